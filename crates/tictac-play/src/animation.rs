use serde::{Deserialize, Serialize};

use tictac_core::audio::{AudioSink, SfxKey};

/// Player animation tracks. Only timing and step sounds are simulated;
/// frames are drawn by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Idle,
    Running,
    InAir,
}

struct Frame {
    ticks: u8,
    sfx: Option<SfxKey>,
}

const fn frame(ticks: u8) -> Frame {
    Frame { ticks, sfx: None }
}

const fn step(ticks: u8, sfx: SfxKey) -> Frame {
    Frame {
        ticks,
        sfx: Some(sfx),
    }
}

static IDLE_FRAMES: [Frame; 14] = [
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(160),
    frame(100),
    frame(160),
    frame(160),
];

static RUNNING_FRAMES: [Frame; 6] = [
    step(10, SfxKey::LowStep),
    step(18, SfxKey::Step),
    step(18, SfxKey::LowStep),
    step(18, SfxKey::Step),
    step(18, SfxKey::LowStep),
    step(18, SfxKey::Step),
];

static IN_AIR_FRAMES: [Frame; 1] = [frame(255)];

impl AnimationKind {
    fn frames(self) -> &'static [Frame] {
        match self {
            AnimationKind::Idle => &IDLE_FRAMES,
            AnimationKind::Running => &RUNNING_FRAMES,
            AnimationKind::InAir => &IN_AIR_FRAMES,
        }
    }

    /// Frame the track wraps back to after its last frame.
    pub const fn loop_start(self) -> u8 {
        match self {
            AnimationKind::Running => 1,
            AnimationKind::Idle | AnimationKind::InAir => 0,
        }
    }

    pub fn frame_count(self) -> usize {
        self.frames().len()
    }
}

/// Playback position on one animation track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    kind: AnimationKind,
    frame_index: u8,
    ticks_left: u8,
}

impl Animation {
    pub fn new(kind: AnimationKind) -> Self {
        Self {
            kind,
            frame_index: 0,
            ticks_left: kind.frames()[0].ticks,
        }
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn frame_index(&self) -> u8 {
        self.frame_index
    }

    /// False when the position does not exist on its track, e.g. in a
    /// tampered snapshot.
    pub fn is_valid(&self) -> bool {
        self.kind
            .frames()
            .get(usize::from(self.frame_index))
            .is_some_and(|frame| (1..=frame.ticks).contains(&self.ticks_left))
    }

    /// True while still on the intro frames before the loop start.
    pub fn in_pre_loop_phase(&self) -> bool {
        self.frame_index < self.kind.loop_start()
    }

    fn enter_frame(&mut self, index: u8, audio: &mut dyn AudioSink) {
        let frame = &self.kind.frames()[index as usize];
        self.frame_index = index;
        self.ticks_left = frame.ticks;
        if let Some(sfx) = frame.sfx {
            audio.play_sfx(sfx);
        }
    }

    /// Switch to `kind` from its first frame, unless it is already playing.
    pub fn ensure(&mut self, kind: AnimationKind, audio: &mut dyn AudioSink) {
        if self.kind != kind {
            self.kind = kind;
            self.enter_frame(0, audio);
        }
    }

    /// Switch to `kind` and jump straight to its loop start, skipping intro
    /// frames.
    pub fn rewind_to_loop(&mut self, kind: AnimationKind, audio: &mut dyn AudioSink) {
        self.kind = kind;
        self.enter_frame(kind.loop_start(), audio);
    }

    /// Advance one tick. Sounds fire when a frame is entered.
    pub fn update(&mut self, audio: &mut dyn AudioSink) {
        self.ticks_left -= 1;
        if self.ticks_left == 0 {
            let last = self.kind.frame_count() as u8 - 1;
            let next = if self.frame_index == last {
                self.kind.loop_start()
            } else {
                self.frame_index + 1
            };
            self.enter_frame(next, audio);
        }
    }
}
