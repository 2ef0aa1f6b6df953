use serde::{Deserialize, Serialize};

/// Sound effects the simulation can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SfxKey {
    Jump,
    Land,
    TicTac,
    Click,
    Back,
    Scratch,
    Cronch,
    Confirm,
    Step,
    LowStep,
}

/// Fire-and-forget sound playback.
pub trait AudioSink {
    fn play_sfx(&mut self, key: SfxKey);
}

/// Collects requested sound effects so the host can play them after the
/// tick.
#[derive(Debug, Default, Clone)]
pub struct SfxQueue {
    events: Vec<SfxKey>,
}

impl SfxQueue {
    pub fn push(&mut self, key: SfxKey) {
        self.events.push(key);
    }

    pub fn events(&self) -> &[SfxKey] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, SfxKey> {
        self.events.drain(..)
    }
}

impl AudioSink for SfxQueue {
    fn play_sfx(&mut self, key: SfxKey) {
        self.push(key);
    }
}

/// Discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Muted;

impl AudioSink for Muted {
    fn play_sfx(&mut self, _key: SfxKey) {}
}
