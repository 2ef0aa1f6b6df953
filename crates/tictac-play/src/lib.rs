pub mod animation;
pub mod config;
pub mod map_gen;
pub mod player;

use serde::{Deserialize, Serialize};

use tictac_core::audio::{AudioSink, SfxKey};
use tictac_core::carrot::{Carrot, CarrotInventory};
use tictac_core::codec::{self, MapCodecError};
use tictac_core::input::InputSource;
use tictac_core::map::TileMap;
use tictac_core::tile::{Layer, TileClass, TransferSlot};

pub use config::{MotionTuning, PlayConfig};
pub use player::{Facing, Plane, Player, PlayerState};

/// Fixed simulation rate.
pub const TICK_RATE_HZ: u32 = 120;

#[derive(Debug)]
pub enum SceneError {
    EmptyPack,
    Codec(MapCodecError),
    /// A lettered transfer tile whose slot has no target map.
    UndefinedTransfer {
        map: usize,
        slot: TransferSlot,
    },
    TransferOutOfRange {
        map: usize,
        target: u8,
        maps: usize,
    },
    Snapshot(String),
    /// A snapshot that decoded but holds state the scene cannot reach.
    InvalidSnapshot(&'static str),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPack => write!(f, "map pack has no maps"),
            Self::Codec(e) => write!(f, "map decode failed: {e}"),
            Self::UndefinedTransfer { map, slot } => {
                write!(f, "map #{map} uses transfer {slot:?} with no target")
            },
            Self::TransferOutOfRange { map, target, maps } => {
                write!(
                    f,
                    "map #{map} transfers to map id {target} but the pack has {maps} maps"
                )
            },
            Self::Snapshot(e) => write!(f, "snapshot error: {e}"),
            Self::InvalidSnapshot(reason) => write!(f, "snapshot rejected: {reason}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapCodecError> for SceneError {
    fn from(e: MapCodecError) -> Self {
        Self::Codec(e)
    }
}

/// Something that happened during a tick, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayEvent {
    Died,
    GoalReached { ticks: u32 },
    CarrotCollected(Carrot),
    Transferred { from: usize, to: usize },
}

/// Format a tick count as `MM:SS`.
pub fn format_race_time(ticks: u32) -> String {
    let secs = ticks / TICK_RATE_HZ;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Serialize, Deserialize)]
struct SceneSnapshot {
    map_index: usize,
    player: Player,
    carrots: CarrotInventory,
    ticks: u32,
    finished: bool,
}

/// A running race over a pack of maps.
pub struct PlayScene {
    maps: Vec<TileMap>,
    map_index: usize,
    player: Player,
    carrots: CarrotInventory,
    ticks: u32,
    finished: bool,
    config: PlayConfig,
}

impl PlayScene {
    /// Decode a '.'-separated map pack and start on its first map.
    pub fn from_pack(text: &str, config: PlayConfig) -> Result<Self, SceneError> {
        let maps = codec::decode_pack(text)?;
        Self::from_maps(maps, config)
    }

    pub fn from_maps(maps: Vec<TileMap>, config: PlayConfig) -> Result<Self, SceneError> {
        if maps.is_empty() {
            return Err(SceneError::EmptyPack);
        }
        validate_transfers(&maps)?;

        let mut player = Player::new(config.motion.clone());
        player.respawn(&maps[0]);
        tracing::debug!(maps = maps.len(), "Play scene ready");
        Ok(Self {
            maps,
            map_index: 0,
            player,
            carrots: CarrotInventory::new(),
            ticks: 0,
            finished: false,
            config,
        })
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn carrots(&self) -> &CarrotInventory {
        &self.carrots
    }

    pub fn maps(&self) -> &[TileMap] {
        &self.maps
    }

    pub fn map_index(&self) -> usize {
        self.map_index
    }

    pub fn current_map(&self) -> &TileMap {
        &self.maps[self.map_index]
    }

    /// Ticks elapsed on the race stopwatch.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    /// Advance one tick. Does nothing once the goal was reached.
    pub fn update(
        &mut self,
        input: &dyn InputSource,
        audio: &mut dyn AudioSink,
    ) -> Vec<PlayEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.ticks = self.ticks.saturating_add(1);
        self.player
            .update(input, audio, &self.carrots, &self.maps[self.map_index]);

        if self.player.has_fallen() {
            audio.play_sfx(SfxKey::Back);
            self.carrots.remove_all();
            self.player.respawn(&self.maps[self.map_index]);
            events.push(PlayEvent::Died);
        } else if let Some(event) = self.resolve_special(audio) {
            events.push(event);
            // goal and transfer end the tick
            if !matches!(event, PlayEvent::CarrotCollected(_)) {
                return events;
            }
        }

        self.carrots.update(input, audio);
        events
    }

    fn resolve_special(&mut self, audio: &mut dyn AudioSink) -> Option<PlayEvent> {
        let rect = self.player.special_rect();
        let map = &self.maps[self.map_index];
        let tile = map.first_collision(Layer::Special, &rect, &self.carrots)?;

        match tile.class()? {
            TileClass::Goal => {
                audio.play_sfx(SfxKey::Click);
                self.finished = true;
                tracing::debug!(ticks = self.ticks, "Race goal reached");
                Some(PlayEvent::GoalReached { ticks: self.ticks })
            },
            TileClass::Carrot(variety) => {
                let carrot = Carrot::new(variety, tile.row, tile.column);
                if !self.carrots.try_add(carrot) {
                    return None;
                }
                audio.play_sfx(SfxKey::Click);
                Some(PlayEvent::CarrotCollected(carrot))
            },
            TileClass::Transfer(Some(slot)) => {
                let target = map.transfer_target(slot)?;
                let from = self.map_index;
                self.map_index = usize::from(target) - 1;
                self.player.respawn(&self.maps[self.map_index]);
                audio.play_sfx(SfxKey::Click);
                tracing::trace!(from, to = self.map_index, "Map transfer");
                Some(PlayEvent::Transferred {
                    from,
                    to: self.map_index,
                })
            },
            // plain arrows and start points do nothing
            TileClass::Transfer(None)
            | TileClass::StartPoint
            | TileClass::Terrain
            | TileClass::CarrotPlatform(_) => None,
        }
    }

    /// Serialize the dynamic race state with MessagePack.
    pub fn serialize_state(&self) -> Result<Vec<u8>, SceneError> {
        let snapshot = SceneSnapshot {
            map_index: self.map_index,
            player: self.player.clone(),
            carrots: self.carrots.clone(),
            ticks: self.ticks,
            finished: self.finished,
        };
        rmp_serde::to_vec(&snapshot).map_err(|e| SceneError::Snapshot(e.to_string()))
    }

    /// Restore state produced by [`PlayScene::serialize_state`] for the same
    /// pack. The scene is left untouched on error.
    pub fn apply_state(&mut self, state: &[u8]) -> Result<(), SceneError> {
        let snapshot: SceneSnapshot =
            rmp_serde::from_slice(state).map_err(|e| SceneError::Snapshot(e.to_string()))?;
        if snapshot.map_index >= self.maps.len() {
            return Err(SceneError::Snapshot(format!(
                "map index {} out of range",
                snapshot.map_index
            )));
        }
        let mut player = snapshot.player;
        player.set_tuning(self.config.motion.clone());
        player.validate().map_err(SceneError::InvalidSnapshot)?;
        snapshot
            .carrots
            .validate()
            .map_err(SceneError::InvalidSnapshot)?;

        self.map_index = snapshot.map_index;
        self.player = player;
        self.carrots = snapshot.carrots;
        self.ticks = snapshot.ticks;
        self.finished = snapshot.finished;
        Ok(())
    }
}

/// Every lettered transfer tile must point at a map in the pack.
fn validate_transfers(maps: &[TileMap]) -> Result<(), SceneError> {
    for (index, map) in maps.iter().enumerate() {
        for tile in map.tiles(Layer::Special) {
            let Some(TileClass::Transfer(Some(slot))) = tile.class() else {
                continue;
            };
            match map.transfer_target(slot) {
                None => return Err(SceneError::UndefinedTransfer { map: index, slot }),
                Some(target) if usize::from(target) > maps.len() => {
                    return Err(SceneError::TransferOutOfRange {
                        map: index,
                        target,
                        maps: maps.len(),
                    });
                },
                Some(_) => {},
            }
        }
    }
    Ok(())
}
