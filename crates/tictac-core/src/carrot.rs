use serde::{Deserialize, Serialize};

use crate::audio::{AudioSink, SfxKey};
use crate::input::{Action, InputSource};

/// Number of inventory slots.
pub const CARROT_SLOTS: usize = 3;

/// Carrot colors. Each one powers the platforms of the same color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variety {
    Orange,
    Yellow,
    Purple,
}

impl Variety {
    /// Fill lost per tick once the carrot has been eaten.
    pub const fn drain_speed(self) -> f64 {
        match self {
            Variety::Orange => 0.002,
            Variety::Yellow => 0.004,
            Variety::Purple => 0.007,
        }
    }
}

/// A carrot picked up from a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Carrot {
    pub variety: Variety,
    pub origin_row: u8,
    pub origin_col: u8,
}

impl Carrot {
    pub const fn new(variety: Variety, origin_row: u8, origin_col: u8) -> Self {
        Self {
            variety,
            origin_row,
            origin_col,
        }
    }
}

/// Three-slot carrot inventory.
///
/// A slot at fill 1.0 holds an uneaten carrot. Eating it drops the fill just
/// below 1.0, after which it drains every tick and powers its color's
/// platforms until empty. Empty slots always have fill 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrotInventory {
    slots: [Option<Carrot>; CARROT_SLOTS],
    fill_levels: [f64; CARROT_SLOTS],
    active_index: u8,
}

impl CarrotInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<Carrot>; CARROT_SLOTS] {
        &self.slots
    }

    pub fn fill_levels(&self) -> &[f64; CARROT_SLOTS] {
        &self.fill_levels
    }

    pub fn active_index(&self) -> u8 {
        self.active_index
    }

    /// Empty every slot and reset the selection.
    pub fn remove_all(&mut self) {
        self.active_index = 0;
        self.slots = [None; CARROT_SLOTS];
        self.fill_levels = [0.0; CARROT_SLOTS];
    }

    /// False when a held carrot was picked from the given map cell.
    pub fn is_map_carrot_on(&self, col: u8, row: u8) -> bool {
        !self
            .slots
            .iter()
            .flatten()
            .any(|c| c.origin_row == row && c.origin_col == col)
    }

    /// Store the carrot in the first free slot, searching from the active
    /// one. Refused when full or when the cell's carrot is already held.
    pub fn try_add(&mut self, carrot: Carrot) -> bool {
        if !self.is_map_carrot_on(carrot.origin_col, carrot.origin_row) {
            return false;
        }
        for i in 0..CARROT_SLOTS {
            let idx = (self.active_index as usize + i) % CARROT_SLOTS;
            if self.slots[idx].is_none() {
                self.slots[idx] = Some(carrot);
                self.fill_levels[idx] = 1.0;
                return true;
            }
        }
        false
    }

    /// Eat the carrot in the active slot. Only a full, uneaten carrot can
    /// be eaten.
    pub fn try_consume(&mut self, audio: &mut dyn AudioSink) -> bool {
        let idx = self.active_index as usize;
        if self.slots[idx].is_none() || self.fill_levels[idx] < 1.0 {
            audio.play_sfx(SfxKey::Scratch);
            return false;
        }
        audio.play_sfx(SfxKey::Cronch);
        self.fill_levels[idx] = 0.9999;
        true
    }

    /// Platform opacity for a color: 0 when no eaten carrot of that color is
    /// active, otherwise a stepped value from the highest remaining fill.
    pub fn fill_opacity(&self, variety: Variety) -> f32 {
        let level = self
            .slots
            .iter()
            .zip(self.fill_levels.iter())
            .filter(|(slot, fill)| {
                slot.is_some_and(|c| c.variety == variety) && **fill < 1.0
            })
            .map(|(_, fill)| *fill)
            .fold(None, |acc: Option<f64>, fill| {
                Some(acc.map_or(fill, |a| a.max(fill)))
            });
        match level {
            None => 0.0,
            Some(l) if l > 0.66 => 1.0,
            Some(l) if l > 0.33 => 0.8,
            Some(_) => 0.65,
        }
    }

    pub fn select_next(&mut self, audio: &mut dyn AudioSink) {
        self.active_index = (self.active_index + 1) % CARROT_SLOTS as u8;
        audio.play_sfx(SfxKey::Click);
    }

    pub fn select_prev(&mut self, audio: &mut dyn AudioSink) {
        self.active_index = match self.active_index {
            0 => CARROT_SLOTS as u8 - 1,
            i => i - 1,
        };
        audio.play_sfx(SfxKey::Click);
    }

    /// Per-tick update: drain eaten carrots, then handle selection and
    /// eating input.
    pub fn update(&mut self, input: &dyn InputSource, audio: &mut dyn AudioSink) {
        for (slot, fill) in self.slots.iter_mut().zip(self.fill_levels.iter_mut()) {
            let Some(carrot) = slot else { continue };
            if *fill < 1.0 {
                *fill -= carrot.variety.drain_speed();
                if *fill <= 0.0 {
                    *fill = 0.0;
                    *slot = None;
                }
            }
        }

        if input.trigger(Action::PrevCarrot) {
            self.select_prev(audio);
        } else if input.trigger(Action::NextCarrot) {
            self.select_next(audio);
        }

        if input.trigger(Action::UseCarrot) {
            let _ = self.try_consume(audio);
        }
    }

    /// Check the invariants `update` relies on, for state restored from
    /// outside (snapshots).
    pub fn validate(&self) -> Result<(), &'static str> {
        if usize::from(self.active_index) >= CARROT_SLOTS {
            return Err("active carrot slot out of range");
        }
        for (slot, fill) in self.slots.iter().zip(self.fill_levels) {
            match slot {
                None if fill != 0.0 => return Err("empty carrot slot with a fill level"),
                Some(_) if !(fill > 0.0 && fill <= 1.0) => {
                    return Err("carrot fill level out of range");
                },
                _ => {},
            }
        }
        Ok(())
    }
}
