use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Initial jump speed (px/tick, upward).
pub const JUMP_INITIAL_SPEED: f64 = 2.4;
/// Gravity applied every airborne tick.
pub const DEFAULT_GRAVITY: f64 = 0.046;
/// Additional gravity once a jump is released past its hold-stop tick.
pub const EXTRA_GRAVITY: f64 = 0.10;
/// Max fall speed as a multiple of the initial jump speed.
pub const MAX_FALL_FACTOR: f64 = 1.33;
/// Horizontal speed bonus while airborne.
pub const AIR_EXTRA_HORZ_SPEED: f64 = 0.2;
/// Share of the air bonus added again after a tic-tac.
pub const TIC_TAC_AIR_HORZ_MULT: f64 = 0.36;
/// Scales the tic-tac initial speed and its gravity.
pub const TIC_TAC_FACTOR: f64 = 0.76;
/// Share of the remaining jump gain converted into speed each tick.
pub const JUMP_GAIN_DECAY: f64 = 0.24;
/// Ground run speed (px/tick).
pub const RUN_SPEED: f64 = 1.5 / 2.0;
/// Run speed while the run animation is on its intro frame.
pub const RUN_FIRST_STEPS_SPEED: f64 = 0.4 / 2.0;
/// Ledge slip speed (px/tick).
pub const SLIP_SPEED: f64 = 0.3;

/// Player motion constants, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    pub jump_initial_speed: f64,
    pub default_gravity: f64,
    pub extra_gravity: f64,
    pub max_fall_factor: f64,
    pub air_extra_horz_speed: f64,
    pub tic_tac_air_horz_mult: f64,
    pub tic_tac_factor: f64,
    pub jump_gain_decay: f64,
    pub run_speed: f64,
    pub run_first_steps_speed: f64,
    pub slip_speed: f64,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            jump_initial_speed: JUMP_INITIAL_SPEED,
            default_gravity: DEFAULT_GRAVITY,
            extra_gravity: EXTRA_GRAVITY,
            max_fall_factor: MAX_FALL_FACTOR,
            air_extra_horz_speed: AIR_EXTRA_HORZ_SPEED,
            tic_tac_air_horz_mult: TIC_TAC_AIR_HORZ_MULT,
            tic_tac_factor: TIC_TAC_FACTOR,
            jump_gain_decay: JUMP_GAIN_DECAY,
            run_speed: RUN_SPEED,
            run_first_steps_speed: RUN_FIRST_STEPS_SPEED,
            slip_speed: SLIP_SPEED,
        }
    }
}

impl MotionTuning {
    pub fn max_fall_speed(&self) -> f64 {
        self.jump_initial_speed * self.max_fall_factor
    }

    /// Replace every value that is not finite or falls outside its usable
    /// range with the default, logging each replacement.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let fields: [(&str, &mut f64, f64, RangeInclusive<f64>); 11] = [
            (
                "jump_initial_speed",
                &mut self.jump_initial_speed,
                d.jump_initial_speed,
                0.1..=8.0,
            ),
            ("default_gravity", &mut self.default_gravity, d.default_gravity, 0.001..=1.0),
            ("extra_gravity", &mut self.extra_gravity, d.extra_gravity, 0.0..=1.0),
            ("max_fall_factor", &mut self.max_fall_factor, d.max_fall_factor, 0.1..=4.0),
            (
                "air_extra_horz_speed",
                &mut self.air_extra_horz_speed,
                d.air_extra_horz_speed,
                0.0..=4.0,
            ),
            (
                "tic_tac_air_horz_mult",
                &mut self.tic_tac_air_horz_mult,
                d.tic_tac_air_horz_mult,
                0.0..=4.0,
            ),
            ("tic_tac_factor", &mut self.tic_tac_factor, d.tic_tac_factor, 0.1..=1.0),
            ("jump_gain_decay", &mut self.jump_gain_decay, d.jump_gain_decay, 0.01..=1.0),
            ("run_speed", &mut self.run_speed, d.run_speed, 0.01..=8.0),
            (
                "run_first_steps_speed",
                &mut self.run_first_steps_speed,
                d.run_first_steps_speed,
                0.01..=8.0,
            ),
            // ledge slips move at most one pixel per tick
            ("slip_speed", &mut self.slip_speed, d.slip_speed, 0.01..=1.0),
        ];
        for (name, value, default, range) in fields {
            if !range.contains(&*value) {
                tracing::warn!("motion.{name} = {value} is outside {range:?}, using {default}");
                *value = default;
            }
        }
        self
    }

    /// Horizontal air speed, boosted after a tic-tac.
    pub fn air_horz_speed(&self, did_tic_tac: bool) -> f64 {
        let mut speed = self.run_speed + self.air_extra_horz_speed;
        if did_tic_tac {
            speed += self.air_extra_horz_speed * self.tic_tac_air_horz_mult;
        }
        speed
    }
}

/// Top-level play configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub motion: MotionTuning,
}

impl PlayConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("TICTAC_PLAY_CONFIG")
            .unwrap_or_else(|_| "config/play.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                PlayConfig::default()
            }),
            Err(_) => PlayConfig::default(),
        }
    }

    /// Parse TOML config. Out-of-range motion values fall back to their
    /// defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.motion = config.motion.sanitized();
        Ok(config)
    }
}
