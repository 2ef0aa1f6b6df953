//! Player motion: a seven-state machine stepping one pixel boundary at a time
//! against the active collision plane.

use serde::{Deserialize, Serialize};

use tictac_core::audio::{AudioSink, Muted, SfxKey};
use tictac_core::carrot::CarrotInventory;
use tictac_core::geom::Rect;
use tictac_core::input::{Action, Direction, InputSource};
use tictac_core::map::TileMap;
use tictac_core::tile::Layer;
use tictac_core::{CANVAS_HEIGHT, CANVAS_WIDTH, TILE_SIZE};

use crate::animation::{Animation, AnimationKind};
use crate::config::MotionTuning;

/// Width of the player's collision box.
pub const COLLISION_WIDTH: i32 = 9;
/// Height of the player's collision box.
pub const COLLISION_HEIGHT: i32 = 28;

const STEP_EPSILON: f64 = 0.0001;
const MAX_X: f64 = (CANVAS_WIDTH - COLLISION_WIDTH) as f64;
const FALLEN_Y: f64 = (CANVAS_HEIGHT + COLLISION_HEIGHT + 16 + 120) as f64;
const HOLD_STOP_UNSET: i32 = 9999;
/// Vertical offset from a start cell's top edge to the player's top edge.
const SPAWN_Y_OFFSET: f64 = 11.0 - COLLISION_HEIGHT as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Running,
    JumpHold,
    JumpInertial,
    TicTacHold,
    TicTacInertial,
    Falling,
}

impl PlayerState {
    pub const fn is_airborne(self) -> bool {
        !matches!(self, PlayerState::Idle | PlayerState::Running)
    }

    const fn animation(self) -> AnimationKind {
        match self {
            PlayerState::Idle => AnimationKind::Idle,
            PlayerState::Running => AnimationKind::Running,
            _ => AnimationKind::InAir,
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlayerState::Idle => "Idle",
            PlayerState::Running => "Running",
            PlayerState::JumpHold => "JumpHold",
            PlayerState::JumpInertial => "JumpInertial",
            PlayerState::TicTacHold => "TicTacHold",
            PlayerState::TicTacInertial => "TicTacInertial",
            PlayerState::Falling => "Falling",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

/// Collision plane the player is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plane {
    Back,
    Main,
    Front,
}

impl Plane {
    pub const fn layer(self) -> Layer {
        match self {
            Plane::Back => Layer::Back,
            Plane::Main => Layer::Main,
            Plane::Front => Layer::Front,
        }
    }
}

/// Read-only view of what the player collides with this tick.
struct Terrain<'a> {
    map: &'a TileMap,
    carrots: &'a CarrotInventory,
}

impl Terrain<'_> {
    fn collides(&self, layer: Layer, rect: &Rect) -> bool {
        self.map.collides(layer, rect, self.carrots)
    }

    fn has_landing(&self, layer: Layer, ox: i32, fx: i32, y: i32) -> bool {
        self.map.has_landing_at(layer, ox, fx, y, self.carrots)
    }
}

/// Next x when moving one pixel boundary towards `target`.
fn step_towards(x: f64, target: f64, dir: Direction) -> f64 {
    match dir {
        Direction::Left => (x - STEP_EPSILON).floor().max(target),
        Direction::Right => (x + STEP_EPSILON).ceil().min(target),
        Direction::None => x,
    }
}

fn clamp_x(x: f64) -> f64 {
    x.clamp(0.0, MAX_X)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    state: PlayerState,
    anim: Animation,
    x: f64,
    y: f64,
    facing: Facing,
    plane: Plane,
    vert_speed: f64,
    jump_gain_left: f64,
    jumping_ticks: i32,
    hold_stop_tick: i32,
    did_tic_tac: bool,
    extra_gravity_ticks: i32,
    #[serde(skip)]
    tuning: MotionTuning,
}

impl Player {
    /// A player in the air at the origin. Call [`Player::respawn`] to place it.
    pub fn new(tuning: MotionTuning) -> Self {
        Self {
            state: PlayerState::Falling,
            anim: Animation::new(AnimationKind::InAir),
            x: 0.0,
            y: 0.0,
            facing: Facing::Right,
            plane: Plane::Main,
            vert_speed: 0.0,
            jump_gain_left: 0.0,
            jumping_ticks: 0,
            hold_stop_tick: HOLD_STOP_UNSET,
            did_tic_tac: true,
            extra_gravity_ticks: 0,
            tuning: tuning.sanitized(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// Positive is upwards.
    pub fn vert_speed(&self) -> f64 {
        self.vert_speed
    }

    pub fn did_tic_tac(&self) -> bool {
        self.did_tic_tac
    }

    pub fn animation(&self) -> &Animation {
        &self.anim
    }

    pub fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    /// Replace the motion constants, e.g. after restoring a snapshot.
    pub fn set_tuning(&mut self, tuning: MotionTuning) {
        self.tuning = tuning.sanitized();
    }

    /// Check a player restored from outside (snapshots) against the ranges
    /// `update` can reach. Call after [`Player::set_tuning`].
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=MAX_X).contains(&self.x) {
            return Err("player x outside the canvas");
        }
        if !(-FALLEN_Y..=FALLEN_Y).contains(&self.y) {
            return Err("player y out of range");
        }
        let t = &self.tuning;
        // one tick of gravity past the peak before the fall clamp applies
        let max_speed =
            t.jump_initial_speed.max(t.max_fall_speed()) + t.default_gravity + t.extra_gravity;
        if !(-max_speed..=max_speed).contains(&self.vert_speed) {
            return Err("vertical speed out of range");
        }
        if !(0.0..=t.jump_initial_speed).contains(&self.jump_gain_left) {
            return Err("jump gain out of range");
        }
        if !(0..i32::MAX).contains(&self.jumping_ticks)
            || !(0..=HOLD_STOP_UNSET).contains(&self.hold_stop_tick)
            || self.extra_gravity_ticks < 0
        {
            return Err("jump tick counters out of range");
        }
        if !self.anim.is_valid() {
            return Err("animation position out of range");
        }
        Ok(())
    }

    /// Whether the host should draw the player behind the main layer.
    pub fn is_behind_main(&self) -> bool {
        self.plane == Plane::Back
    }

    fn ix(&self) -> i32 {
        self.x as i32
    }

    fn iy(&self) -> i32 {
        self.y as i32
    }

    pub fn collision_rect(&self) -> Rect {
        let (x, y) = (self.ix(), self.iy());
        Rect::new(x, y, x + COLLISION_WIDTH, y + COLLISION_HEIGHT)
    }

    /// Box tested against the special layer for pickups, goals and transfers.
    pub fn special_rect(&self) -> Rect {
        let (x, y) = (self.ix(), self.iy());
        match self.facing {
            Facing::Right => Rect::new(x + 1, y + 3, x + 6, y + 22),
            Facing::Left => Rect::new(x + 3, y + 3, x + 8, y + 22),
        }
    }

    fn tic_tac_probe(&self) -> Rect {
        let (x, y) = (self.ix(), self.iy());
        Rect::new(x + 2, y + 20, x + 7, y + 25)
    }

    fn landing_zone(&self) -> (i32, i32) {
        let x = self.ix();
        match self.facing {
            Facing::Right => (x, x + 7),
            Facing::Left => (x + 2, x + 9),
        }
    }

    /// Fell off the bottom of the canvas.
    pub fn has_fallen(&self) -> bool {
        self.y > FALLEN_Y
    }

    /// Place the player on the map's start cell, idle and grounded.
    pub fn respawn(&mut self, map: &TileMap) {
        // idle frames carry no sound
        self.change_state(PlayerState::Idle, &mut Muted);
        let (row, col) = map.start();
        self.x = f64::from(col) * f64::from(TILE_SIZE) + 2.0;
        self.y = f64::from(row) * f64::from(TILE_SIZE) + SPAWN_Y_OFFSET;
        self.vert_speed = 0.0;
        self.jump_gain_left = 0.0;
        self.jumping_ticks = 0;
        self.did_tic_tac = false;
        self.extra_gravity_ticks = 0;
        self.plane = if map.tile_id_at(Layer::Front, row, col).is_some() {
            Plane::Front
        } else {
            Plane::Main
        };
        tracing::trace!(x = self.x, y = self.y, plane = ?self.plane, "Player respawned");
    }

    /// Advance one tick.
    pub fn update(
        &mut self,
        input: &dyn InputSource,
        audio: &mut dyn AudioSink,
        carrots: &CarrotInventory,
        map: &TileMap,
    ) {
        let terrain = Terrain { map, carrots };
        let dir = input.horizontal_direction();
        match dir {
            Direction::Left => self.facing = Facing::Left,
            Direction::Right => self.facing = Facing::Right,
            Direction::None => {},
        }

        match self.state {
            PlayerState::Idle => {
                if dir == Direction::None {
                    if !self.detect_and_process_falling(&terrain, audio) {
                        let slip_x = self.detect_slip(&terrain);
                        if slip_x != self.x {
                            self.slip_towards(&terrain, slip_x);
                        }
                    }
                } else {
                    self.change_state(PlayerState::Running, audio);
                    self.apply_running_motion(&terrain, audio);
                }
                if self.state == PlayerState::Idle && input.trigger(Action::Jump) {
                    audio.play_sfx(SfxKey::Jump);
                    self.change_state(PlayerState::JumpHold, audio);
                }
            },
            PlayerState::Running => {
                if dir == Direction::None {
                    self.change_state(PlayerState::Idle, audio);
                } else {
                    self.apply_running_motion(&terrain, audio);
                }
                if self.state == PlayerState::Running && input.trigger(Action::Jump) {
                    audio.play_sfx(SfxKey::Jump);
                    self.change_state(PlayerState::JumpHold, audio);
                }
            },
            PlayerState::JumpHold => {
                self.apply_jump_motion(&terrain, dir, audio);
                if self.state == PlayerState::JumpHold
                    && !self.try_tic_tac(&terrain, input, audio)
                    && !input.pressed(Action::Jump)
                {
                    self.hold_stop_tick = self.jumping_ticks;
                    self.change_state(PlayerState::JumpInertial, audio);
                }
            },
            PlayerState::JumpInertial => {
                self.apply_jump_motion(&terrain, dir, audio);
                if self.state == PlayerState::JumpInertial {
                    self.try_tic_tac(&terrain, input, audio);
                }
            },
            PlayerState::TicTacHold => {
                self.apply_jump_motion(&terrain, dir, audio);
                if self.state == PlayerState::TicTacHold && !input.pressed(Action::Jump) {
                    self.change_state(PlayerState::TicTacInertial, audio);
                }
            },
            PlayerState::TicTacInertial => {
                self.apply_jump_motion(&terrain, dir, audio);
            },
            PlayerState::Falling => {
                self.apply_fall_motion(&terrain, dir, audio);
                if self.state == PlayerState::Falling {
                    self.try_tic_tac(&terrain, input, audio);
                }
            },
        }

        self.anim.update(audio);
    }

    /// Whether a tic-tac would be accepted right now.
    pub fn can_tic_tac(&self, map: &TileMap, carrots: &CarrotInventory) -> bool {
        self.tic_tac_target(&Terrain { map, carrots }).is_some()
    }

    /// Plane the player ends up on after a tic-tac. Main bounces off the back
    /// layer; front bounces off main and stays in front.
    fn tic_tac_target(&self, terrain: &Terrain<'_>) -> Option<Plane> {
        if self.did_tic_tac {
            return None;
        }
        if self.state == PlayerState::Falling && self.vert_speed < -self.tuning.jump_initial_speed
        {
            return None;
        }
        let probe = self.tic_tac_probe();
        match self.plane {
            Plane::Main if terrain.collides(Layer::Back, &probe) => Some(Plane::Back),
            Plane::Front if terrain.collides(Layer::Main, &probe) => Some(Plane::Front),
            _ => None,
        }
    }

    fn try_tic_tac(
        &mut self,
        terrain: &Terrain<'_>,
        input: &dyn InputSource,
        audio: &mut dyn AudioSink,
    ) -> bool {
        if !input.trigger(Action::Jump) {
            return false;
        }
        let Some(plane) = self.tic_tac_target(terrain) else {
            return false;
        };
        self.plane = plane;
        audio.play_sfx(SfxKey::TicTac);
        self.change_state(PlayerState::TicTacHold, audio);
        true
    }

    fn change_state(&mut self, state: PlayerState, audio: &mut dyn AudioSink) {
        if state == PlayerState::Running {
            self.anim.rewind_to_loop(AnimationKind::Running, audio);
        } else {
            self.anim.ensure(state.animation(), audio);
        }
        if self.state != state {
            tracing::trace!(from = %self.state, to = %state, "Player state change");
        }
        self.state = state;

        match state {
            PlayerState::JumpHold => {
                self.did_tic_tac = false;
                self.jump_gain_left = self.tuning.jump_initial_speed;
                self.vert_speed = 0.0;
                // samples with the previous jump's tick counters
                self.vert_speed = self.next_jump_speed();
                self.extra_gravity_ticks = 0;
                self.jumping_ticks = 0;
                self.hold_stop_tick = HOLD_STOP_UNSET;
            },
            PlayerState::Falling => {
                if self.vert_speed > 0.0 {
                    self.vert_speed = 0.0;
                }
            },
            PlayerState::TicTacHold => {
                self.vert_speed = self.tuning.jump_initial_speed * self.tuning.tic_tac_factor
                    - self.vert_speed.abs() / 8.0;
                self.did_tic_tac = true;
            },
            PlayerState::Idle | PlayerState::Running => self.vert_speed = 0.0,
            PlayerState::JumpInertial | PlayerState::TicTacInertial => {},
        }
    }

    fn end_fall(&mut self, dir: Direction, audio: &mut dyn AudioSink) {
        if dir == Direction::None {
            self.change_state(PlayerState::Idle, audio);
        } else {
            self.change_state(PlayerState::Running, audio);
        }
    }

    fn next_jump_speed(&mut self) -> f64 {
        match self.state {
            PlayerState::JumpHold | PlayerState::JumpInertial => self.next_normal_jump_speed(),
            PlayerState::TicTacHold | PlayerState::TicTacInertial => self.next_tic_tac_speed(),
            other => unreachable!("jump speed requested while {other}"),
        }
    }

    fn next_normal_jump_speed(&mut self) -> f64 {
        let t = &self.tuning;
        if self.jump_gain_left > 0.0 {
            let gain = self.jump_gain_left * t.jump_gain_decay;
            self.vert_speed += gain;
            self.jump_gain_left -= gain;
        }
        self.vert_speed -= t.default_gravity;
        if self.jumping_ticks > self.hold_stop_tick {
            self.extra_gravity_ticks = self
                .extra_gravity_ticks
                .max(self.jumping_ticks - self.hold_stop_tick);
            self.vert_speed -= t.extra_gravity;
        }
        self.vert_speed
    }

    fn next_tic_tac_speed(&mut self) -> f64 {
        self.vert_speed -= self.tuning.default_gravity * self.tuning.tic_tac_factor;
        if self.state == PlayerState::TicTacInertial {
            self.vert_speed -= self.tuning.default_gravity;
        }
        self.vert_speed
    }

    fn next_fall_speed(&mut self) -> f64 {
        self.vert_speed -= self.tuning.default_gravity;
        if self.extra_gravity_ticks > 0 {
            self.extra_gravity_ticks -= 1;
            self.vert_speed -= self.tuning.extra_gravity;
        }
        self.vert_speed = self.vert_speed.max(-self.tuning.max_fall_speed());
        self.vert_speed
    }

    fn collides_at(&self, terrain: &Terrain<'_>, x: f64, y: f64) -> bool {
        let (x, y) = (x as i32, y as i32);
        let rect = Rect::new(x, y, x + COLLISION_WIDTH, y + COLLISION_HEIGHT);
        match self.plane {
            Plane::Back => false,
            Plane::Main | Plane::Front => terrain.collides(self.plane.layer(), &rect),
        }
    }

    /// Switch to falling when nothing supports the player. Returns true if
    /// the player started falling.
    fn detect_and_process_falling(
        &mut self,
        terrain: &Terrain<'_>,
        audio: &mut dyn AudioSink,
    ) -> bool {
        let (ox, fx) = self.landing_zone();
        let y = self.iy() + COLLISION_HEIGHT;
        let supported = terrain.has_landing(Layer::Main, ox, fx, y)
            || (self.plane != Plane::Back && terrain.has_landing(Layer::Front, ox, fx, y));
        if supported {
            return false;
        }
        self.change_state(PlayerState::Falling, audio);
        true
    }

    /// Land if a main or front top sits at `feet_y`. Landing on main always
    /// takes precedence.
    fn detect_and_process_landing_at(
        &mut self,
        terrain: &Terrain<'_>,
        feet_y: f64,
        dir: Direction,
        audio: &mut dyn AudioSink,
    ) -> bool {
        let (ox, fx) = self.landing_zone();
        let y = feet_y as i32;
        if terrain.has_landing(Layer::Main, ox, fx, y) {
            self.end_fall(dir, audio);
            self.plane = Plane::Main;
            true
        } else if self.plane != Plane::Back && terrain.has_landing(Layer::Front, ox, fx, y) {
            self.end_fall(dir, audio);
            self.plane = Plane::Front;
            true
        } else {
            false
        }
    }

    /// Where a grounded player drifts when one foot hangs over an edge. The
    /// foot ahead is checked first.
    fn detect_slip(&self, terrain: &Terrain<'_>) -> f64 {
        let x = self.ix();
        let y = self.iy() + COLLISION_HEIGHT;
        let layer = self.plane.layer();
        let (left_foot, right_foot) = match self.facing {
            Facing::Right => ((x, x + 4), (x + 3, x + 7)),
            Facing::Left => ((x + 2, x + 6), (x + 5, x + 9)),
        };
        let on = |(ox, fx): (i32, i32)| terrain.has_landing(layer, ox, fx, y);
        let slip = self.tuning.slip_speed;
        let target = match self.facing {
            Facing::Right if !on(right_foot) => self.x + slip,
            Facing::Right if !on(left_foot) => self.x - slip,
            Facing::Left if !on(left_foot) => self.x - slip,
            Facing::Left if !on(right_foot) => self.x + slip,
            _ => self.x,
        };
        clamp_x(target)
    }

    fn slip_towards(&mut self, terrain: &Terrain<'_>, slip_x: f64) {
        let slip_x = clamp_x(slip_x);
        assert!(
            (slip_x - self.x).abs() <= 1.0,
            "slip of more than one pixel: {} -> {slip_x}",
            self.x
        );
        if !self.collides_at(terrain, slip_x, self.y) {
            self.x = slip_x;
        }
    }

    fn apply_running_motion(&mut self, terrain: &Terrain<'_>, audio: &mut dyn AudioSink) {
        if self.detect_and_process_falling(terrain, audio) {
            return;
        }
        let speed = if self.anim.in_pre_loop_phase() {
            self.tuning.run_first_steps_speed
        } else {
            self.tuning.run_speed
        };
        let slip_x = self.detect_slip(terrain);
        let (target, dir) = match self.facing {
            Facing::Left => {
                if slip_x > self.x {
                    self.slip_towards(terrain, slip_x);
                    return;
                }
                (clamp_x(self.x - speed), Direction::Left)
            },
            Facing::Right => {
                if slip_x < self.x {
                    self.slip_towards(terrain, slip_x);
                    return;
                }
                (clamp_x(self.x + speed), Direction::Right)
            },
        };

        while self.x != target {
            let next = step_towards(self.x, target, dir);
            if self.collides_at(terrain, next, self.y) {
                self.change_state(PlayerState::Idle, audio);
                break;
            }
            self.x = next;
        }
    }

    fn air_target_x(&self, dir: Direction) -> f64 {
        let speed = self.tuning.air_horz_speed(self.did_tic_tac);
        let target = match dir {
            Direction::Left => self.x - speed,
            Direction::Right => self.x + speed,
            Direction::None => self.x,
        };
        clamp_x(target)
    }

    /// Finish the horizontal part of an air step, stopping at the first wall.
    fn finish_horizontal(&mut self, terrain: &Terrain<'_>, target_x: f64, dir: Direction) {
        if dir == Direction::None {
            return;
        }
        while self.x != target_x {
            let next = step_towards(self.x, target_x, dir);
            if self.collides_at(terrain, next, self.y) {
                break;
            }
            self.x = next;
        }
    }

    fn apply_jump_motion(
        &mut self,
        terrain: &Terrain<'_>,
        dir: Direction,
        audio: &mut dyn AudioSink,
    ) {
        self.jumping_ticks += 1;
        let speed = self.next_jump_speed();
        if speed <= 0.0 {
            self.y -= speed;
            self.change_state(PlayerState::Falling, audio);
            return;
        }

        let target_y = self.y - speed;
        let target_x = self.air_target_x(dir);
        while self.y > target_y {
            let next_x = step_towards(self.x, target_x, dir);
            let next_y = (self.y - STEP_EPSILON).floor().max(target_y);
            if self.collides_at(terrain, next_x, next_y) {
                // head bump
                self.change_state(PlayerState::Falling, audio);
                break;
            }
            self.x = next_x;
            self.y = next_y;
        }
        self.finish_horizontal(terrain, target_x, dir);
    }

    fn apply_fall_motion(
        &mut self,
        terrain: &Terrain<'_>,
        mut dir: Direction,
        audio: &mut dyn AudioSink,
    ) {
        let feet = self.y + f64::from(COLLISION_HEIGHT);
        if self.detect_and_process_landing_at(terrain, feet, dir, audio) {
            audio.play_sfx(SfxKey::Land);
            return;
        }

        let target_y = self.y - self.next_fall_speed();
        let target_x = self.air_target_x(dir);
        while self.y < target_y {
            if dir != Direction::None {
                let next_x = step_towards(self.x, target_x, dir);
                if self.collides_at(terrain, next_x, self.y) {
                    dir = Direction::None;
                } else {
                    self.x = next_x;
                }
            }
            self.y = (self.y + STEP_EPSILON).ceil().min(target_y);
            let feet = self.y + f64::from(COLLISION_HEIGHT);
            if self.detect_and_process_landing_at(terrain, feet, dir, audio) {
                audio.play_sfx(SfxKey::Land);
                break;
            }
        }
        self.finish_horizontal(terrain, target_x, dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictac_core::audio::SfxQueue;
    use tictac_core::input::InputFrame;
    use tictac_core::test_helpers::{back_wall, empty_map, flat_map, grass_floor, tile};
    use tictac_core::tile::ids;

    fn spawned(map: &TileMap) -> Player {
        let mut player = Player::new(MotionTuning::default());
        player.respawn(map);
        player
    }

    fn run(
        player: &mut Player,
        map: &TileMap,
        input: InputFrame,
        ticks: usize,
        audio: &mut SfxQueue,
    ) {
        let carrots = CarrotInventory::default();
        for _ in 0..ticks {
            player.update(&input, audio, &carrots, map);
        }
    }

    #[test]
    fn respawn_places_feet_on_start_cell() {
        let map = flat_map(15, 5);
        let player = spawned(&map);
        assert_eq!(player.x(), 102.0);
        assert_eq!(player.y(), 283.0);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.plane(), Plane::Main);
        assert!(!player.did_tic_tac());
    }

    #[test]
    fn new_player_starts_airborne() {
        let player = Player::new(MotionTuning::default());
        assert_eq!(player.state(), PlayerState::Falling);
        assert!(player.did_tic_tac());
        assert_eq!(player.facing(), Facing::Right);
    }

    #[test]
    fn runs_right_on_flat_ground() {
        let map = flat_map(15, 5);
        let carrots = CarrotInventory::default();
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let right = InputFrame::new().with_direction(Direction::Right);
        for _ in 0..60 {
            player.update(&right, &mut audio, &carrots, &map);
            assert_ne!(player.state(), PlayerState::Falling);
        }
        assert_eq!(player.state(), PlayerState::Running);
        assert_eq!(player.x(), 147.0);
        assert_eq!(player.y(), 283.0);
        assert!(audio.events().contains(&SfxKey::Step));
    }

    #[test]
    fn releasing_direction_stops() {
        let map = flat_map(15, 5);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let left = InputFrame::new().with_direction(Direction::Left);
        run(&mut player, &map, left, 4, &mut audio);
        assert_eq!(player.x(), 99.0);
        assert_eq!(player.facing(), Facing::Left);
        run(&mut player, &map, InputFrame::new(), 1, &mut audio);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.x(), 99.0);
    }

    #[test]
    fn running_into_a_wall_goes_idle() {
        let mut map = flat_map(15, 5);
        map.set_tile(Layer::Main, tile(ids::MAIN_GROUND, 14, 8));
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let right = InputFrame::new().with_direction(Direction::Right);
        run(&mut player, &map, right, 100, &mut audio);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.x(), 151.5);
    }

    #[test]
    fn run_is_clamped_to_canvas() {
        let map = flat_map(15, 0);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let left = InputFrame::new().with_direction(Direction::Left);
        run(&mut player, &map, left, 10, &mut audio);
        assert_eq!(player.x(), 0.0);
    }

    #[test]
    fn jump_arc_lands_back_on_the_floor() {
        let map = flat_map(15, 5);
        let carrots = CarrotInventory::default();
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let mut states = vec![player.state()];

        let jump = InputFrame::new().with_trigger(Action::Jump);
        player.update(&jump, &mut audio, &carrots, &map);
        states.push(player.state());
        assert_eq!(audio.events().first(), Some(&SfxKey::Jump));
        assert!(player.vert_speed() > 0.0);

        let mut min_y = player.y();
        for _ in 0..300 {
            player.update(&InputFrame::new(), &mut audio, &carrots, &map);
            min_y = min_y.min(player.y());
            if states.last() != Some(&player.state()) {
                states.push(player.state());
            }
            if player.state() == PlayerState::Idle {
                break;
            }
        }

        assert_eq!(
            states,
            vec![
                PlayerState::Idle,
                PlayerState::JumpHold,
                PlayerState::JumpInertial,
                PlayerState::Falling,
                PlayerState::Idle,
            ]
        );
        assert!(min_y < 275.0, "short hop still rises, peaked at {min_y}");
        assert_eq!(player.y(), 283.0);
        assert_eq!(player.x(), 102.0);
        assert_eq!(audio.events().last(), Some(&SfxKey::Land));
    }

    #[test]
    fn holding_jump_goes_higher() {
        let map = flat_map(15, 5);
        let carrots = CarrotInventory::default();
        let peak = |hold: usize| {
            let mut audio = SfxQueue::default();
            let mut player = spawned(&map);
            let jump = InputFrame::new().with_trigger(Action::Jump);
            player.update(&jump, &mut audio, &carrots, &map);
            let held = InputFrame::new().with_held(Action::Jump);
            let mut min_y = player.y();
            for tick in 0..300 {
                let input = if tick < hold { held } else { InputFrame::new() };
                player.update(&input, &mut audio, &carrots, &map);
                min_y = min_y.min(player.y());
            }
            assert_eq!(player.state(), PlayerState::Idle);
            min_y
        };
        assert!(peak(30) < peak(1));
    }

    #[test]
    fn head_bump_starts_falling() {
        let mut map = flat_map(15, 5);
        map.set_tile(Layer::Main, tile(ids::MAIN_GROUND, 13, 5));
        let carrots = CarrotInventory::default();
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let jump = InputFrame::new().with_trigger(Action::Jump);
        player.update(&jump, &mut audio, &carrots, &map);
        let held = InputFrame::new().with_held(Action::Jump);
        for _ in 0..10 {
            player.update(&held, &mut audio, &carrots, &map);
            if player.state() == PlayerState::Falling {
                break;
            }
        }
        assert_eq!(player.state(), PlayerState::Falling);
        assert!(player.y() >= 280.0);
        assert!(player.vert_speed() <= 0.0);
    }

    #[test]
    fn walking_off_a_ledge_falls() {
        let mut map = empty_map(15, 5);
        grass_floor(&mut map, 15, 0..6);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let right = InputFrame::new().with_direction(Direction::Right);
        let carrots = CarrotInventory::default();
        let mut fell = false;
        for _ in 0..60 {
            player.update(&right, &mut audio, &carrots, &map);
            if player.state() == PlayerState::Falling {
                fell = true;
                break;
            }
        }
        assert!(fell);
        assert!(player.x() > 115.0);
    }

    #[test]
    fn front_foot_over_edge_slips_forward() {
        let mut map = empty_map(15, 5);
        grass_floor(&mut map, 15, 0..6);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        player.x = 118.0;
        run(&mut player, &map, InputFrame::new(), 1, &mut audio);
        assert_eq!(player.state(), PlayerState::Idle);
        assert!((player.x() - 118.3).abs() < 1e-9);
    }

    #[test]
    fn back_foot_over_edge_slips_backward() {
        let mut map = empty_map(15, 5);
        grass_floor(&mut map, 15, 5..10);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        player.x = 95.0;
        run(&mut player, &map, InputFrame::new(), 1, &mut audio);
        assert!((player.x() - 94.7).abs() < 1e-9);
    }

    #[test]
    fn no_slip_with_both_feet_down() {
        let map = flat_map(15, 5);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        run(&mut player, &map, InputFrame::new(), 30, &mut audio);
        assert_eq!(player.x(), 102.0);
        assert_eq!(player.state(), PlayerState::Idle);
    }

    fn wall_map() -> TileMap {
        let mut map = flat_map(15, 5);
        back_wall(&mut map, 5, 6..16);
        map
    }

    #[test]
    fn tic_tac_off_the_back_wall() {
        let map = wall_map();
        let carrots = CarrotInventory::default();
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let jump = InputFrame::new().with_trigger(Action::Jump);
        player.update(&jump, &mut audio, &carrots, &map);
        assert_eq!(player.state(), PlayerState::JumpHold);
        assert!(player.can_tic_tac(&map, &carrots));

        player.update(&jump, &mut audio, &carrots, &map);
        assert_eq!(player.state(), PlayerState::TicTacHold);
        assert_eq!(player.plane(), Plane::Back);
        assert!(player.did_tic_tac());
        assert!(player.is_behind_main());
        assert!(audio.events().contains(&SfxKey::TicTac));
        assert!(!player.can_tic_tac(&map, &carrots), "one tic-tac per jump");

        for _ in 0..300 {
            player.update(&InputFrame::new(), &mut audio, &carrots, &map);
            if !player.state().is_airborne() {
                break;
            }
        }
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.plane(), Plane::Main);
        assert_eq!(player.y(), 283.0);
    }

    #[test]
    fn tic_tac_needs_a_wall() {
        let map = flat_map(15, 5);
        let carrots = CarrotInventory::default();
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let jump = InputFrame::new().with_trigger(Action::Jump);
        player.update(&jump, &mut audio, &carrots, &map);
        player.update(&jump, &mut audio, &carrots, &map);
        assert_eq!(player.state(), PlayerState::JumpHold);
        assert!(!audio.events().contains(&SfxKey::TicTac));
    }

    #[test]
    fn fast_fall_blocks_tic_tac() {
        let map = wall_map();
        let carrots = CarrotInventory::default();
        let mut player = spawned(&map);
        player.state = PlayerState::Falling;
        player.did_tic_tac = false;

        player.vert_speed = -1.0;
        assert!(player.can_tic_tac(&map, &carrots));
        player.vert_speed = -2.5;
        assert!(!player.can_tic_tac(&map, &carrots));
    }

    #[test]
    fn tic_tac_speed_loses_an_eighth_of_current_speed() {
        let map = wall_map();
        let mut player = spawned(&map);
        player.state = PlayerState::Falling;
        player.vert_speed = -1.6;
        player.change_state(PlayerState::TicTacHold, &mut Muted);
        assert!((player.vert_speed() - (2.4 * 0.76 - 0.2)).abs() < 1e-12);
    }

    #[test]
    fn front_plane_tic_tac_stays_in_front() {
        let mut map = flat_map(15, 5);
        map.set_tile(Layer::Main, tile(ids::MAIN_GROUND, 15, 5));
        map.set_tile(Layer::Front, tile(ids::FRONT_GRASS_SIDE, 15, 5));
        let carrots = CarrotInventory::default();
        let mut player = spawned(&map);
        assert_eq!(player.plane(), Plane::Front);
        player.state = PlayerState::JumpHold;
        let terrain = Terrain {
            map: &map,
            carrots: &carrots,
        };
        assert_eq!(player.tic_tac_target(&terrain), Some(Plane::Front));
    }

    #[test]
    fn respawn_on_front_tile_uses_front_plane() {
        let mut map = flat_map(15, 5);
        map.set_tile(Layer::Front, tile(ids::FRONT_GRASS_SIDE, 15, 5));
        let player = spawned(&map);
        assert_eq!(player.plane(), Plane::Front);
    }

    #[test]
    fn falls_through_empty_map_and_is_lost() {
        let map = empty_map(2, 5);
        let mut audio = SfxQueue::default();
        let mut player = spawned(&map);
        let carrots = CarrotInventory::default();
        let mut ticks = 0;
        while !player.has_fallen() {
            player.update(&InputFrame::new(), &mut audio, &carrots, &map);
            ticks += 1;
            assert!(ticks < 1000);
            assert!(player.vert_speed() >= -player.tuning().max_fall_speed());
        }
        assert_eq!(player.state(), PlayerState::Falling);
    }

    #[test]
    fn special_rect_depends_on_facing() {
        let map = flat_map(15, 5);
        let mut player = spawned(&map);
        assert_eq!(player.special_rect(), Rect::new(103, 286, 108, 305));
        player.facing = Facing::Left;
        assert_eq!(player.special_rect(), Rect::new(105, 286, 110, 305));
    }

    #[test]
    fn collision_box_sits_on_the_floor() {
        let map = flat_map(15, 5);
        let mut player = spawned(&map);
        assert_eq!(player.collision_rect(), Rect::new(102, 283, 111, 311));
        let (body, special) = (player.collision_rect(), player.special_rect());
        assert!(body.min_x <= special.min_x && special.max_x <= body.max_x);
        assert!(body.min_y <= special.min_y && special.max_y <= body.max_y);
        player.x = 42.75;
        assert_eq!(player.collision_rect().min_x, 42);
    }

    #[test]
    fn oversized_slip_speed_is_replaced() {
        let mut map = empty_map(15, 5);
        grass_floor(&mut map, 15, 0..6);
        let tuning = MotionTuning {
            slip_speed: 1.5,
            ..MotionTuning::default()
        };
        let mut player = Player::new(tuning);
        player.respawn(&map);
        player.x = 118.0;
        let mut audio = SfxQueue::default();
        run(&mut player, &map, InputFrame::new(), 1, &mut audio);
        assert!((player.x() - 118.3).abs() < 1e-9);

        player.set_tuning(MotionTuning {
            run_speed: f64::NAN,
            ..MotionTuning::default()
        });
        assert_eq!(player.tuning(), &MotionTuning::default());
    }

    #[test]
    fn validate_rejects_out_of_range_state() {
        let map = flat_map(15, 5);
        let player = spawned(&map);
        assert_eq!(player.validate(), Ok(()));

        let mut bad = player.clone();
        bad.x = f64::NAN;
        assert!(bad.validate().is_err());

        let mut bad = player.clone();
        bad.y = f64::INFINITY;
        assert!(bad.validate().is_err());

        let mut bad = player.clone();
        bad.x = 700.0;
        assert!(bad.validate().is_err());

        let mut bad = player.clone();
        bad.vert_speed = 50.0;
        assert!(bad.validate().is_err());

        let mut bad = player.clone();
        bad.jumping_ticks = i32::MAX;
        assert!(bad.validate().is_err());

        let mut bad = player;
        bad.hold_stop_tick = -1;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn state_names() {
        assert_eq!(PlayerState::TicTacInertial.to_string(), "TicTacInertial");
        assert!(PlayerState::Falling.is_airborne());
        assert!(!PlayerState::Running.is_airborne());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn frame() -> impl Strategy<Value = InputFrame> {
            (0u8..3, any::<bool>(), any::<bool>()).prop_map(|(d, trig, held)| {
                let direction = match d {
                    0 => Direction::None,
                    1 => Direction::Left,
                    _ => Direction::Right,
                };
                let mut f = InputFrame::new().with_direction(direction);
                if trig {
                    f = f.with_trigger(Action::Jump);
                } else if held {
                    f = f.with_held(Action::Jump);
                }
                f
            })
        }

        proptest! {
            #[test]
            fn same_inputs_same_result(inputs in prop::collection::vec(frame(), 0..240)) {
                let map = wall_map();
                let carrots = CarrotInventory::default();
                let play = || {
                    let mut audio = SfxQueue::default();
                    let mut player = spawned(&map);
                    for input in &inputs {
                        player.update(input, &mut audio, &carrots, &map);
                    }
                    (player, audio.events().to_vec())
                };
                let (a, sa) = play();
                let (b, sb) = play();
                prop_assert_eq!(a, b);
                prop_assert_eq!(sa, sb);
            }

            #[test]
            fn stays_inside_horizontal_bounds(inputs in prop::collection::vec(frame(), 0..240)) {
                let map = wall_map();
                let carrots = CarrotInventory::default();
                let mut audio = SfxQueue::default();
                let mut player = spawned(&map);
                for input in &inputs {
                    player.update(input, &mut audio, &carrots, &map);
                    prop_assert!(player.x() >= 0.0 && player.x() <= MAX_X);
                    prop_assert_eq!(player.validate(), Ok(()));
                }
            }
        }
    }
}
