use tictac_core::audio::{SfxKey, SfxQueue};
use tictac_core::carrot::{Carrot, Variety};
use tictac_core::codec::encode_pack;
use tictac_core::input::{Action, Direction, InputFrame};
use tictac_core::map::TileMap;
use tictac_core::test_helpers::{empty_map, flat_map, grass_floor, tile};
use tictac_core::tile::{Layer, TransferSlot, ids};
use tictac_play::map_gen::generate_map;
use tictac_play::{PlayConfig, PlayEvent, PlayScene, PlayerState};

fn scene(maps: Vec<TileMap>) -> PlayScene {
    PlayScene::from_maps(maps, PlayConfig::default()).unwrap()
}

fn right() -> InputFrame {
    InputFrame::new().with_direction(Direction::Right)
}

/// Run `ticks` updates with the same input, collecting every event.
fn run(
    scene: &mut PlayScene,
    input: InputFrame,
    ticks: usize,
    audio: &mut SfxQueue,
) -> Vec<PlayEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(scene.update(&input, audio));
    }
    events
}

/// Grass up to x = 80, then orange carrot platforms over a pit. An orange
/// carrot sits on the way.
fn carrot_bridge_map() -> TileMap {
    let mut map = empty_map(15, 2);
    grass_floor(&mut map, 15, 0..4);
    for col in 4..10 {
        map.set_tile(Layer::Main, tile(ids::ORANGE_PLAT_SINGLE, 15, col));
    }
    map.set_tile(Layer::Special, tile(ids::CARROT_ORANGE, 14, 3));
    map
}

#[test]
fn carrot_is_picked_up_once() {
    let mut scene = scene(vec![carrot_bridge_map()]);
    let mut audio = SfxQueue::default();
    let events = run(&mut scene, right(), 40, &mut audio);

    assert_eq!(
        events,
        vec![PlayEvent::CarrotCollected(Carrot::new(Variety::Orange, 14, 3))]
    );
    assert!(audio.events().contains(&SfxKey::Click));
    assert!(!scene.carrots().is_map_carrot_on(3, 14));
    assert_eq!(scene.carrots().fill_levels()[0], 1.0);
}

#[test]
fn uneaten_carrot_leaves_platforms_off() {
    let mut scene = scene(vec![carrot_bridge_map()]);
    let mut audio = SfxQueue::default();
    let events = run(&mut scene, right(), 400, &mut audio);

    assert!(events.contains(&PlayEvent::Died), "fell through the bridge");
    assert!(audio.events().contains(&SfxKey::Back));
}

#[test]
fn eaten_carrot_turns_platforms_solid() {
    let mut scene = scene(vec![carrot_bridge_map()]);
    let mut audio = SfxQueue::default();
    run(&mut scene, right(), 40, &mut audio);
    let eat = right().with_trigger(Action::UseCarrot);
    scene.update(&eat, &mut audio);
    assert!(audio.events().contains(&SfxKey::Cronch));
    assert!(scene.carrots().fill_opacity(Variety::Orange) > 0.0);

    let events = run(&mut scene, right(), 200, &mut audio);
    assert!(events.is_empty());
    // blocked by the platform edge at x = 81
    assert_eq!(scene.player().state(), PlayerState::Idle);
    assert!(scene.player().x() < 73.0);
}

#[test]
fn death_clears_inventory_and_respawns() {
    let mut map = carrot_bridge_map();
    for col in 4..10 {
        map.delete_tile(Layer::Main, 15, col);
    }
    let mut scene = scene(vec![map]);
    let mut audio = SfxQueue::default();

    let mut died = false;
    for _ in 0..400 {
        if scene.update(&right(), &mut audio).contains(&PlayEvent::Died) {
            died = true;
            break;
        }
    }
    assert!(died);
    assert!(scene.carrots().slots().iter().all(Option::is_none));
    assert!(scene.carrots().is_map_carrot_on(3, 14));
    assert_eq!(scene.player().state(), PlayerState::Idle);
    assert_eq!((scene.player().x(), scene.player().y()), (42.0, 283.0));
}

#[test]
fn goal_finishes_the_race() {
    let mut map = flat_map(15, 2);
    map.set_tile(Layer::Special, tile(ids::RACE_GOAL, 14, 8));
    let mut scene = scene(vec![map]);
    let mut audio = SfxQueue::default();
    let events = run(&mut scene, right(), 300, &mut audio);

    let goals: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, PlayEvent::GoalReached { .. }))
        .collect();
    assert_eq!(goals.len(), 1);
    assert_eq!(*goals[0], PlayEvent::GoalReached { ticks: scene.ticks() });
    assert!(scene.is_finished());
}

#[test]
fn lettered_transfer_switches_map() {
    let mut first = flat_map(15, 2);
    first.set_tile(Layer::Special, tile(ids::TRANSFER_RIGHT_A, 14, 5));
    first.set_transfer_id(TransferSlot::A, 2);

    let mut second = TileMap::new(2);
    second.set_spawn(15, 10);
    grass_floor(&mut second, 15, 0..32);

    let mut scene = scene(vec![first, second]);
    let mut audio = SfxQueue::default();
    let events = run(&mut scene, right(), 60, &mut audio);

    assert_eq!(
        events.first(),
        Some(&PlayEvent::Transferred { from: 0, to: 1 })
    );
    assert_eq!(scene.map_index(), 1);
    assert_eq!(scene.current_map().id(), 2);
    assert!(scene.player().x() >= 202.0);
}

#[test]
fn plain_arrow_is_ignored() {
    let mut map = flat_map(15, 2);
    map.set_tile(Layer::Special, tile(ids::TRANSFER_RIGHT, 14, 5));
    let mut scene = scene(vec![map]);
    let mut audio = SfxQueue::default();
    assert!(run(&mut scene, right(), 60, &mut audio).is_empty());
    assert_eq!(scene.map_index(), 0);
}

#[test]
fn pack_text_loads_every_map() {
    let maps = vec![generate_map(5, 1), generate_map(6, 2)];
    let text = encode_pack(&maps).unwrap();
    let scene = PlayScene::from_pack(&format!("\n{text}\n"), PlayConfig::default()).unwrap();
    assert_eq!(scene.maps(), maps.as_slice());
    assert_eq!(scene.map_index(), 0);
    assert_eq!(scene.player().state(), PlayerState::Idle);
}

#[test]
fn replay_script_from_json() {
    let script = r#"[
        {"direction": "Right", "triggered": 0, "held": 0},
        {"direction": "Right", "triggered": 1, "held": 1},
        {"direction": "Right", "triggered": 0, "held": 1},
        {"direction": "None", "triggered": 0, "held": 0}
    ]"#;
    let frames: Vec<InputFrame> = serde_json::from_str(script).unwrap();
    let mut scene = scene(vec![flat_map(15, 2)]);
    let mut audio = SfxQueue::default();
    for frame in &frames {
        scene.update(frame, &mut audio);
    }
    assert!(scene.player().state().is_airborne());
    assert!(audio.events().contains(&SfxKey::Jump));
    assert_eq!(scene.ticks(), 4);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn frame() -> impl Strategy<Value = InputFrame> {
        (0u8..3, 0u8..16, 0u8..16).prop_map(|(d, triggered, held)| InputFrame {
            direction: match d {
                0 => Direction::None,
                1 => Direction::Left,
                _ => Direction::Right,
            },
            triggered,
            held: held | triggered,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn same_seed_and_inputs_replay_identically(
            seed in any::<u64>(),
            inputs in prop::collection::vec(frame(), 0..600),
        ) {
            let play = || {
                let mut scene = scene(vec![generate_map(seed, 1)]);
                let mut audio = SfxQueue::default();
                let mut events = Vec::new();
                for input in &inputs {
                    events.extend(scene.update(input, &mut audio));
                }
                (scene.serialize_state().unwrap(), events, audio.events().to_vec())
            };
            prop_assert_eq!(play(), play());
        }

        #[test]
        fn player_never_leaves_the_canvas_sideways(
            seed in any::<u64>(),
            inputs in prop::collection::vec(frame(), 0..600),
        ) {
            let mut scene = scene(vec![generate_map(seed, 1)]);
            let mut audio = SfxQueue::default();
            for input in &inputs {
                scene.update(input, &mut audio);
                let x = scene.player().x();
                prop_assert!((0.0..=631.0).contains(&x));
                prop_assert!(!scene.player().has_fallen());
            }
        }
    }
}
