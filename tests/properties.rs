//! Property and soak tests over the movement and sync invariants.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hideseek::{
    core::Rect,
    game::{
        collision::is_solid,
        input::{FLAG_DOWN, FLAG_INTERACT, FLAG_LEFT, FLAG_RIGHT, FLAG_UP},
        interact::is_near,
        resolve_move, tick, ActorKind, EntityRegistry, InteractableRegistry, Movable, TickConfig,
    },
    network::{apply_snapshot, HunterSnapshot, Snapshot},
    Actor, ActorId, GameState, InputFrame, TileCoord, TileMap, Vec2,
};
use hideseek::game::actor::Collidable;

/// 12x12 room with a walled border, pillars, two doors and two spots.
fn arena() -> TileMap {
    let mut rows = vec![vec![0i64; 12]; 12];
    for i in 0..12 {
        rows[0][i] = 1;
        rows[11][i] = 1;
        rows[i][0] = 1;
        rows[i][11] = 1;
    }
    rows[4][4] = 1;
    rows[4][7] = 1;
    rows[7][4] = 1;
    rows[6][6] = 2;
    rows[3][9] = 2;
    rows[2][2] = 3;
    rows[8][8] = 3;
    TileMap::from_codes(rows)
}

fn touches_solid(map: &TileMap, inter: &InteractableRegistry, rect: &Rect) -> bool {
    TileMap::tiles_overlapping(rect).any(|c| is_solid(map, inter, c))
}

proptest! {
    #[test]
    fn prop_moves_never_enter_solid_tiles(
        start_x in 61.0f64..600.0,
        start_y in 61.0f64..600.0,
        steps in prop::collection::vec((0u8..16, 0.001f64..0.1), 1..60),
    ) {
        let map = arena();
        let inter = InteractableRegistry::from_map(&map);
        let others = EntityRegistry::new();
        let mut actor = Actor::player("a", Vec2::new(start_x, start_y));
        prop_assume!(!touches_solid(&map, &inter, &actor.bounds()));

        for (keys, dt) in steps {
            let input = InputFrame::new(keys & (FLAG_UP | FLAG_DOWN | FLAG_LEFT | FLAG_RIGHT));
            let out = resolve_move(&actor, input.direction(), dt, &map, &inter, &others);
            actor.set_position(out.position);
            prop_assert!(!touches_solid(&map, &inter, &actor.bounds()), "entered solid at {:?}", actor.position);
        }
    }

    #[test]
    fn prop_diagonal_matches_axial_speed(dt in 0.001f64..0.1, kind in prop::bool::ANY) {
        let map = TileMap::from_codes(Vec::new());
        let inter = InteractableRegistry::from_map(&map);
        let others = EntityRegistry::new();
        let start = Vec2::new(500.0, 500.0);
        let actor = if kind { Actor::player("a", start) } else { Actor::hunter("a", start) };

        let axial = resolve_move(&actor, Vec2::new(0.0, -1.0), dt, &map, &inter, &others);
        for (dx, dy) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            let diag = resolve_move(&actor, Vec2::new(dx, dy), dt, &map, &inter, &others);
            let a = (axial.position - start).length();
            let d = (diag.position - start).length();
            prop_assert!((a - d).abs() < 1e-9);
            prop_assert!((a - actor.speed() * dt).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_door_adjacency_is_manhattan_one(
        ax in -20i32..20, ay in -20i32..20, dx in -3i32..3, dy in -3i32..3,
    ) {
        let actor = TileCoord::new(ax, ay);
        let door = TileCoord::new(ax + dx, ay + dy);
        prop_assert_eq!(is_near(actor, door), dx.abs() + dy.abs() == 1);
    }
}

#[test]
fn test_random_walk_soak_keeps_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut state = GameState::new(arena());
    let me = ActorId::from("me");
    state.spawn_local(&me, Vec2::new(75.0, 75.0));
    state.ensure_actor(&"rival".into(), ActorKind::Player, Vec2::new(500.0, 500.0));
    let config = TickConfig::default();
    let dirs = [FLAG_UP, FLAG_DOWN, FLAG_LEFT, FLAG_RIGHT];

    let mut held = 0u8;
    for step in 0..5_000 {
        if step % 20 == 0 {
            held = dirs[rng.gen_range(0..4)] | if rng.gen_bool(0.3) { dirs[rng.gen_range(0..4)] } else { 0 };
        }
        let mut flags = held;
        if rng.gen_bool(0.02) {
            flags |= FLAG_INTERACT;
        }
        let result = tick(&mut state, InputFrame::new(flags), 1.0 / 60.0, &config);

        // Doors only move on the server's word.
        for request in &result.requests {
            if let hideseek::game::ActionRequest::ToggleDoor(door) = request {
                assert!(state.interactables.is_door_closed(*door));
            }
        }

        let local = state.actors.local().unwrap();
        if !local.is_hidden {
            assert!(
                !touches_solid(&state.map, &state.interactables, &local.bounds()),
                "step {step}: local inside solid at {:?}",
                local.position
            );
        }

        // Every occupied spot holds exactly its hidden occupant.
        for spot in state.interactables.hiding_spots() {
            if let Some(id) = spot.occupant() {
                assert!(state.actors.get(id.as_str()).unwrap().is_hidden);
                assert_eq!(state.interactables.spot_of(id), Some(spot.coord));
            }
        }
    }
}

#[test]
fn test_observers_converge_on_same_snapshot_stream() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut a = GameState::new(arena());
    let mut b = GameState::new(arena());
    let ids = ["p1", "p2", "p3", "p4"];
    let doors = [TileCoord::new(6, 6), TileCoord::new(9, 3)];

    for _ in 0..300 {
        let mut snap = Snapshot::default();
        for id in ids {
            if rng.gen_bool(0.7) {
                let p = Vec2::new(rng.gen_range(0.0..700.0), rng.gen_range(0.0..700.0));
                snap.positions.push((ActorId::from(id), p));
            }
        }
        for door in doors {
            if rng.gen_bool(0.5) {
                snap.doors.push((door, rng.gen_bool(0.5)));
            }
        }
        if rng.gen_bool(0.3) {
            snap.hidden = Some(ids.iter().filter(|_| rng.gen_bool(0.3)).map(|id| ActorId::from(*id)).collect());
        }
        if rng.gen_bool(0.3) {
            let carrying = rng.gen_bool(0.5).then(|| ActorId::from(ids[rng.gen_range(0..ids.len())]));
            let position = Vec2::new(rng.gen_range(0.0..700.0), rng.gen_range(0.0..700.0));
            snap.hunters = Some(vec![(ActorId::from("h"), HunterSnapshot { position, carrying })]);
        }

        // B sees every message twice; duplicates must not matter.
        apply_snapshot(&mut a, &snap);
        apply_snapshot(&mut b, &snap);
        apply_snapshot(&mut b, &snap);
        assert_eq!(a.compute_hash(), b.compute_hash());

        // At most one carried player, and it sits on the hunter.
        if let Some(h) = a.actors.get("h") {
            let carried: Vec<_> = a.actors.iter().filter(|x| x.is_carried).collect();
            assert!(carried.len() <= 1);
            for c in carried {
                assert_eq!(c.carried_by.as_ref(), Some(&h.id));
                assert_eq!(c.position, h.position);
            }
        }
    }
}
