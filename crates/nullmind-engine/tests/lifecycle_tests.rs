//! Integration tests running a small game through the full frame
//! lifecycle: level generation at Start, keyboard-driven movement against
//! the wall colliders, scene changes from events, and deterministic replay
//! of recorded frames.

use nullmind_engine::map::tile_index_to_pixel;
use nullmind_engine::prelude::*;

// ---------------------------------------------------------------------------
// Test systems
// ---------------------------------------------------------------------------

const PLAYER: OwnerId = OwnerId(7);

fn spawn_level(ctx: &mut GameContext) -> SystemResult {
    let map = EnvironmentMap::generate(&ctx.config.map, &mut ctx.rng, &mut ctx.colliders)?;
    let start = map.start();
    ctx.map = Some(map);

    // Tile (15, 15) is one tile inside the top-left corner of the 12x12
    // start room, away from every hallway.
    let origin = tile_index_to_pixel(GridPos::new(15, 15), start).expect("tile in start room");
    let hitbox = Rect::new(origin.x as i32 + 2, origin.y as i32 + 2, 16, 16);
    let player = Collider::new(hitbox, CollisionLayer::PLAYER, CollisionLayer::ENVIRONMENT);
    ctx.colliders.register(player, Some(PLAYER))?;
    Ok(())
}

fn player(ctx: &GameContext) -> ColliderHandle {
    ctx.colliders
        .iter()
        .find(|(_, c)| c.owner == Some(PLAYER))
        .map(|(handle, _)| handle)
        .expect("player collider registered")
}

fn walk(ctx: &mut GameContext, step: i32) -> SystemResult {
    let handle = player(ctx);
    let mut dx = 0;
    let mut dy = 0;
    if ctx.input.key(Key::A).held {
        dx -= step;
    }
    if ctx.input.key(Key::D).held {
        dx += step;
    }
    if ctx.input.key(Key::W).held {
        dy -= step;
    }
    if ctx.input.key(Key::S).held {
        dy += step;
    }

    let collider = ctx.colliders.get(handle).expect("live player").clone();
    let target = collider.hitbox.translated(dx, dy);
    let mut hits = CheckResult::new();
    if !ctx
        .colliders
        .query_rect(&target, collider.collides_with, Some(handle), &mut hits)
    {
        ctx.colliders.set_hitbox(handle, target)?;
    }
    Ok(())
}

fn walk_slow(ctx: &mut GameContext) -> SystemResult {
    walk(ctx, 2)
}

fn walk_fast(ctx: &mut GameContext) -> SystemResult {
    walk(ctx, 3)
}

fn enter_game(ctx: &mut GameContext, event: &AppEvent) -> SystemResult {
    if let AppEvent::Input(InputEvent::KeyDown(Key::RETURN)) = event {
        ctx.scene = Scene::Game;
    }
    Ok(())
}

fn game(walker: SystemFn) -> App {
    let config = EngineConfig {
        seed: 1234,
        ..Default::default()
    };
    let mut app = App::new(config).unwrap();
    app.add_system(Stage::Start, "spawn_level", spawn_level);
    app.add_event_system("enter_game", enter_game);
    app.add_system(Stage::PostUpdate, "walk", walker);
    app.start().unwrap();
    app
}

fn key_down(key: Key) -> AppEvent {
    AppEvent::Input(InputEvent::KeyDown(key))
}

fn key_up(key: Key) -> AppEvent {
    AppEvent::Input(InputEvent::KeyUp(key))
}

/// Hold D from frame 10 to frame 30, then hold S until frame 50.
fn scripted_input(frame: u64) -> FrameInput {
    let events = match frame {
        10 => vec![key_down(Key::D)],
        30 => vec![key_up(Key::D), key_down(Key::S)],
        50 => vec![key_up(Key::S)],
        _ => Vec::new(),
    };
    FrameInput::new(1.0 / 60.0, events)
}

fn record(app: &mut App, frames: u64, interval: u64) -> ReplayLog {
    let mut recorder = ReplayRecorder::new(app.capture_snapshot(), interval);
    for _ in 0..frames {
        let frame = app.frame_count();
        let input = scripted_input(frame);
        recorder.record_frame(frame, &input, Some(app.state_hash()));
        app.frame(input.raw_dt, &input.events).unwrap();
    }
    recorder.finish()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn start_builds_level_with_player() {
    let app = game(walk_slow);
    let ctx = app.context();
    let map = ctx.map.as_ref().expect("map generated at Start");

    assert_eq!(ctx.colliders.len(), map.collider_count() + 1);
    assert_eq!(ctx.scene, Scene::Menu);
    assert!(ctx.running);
    let hitbox = ctx.colliders.get(player(ctx)).unwrap().hitbox;
    assert_eq!(map.chunk_at_pixel(hitbox.center()).unwrap().room_type, RoomType::Start);
}

#[test]
fn return_key_enters_game_scene() {
    let mut app = game(walk_slow);
    app.frame(1.0 / 60.0, &[key_down(Key::SPACE)]).unwrap();
    assert_eq!(app.context().scene, Scene::Menu);
    app.frame(1.0 / 60.0, &[key_down(Key::RETURN)]).unwrap();
    assert_eq!(app.context().scene, Scene::Game);
}

#[test]
fn held_key_walks_player_until_wall() {
    let mut app = game(walk_slow);
    let start = app.context().map.as_ref().unwrap().start();
    let room_left = (start.x * CHUNK_SIZE_PIXEL as i32) + 14 * TILE_SIZE_PIXELS as i32;

    app.frame(1.0 / 60.0, &[key_down(Key::A)]).unwrap();
    app.run_frames(40).unwrap();

    // The wall column left of the room ends exactly where the room starts.
    let hitbox = app.context().colliders.get(player(app.context())).unwrap().hitbox;
    assert_eq!(hitbox.x, room_left);

    let mut hits = CheckResult::new();
    assert!(app.context().colliders.query_rect(
        &hitbox.translated(-2, 0),
        CollisionLayer::ENVIRONMENT,
        None,
        &mut hits
    ));
}

#[test]
fn released_key_stops_player() {
    let mut app = game(walk_slow);
    app.frame(1.0 / 60.0, &[key_down(Key::D)]).unwrap();
    app.run_frames(3).unwrap();
    app.frame(1.0 / 60.0, &[key_up(Key::D)]).unwrap();
    let stopped = app.context().colliders.get(player(app.context())).unwrap().hitbox;
    app.run_frames(10).unwrap();
    assert_eq!(
        app.context().colliders.get(player(app.context())).unwrap().hitbox,
        stopped
    );
}

// ---------------------------------------------------------------------------
// Snapshot and replay
// ---------------------------------------------------------------------------

#[test]
fn recorded_run_replays_identically() {
    let mut app = game(walk_slow);
    let log = record(&mut app, 60, 5);
    let final_hash = app.state_hash();

    let result = replay(&mut app, &log).unwrap();
    assert!(result.completed, "divergence: {:?}", result.first_divergence);
    assert_eq!(result.frames_replayed, 60);
    assert_eq!(app.state_hash(), final_hash);
}

#[test]
fn replay_on_fresh_app_matches() {
    let mut recorded = game(walk_slow);
    let log = record(&mut recorded, 60, 10);

    let json = serde_json::to_string(&log).unwrap();
    let log: ReplayLog = serde_json::from_str(&json).unwrap();

    let mut fresh = App::new(EngineConfig::default()).unwrap();
    fresh.add_event_system("enter_game", enter_game);
    fresh.add_system(Stage::PostUpdate, "walk", walk_slow);
    let result = replay(&mut fresh, &log).unwrap();
    assert!(result.completed);
    assert_eq!(fresh.state_hash(), recorded.state_hash());
}

#[test]
fn different_systems_diverge_at_first_checkpoint_after_movement() {
    let mut app = game(walk_slow);
    let log = record(&mut app, 60, 5);

    let mut other = game(walk_fast);
    let result = replay(&mut other, &log).unwrap();
    assert!(!result.completed);
    let divergence = result.first_divergence.unwrap();
    // Movement starts in frame 10, so the state before frame 15 differs.
    assert_eq!(divergence.frame, 15);
    assert_eq!(result.frames_replayed, 15);
}
