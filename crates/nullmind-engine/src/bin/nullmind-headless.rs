//! Headless run of a generated level.
//!
//! Builds a map, drops a player collider into the start room and lets it
//! wander for a fixed number of frames, bumping into walls. Prints the final
//! state hash and collision counts, so two runs with the same seed can be
//! compared.
//!
//! ```text
//! RUST_LOG=debug nullmind-headless --seed 7 --frames 600
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use nullmind_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(about = "Run a generated level without a window", version)]
struct Args {
    /// JSON engine configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Queue debug hitbox outlines every frame.
    #[arg(long)]
    hitboxes: bool,
}

const PLAYER: OwnerId = OwnerId(1);
const PLAYER_SIZE: i32 = 16;
/// Pixels per second.
const PLAYER_SPEED: f32 = 240.0;
/// Frames between changes of walking direction.
const WANDER_FRAMES: u64 = 45;

static MOVES: AtomicU64 = AtomicU64::new(0);
static BLOCKED: AtomicU64 = AtomicU64::new(0);
static CONTACTS: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn spawn_level(ctx: &mut GameContext) -> SystemResult {
    let map = EnvironmentMap::generate(&ctx.config.map, &mut ctx.rng, &mut ctx.colliders)?;
    let spawn = map.start_position();
    ctx.map = Some(map);
    ctx.scene = Scene::Game;

    let size = Vec2::new(PLAYER_SIZE as f32, PLAYER_SIZE as f32);
    let player = Collider::new(
        spawn.to_centered_rect(size),
        CollisionLayer::PLAYER,
        CollisionLayer::ENVIRONMENT | CollisionLayer::ENEMY | CollisionLayer::TRIGGER,
    );
    ctx.colliders.register(player, Some(PLAYER))?;
    ctx.camera.follow(spawn);
    Ok(())
}

fn player_handle(ctx: &GameContext) -> Option<ColliderHandle> {
    ctx.colliders
        .iter()
        .find(|(_, collider)| collider.owner == Some(PLAYER))
        .map(|(handle, _)| handle)
}

/// Walking direction for the current wander window. Derived from the seed
/// so it needs no state of its own.
fn wander_direction(ctx: &GameContext) -> Vec2 {
    let mut rng = GameRng::from_seed(ctx.config.seed ^ (ctx.frame / WANDER_FRAMES));
    let directions = [Vec2::UP, Vec2::DOWN, Vec2::LEFT, Vec2::RIGHT];
    rng.choose(&directions).copied().unwrap_or(Vec2::ZERO)
}

fn move_player(ctx: &mut GameContext) -> SystemResult {
    let Some(handle) = player_handle(ctx) else {
        return Ok(());
    };
    let Some(current) = ctx.colliders.get(handle).map(|c| c.hitbox) else {
        return Ok(());
    };

    let step = wander_direction(ctx) * PLAYER_SPEED * ctx.time.delta_seconds();
    let target = current.translated(step.x.round() as i32, step.y.round() as i32);
    let mask = CollisionLayer::ENVIRONMENT | CollisionLayer::ENEMY | CollisionLayer::TRIGGER;

    let mut hits = CheckResult::new();
    if ctx.colliders.query_rect(&target, mask, Some(handle), &mut hits) {
        BLOCKED.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(frame = ctx.frame, hits = hits.count(), "player blocked");

        let mut sparks = ParticleEmitter::from_preset(&ParticleEmitter::gun_sparks());
        sparks.position = current.center();
        sparks.direction = -wander_direction(ctx);
        sparks.destroy_when_done = true;
        sparks.activate_once();
        ctx.particles.add(sparks);
        return Ok(());
    }

    ctx.colliders.set_hitbox(handle, target)?;
    MOVES.fetch_add(1, Ordering::Relaxed);
    if ctx.colliders.check(handle, &mut hits) {
        CONTACTS.fetch_add(hits.count() as u64, Ordering::Relaxed);
    }
    ctx.camera.follow(target.center());
    Ok(())
}

fn draw_map(ctx: &mut GameContext) -> SystemResult {
    if let Some(map) = &ctx.map {
        map.render(&mut ctx.draw_list, &ctx.camera);
    }
    Ok(())
}

fn draw_hitboxes(ctx: &mut GameContext) -> SystemResult {
    ctx.draw_list.debug_hitboxes(&ctx.colliders, &ctx.camera);
    Ok(())
}

fn report(ctx: &mut GameContext) -> SystemResult {
    if let Some(map) = &ctx.map {
        tracing::info!(
            rooms = map.room_count(),
            enemy_budget = map.enemy_budget(),
            "level summary"
        );
    }
    let player = player_handle(ctx).and_then(|h| Some((h, ctx.colliders.get(h)?.hitbox)));
    if let Some((handle, hitbox)) = player {
        let origin = hitbox.center();
        let ray = ctx.colliders.raycast(
            origin,
            Vec2::RIGHT,
            CollisionLayer::ENVIRONMENT,
            MAX_RAYCAST_STEPS,
            Some(handle),
        );
        tracing::info!(
            distance = ray.end.x - origin.x,
            wall = ray.hit.is_some(),
            "line of sight east of player"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.max_frames = Some(args.frames);

    let mut app = App::new(config)?;
    app.add_system(Stage::Start, "spawn_level", spawn_level);
    app.add_system(Stage::PostUpdate, "move_player", move_player);
    app.add_system(Stage::Render, "map", draw_map);
    if args.hitboxes {
        app.add_system(Stage::Render, "hitboxes", draw_hitboxes);
    }
    app.add_system(Stage::Quit, "report", report);

    let frames = app.run()?;
    let ctx = app.context();
    println!("frames:     {frames}");
    println!("seed:       {}", ctx.config.seed);
    println!("colliders:  {} live, {} slots used", ctx.colliders.len(), ctx.colliders.count());
    println!("moves:      {}", MOVES.load(Ordering::Relaxed));
    println!("blocked:    {}", BLOCKED.load(Ordering::Relaxed));
    println!("contacts:   {}", CONTACTS.load(Ordering::Relaxed));
    println!("particles:  {}", ctx.particles.particle_count());
    println!("draw calls: {}", ctx.draw_list.len());
    println!("state hash: {}", app.state_hash());
    Ok(())
}
