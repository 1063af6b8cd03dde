//! Frame lifecycle.
//!
//! The [`App`] owns the [`GameContext`] and runs named systems in fixed
//! stages:
//!
//! 1. `Start`, once, from [`App::start`].
//! 2. Per frame, from [`App::frame`]:
//!    - `PreUpdate`: input edges are cleared and time advances, then the
//!      PreUpdate systems run.
//!    - `EventHandler`: for each pending event, quit requests and input are
//!      handled, then every event system sees the event.
//!    - `PostUpdate`: PostUpdate systems, then every particle emitter.
//!    - `Render`: the draw list is cleared, render systems fill it, then live
//!      particles are appended.
//! 3. `Quit`, once, from [`App::quit`].
//!
//! Within a stage, systems run in registration order. A system that returns
//! an error aborts the rest of the frame with [`EngineError::Stage`].
//!
//! # Example
//!
//! ```
//! use nullmind_engine::prelude::*;
//!
//! let mut app = App::new(EngineConfig::default()).unwrap();
//! app.add_event_system("escape", |ctx, event| {
//!     if let AppEvent::Input(InputEvent::KeyDown(Key::ESCAPE)) = event {
//!         ctx.running = false;
//!     }
//!     Ok(())
//! });
//! app.start().unwrap();
//!
//! let escape = [AppEvent::Input(InputEvent::KeyDown(Key::ESCAPE))];
//! app.frame(1.0 / 60.0, &escape).unwrap();
//! assert!(!app.context().running);
//! assert!(app.context().input.key(Key::ESCAPE).pressed);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use nullmind_core::camera::Camera;
use nullmind_core::collision::ColliderRegistry;
use nullmind_core::input::{InputEvent, InputState};
use nullmind_core::random::GameRng;
use nullmind_core::time::TimeSystem;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::draw::DrawList;
use crate::map::EnvironmentMap;
use crate::particles::EmitterPool;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Lifecycle stage a system is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Start,
    PreUpdate,
    EventHandler,
    PostUpdate,
    Render,
    Quit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "Start",
            Stage::PreUpdate => "PreUpdate",
            Stage::EventHandler => "EventHandler",
            Stage::PostUpdate => "PostUpdate",
            Stage::Render => "Render",
            Stage::Quit => "Quit",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Events and scenes
// ---------------------------------------------------------------------------

/// An event delivered during the EventHandler stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Stop the app after the current frame.
    Quit,
    Input(InputEvent),
}

impl From<InputEvent> for AppEvent {
    fn from(event: InputEvent) -> Self {
        AppEvent::Input(event)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scene {
    #[default]
    Menu,
    Game,
}

// ---------------------------------------------------------------------------
// GameContext
// ---------------------------------------------------------------------------

/// All game state. Systems receive it mutably; nothing lives in globals.
#[derive(Debug, Clone)]
pub struct GameContext {
    /// Configuration the app was built with.
    pub config: EngineConfig,
    pub time: TimeSystem,
    pub input: InputState,
    pub colliders: ColliderRegistry,
    pub camera: Camera,
    pub rng: GameRng,
    pub particles: EmitterPool,
    /// The current level, once a system has generated one.
    pub map: Option<EnvironmentMap>,
    pub scene: Scene,
    /// Rebuilt every frame during Render.
    pub draw_list: DrawList,
    /// Cleared to stop [`App::run`].
    pub running: bool,
    /// Frames completed so far.
    pub frame: u64,
}

impl GameContext {
    fn new(config: EngineConfig) -> Self {
        Self {
            time: TimeSystem::with_max_delta(config.max_delta_seconds),
            input: InputState::new(),
            colliders: ColliderRegistry::with_capacity(config.collider_capacity),
            camera: Camera::new(config.screen_width, config.screen_height),
            rng: GameRng::from_seed(config.seed),
            particles: EmitterPool::new(),
            map: None,
            scene: Scene::default(),
            draw_list: DrawList::new(),
            running: false,
            frame: 0,
            config,
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub type SystemResult = Result<(), EngineError>;

/// A system run once per stage invocation.
pub type SystemFn = fn(&mut GameContext) -> SystemResult;

/// A system run once per event during the EventHandler stage.
pub type EventSystemFn = fn(&mut GameContext, &AppEvent) -> SystemResult;

#[derive(Debug)]
struct RegisteredSystem<F> {
    name: String,
    func: F,
}

fn register<F>(systems: &mut Vec<RegisteredSystem<F>>, stage: Stage, name: &str, func: F) {
    assert!(
        !systems.iter().any(|s| s.name == name),
        "duplicate system name in {stage}: {name:?}"
    );
    systems.push(RegisteredSystem {
        name: name.to_owned(),
        func,
    });
}

fn stage_error(stage: Stage, system: &str, err: EngineError) -> EngineError {
    tracing::error!(%stage, system, error = %err, "system failed");
    EngineError::Stage {
        stage,
        system: system.to_owned(),
        message: err.to_string(),
    }
}

fn run_systems(
    stage: Stage,
    systems: &[RegisteredSystem<SystemFn>],
    ctx: &mut GameContext,
    times: &mut Vec<(Stage, String, Duration)>,
) -> Result<(), EngineError> {
    for system in systems {
        let sys_start = Instant::now();
        let result = (system.func)(ctx);
        times.push((stage, system.name.clone(), sys_start.elapsed()));
        result.map_err(|e| stage_error(stage, &system.name, e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing of the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Wall-clock time per system, in execution order. Built-in work shows
    /// up under the names `"particles"` and `"particles.render"`.
    pub system_times: Vec<(Stage, String, Duration)>,
    pub total_time: Duration,
    pub events_handled: usize,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    context: GameContext,
    systems: BTreeMap<Stage, Vec<RegisteredSystem<SystemFn>>>,
    event_systems: Vec<RegisteredSystem<EventSystemFn>>,
    started: bool,
    quit_done: bool,
    last_diagnostics: FrameDiagnostics,
}

impl App {
    /// Validate `config` and build a fresh context from it.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            context: GameContext::new(config),
            systems: BTreeMap::new(),
            event_systems: Vec::new(),
            started: false,
            quit_done: false,
            last_diagnostics: FrameDiagnostics::default(),
        })
    }

    /// Register a system for `stage`.
    ///
    /// # Panics
    ///
    /// - If `stage` is [`Stage::EventHandler`]; use
    ///   [`add_event_system`](Self::add_event_system).
    /// - If a system with the same name is already registered for `stage`.
    pub fn add_system(&mut self, stage: Stage, name: &str, func: SystemFn) {
        assert!(
            stage != Stage::EventHandler,
            "EventHandler systems take the event; register {name:?} with add_event_system"
        );
        register(self.systems.entry(stage).or_default(), stage, name, func);
    }

    /// Register a system that sees every event.
    ///
    /// # Panics
    ///
    /// Panics if an event system with the same name is already registered.
    pub fn add_event_system(&mut self, name: &str, func: EventSystemFn) {
        register(&mut self.event_systems, Stage::EventHandler, name, func);
    }

    /// Empty the collider registry, reseed the RNG and run the Start
    /// systems.
    ///
    /// # Errors
    ///
    /// [`EngineError::Stage`] when a Start system fails. The app is then
    /// left stopped and frames are refused until `start` succeeds.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let ctx = &mut self.context;
        ctx.colliders.start();
        ctx.rng = GameRng::from_seed(ctx.config.seed);
        ctx.running = true;
        self.started = false;
        self.quit_done = false;

        let mut times = Vec::new();
        let systems = self.systems.get(&Stage::Start).map_or(&[][..], Vec::as_slice);
        if let Err(err) = run_systems(Stage::Start, systems, &mut self.context, &mut times) {
            self.context.running = false;
            return Err(err);
        }
        self.started = true;

        tracing::info!(
            seed = self.context.config.seed,
            systems = self.system_count(),
            "app started"
        );
        Ok(())
    }

    /// Run one frame with `raw_dt` seconds of wall-clock time and the
    /// events gathered since the previous frame.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotStarted`] before [`start`](Self::start), or
    /// [`EngineError::Stage`] when a system fails. A failed frame is not
    /// counted.
    pub fn frame(
        &mut self,
        raw_dt: f32,
        events: &[AppEvent],
    ) -> Result<FrameDiagnostics, EngineError> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        let frame_start = Instant::now();
        let mut times = Vec::new();
        let ctx = &mut self.context;

        // PreUpdate
        ctx.input.pre_update();
        ctx.time.pre_update(raw_dt);
        let systems = self.systems.get(&Stage::PreUpdate).map_or(&[][..], Vec::as_slice);
        run_systems(Stage::PreUpdate, systems, ctx, &mut times)?;

        // EventHandler
        for event in events {
            match event {
                AppEvent::Quit => {
                    tracing::debug!(frame = ctx.frame, "quit requested");
                    ctx.running = false;
                }
                AppEvent::Input(input) => ctx.input.handle_event(input),
            }
            for system in &self.event_systems {
                let sys_start = Instant::now();
                let result = (system.func)(ctx, event);
                times.push((Stage::EventHandler, system.name.clone(), sys_start.elapsed()));
                result.map_err(|e| stage_error(Stage::EventHandler, &system.name, e))?;
            }
        }

        // PostUpdate
        let systems = self.systems.get(&Stage::PostUpdate).map_or(&[][..], Vec::as_slice);
        run_systems(Stage::PostUpdate, systems, ctx, &mut times)?;
        let particles_start = Instant::now();
        ctx.particles.update(&ctx.time, &mut ctx.rng);
        times.push((Stage::PostUpdate, "particles".to_owned(), particles_start.elapsed()));

        // Render
        ctx.draw_list.clear();
        let systems = self.systems.get(&Stage::Render).map_or(&[][..], Vec::as_slice);
        run_systems(Stage::Render, systems, ctx, &mut times)?;
        let render_start = Instant::now();
        ctx.particles.render(&mut ctx.draw_list, &ctx.camera);
        times.push((Stage::Render, "particles.render".to_owned(), render_start.elapsed()));

        ctx.frame += 1;
        self.last_diagnostics = FrameDiagnostics {
            system_times: times,
            total_time: frame_start.elapsed(),
            events_handled: events.len(),
        };
        Ok(self.last_diagnostics.clone())
    }

    /// Run `count` frames of `fixed_dt` seconds with no events.
    pub fn run_frames(&mut self, count: u64) -> Result<(), EngineError> {
        let dt = self.context.config.fixed_dt;
        for _ in 0..count {
            self.frame(dt, &[])?;
        }
        Ok(())
    }

    /// Run fixed-dt frames until a system clears `running` or `max_frames`
    /// is reached, then quit. Returns the number of frames run.
    ///
    /// Without `max_frames` this only returns once a system stops the app.
    pub fn run(&mut self) -> Result<u64, EngineError> {
        if !self.started {
            self.start()?;
        }
        let dt = self.context.config.fixed_dt;
        let limit = self.context.config.max_frames;
        let mut frames = 0u64;
        while self.context.running && limit.map_or(true, |max| frames < max) {
            self.frame(dt, &[])?;
            frames += 1;
        }
        self.quit()?;
        Ok(frames)
    }

    /// Run the Quit systems. Only the first call has any effect.
    pub fn quit(&mut self) -> Result<(), EngineError> {
        if self.quit_done {
            return Ok(());
        }
        self.quit_done = true;
        self.context.running = false;

        let mut times = Vec::new();
        let systems = self.systems.get(&Stage::Quit).map_or(&[][..], Vec::as_slice);
        run_systems(Stage::Quit, systems, &mut self.context, &mut times)?;
        tracing::info!(frames = self.context.frame, "app quit");
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.context.config
    }

    pub fn frame_count(&self) -> u64 {
        self.context.frame
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Names of the systems registered for `stage`, in execution order.
    pub fn system_names(&self, stage: Stage) -> Vec<&str> {
        if stage == Stage::EventHandler {
            return self.event_systems.iter().map(|s| s.name.as_str()).collect();
        }
        self.systems
            .get(&stage)
            .map(|systems| systems.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Number of registered systems across all stages.
    pub fn system_count(&self) -> usize {
        self.systems.values().map(Vec::len).sum::<usize>() + self.event_systems.len()
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    pub(crate) fn set_started(&mut self, started: bool) {
        self.started = started;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nullmind_core::collision::{Collider, CollisionLayer};
    use nullmind_core::geometry::Rect;
    use nullmind_core::input::Key;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn app() -> App {
        App::new(EngineConfig::default()).unwrap()
    }

    // -- construction and registration --------------------------------------

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            fixed_dt: -1.0,
            ..Default::default()
        };
        assert!(matches!(App::new(config), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn systems_are_listed_per_stage() {
        let mut app = app();
        app.add_system(Stage::PostUpdate, "alpha", |_| Ok(()));
        app.add_system(Stage::PostUpdate, "beta", |_| Ok(()));
        app.add_system(Stage::Render, "alpha", |_| Ok(()));
        app.add_event_system("keys", |_, _| Ok(()));

        assert_eq!(app.system_names(Stage::PostUpdate), vec!["alpha", "beta"]);
        assert_eq!(app.system_names(Stage::Render), vec!["alpha"]);
        assert_eq!(app.system_names(Stage::EventHandler), vec!["keys"]);
        assert!(app.system_names(Stage::Quit).is_empty());
        assert_eq!(app.system_count(), 4);
    }

    #[test]
    #[should_panic(expected = "duplicate system name")]
    fn duplicate_system_name_panics() {
        let mut app = app();
        app.add_system(Stage::PreUpdate, "input", |_| Ok(()));
        app.add_system(Stage::PreUpdate, "input", |_| Ok(()));
    }

    #[test]
    #[should_panic(expected = "add_event_system")]
    fn event_stage_needs_event_system() {
        let mut app = app();
        app.add_system(Stage::EventHandler, "keys", |_| Ok(()));
    }

    #[test]
    fn frame_before_start_fails() {
        let mut app = app();
        assert!(matches!(app.frame(0.016, &[]), Err(EngineError::NotStarted)));
        assert_eq!(app.frame_count(), 0);
    }

    // -- stage order --------------------------------------------------------

    static ORDER_COUNTER: AtomicU64 = AtomicU64::new(0);
    static PRE_ORDER: AtomicU64 = AtomicU64::new(u64::MAX);
    static EVENT_ORDER: AtomicU64 = AtomicU64::new(u64::MAX);
    static POST_ORDER: AtomicU64 = AtomicU64::new(u64::MAX);
    static RENDER_ORDER: AtomicU64 = AtomicU64::new(u64::MAX);

    fn record(slot: &AtomicU64) {
        slot.store(ORDER_COUNTER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    }

    #[test]
    fn stages_run_in_lifecycle_order() {
        let mut app = app();
        app.add_system(Stage::Render, "render", |_| {
            record(&RENDER_ORDER);
            Ok(())
        });
        app.add_system(Stage::PostUpdate, "post", |_| {
            record(&POST_ORDER);
            Ok(())
        });
        app.add_event_system("event", |_, _| {
            record(&EVENT_ORDER);
            Ok(())
        });
        app.add_system(Stage::PreUpdate, "pre", |_| {
            record(&PRE_ORDER);
            Ok(())
        });

        app.start().unwrap();
        let diag = app
            .frame(0.016, &[AppEvent::Input(InputEvent::KeyDown(Key::W))])
            .unwrap();

        let pre = PRE_ORDER.load(Ordering::SeqCst);
        let event = EVENT_ORDER.load(Ordering::SeqCst);
        let post = POST_ORDER.load(Ordering::SeqCst);
        let render = RENDER_ORDER.load(Ordering::SeqCst);
        assert!(pre < event, "pre ({pre}) before event ({event})");
        assert!(event < post, "event ({event}) before post ({post})");
        assert!(post < render, "post ({post}) before render ({render})");

        let names: Vec<&str> = diag.system_times.iter().map(|(_, n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["pre", "event", "post", "particles", "render", "particles.render"]);
        assert_eq!(diag.events_handled, 1);
    }

    static START_RUNS: AtomicU64 = AtomicU64::new(0);
    static QUIT_RUNS: AtomicU64 = AtomicU64::new(0);

    #[test]
    fn start_and_quit_run_once() {
        let mut app = app();
        app.add_system(Stage::Start, "start", |_| {
            START_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        app.add_system(Stage::Quit, "quit", |_| {
            QUIT_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        app.start().unwrap();
        app.run_frames(3).unwrap();
        app.quit().unwrap();
        app.quit().unwrap();

        assert_eq!(START_RUNS.load(Ordering::SeqCst), 1);
        assert_eq!(QUIT_RUNS.load(Ordering::SeqCst), 1);
        assert!(!app.context().running);
    }

    // -- built-ins ----------------------------------------------------------

    #[test]
    fn start_resets_colliders_and_reseeds() {
        let mut app = app();
        let ctx = app.context_mut();
        ctx.colliders
            .register(
                Collider::new(Rect::new(0, 0, 5, 5), CollisionLayer::PLAYER, CollisionLayer::NONE),
                None,
            )
            .unwrap();
        ctx.rng.rand_int(0, 100);

        app.start().unwrap();
        assert!(app.context().colliders.is_empty());
        assert_eq!(app.context().rng, GameRng::from_seed(0));
        assert!(app.context().running);
    }

    #[test]
    fn input_edges_last_one_frame() {
        let mut app = app();
        app.start().unwrap();

        app.frame(0.016, &[InputEvent::KeyDown(Key::SPACE).into()]).unwrap();
        assert!(app.context().input.key(Key::SPACE).pressed);
        assert!(app.context().input.key(Key::SPACE).held);

        app.frame(0.016, &[]).unwrap();
        assert!(!app.context().input.key(Key::SPACE).pressed);
        assert!(app.context().input.key(Key::SPACE).held);
    }

    #[test]
    fn quit_event_stops_run_loop() {
        let mut app = app();
        app.start().unwrap();
        app.frame(0.016, &[AppEvent::Quit]).unwrap();
        assert!(!app.context().running);
        assert_eq!(app.run().unwrap(), 0);
    }

    #[test]
    fn run_honours_max_frames() {
        let config = EngineConfig {
            max_frames: Some(25),
            ..Default::default()
        };
        let mut app = App::new(config).unwrap();
        assert_eq!(app.run().unwrap(), 25);
        assert_eq!(app.frame_count(), 25);
        assert!((app.context().time.elapsed_seconds() - 25.0 / 60.0).abs() < 1e-4);
    }

    #[test]
    fn time_advances_by_clamped_delta() {
        let mut app = app();
        app.start().unwrap();
        app.frame(5.0, &[]).unwrap();
        assert_eq!(app.context().time.raw_delta_seconds(), 5.0);
        assert_eq!(
            app.context().time.delta_seconds(),
            app.config().max_delta_seconds
        );
    }

    #[test]
    fn render_list_is_rebuilt_each_frame() {
        let mut app = app();
        app.add_system(Stage::Render, "box", |ctx| {
            ctx.draw_list.fill_rect(Rect::new(0, 0, 4, 4), crate::draw::Rgba::new(1, 2, 3, 255));
            Ok(())
        });
        app.start().unwrap();
        app.run_frames(3).unwrap();
        assert_eq!(app.context().draw_list.len(), 1);
    }

    // -- errors -------------------------------------------------------------

    #[test]
    fn failing_system_aborts_the_frame() {
        let mut app = app();
        app.add_system(Stage::PostUpdate, "broken", |_| {
            Err(EngineError::InvalidConfig("boom".to_owned()))
        });
        app.add_system(Stage::Render, "never", |_| panic!("render must not run"));
        app.start().unwrap();

        let err = app.frame(0.016, &[]).unwrap_err();
        match &err {
            EngineError::Stage { stage, system, message } => {
                assert_eq!(*stage, Stage::PostUpdate);
                assert_eq!(system, "broken");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("PostUpdate system 'broken' failed"));
        assert_eq!(app.frame_count(), 0);
    }

    #[test]
    fn failing_start_system_is_reported() {
        let mut app = app();
        app.add_system(Stage::Start, "load", |_| Err(EngineError::NotStarted));
        let err = app.start().unwrap_err();
        assert!(matches!(err, EngineError::Stage { stage: Stage::Start, .. }));
    }

    #[test]
    fn failed_start_leaves_app_stopped() {
        let mut app = app();
        app.add_system(Stage::Start, "load", |_| Err(EngineError::NotStarted));
        assert!(app.start().is_err());

        assert!(!app.is_started());
        assert!(!app.context().running);
        assert!(matches!(app.frame(1.0 / 60.0, &[]), Err(EngineError::NotStarted)));
        assert_eq!(app.frame_count(), 0);

        // run() retries start and reports the same failure.
        assert!(matches!(app.run(), Err(EngineError::Stage { stage: Stage::Start, .. })));
    }
}
