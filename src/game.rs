//! Game state machine
//!
//! ```text
//! Ready --pointer move--> Playing --overlap--> GameOver --restart--> Ready
//!                          |    ^
//!                    pause |    | resume
//!                          v    |
//!                          Paused
//! ```
//!
//! The host calls `update` once per frame with its clock (ms). Requests that
//! don't apply to the current state are ignored and logged at debug level.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;

use crate::consts::*;
use crate::events::{EventBus, GameEvent, SubscriptionId, Topic};
use crate::format_time;
use crate::input::InputGate;
use crate::score::{GameResult, ScoreStore};
use crate::settings::{DevSettings, SettingKey, SettingValue};
use crate::sim::{Hazard, Paddle, PlayField, SpeedChangePolicy, Spawner, find_overlap, step_hazards};

/// Externally visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ready,
    Playing,
    Paused,
    GameOver,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Ready => "ready",
            GameState::Playing => "playing",
            GameState::Paused => "paused",
            GameState::GameOver => "game_over",
        }
    }
}

/// One play session from first move to collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    /// Engine time (ms) the run clock counts from
    pub start_time: f64,
    /// Seconds survived so far
    pub elapsed_time: f64,
}

/// State plus the data that only exists in that state. A finished run lives
/// in `GameOver`, so a second overlap report finds nothing to end.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Ready,
    Playing(Run),
    Paused { run: Run },
    GameOver(GameResult),
}

/// Runtime tuning for a game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub field: PlayField,
    pub spawn_interval_ms: f64,
    pub ball_speed: f32,
    pub gravity: f32,
    pub player_speed: f32,
    pub speed_policy: SpeedChangePolicy,
    /// Spawn position seed
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field: PlayField::default(),
            spawn_interval_ms: BALL_SPAWN_RATE,
            ball_speed: BALL_SPEED,
            gravity: GRAVITY,
            player_speed: PLAYER_SPEED,
            speed_policy: SpeedChangePolicy::default(),
            seed: 0,
        }
    }
}

impl GameConfig {
    pub fn from_settings(settings: &DevSettings, seed: u64) -> Self {
        Self {
            spawn_interval_ms: settings.ball_spawn_rate,
            ball_speed: settings.ball_speed as f32,
            gravity: settings.gravity as f32,
            player_speed: settings.player_speed as f32,
            seed,
            ..Self::default()
        }
    }
}

/// Debug snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameStats {
    pub state: GameState,
    pub elapsed_time: f64,
    pub hazards_active: usize,
    pub paddle_x: f32,
    pub best_time: f64,
    /// Frames counted over the last full second
    pub fps: u32,
}

/// Below this many frames per second the game logs a warning
pub const LOW_FPS_THRESHOLD: u32 = 60;
/// Above this many frames per second a high-FPS notice goes out
pub const HIGH_FPS_THRESHOLD: u32 = 70;

/// Counts frames over one-second windows of engine time
#[derive(Debug, Clone, Copy, Default)]
struct FrameCounter {
    window_start: Option<f64>,
    frames: u32,
    last_fps: u32,
}

impl FrameCounter {
    /// Count a frame at `now` (ms). Returns the frame count when a window closes.
    fn tick(&mut self, now: f64) -> Option<u32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        if now - start < 1000.0 {
            return None;
        }

        let fps = self.frames;
        self.last_fps = fps;
        self.frames = 0;
        self.window_start = Some(now);
        Some(fps)
    }
}

/// The orchestrator: owns the run, the play field and the score store
pub struct Game {
    phase: Phase,
    field: PlayField,
    paddle: Paddle,
    spawner: Spawner,
    gravity: f32,
    /// Stored for the dev panel; the paddle follows the pointer directly
    player_speed: f32,
    scores: ScoreStore,
    bus: Rc<EventBus>,
    input: InputGate,
    /// Last engine time seen (ms)
    clock: f64,
    frames: FrameCounter,
}

impl Game {
    pub fn new(config: GameConfig, mut scores: ScoreStore, bus: Rc<EventBus>, input: InputGate) -> Self {
        scores.start_game();
        input.set_enabled(true);

        log::info!("Game ready (move the pointer to start)");
        Self {
            phase: Phase::Ready,
            field: config.field,
            paddle: Paddle::new(&config.field),
            spawner: Spawner::new(
                config.spawn_interval_ms,
                config.ball_speed,
                config.speed_policy,
                config.seed,
            ),
            gravity: config.gravity,
            player_speed: config.player_speed,
            scores,
            bus,
            input,
            clock: 0.0,
            frames: FrameCounter::default(),
        }
    }

    /// Route pointer movement and key presses from the bus into `game`.
    ///
    /// Handlers hold a weak reference, so they go quiet once the game is dropped.
    pub fn attach_input(game: &Rc<RefCell<Game>>, bus: &EventBus) -> Vec<(Topic, SubscriptionId)> {
        let mut subscriptions = Vec::new();

        let weak = Rc::downgrade(game);
        let id = bus.subscribe(Topic::PointerMove, move |event| {
            let GameEvent::PointerMoved { x, .. } = event else {
                return Ok(());
            };
            let Some(game) = weak.upgrade() else {
                return Ok(());
            };
            let mut game = game
                .try_borrow_mut()
                .map_err(|_| anyhow!("game busy, dropped pointer move"))?;
            game.on_pointer_move(*x);
            Ok(())
        });
        subscriptions.push((Topic::PointerMove, id));

        let weak = Rc::downgrade(game);
        let id = bus.subscribe(Topic::KeyPress, move |event| {
            let GameEvent::KeyPressed { key } = event else {
                return Ok(());
            };
            let Some(game) = weak.upgrade() else {
                return Ok(());
            };
            let mut game = game
                .try_borrow_mut()
                .map_err(|_| anyhow!("game busy, dropped key {}", key))?;
            game.on_key(key);
            Ok(())
        });
        subscriptions.push((Topic::KeyPress, id));

        subscriptions
    }

    pub fn state(&self) -> GameState {
        match self.phase {
            Phase::Ready => GameState::Ready,
            Phase::Playing(_) => GameState::Playing,
            Phase::Paused { .. } => GameState::Paused,
            Phase::GameOver(_) => GameState::GameOver,
        }
    }

    /// The current run, if one is in progress or paused
    pub fn run(&self) -> Option<Run> {
        match self.phase {
            Phase::Playing(run) | Phase::Paused { run, .. } => Some(run),
            _ => None,
        }
    }

    /// Result of the finished run while in `GameOver`
    pub fn result(&self) -> Option<GameResult> {
        match self.phase {
            Phase::GameOver(result) => Some(result),
            _ => None,
        }
    }

    /// Pointer moved to `x`: the paddle follows it, and the first move starts the run
    pub fn on_pointer_move(&mut self, x: f32) {
        if !self.input.is_enabled() {
            log::debug!("Pointer move ignored while {}", self.state().as_str());
            return;
        }

        self.paddle.pos.x = self.paddle.clamp_x(x, &self.field);

        if self.phase == Phase::Ready {
            self.start();
        }
    }

    /// Keyboard shortcuts: Escape/P toggles pause
    pub fn on_key(&mut self, key: &str) {
        match key {
            "Escape" | "p" | "P" => self.toggle_pause(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let run = Run {
            start_time: self.clock,
            elapsed_time: 0.0,
        };
        self.phase = Phase::Playing(run);
        self.spawner.set_active(true);
        self.input.set_enabled(true);

        log::info!("Run started");
        self.bus.publish(GameEvent::GameStarted {
            start_time: run.start_time,
        });
    }

    /// Advance one frame. `now` is the engine clock (ms), `dt` the frame delta (s).
    pub fn update(&mut self, now: f64, dt: f32) {
        self.clock = now;
        self.track_fps(now);

        let Phase::Playing(mut run) = self.phase else {
            return;
        };

        run.elapsed_time = ((now - run.start_time) / 1000.0).max(0.0);
        self.phase = Phase::Playing(run);
        self.scores.update_score(run.elapsed_time);

        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        step_hazards(self.spawner.hazards_mut(), dt, self.gravity);

        for id in self.spawner.advance(dt as f64 * 1000.0, &self.field) {
            if let Some(hazard) = self.spawner.hazards().iter().find(|h| h.id == id) {
                let x = hazard.pos.x;
                self.bus.publish(GameEvent::HazardSpawned { id, x });
            }
        }

        if let Some(id) = find_overlap(&self.paddle, self.spawner.hazards()) {
            self.on_hazard_overlap(id);
            return;
        }

        for id in self.spawner.sweep(&self.field) {
            self.bus.publish(GameEvent::HazardDestroyed { id });
        }
    }

    /// Overlap report from collision detection. Only the first report of a
    /// run ends it; later ones (the hazard may overlap for several frames)
    /// find the game already over.
    pub fn on_hazard_overlap(&mut self, hazard_id: u32) {
        let Phase::Playing(run) = self.phase else {
            log::debug!(
                "Overlap with hazard {} ignored while {}",
                hazard_id,
                self.state().as_str()
            );
            return;
        };

        log::info!("Hit by hazard {} at {}", hazard_id, format_time(run.elapsed_time));

        self.input.set_enabled(false);
        self.spawner.set_active(false);

        let result = self.scores.end_game(run.elapsed_time);
        self.phase = Phase::GameOver(result);

        self.bus.publish(GameEvent::GameOver(result));
        self.bus.publish(GameEvent::ShowGameOver {
            final_time: result.final_time,
            is_new_record: result.is_new_record,
        });
    }

    /// GameOver -> Ready
    pub fn restart(&mut self) {
        if !matches!(self.phase, Phase::GameOver(_)) {
            log::debug!("Restart ignored while {}", self.state().as_str());
            return;
        }
        self.enter_ready();
        log::info!("Game restarted");
    }

    fn enter_ready(&mut self) {
        let cleared = self.spawner.clear();
        self.spawner.set_active(false);
        self.paddle = Paddle::new(&self.field);
        self.input.set_enabled(true);
        self.scores.start_game();
        self.phase = Phase::Ready;

        log::debug!("Cleared {} hazards", cleared);
        self.bus.publish(GameEvent::HideGameOver);
        self.bus.publish(GameEvent::GameRestarted);
    }

    /// Playing -> Paused
    pub fn pause(&mut self) {
        let Phase::Playing(run) = self.phase else {
            log::debug!("Pause ignored while {}", self.state().as_str());
            return;
        };

        self.phase = Phase::Paused { run };
        self.spawner.set_active(false);
        self.input.set_enabled(false);

        log::info!("Game paused");
        self.bus.publish(GameEvent::GamePaused);
    }

    /// Paused -> Playing. The run keeps its start time, so elapsed time stays
    /// relative to the engine clock.
    pub fn resume(&mut self) {
        let Phase::Paused { run } = self.phase else {
            log::debug!("Resume ignored while {}", self.state().as_str());
            return;
        };

        self.phase = Phase::Playing(run);
        self.spawner.set_active(true);
        self.input.set_enabled(true);

        log::info!("Game resumed");
        self.bus.publish(GameEvent::GameResumed);
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Playing(_) => self.pause(),
            Phase::Paused { .. } => self.resume(),
            _ => log::debug!("Pause toggle ignored while {}", self.state().as_str()),
        }
    }

    /// Back to Ready from any state and wipe all scores (dev/testing only)
    pub fn reset(&mut self) {
        log::info!("Resetting game completely");
        self.enter_ready();
        self.scores.reset();
        self.bus.publish(GameEvent::GameReset);
    }

    /// Apply a dev setting change to the running game
    pub fn apply_setting(&mut self, key: SettingKey, value: SettingValue) {
        let SettingValue::Number(n) = value else {
            return;
        };
        match key {
            SettingKey::BallSpawnRate => self.spawner.set_interval(n),
            SettingKey::BallSpeed => self.spawner.set_speed(n as f32),
            SettingKey::Gravity => self.gravity = n as f32,
            SettingKey::PlayerSpeed => self.player_speed = n as f32,
            SettingKey::ShowDebugInfo => return,
        }
        log::debug!("Applied {} = {}", key.as_str(), n);
    }

    pub fn player_speed(&self) -> f32 {
        self.player_speed
    }

    fn track_fps(&mut self, now: f64) {
        let Some(fps) = self.frames.tick(now) else {
            return;
        };
        if fps < LOW_FPS_THRESHOLD {
            log::warn!("Low FPS detected: {} FPS", fps);
            self.bus.publish(GameEvent::LowFps(fps));
        } else if fps > HIGH_FPS_THRESHOLD {
            self.bus.publish(GameEvent::HighFps(fps));
        }
    }

    pub fn set_speed_policy(&mut self, policy: SpeedChangePolicy) {
        self.spawner.set_policy(policy);
    }

    pub fn field(&self) -> &PlayField {
        &self.field
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn hazards(&self) -> &[Hazard] {
        self.spawner.hazards()
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// Direct spawner access for engine-side placement
    pub fn spawner_mut(&mut self) -> &mut Spawner {
        &mut self.spawner
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            state: self.state(),
            elapsed_time: self.run().map_or(0.0, |run| run.elapsed_time),
            hazards_active: self.spawner.hazards().len(),
            paddle_x: self.paddle.pos.x,
            best_time: self.scores.best_time(),
            fps: self.frames.last_fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputManager;
    use crate::persistence::{KeyValueStore, MemoryStore, keys, save_json};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const FRAME_DT: f32 = 1.0 / 60.0;

    struct Harness {
        kv: Rc<MemoryStore>,
        bus: Rc<EventBus>,
        input: InputManager,
        game: Rc<RefCell<Game>>,
        events: Rc<RefCell<Vec<GameEvent>>>,
    }

    fn harness_with_best(best: f64) -> Harness {
        let kv = Rc::new(MemoryStore::new());
        save_json(kv.as_ref(), keys::BEST_TIME, &best);
        let bus = Rc::new(EventBus::new());
        let input = InputManager::new(bus.clone());
        let scores = ScoreStore::new(kv.clone(), bus.clone());
        let config = GameConfig {
            seed: 1234,
            ..GameConfig::default()
        };
        let game = Rc::new(RefCell::new(Game::new(config, scores, bus.clone(), input.gate())));
        Game::attach_input(&game, &bus);

        let events = Rc::new(RefCell::new(Vec::new()));
        for topic in [
            Topic::GameStart,
            Topic::GameOver,
            Topic::GameRestart,
            Topic::GamePause,
            Topic::GameResume,
            Topic::ShowGameOver,
            Topic::HideGameOver,
        ] {
            let events = events.clone();
            bus.subscribe(topic, move |event| {
                events.borrow_mut().push(event.clone());
                Ok(())
            });
        }

        Harness {
            kv,
            bus,
            input,
            game,
            events,
        }
    }

    fn harness() -> Harness {
        harness_with_best(0.0)
    }

    /// Place a hazard right on top of the paddle
    fn drop_hazard_on_paddle(game: &mut Game) {
        let paddle_pos = game.paddle().pos;
        let field = *game.field();
        let spawner = game.spawner_mut();
        let id = spawner.on_tick(&field).id;
        if let Some(h) = spawner.hazards_mut().iter_mut().find(|h| h.id == id) {
            h.pos = paddle_pos;
        }
    }

    #[test]
    fn test_first_pointer_move_starts_run() {
        let h = harness();
        h.game.borrow_mut().update(500.0, FRAME_DT);
        assert_eq!(h.game.borrow().state(), GameState::Ready);

        h.input.pointer_move(300.0, 100.0);

        let game = h.game.borrow();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.run().map(|r| r.start_time), Some(500.0));
        assert!(game.spawner().is_active());
        assert_eq!(
            h.events.borrow().first(),
            Some(&GameEvent::GameStarted { start_time: 500.0 })
        );
    }

    #[test]
    fn test_no_spawning_while_ready() {
        let h = harness();
        let mut game = h.game.borrow_mut();
        for i in 0..600 {
            game.update(i as f64 * FRAME_MS, FRAME_DT);
        }
        assert!(game.hazards().is_empty());
        assert_eq!(game.scores().current_score(), 0.0);
    }

    #[test]
    fn test_elapsed_time_tracks_engine_clock() {
        let h = harness();
        h.game.borrow_mut().update(1000.0, FRAME_DT);
        h.input.pointer_move(400.0, 0.0);

        let mut game = h.game.borrow_mut();
        game.update(3500.0, FRAME_DT);
        assert_eq!(game.run().map(|r| r.elapsed_time), Some(2.5));
        assert_eq!(game.scores().current_score(), 2.5);
    }

    #[test]
    fn test_standard_session_visits_states_in_order() {
        let h = harness();
        let mut visited = vec![h.game.borrow().state()];

        h.input.pointer_move(400.0, 0.0);
        visited.push(h.game.borrow().state());

        {
            let mut game = h.game.borrow_mut();
            game.update(2000.0, FRAME_DT);
            drop_hazard_on_paddle(&mut game);
            game.update(2000.0 + FRAME_MS, FRAME_DT);
            visited.push(game.state());

            game.restart();
            visited.push(game.state());
        }

        assert_eq!(
            visited,
            vec![
                GameState::Ready,
                GameState::Playing,
                GameState::GameOver,
                GameState::Ready
            ]
        );

        let topics: Vec<Topic> = h.events.borrow().iter().map(|e| e.topic()).collect();
        assert_eq!(
            topics,
            vec![
                Topic::GameStart,
                Topic::GameOver,
                Topic::ShowGameOver,
                Topic::HideGameOver,
                Topic::GameRestart
            ]
        );
    }

    #[test]
    fn test_repeated_overlap_ends_run_once() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);

        let mut game = h.game.borrow_mut();
        game.update(3000.0, FRAME_DT);
        drop_hazard_on_paddle(&mut game);

        // Engine keeps reporting the same overlap for a few frames
        game.update(3000.0, FRAME_DT);
        game.on_hazard_overlap(1);
        game.update(3100.0, FRAME_DT);
        game.on_hazard_overlap(1);

        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.scores().session_stats().games_played, 1);
        let game_overs = h
            .events
            .borrow()
            .iter()
            .filter(|e| e.topic() == Topic::GameOver)
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_game_over_records_result_and_persists() {
        let h = harness_with_best(2.0);
        h.input.pointer_move(400.0, 0.0);

        let mut game = h.game.borrow_mut();
        game.update(3140.0, FRAME_DT);
        game.on_hazard_overlap(99);

        let result = game.result();
        assert_eq!(
            result,
            Some(GameResult {
                final_time: 3.14,
                best_time: 3.14,
                is_new_record: true,
            })
        );
        assert_eq!(
            h.kv.get_item(keys::BEST_TIME).unwrap().as_deref(),
            Some("3.14")
        );
        assert!(!game.spawner().is_active());
    }

    #[test]
    fn test_input_disabled_after_game_over() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);
        {
            let mut game = h.game.borrow_mut();
            game.update(1000.0, FRAME_DT);
            game.on_hazard_overlap(1);
        }

        let paddle_before = h.game.borrow().paddle().pos;
        h.input.pointer_move(10.0, 0.0);
        h.game.borrow_mut().update(2000.0, FRAME_DT);

        let game = h.game.borrow();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.paddle().pos, paddle_before);
    }

    #[test]
    fn test_restart_clears_hazards_and_waits_for_move() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);
        {
            let mut game = h.game.borrow_mut();
            for i in 1..=300 {
                game.update(i as f64 * FRAME_MS, FRAME_DT);
                if game.state() != GameState::Playing {
                    break;
                }
            }
            let field = *game.field();
            game.spawner_mut().on_tick(&field);
            game.on_hazard_overlap(1);
            assert!(!game.hazards().is_empty());

            game.restart();
            assert_eq!(game.state(), GameState::Ready);
            assert!(game.hazards().is_empty());
            assert!(!game.spawner().is_active());

            for i in 301..=600 {
                game.update(i as f64 * FRAME_MS, FRAME_DT);
            }
            assert!(game.hazards().is_empty());
        }

        h.input.pointer_move(200.0, 0.0);
        assert_eq!(h.game.borrow().state(), GameState::Playing);
        assert!(!h.game.borrow().scores().has_ended());
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let h = harness();
        let mut game = h.game.borrow_mut();

        game.restart();
        game.resume();
        game.pause();
        game.on_hazard_overlap(1);
        assert_eq!(game.state(), GameState::Ready);
        assert_eq!(game.scores().session_stats().games_played, 0);
        assert!(h.events.borrow().is_empty());
    }

    #[test]
    fn test_pause_resume_keeps_engine_clock_baseline() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);

        {
            let mut game = h.game.borrow_mut();
            game.update(1000.0, FRAME_DT);
            game.pause();
            assert_eq!(game.state(), GameState::Paused);
            assert!(!game.spawner().is_active());
        }

        // Pointer is gated while paused
        h.input.pointer_move(100.0, 0.0);
        assert_eq!(h.game.borrow().state(), GameState::Paused);
        assert_eq!(h.game.borrow().paddle().pos.x, 400.0);

        let mut game = h.game.borrow_mut();
        game.update(6000.0, FRAME_DT);
        assert_eq!(game.run().map(|r| r.elapsed_time), Some(1.0));

        game.resume();
        game.update(7000.0, FRAME_DT);
        assert_eq!(game.run().map(|r| r.start_time), Some(0.0));
        assert_eq!(game.run().map(|r| r.elapsed_time), Some(7.0));
        assert!(game.spawner().is_active());
    }

    #[test]
    fn test_paddle_follows_pointer_immediately() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);
        h.game.borrow_mut().update(16.0, FRAME_DT);

        h.input.pointer_move(100.0, 0.0);
        assert_eq!(h.game.borrow().paddle().pos.x, 100.0);

        h.game.borrow_mut().update(32.0, FRAME_DT);
        assert_eq!(h.game.borrow().paddle().pos.x, 100.0);

        // Clamped to the field
        h.input.pointer_move(-50.0, 0.0);
        assert_eq!(h.game.borrow().paddle().pos.x, PLAYER_SIZE / 2.0);
    }

    #[test]
    fn test_player_speed_setting_is_stored_only() {
        let h = harness();
        h.game
            .borrow_mut()
            .apply_setting(SettingKey::PlayerSpeed, SettingValue::Number(1.0));
        assert_eq!(h.game.borrow().player_speed(), 1.0);

        h.input.pointer_move(700.0, 0.0);
        assert_eq!(h.game.borrow().paddle().pos.x, 700.0);
    }

    fn fps_events(h: &Harness) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for topic in [Topic::PerformanceLowFps, Topic::PerformanceHighFps] {
            let seen = seen.clone();
            h.bus.subscribe(topic, move |event| {
                seen.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn test_low_fps_reported_once_per_second() {
        let h = harness();
        let seen = fps_events(&h);

        let mut game = h.game.borrow_mut();
        // 20 frames per second
        for i in 0..=40 {
            game.update(i as f64 * 50.0, 0.05);
        }

        assert_eq!(*seen.borrow(), vec![GameEvent::LowFps(20), GameEvent::LowFps(20)]);
        assert_eq!(game.stats().fps, 20);
    }

    #[test]
    fn test_high_and_normal_fps() {
        let h = harness();
        let seen = fps_events(&h);

        let mut game = h.game.borrow_mut();
        // 100 frames per second
        for i in 0..=100 {
            game.update(i as f64 * 10.0, 0.01);
        }
        assert_eq!(*seen.borrow(), vec![GameEvent::HighFps(100)]);

        // 64 frames per second is in band
        let base = 1000.0;
        for i in 1..=64 {
            game.update(base + i as f64 * 15.625, 0.015625);
        }
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(game.stats().fps, 64);
    }

    #[test]
    fn test_escape_toggles_pause_through_bus() {
        let h = harness();
        h.input.pointer_move(400.0, 0.0);

        h.input.key_press("Escape");
        assert_eq!(h.game.borrow().state(), GameState::Paused);

        h.input.key_press("Escape");
        assert_eq!(h.game.borrow().state(), GameState::Playing);
    }

    #[test]
    fn test_hazards_spawn_and_sweep_while_playing() {
        let h = harness();
        // Park the paddle at the far left so falling hazards rarely hit it
        h.input.pointer_move(0.0, 0.0);

        let mut game = h.game.borrow_mut();
        let mut max_live = 0;
        let mut frame = 0;
        while frame < 60 * 10 && game.state() == GameState::Playing {
            frame += 1;
            game.update(frame as f64 * FRAME_MS, FRAME_DT);
            max_live = max_live.max(game.hazards().len());
        }

        assert!(max_live > 0);
        // Hazards take ~3.2s to cross the field at one spawn per second
        assert!(max_live <= 5);
    }

    #[test]
    fn test_settings_apply_to_running_game() {
        let h = harness();
        let mut game = h.game.borrow_mut();

        game.apply_setting(SettingKey::BallSpawnRate, SettingValue::Number(250.0));
        game.apply_setting(SettingKey::BallSpeed, SettingValue::Number(320.0));
        game.apply_setting(SettingKey::ShowDebugInfo, SettingValue::Bool(true));

        assert_eq!(game.spawner().interval(), 250.0);
        assert_eq!(game.spawner().speed(), 320.0);
    }

    #[test]
    fn test_reset_wipes_scores() {
        let h = harness_with_best(9.0);
        h.input.pointer_move(400.0, 0.0);

        let mut game = h.game.borrow_mut();
        game.update(1000.0, FRAME_DT);
        game.reset();

        assert_eq!(game.state(), GameState::Ready);
        assert_eq!(game.scores().best_time(), 0.0);
        assert_eq!(game.scores().session_stats().games_played, 0);
    }

    #[test]
    fn test_dropped_game_silences_handlers() {
        let h = harness();
        let Harness { bus, input, game, .. } = h;
        drop(game);

        // Handler upgrades fail quietly
        input.pointer_move(1.0, 1.0);
        assert_eq!(bus.subscriber_count(Topic::PointerMove), 1);
    }
}
