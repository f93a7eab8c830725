//! Survival-time scoring and session statistics
//!
//! Persisted to the key-value store under `best-time` and `session-stats`.
//! Every durable change is written through before the call returns.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::events::{EventBus, GameEvent};
use crate::format_time;
use crate::persistence::{KeyValueStore, keys, load_json, save_json};

/// Aggregate play statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub games_played: u32,
    /// Sum of all final times (seconds)
    pub total_time: f64,
    /// `total_time / games_played`, 0 before the first game
    pub average_time: f64,
    pub best_streak: u32,
    /// Consecutive runs that beat the best time
    pub current_streak: u32,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub final_time: f64,
    pub best_time: f64,
    /// `final_time >= best_time` after the update, so a tie also counts
    pub is_new_record: bool,
}

/// Snapshot returned by `ScoreStore::current_stats`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSnapshot {
    pub current_score: f64,
    pub best_score: f64,
    pub session: SessionStats,
}

/// Milestones derived from the persisted stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Achievements {
    pub first_game: bool,
    pub five_games: bool,
    pub ten_seconds: bool,
    pub thirty_seconds: bool,
    pub minute_mark: bool,
    pub streak_master: bool,
}

/// Score and record keeper
pub struct ScoreStore {
    store: Rc<dyn KeyValueStore>,
    bus: Rc<EventBus>,
    current_score: f64,
    best_score: f64,
    stats: SessionStats,
    /// Result of the current run once `end_game` has run
    ended: Option<GameResult>,
}

impl ScoreStore {
    /// Create the store, loading any persisted record
    pub fn new(store: Rc<dyn KeyValueStore>, bus: Rc<EventBus>) -> Self {
        let best_score = load_json(store.as_ref(), keys::BEST_TIME, 0.0_f64).max(0.0);
        let stats = load_json(store.as_ref(), keys::SESSION_STATS, SessionStats::default());

        log::info!(
            "Loaded score data: best {} over {} games",
            format_time(best_score),
            stats.games_played
        );

        Self {
            store,
            bus,
            current_score: 0.0,
            best_score,
            stats,
            ended: None,
        }
    }

    fn save(&self) {
        save_json(self.store.as_ref(), keys::BEST_TIME, &self.best_score);
        save_json(self.store.as_ref(), keys::SESSION_STATS, &self.stats);
    }

    /// Begin a new run
    pub fn start_game(&mut self) {
        self.current_score = 0.0;
        self.ended = None;
        log::debug!("Score reset for new run");
    }

    /// Set the running time (seconds) and notify listeners
    pub fn update_score(&mut self, elapsed: f64) {
        self.current_score = elapsed;
        self.bus.publish(GameEvent::TimerUpdated(elapsed));
    }

    /// Finish the run. Repeated calls before the next `start_game` return the
    /// first result and leave the aggregates alone.
    pub fn end_game(&mut self, final_time: f64) -> GameResult {
        if let Some(result) = self.ended {
            return result;
        }

        self.current_score = final_time;
        self.stats.games_played += 1;
        self.stats.total_time += final_time;
        self.stats.average_time = self.stats.total_time / self.stats.games_played as f64;

        let beat_best = final_time > self.best_score;
        if beat_best {
            self.best_score = final_time;
            self.stats.current_streak += 1;
            self.stats.best_streak = self.stats.best_streak.max(self.stats.current_streak);
        } else {
            self.stats.current_streak = 0;
        }

        self.save();

        if beat_best {
            log::info!("New best time: {}", format_time(final_time));
            self.bus.publish(GameEvent::BestTimeUpdated(self.best_score));
        }

        let result = GameResult {
            final_time,
            best_time: self.best_score,
            is_new_record: final_time >= self.best_score,
        };
        self.ended = Some(result);

        log::info!(
            "Run ended - final {}, best {}",
            format_time(final_time),
            format_time(self.best_score)
        );
        result
    }

    /// Wipe the record and all aggregates (dev/testing only)
    pub fn reset(&mut self) {
        log::info!("Resetting all scores");
        self.current_score = 0.0;
        self.best_score = 0.0;
        self.stats = SessionStats::default();
        self.ended = None;
        self.save();
        self.bus.publish(GameEvent::BestTimeUpdated(0.0));
    }

    /// Whether `time` would strictly beat the stored best
    pub fn is_new_record(&self, time: f64) -> bool {
        time > self.best_score
    }

    pub fn has_ended(&self) -> bool {
        self.ended.is_some()
    }

    pub fn current_score(&self) -> f64 {
        self.current_score
    }

    pub fn best_time(&self) -> f64 {
        self.best_score
    }

    pub fn session_stats(&self) -> SessionStats {
        self.stats
    }

    pub fn current_stats(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            current_score: self.current_score,
            best_score: self.best_score,
            session: self.stats,
        }
    }

    pub fn achievements(&self) -> Achievements {
        Achievements {
            first_game: self.stats.games_played > 0,
            five_games: self.stats.games_played >= 5,
            ten_seconds: self.best_score >= 10.0,
            thirty_seconds: self.best_score >= 30.0,
            minute_mark: self.best_score >= 60.0,
            streak_master: self.stats.best_streak >= 3,
        }
    }
}
