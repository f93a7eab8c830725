//! HUD projection
//!
//! Mirrors score and game-over notifications onto whatever surface the
//! platform provides (DOM in the browser, the log natively). No game logic.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;

use crate::events::{EventBus, GameEvent, SubscriptionId, Topic};
use crate::format_time;

/// Something that can show the HUD
pub trait HudSurface {
    /// Current run time in seconds
    fn update_timer(&mut self, seconds: f64);

    fn update_best_time(&mut self, seconds: f64);

    fn show_game_over_screen(&mut self, final_time: f64, is_new_record: bool);

    fn hide_game_over_screen(&mut self);
}

/// Best time label, "--" before any record
pub fn format_best_time(seconds: f64) -> String {
    if seconds > 0.0 {
        format_time(seconds)
    } else {
        "--".to_string()
    }
}

/// Subscribe `surface` to the HUD topics and paint the initial best time
pub fn attach_hud<S>(bus: &EventBus, surface: Rc<RefCell<S>>, best_time: f64) -> Vec<(Topic, SubscriptionId)>
where
    S: HudSurface + 'static,
{
    surface.borrow_mut().update_best_time(best_time);

    let topics = [
        Topic::TimerUpdate,
        Topic::BestTimeUpdate,
        Topic::ShowGameOver,
        Topic::HideGameOver,
    ];

    topics
        .into_iter()
        .map(|topic| {
            let surface = surface.clone();
            let id = bus.subscribe(topic, move |event| {
                let mut surface = surface
                    .try_borrow_mut()
                    .map_err(|_| anyhow!("HUD surface busy"))?;
                match event {
                    GameEvent::TimerUpdated(t) => surface.update_timer(*t),
                    GameEvent::BestTimeUpdated(t) => surface.update_best_time(*t),
                    GameEvent::ShowGameOver {
                        final_time,
                        is_new_record,
                    } => surface.show_game_over_screen(*final_time, *is_new_record),
                    GameEvent::HideGameOver => surface.hide_game_over_screen(),
                    _ => {}
                }
                Ok(())
            });
            (topic, id)
        })
        .collect()
}

/// Native surface that writes the HUD to the log
#[derive(Debug, Default)]
pub struct LogHud {
    /// Last whole second logged, to keep the timer quiet
    last_logged_second: Option<u64>,
}

impl HudSurface for LogHud {
    fn update_timer(&mut self, seconds: f64) {
        let whole = seconds.max(0.0) as u64;
        if self.last_logged_second != Some(whole) {
            self.last_logged_second = Some(whole);
            log::info!("Time: {}", format_time(seconds));
        }
    }

    fn update_best_time(&mut self, seconds: f64) {
        log::info!("Best: {}", format_best_time(seconds));
    }

    fn show_game_over_screen(&mut self, final_time: f64, is_new_record: bool) {
        self.last_logged_second = None;
        if is_new_record {
            log::info!("GAME OVER - {} (new record!)", format_time(final_time));
        } else {
            log::info!("GAME OVER - {}", format_time(final_time));
        }
    }

    fn hide_game_over_screen(&mut self) {
        log::info!("Ready - move to start");
    }
}
