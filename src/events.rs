//! Event bus for decoupled game notifications
//!
//! Publishing is synchronous: every subscriber of the event's topic runs, in
//! subscription order, before `publish` returns. A failing handler is logged
//! and skipped; the publisher never sees the error.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::score::GameResult;

/// Notification channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    GameStart,
    GameOver,
    GameRestart,
    GamePause,
    GameResume,
    GameReset,
    PointerMove,
    PointerDown,
    PointerUp,
    KeyPress,
    KeyRelease,
    HazardSpawn,
    HazardDestroy,
    TimerUpdate,
    BestTimeUpdate,
    ShowGameOver,
    HideGameOver,
    PerformanceLowFps,
    PerformanceHighFps,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::GameStart => "game:start",
            Topic::GameOver => "game:over",
            Topic::GameRestart => "game:restart",
            Topic::GamePause => "game:pause",
            Topic::GameResume => "game:resume",
            Topic::GameReset => "game:reset",
            Topic::PointerMove => "input:pointer:move",
            Topic::PointerDown => "input:pointer:down",
            Topic::PointerUp => "input:pointer:up",
            Topic::KeyPress => "input:key:press",
            Topic::KeyRelease => "input:key:release",
            Topic::HazardSpawn => "hazard:spawn",
            Topic::HazardDestroy => "hazard:destroy",
            Topic::TimerUpdate => "ui:update:timer",
            Topic::BestTimeUpdate => "ui:update:best",
            Topic::ShowGameOver => "ui:show:gameover",
            Topic::HideGameOver => "ui:hide:gameover",
            Topic::PerformanceLowFps => "performance:lowfps",
            Topic::PerformanceHighFps => "performance:highfps",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payloads, one variant per topic
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Run clock started at the given engine time (ms)
    GameStarted { start_time: f64 },
    GameOver(GameResult),
    GameRestarted,
    GamePaused,
    GameResumed,
    /// Scores wiped (dev only)
    GameReset,
    PointerMoved { x: f32, y: f32 },
    PointerDown { x: f32, y: f32, button: i16 },
    PointerUp { x: f32, y: f32, button: i16 },
    KeyPressed { key: String },
    KeyReleased { key: String },
    HazardSpawned { id: u32, x: f32 },
    HazardDestroyed { id: u32 },
    /// Current run time in seconds
    TimerUpdated(f64),
    /// Best time in seconds
    BestTimeUpdated(f64),
    ShowGameOver { final_time: f64, is_new_record: bool },
    HideGameOver,
    /// Frames counted over the last second
    LowFps(u32),
    HighFps(u32),
}

impl GameEvent {
    /// The topic this payload is delivered on
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::GameStarted { .. } => Topic::GameStart,
            GameEvent::GameOver(_) => Topic::GameOver,
            GameEvent::GameRestarted => Topic::GameRestart,
            GameEvent::GamePaused => Topic::GamePause,
            GameEvent::GameResumed => Topic::GameResume,
            GameEvent::GameReset => Topic::GameReset,
            GameEvent::PointerMoved { .. } => Topic::PointerMove,
            GameEvent::PointerDown { .. } => Topic::PointerDown,
            GameEvent::PointerUp { .. } => Topic::PointerUp,
            GameEvent::KeyPressed { .. } => Topic::KeyPress,
            GameEvent::KeyReleased { .. } => Topic::KeyRelease,
            GameEvent::HazardSpawned { .. } => Topic::HazardSpawn,
            GameEvent::HazardDestroyed { .. } => Topic::HazardDestroy,
            GameEvent::TimerUpdated(_) => Topic::TimerUpdate,
            GameEvent::BestTimeUpdated(_) => Topic::BestTimeUpdate,
            GameEvent::ShowGameOver { .. } => Topic::ShowGameOver,
            GameEvent::HideGameOver => Topic::HideGameOver,
            GameEvent::LowFps(_) => Topic::PerformanceLowFps,
            GameEvent::HighFps(_) => Topic::PerformanceHighFps,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<RefCell<dyn FnMut(&GameEvent) -> anyhow::Result<()>>>;

/// Synchronous publish/subscribe hub
pub struct EventBus {
    topics: RefCell<HashMap<Topic, Vec<(SubscriptionId, Handler)>>>,
    next_id: Cell<u64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.borrow();
        let mut map = f.debug_map();
        for (topic, handlers) in topics.iter() {
            map.entry(&topic.as_str(), &handlers.len());
        }
        map.finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            topics: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a handler for a topic
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handler: Handler = Rc::new(RefCell::new(handler));
        self.topics
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a handler. Returns false if it was not subscribed to `topic`.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut topics = self.topics.borrow_mut();
        let Some(handlers) = topics.get_mut(&topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            topics.remove(&topic);
        }
        removed
    }

    /// Deliver an event to every current subscriber of its topic
    pub fn publish(&self, event: GameEvent) {
        let topic = event.topic();

        // Snapshot so handlers can (un)subscribe or publish while we iterate
        let snapshot: Vec<(SubscriptionId, Handler)> = match self.topics.borrow().get(&topic) {
            Some(handlers) => handlers.clone(),
            None => return,
        };

        for (id, handler) in snapshot {
            let Ok(mut callback) = handler.try_borrow_mut() else {
                log::warn!("Skipping re-entrant handler {:?} for {}", id, topic);
                continue;
            };
            if let Err(err) = callback(&event) {
                log::error!("Error in event handler for {}: {:#}", topic, err);
            }
        }
    }

    /// Drop subscriptions for one topic, or for every topic when `None`
    pub fn clear(&self, topic: Option<Topic>) {
        let mut topics = self.topics.borrow_mut();
        match topic {
            Some(topic) => {
                topics.remove(&topic);
            }
            None => topics.clear(),
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.borrow().get(&topic).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_publish_runs_handlers_in_subscription_order() {
        let bus = EventBus::new();
        let log = recorder();

        for name in ["first", "second", "third"] {
            let log = log.clone();
            bus.subscribe(Topic::TimerUpdate, move |_| {
                log.borrow_mut().push(name.to_string());
                Ok(())
            });
        }

        bus.publish(GameEvent::TimerUpdated(1.0));
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let log = recorder();

        bus.subscribe(Topic::GameStart, |_| anyhow::bail!("handler blew up"));
        {
            let log = log.clone();
            bus.subscribe(Topic::GameStart, move |_| {
                log.borrow_mut().push("ran".to_string());
                Ok(())
            });
        }

        bus.publish(GameEvent::GameStarted { start_time: 0.0 });
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[test]
    fn test_publish_only_reaches_matching_topic() {
        let bus = EventBus::new();
        let log = recorder();
        {
            let log = log.clone();
            bus.subscribe(Topic::GameOver, move |event| {
                if let GameEvent::GameOver(result) = event {
                    log.borrow_mut().push(format!("{:.1}", result.final_time));
                }
                Ok(())
            });
        }

        bus.publish(GameEvent::TimerUpdated(2.0));
        assert!(log.borrow().is_empty());

        bus.publish(GameEvent::GameOver(GameResult {
            final_time: 2.5,
            best_time: 2.5,
            is_new_record: true,
        }));
        assert_eq!(*log.borrow(), vec!["2.5"]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let calls = Rc::new(Cell::new(0));
        let id = {
            let calls = calls.clone();
            bus.subscribe(Topic::HideGameOver, move |_| {
                calls.set(calls.get() + 1);
                Ok(())
            })
        };

        bus.publish(GameEvent::HideGameOver);
        assert!(bus.unsubscribe(Topic::HideGameOver, id));
        assert!(!bus.unsubscribe(Topic::HideGameOver, id));
        bus.publish(GameEvent::HideGameOver);

        assert_eq!(calls.get(), 1);
        assert_eq!(bus.subscriber_count(Topic::HideGameOver), 0);
    }

    #[test]
    fn test_clear_single_topic_and_all() {
        let bus = EventBus::new();
        bus.subscribe(Topic::GamePause, |_| Ok(()));
        bus.subscribe(Topic::GameResume, |_| Ok(()));
        bus.subscribe(Topic::GameResume, |_| Ok(()));

        bus.clear(Some(Topic::GamePause));
        assert_eq!(bus.subscriber_count(Topic::GamePause), 0);
        assert_eq!(bus.subscriber_count(Topic::GameResume), 2);

        bus.clear(None);
        assert_eq!(bus.subscriber_count(Topic::GameResume), 0);
    }

    #[test]
    fn test_subscribe_during_dispatch_applies_to_next_publish() {
        let bus = Rc::new(EventBus::new());
        let late_calls = Rc::new(Cell::new(0));

        {
            let bus_inner = bus.clone();
            let late_calls = late_calls.clone();
            bus.subscribe(Topic::HazardSpawn, move |_| {
                let late_calls = late_calls.clone();
                bus_inner.subscribe(Topic::HazardSpawn, move |_| {
                    late_calls.set(late_calls.get() + 1);
                    Ok(())
                });
                Ok(())
            });
        }

        bus.publish(GameEvent::HazardSpawned { id: 1, x: 10.0 });
        assert_eq!(late_calls.get(), 0);

        bus.publish(GameEvent::HazardSpawned { id: 2, x: 20.0 });
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_nested_publish_from_handler() {
        let bus = Rc::new(EventBus::new());
        let log = recorder();

        {
            let bus_inner = bus.clone();
            bus.subscribe(Topic::GameOver, move |event| {
                if let GameEvent::GameOver(result) = event {
                    bus_inner.publish(GameEvent::ShowGameOver {
                        final_time: result.final_time,
                        is_new_record: result.is_new_record,
                    });
                }
                Ok(())
            });
        }
        {
            let log = log.clone();
            bus.subscribe(Topic::ShowGameOver, move |_| {
                log.borrow_mut().push("shown".to_string());
                Ok(())
            });
        }

        bus.publish(GameEvent::GameOver(GameResult {
            final_time: 1.0,
            best_time: 4.0,
            is_new_record: false,
        }));
        assert_eq!(*log.borrow(), vec!["shown"]);
    }

    #[test]
    fn test_event_topics() {
        assert_eq!(GameEvent::TimerUpdated(0.0).topic(), Topic::TimerUpdate);
        assert_eq!(
            GameEvent::PointerMoved { x: 0.0, y: 0.0 }.topic(),
            Topic::PointerMove
        );
        assert_eq!(Topic::GameOver.as_str(), "game:over");
        assert_eq!(GameEvent::LowFps(30).topic(), Topic::PerformanceLowFps);
        assert_eq!(Topic::KeyRelease.as_str(), "input:key:release");
    }
}
