//! Dodge Balls entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::anyhow;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use dodge_balls::consts::*;
    use dodge_balls::events::EventBus;
    use dodge_balls::game::{Game, GameConfig, GameState};
    use dodge_balls::input::InputManager;
    use dodge_balls::platform::{self, web};
    use dodge_balls::score::ScoreStore;
    use dodge_balls::settings::{Preset, SettingKey, SettingValue, SettingsStore};
    use dodge_balls::ui::attach_hud;

    const BACKGROUND_COLOR: &str = "#1a1a2e";
    const PLAYER_COLOR: &str = "#4ecdc4";
    const BALL_COLOR: &str = "#ff6b6b";
    const SPIKE_COLOR: &str = "#ff4757";

    /// Everything the frame loop and DOM callbacks share
    struct App {
        game: Rc<RefCell<Game>>,
        input: Rc<InputManager>,
        settings: Rc<RefCell<SettingsStore>>,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        last_time: f64,
    }

    impl App {
        /// Map a pointer offset (CSS pixels) into field coordinates
        fn to_field(&self, x: f32, y: f32) -> (f32, f32) {
            let w = self.canvas.client_width().max(1) as f32;
            let h = self.canvas.client_height().max(1) as f32;
            (x * FIELD_WIDTH / w, y * FIELD_HEIGHT / h)
        }

        fn render(&self) {
            let ctx = &self.ctx;
            let game = self.game.borrow();

            ctx.set_fill_style_str(BACKGROUND_COLOR);
            ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);

            let paddle = game.paddle();
            let half = paddle.size as f64 / 2.0;
            ctx.set_fill_style_str(PLAYER_COLOR);
            ctx.fill_rect(
                paddle.pos.x as f64 - half,
                paddle.pos.y as f64 - half,
                paddle.size as f64,
                paddle.size as f64,
            );

            ctx.set_fill_style_str(BALL_COLOR);
            ctx.set_stroke_style_str(SPIKE_COLOR);
            ctx.set_line_width(2.0);
            for hazard in game.hazards() {
                let (x, y, r) = (hazard.pos.x as f64, hazard.pos.y as f64, hazard.radius as f64);
                ctx.begin_path();
                let _ = ctx.arc(x, y, r, 0.0, std::f64::consts::TAU);
                ctx.fill();

                // Eight spikes
                ctx.begin_path();
                for i in 0..8 {
                    let angle = i as f64 * std::f64::consts::FRAC_PI_4;
                    ctx.move_to(x + angle.cos() * (r - 2.0), y + angle.sin() * (r - 2.0));
                    ctx.line_to(x + angle.cos() * (r + 4.0), y + angle.sin() * (r + 4.0));
                }
                ctx.stroke();
            }

            if self.settings.borrow().all().show_debug_info {
                let stats = game.stats();
                ctx.set_fill_style_str("#ffffff");
                ctx.set_font("12px monospace");
                let lines = [
                    format!("state: {}", stats.state.as_str()),
                    format!("elapsed: {:.2}", stats.elapsed_time),
                    format!("hazards: {}", stats.hazards_active),
                    format!("paddle x: {:.0}", stats.paddle_x),
                    format!("spawn: {:.0}ms", game.spawner().interval()),
                    format!("fps: {}", stats.fps),
                ];
                for (i, line) in lines.iter().enumerate() {
                    let _ = ctx.fill_text(line, 10.0, FIELD_HEIGHT as f64 - 94.0 + i as f64 * 14.0);
                }
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| anyhow!("failed to init logger: {}", e))?;

        log::info!("Dodge the Spiked Balls starting...");

        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let document = window.document().ok_or_else(|| anyhow!("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| anyhow!("no #canvas element"))?
            .dyn_into()
            .map_err(|_| anyhow!("#canvas is not a canvas"))?;
        canvas.set_width(FIELD_WIDTH as u32);
        canvas.set_height(FIELD_HEIGHT as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| anyhow!("get_context failed: {:?}", e))?
            .ok_or_else(|| anyhow!("2D canvas not supported"))?
            .dyn_into()
            .map_err(|_| anyhow!("unexpected context type"))?;

        // Services
        let store = platform::default_store();
        let bus = Rc::new(EventBus::new());
        let settings = Rc::new(RefCell::new(SettingsStore::new(store.clone())));
        let scores = ScoreStore::new(store, bus.clone());
        let best_time = scores.best_time();
        let input = Rc::new(InputManager::new(bus.clone()));

        let seed = js_sys::Date::now() as u64;
        let config = GameConfig::from_settings(&settings.borrow().all(), seed);
        let game = Rc::new(RefCell::new(Game::new(config, scores, bus.clone(), input.gate())));
        log::info!("Game initialized with seed: {}", seed);

        Game::attach_input(&game, &bus);
        attach_hud(&bus, Rc::new(RefCell::new(web::DomHud::new(document))), best_time);
        wire_settings(&settings, &game);

        let app = Rc::new(RefCell::new(App {
            game,
            input,
            settings,
            canvas,
            ctx,
            last_time: web::now(),
        }));

        setup_input_handlers(&app)?;
        setup_restart_button(&app);
        setup_auto_pause(&app)?;

        request_animation_frame(app);

        log::info!("Ready - move the pointer to start");
        Ok(())
    }

    /// Push dev setting changes into the running game
    fn wire_settings(settings: &Rc<RefCell<SettingsStore>>, game: &Rc<RefCell<Game>>) {
        let mut settings = settings.borrow_mut();
        for key in SettingKey::ALL {
            let game = Rc::downgrade(game);
            settings.on_change(key, move |value| {
                if let Some(game) = game.upgrade() {
                    match game.try_borrow_mut() {
                        Ok(mut game) => game.apply_setting(key, value),
                        Err(_) => log::warn!("Game busy, setting {} not applied", key.as_str()),
                    }
                }
            });
        }
    }

    fn setup_input_handlers(app: &Rc<RefCell<App>>) -> anyhow::Result<()> {
        let canvas = app.borrow().canvas.clone();

        // Pointer move
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let a = app.borrow();
                let (x, y) = a.to_field(event.offset_x() as f32, event.offset_y() as f32);
                a.input.pointer_move(x, y);
            });
            canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref())
                .map_err(|e| anyhow!("pointermove listener: {:?}", e))?;
            closure.forget();
        }

        // Pointer down/up
        for (name, down) in [("pointerdown", true), ("pointerup", false)] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let a = app.borrow();
                let (x, y) = a.to_field(event.offset_x() as f32, event.offset_y() as f32);
                if down {
                    a.input.pointer_down(x, y, event.button());
                } else {
                    a.input.pointer_up(x, y, event.button());
                }
            });
            canvas
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .map_err(|e| anyhow!("{} listener: {:?}", name, e))?;
            closure.forget();
        }

        // Keyboard
        {
            let app = app.clone();
            let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if cfg!(debug_assertions) && handle_dev_key(&app, &key) {
                    return;
                }
                let input = app.borrow().input.clone();
                input.key_press(&key);
            });
            window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
                .map_err(|e| anyhow!("keydown listener: {:?}", e))?;
            closure.forget();
        }

        {
            let input = app.borrow().input.clone();
            let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                input.key_release(&event.key());
            });
            window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())
                .map_err(|e| anyhow!("keyup listener: {:?}", e))?;
            closure.forget();
        }

        Ok(())
    }

    /// Development shortcuts: 1-4 presets, D debug overlay, Shift+R wipe scores
    fn handle_dev_key(app: &Rc<RefCell<App>>, key: &str) -> bool {
        let (settings, game) = {
            let a = app.borrow();
            (a.settings.clone(), a.game.clone())
        };

        let preset = match key {
            "1" => Some(Preset::Easy),
            "2" => Some(Preset::Normal),
            "3" => Some(Preset::Hard),
            "4" => Some(Preset::Chaos),
            _ => None,
        };
        if let Some(preset) = preset {
            settings.borrow_mut().apply_preset(preset);
            return true;
        }

        match key {
            "d" | "D" => {
                let show = settings.borrow().all().show_debug_info;
                settings
                    .borrow_mut()
                    .set(SettingKey::ShowDebugInfo, SettingValue::Bool(!show));
                true
            }
            "R" => {
                game.borrow_mut().reset();
                true
            }
            _ => false,
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = ((time - a.last_time).max(0.0) / 1000.0) as f32;
            a.last_time = time;

            a.game.borrow_mut().update(time, dt);
            a.render();
        }

        request_animation_frame(app);
    }

    fn setup_restart_button(app: &Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-button") {
            let game = app.borrow().game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: &Rc<RefCell<App>>) -> anyhow::Result<()> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let document = window.document().ok_or_else(|| anyhow!("no document"))?;
        let game = app.borrow().game.clone();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state() == GameState::Playing {
                        g.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let input = app.borrow().input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                input.clear_keys();
                let mut g = game.borrow_mut();
                if g.state() == GameState::Playing {
                    g.pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(err) = wasm_game::run() {
        log::error!("Failed to initialize game: {:#}", err);
        dodge_balls::platform::web::show_fatal_error(&format!("{:#}", err));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Dodge Balls (native) starting...");
    log::info!("Native mode plays a headless demo - run with `trunk serve` for the web version");

    headless::run(3)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted native session: a simple bot dodges until it gets hit
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use dodge_balls::events::EventBus;
    use dodge_balls::game::{Game, GameConfig, GameState};
    use dodge_balls::input::InputManager;
    use dodge_balls::platform;
    use dodge_balls::score::ScoreStore;
    use dodge_balls::settings::SettingsStore;
    use dodge_balls::ui::{LogHud, attach_hud};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up on a run after this long (seconds)
    const MAX_RUN_SECS: f64 = 120.0;

    pub fn run(rounds: u32) -> anyhow::Result<()> {
        let store = platform::default_store();
        let bus = Rc::new(EventBus::new());
        let settings = SettingsStore::new(store.clone());
        let scores = ScoreStore::new(store, bus.clone());
        let best_time = scores.best_time();
        let input = InputManager::new(bus.clone());

        let seed: u64 = rand::random();
        let config = GameConfig::from_settings(&settings.all(), seed);
        let game = Rc::new(RefCell::new(Game::new(config, scores, bus.clone(), input.gate())));
        Game::attach_input(&game, &bus);
        attach_hud(&bus, Rc::new(RefCell::new(LogHud::default())), best_time);

        let mut now = 0.0;
        for round in 1..=rounds {
            log::info!("Round {}/{}", round, rounds);
            let start_x = game.borrow().paddle().pos.x;
            input.pointer_move(start_x, 0.0);

            while game.borrow().state() == GameState::Playing {
                now += FRAME_MS;
                let target = dodge_target(&game.borrow());
                input.pointer_move(target, 0.0);
                game.borrow_mut().update(now, (FRAME_MS / 1000.0) as f32);

                if game.borrow().stats().elapsed_time > MAX_RUN_SECS {
                    log::info!("Bot survived {}s, ending demo", MAX_RUN_SECS);
                    return Ok(());
                }
            }

            game.borrow_mut().restart();
        }

        let game = game.borrow();
        let stats = game.scores().session_stats();
        log::info!(
            "Session: {} games, average {:.2}s, best {:.2}s, best streak {}",
            stats.games_played,
            stats.average_time,
            game.scores().best_time(),
            stats.best_streak
        );
        log::info!("Achievements: {:?}", game.scores().achievements());

        bus.clear(None);
        Ok(())
    }

    /// Nudge away from the closest hazard above the paddle, a few pixels per frame
    fn dodge_target(game: &Game) -> f32 {
        let paddle = game.paddle();
        let threat = game
            .hazards()
            .iter()
            .filter(|h| h.pos.y < paddle.pos.y && (h.pos.x - paddle.pos.x).abs() < 40.0)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        match threat {
            Some(h) if h.pos.x >= paddle.pos.x => paddle.pos.x - 8.0,
            Some(_) => paddle.pos.x + 8.0,
            None => paddle.pos.x,
        }
    }
}
