//! Browser bindings: LocalStorage, DOM HUD, clock

use anyhow::anyhow;

use crate::format_time;
use crate::persistence::KeyValueStore;
use crate::ui::{HudSurface, format_best_time};

/// `window.localStorage` as a `KeyValueStore`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let storage = window
            .local_storage()
            .map_err(|e| anyhow!("localStorage access denied: {:?}", e))?
            .ok_or_else(|| anyhow!("localStorage not available"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| anyhow!("getItem({}) failed: {:?}", key, e))
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| anyhow!("setItem({}) failed: {:?}", key, e))
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| anyhow!("removeItem({}) failed: {:?}", key, e))
    }
}

/// HUD elements in the page
pub struct DomHud {
    document: web_sys::Document,
}

impl DomHud {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }
}

impl HudSurface for DomHud {
    fn update_timer(&mut self, seconds: f64) {
        self.set_text("current-time", &format_time(seconds));
    }

    fn update_best_time(&mut self, seconds: f64) {
        self.set_text("best-time", &format_best_time(seconds));
    }

    fn show_game_over_screen(&mut self, final_time: f64, is_new_record: bool) {
        self.set_text("final-time", &format_time(final_time));

        if let Some(el) = self.document.get_element_by_id("new-record") {
            let display = if is_new_record { "block" } else { "none" };
            let _ = el.set_attribute("style", &format!("display: {}", display));
        }
        if let Some(el) = self.document.get_element_by_id("game-over-screen") {
            let _ = el.class_list().add_1("show");
        }
    }

    fn hide_game_over_screen(&mut self) {
        if let Some(el) = self.document.get_element_by_id("game-over-screen") {
            let _ = el.class_list().remove_1("show");
        }
    }
}

/// Engine clock in milliseconds
pub fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Replace the game container with a load failure message
pub fn show_fatal_error(message: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(container) = document.get_element_by_id("game-container") else {
        return;
    };
    if let Err(err) = build_error_panel(&document, &container, message) {
        log::error!("Could not show error panel: {:#}", err);
    }
}

fn build_error_panel(
    document: &web_sys::Document,
    container: &web_sys::Element,
    message: &str,
) -> anyhow::Result<()> {
    let element = |tag: &str, style: &str, text: &str| -> anyhow::Result<web_sys::Element> {
        let el = document
            .create_element(tag)
            .map_err(|e| anyhow!("createElement({}) failed: {:?}", tag, e))?;
        if !style.is_empty() {
            el.set_attribute("style", style)
                .map_err(|e| anyhow!("setAttribute failed: {:?}", e))?;
        }
        if !text.is_empty() {
            el.set_text_content(Some(text));
        }
        Ok(el)
    };

    let panel = element(
        "div",
        "color: red; text-align: center; padding: 50px; font-family: Arial, sans-serif;",
        "",
    )?;
    let children = [
        element("h2", "", "Game failed to load")?,
        element("p", "", "Please refresh the page or check the console for errors.")?,
        element(
            "p",
            "font-size: 12px; margin-top: 20px; color: #666;",
            &format!("Error: {}", message),
        )?,
    ];
    for child in &children {
        panel
            .append_child(child)
            .map_err(|e| anyhow!("appendChild failed: {:?}", e))?;
    }

    container.set_text_content(None);
    container
        .append_child(&panel)
        .map_err(|e| anyhow!("appendChild failed: {:?}", e))?;
    Ok(())
}
