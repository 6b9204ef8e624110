//! WASM bridge for Trade Draft: exposes the drawing engine to a browser
//! chart host.
//!
//! Compiled via `wasm-pack build --target web`. The host forwards pointer and
//! key events, supplies its coordinate conversions as a JS object, and
//! paints from `scene_json()`. Persisted and synced drawings cross the
//! boundary as JSON strings.

mod scene;
mod viewport;

pub use scene::{Scene, SceneHandle, SceneItem, build_scene};
pub use viewport::JsViewport;

use std::fmt::Display;

use td_core::{Bar, BarSeries, DrawingSnapshot, TdError, remote::SyncMessage};
use td_editor::{Board, InputEvent, InputRouter, InteractionConfig, Modifiers, ToolKind};
use wasm_bindgen::prelude::*;

/// One chart pane's drawing state.
///
/// Holds the input router (board, tools, gestures, undo) and the host
/// viewport. Everything the page does with drawings goes through here.
#[wasm_bindgen]
pub struct TdChart {
    router: InputRouter,
    viewport: JsViewport,
}

#[wasm_bindgen]
impl TdChart {
    /// `bars_json` is an array of `{time, open?, high?, low?, close?}`;
    /// `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        bars_json: &str,
        viewport: JsValue,
        symbol: Option<String>,
        config_json: Option<String>,
    ) -> Result<TdChart, JsValue> {
        console_error_panic_hook_setup();

        let series = parse_series(bars_json).map_err(js_err)?;
        let config = match config_json.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(json) => InteractionConfig::from_json(json).map_err(js_err)?,
            None => InteractionConfig::default(),
        };
        let mut board = Board::new(series);
        if let Some(symbol) = symbol {
            board = board.with_symbol(symbol);
        }
        Ok(Self {
            router: InputRouter::new(board, config),
            viewport: JsViewport::new(viewport),
        })
    }

    /// Swap in a new bar series (symbol or interval change, history load).
    pub fn set_bars(&mut self, bars_json: &str) -> Result<(), JsValue> {
        let series = parse_series(bars_json).map_err(js_err)?;
        self.router.replace_series(series);
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: JsValue) {
        self.viewport = JsViewport::new(viewport);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// All pointer handlers return `true` when the host should repaint.
    /// `time` is the bar time under the pointer if the host knows it.
    pub fn pointer_down(&mut self, x: f64, y: f64, time: Option<f64>) -> bool {
        let time = time.map(to_unix);
        self.route(InputEvent::PointerDown { x, y, time })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, time: Option<f64>) -> bool {
        let time = time.map(to_unix);
        self.route(InputEvent::PointerMove { x, y, time })
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, time: Option<f64>) -> bool {
        let time = time.map(to_unix);
        self.route(InputEvent::PointerUp { x, y, time })
    }

    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.route(InputEvent::key_down(key, modifiers))
    }

    pub fn key_up(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.route(InputEvent::key_up(key, modifiers))
    }

    // ─── Tools & editing ─────────────────────────────────────────────────

    /// Returns `false` for an unknown tool name.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(kind) => {
                self.router.set_tool(kind);
                true
            }
            None => {
                log::warn!("unknown tool `{name}`");
                false
            }
        }
    }

    pub fn tool_name(&self) -> String {
        self.router
            .tool_kind()
            .drawing_kind()
            .map_or("select", |k| k.name())
            .to_string()
    }

    /// Returns the undone step's description (`"create"`, `"move"`, ...).
    pub fn undo(&mut self) -> Option<String> {
        self.router.undo()
    }

    pub fn redo(&mut self) -> Option<String> {
        self.router.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.router.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.router.can_redo()
    }

    /// Returns how many drawings were deleted.
    pub fn delete_selected(&mut self) -> usize {
        self.router.delete_selection().len()
    }

    pub fn cancel(&mut self) -> bool {
        self.router.cancel()
    }

    /// Call before the host tears the chart down or switches context.
    pub fn detach(&mut self) {
        self.router.detach();
    }

    pub fn cursor(&self) -> String {
        self.router.cursor().as_css().to_string()
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Everything the host needs to paint one frame.
    pub fn scene_json(&self) -> String {
        to_json(&build_scene(&self.router, &self.viewport))
    }

    pub fn handles_json(&self) -> String {
        to_json(&build_scene(&self.router, &self.viewport).handles)
    }

    /// Persistable snapshots of every finished drawing.
    pub fn snapshots_json(&self) -> String {
        to_json(&self.router.board().snapshots())
    }

    // ─── Persistence & sync ──────────────────────────────────────────────

    /// Load drawings saved by `snapshots_json`. Returns how many loaded;
    /// individual bad entries are skipped.
    pub fn load_snapshots_json(&mut self, json: &str) -> Result<usize, JsValue> {
        let snapshots: Vec<DrawingSnapshot> = serde_json::from_str(json).map_err(js_err)?;
        Ok(self.router.board_mut().load_snapshots(&snapshots))
    }

    /// Apply a server push (`chart_drawing_received`, `chart_drawing_updated`,
    /// `chart_drawing_deleted`). Returns the affected id, or `undefined` when
    /// the event was for another symbol or had nothing to remove.
    pub fn apply_server_event(&mut self, event: &str, json: &str) -> Result<Option<String>, JsValue> {
        let message = SyncMessage::from_event(event, json).map_err(js_err)?;
        self.apply_sync(&message)
    }

    /// Apply one undelivered-command record replayed after reconnect.
    pub fn apply_undelivered(&mut self, json: &str) -> Result<Option<String>, JsValue> {
        let message = SyncMessage::from_undelivered(json).map_err(js_err)?;
        self.apply_sync(&message)
    }

    /// Deliver commits to `callback(json)` as they happen instead of
    /// queueing them for `drain_commits_json`.
    pub fn set_on_commit(&mut self, callback: js_sys::Function) {
        self.router.board_mut().set_on_commit(move |event| {
            let json = to_json(event);
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                log::error!("commit callback threw: {e:?}");
            }
        });
    }

    /// Commits queued since the last drain, as a JSON array.
    pub fn drain_commits_json(&mut self) -> String {
        to_json(&self.router.board_mut().drain_commits())
    }
}

impl TdChart {
    fn route(&mut self, event: InputEvent) -> bool {
        self.router.handle(&event, &self.viewport)
    }

    fn apply_sync(&mut self, message: &SyncMessage) -> Result<Option<String>, JsValue> {
        let id = self.router.board_mut().apply_sync(message).map_err(js_err)?;
        Ok(id.map(|id| id.as_str().to_string()))
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

pub fn parse_series(json: &str) -> Result<BarSeries, TdError> {
    let bars: Vec<Bar> = serde_json::from_str(json)?;
    BarSeries::new(bars)
}

fn to_unix(time: f64) -> i64 {
    time.round() as i64
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("serialize failed: {e}");
        "null".to_string()
    })
}

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Route panics and `log` records to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Trade Draft WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&console::LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Log, Metadata, Record};

    pub static LOGGER: ConsoleLogger = ConsoleLogger;

    pub struct ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let msg: wasm_bindgen::JsValue = format!("[{}] {}", record.target(), record.args()).into();
            match record.level() {
                Level::Error => web_sys::console::error_1(&msg),
                Level::Warn => web_sys::console::warn_1(&msg),
                _ => web_sys::console::log_1(&msg),
            }
        }

        fn flush(&self) {}
    }
}
