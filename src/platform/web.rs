//! JS-facing game handle
//!
//! The page owns the canvas, audio and network. It calls `frame` from
//! `requestAnimationFrame`, draws the returned JSON snapshot, posts any pending
//! submission and reports the HTTP outcome back.

use wasm_bindgen::prelude::*;

use super::storage::LocalStorageStore;
use crate::game::GameContext;
use crate::settings::Settings;
use crate::submission::{SubmissionResponse, SubmitError};
use crate::tuning::Tuning;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    ctx: GameContext<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebGame {
    /// `tuning_json` may override any subset of the balance table
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<WebGame, JsValue> {
        super::init_logging();
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(js_error)?,
            None => Tuning::default(),
        };
        let store = LocalStorageStore::open().map_err(js_error)?;
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64 ^ js_sys::Date::now() as u64;
        log::info!("Sniffy Flight starting...");
        Ok(Self {
            ctx: GameContext::new(store, tuning, seed),
        })
    }

    /// Advance to `now_ms` and return the frame snapshot as JSON
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let snapshot = self.ctx.frame(now_ms);
        serde_json::to_string(&snapshot).map_err(js_error)
    }

    /// Pointer/key press: flaps during a run, starts one from the menu,
    /// acknowledges a presentation otherwise
    pub fn press(&mut self) -> bool {
        if self.ctx.is_running() {
            self.ctx.flap()
        } else if self.ctx.can_start_run() {
            self.ctx.start_run()
        } else {
            self.ctx.acknowledge()
        }
    }

    pub fn start_run(&mut self) -> bool {
        self.ctx.start_run()
    }

    pub fn acknowledge(&mut self) -> bool {
        self.ctx.acknowledge()
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.ctx.set_autopilot(enabled);
    }

    /// Pending submission body (JSON), handed out once
    pub fn take_submission_request(&mut self) -> Option<String> {
        let request = self.ctx.take_submission_request()?;
        match serde_json::to_string(&request) {
            Ok(json) => Some(json),
            Err(err) => {
                log::warn!("Could not encode submission: {}", err);
                self.ctx.resolve_submission(Err(SubmitError::Malformed(err)));
                None
            }
        }
    }

    /// HTTP reply to the submission
    pub fn resolve_submission(&mut self, status: u16, body: &str) -> bool {
        let result = SubmissionResponse::from_http(status, body);
        self.ctx.resolve_submission(result)
    }

    /// Network failure before any reply arrived
    pub fn fail_submission(&mut self, reason: String) -> bool {
        self.ctx.resolve_submission(Err(SubmitError::Network(reason)))
    }

    /// Menu cosmetic picker; returns the selected key
    pub fn cycle_cosmetic(&mut self, forward: bool) -> String {
        self.ctx.cycle_cosmetic(forward).key().to_string()
    }

    pub fn settings(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.ctx.settings()).map_err(js_error)
    }

    pub fn set_settings(&mut self, json: &str) -> Result<(), JsValue> {
        let settings: Settings = serde_json::from_str(json).map_err(js_error)?;
        self.ctx.update_settings(settings);
        Ok(())
    }
}
