//! Shared leaderboard
//!
//! Entries live on the backend (`GET`/`POST {server}/api/highscores`). This
//! module holds the last fetched list, formats it for display and talks to
//! the backend on the web. Failures never touch the simulation; they keep the
//! previous list and surface a message instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the list is empty
pub const EMPTY_MESSAGE: &str = "No high scores yet!";
/// Shown when the list could not be fetched
pub const LOAD_ERROR_MESSAGE: &str = "Error loading scores. Check backend logs and CORS!";
/// Shown when a submission failed
pub const SUBMIT_ERROR_MESSAGE: &str = "Failed to submit high score.";
/// Longest name accepted for submission
pub const MAX_NAME_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Please enter your name!")]
    EmptyName,
    #[error("HTTP error! status: {status}, message: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid leaderboard response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

/// Ordered leaderboard, highest score first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from backend entries; ties keep the backend's order
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display lines, `"{rank}. {name}: {score}"`
    pub fn lines(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![EMPTY_MESSAGE.to_string()];
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}: {}", i + 1, e.name, e.score))
            .collect()
    }
}

/// Trim and check a player name before submitting
pub fn validate_name(name: &str) -> Result<String, LeaderboardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LeaderboardError::EmptyName);
    }
    Ok(name.chars().take(MAX_NAME_LEN).collect())
}

/// Build the POST body for a finished run
pub fn submission(name: &str, score: u64) -> Result<LeaderboardEntry, LeaderboardError> {
    Ok(LeaderboardEntry {
        name: validate_name(name)?,
        score,
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Turn a backend response into a result
///
/// Non-success statuses carry the backend's `message` if it sent one.
pub fn check_status(status: u16, body: &str) -> Result<(), LeaderboardError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string());
    Err(LeaderboardError::Status { status, message })
}

/// Parse a `GET` response
pub fn parse_list(status: u16, body: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    check_status(status, body)?;
    Ok(serde_json::from_str(body)?)
}

/// What the leaderboard panel shows
#[derive(Debug, Clone, Default)]
pub struct LeaderboardView {
    board: Leaderboard,
    message: Option<String>,
}

impl LeaderboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    /// User-visible error, if the last operation failed
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Apply the outcome of a fetch (or a relay push)
    pub fn apply_fetch(&mut self, result: Result<Vec<LeaderboardEntry>, LeaderboardError>) {
        match result {
            Ok(entries) => {
                self.board = Leaderboard::from_entries(entries);
                self.message = None;
            }
            Err(e) => {
                log::error!("Error fetching high scores: {}", e);
                self.message = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Apply the outcome of a submission; returns true on success
    pub fn apply_submit(&mut self, result: Result<(), LeaderboardError>) -> bool {
        match result {
            Ok(()) => {
                self.message = None;
                true
            }
            Err(LeaderboardError::EmptyName) => {
                self.message = Some(LeaderboardError::EmptyName.to_string());
                false
            }
            Err(e) => {
                log::error!("Error submitting high score: {}", e);
                self.message = Some(SUBMIT_ERROR_MESSAGE.to_string());
                false
            }
        }
    }

    /// Lines to render: the error message (if any) above the list
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(message) = &self.message {
            lines.push(message.clone());
        }
        lines.extend(self.board.lines());
        lines
    }
}

/// Backend client (WASM only)
#[cfg(target_arch = "wasm32")]
pub mod client {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{LeaderboardEntry, LeaderboardError, check_status, parse_list};

    fn js_err(e: JsValue) -> LeaderboardError {
        LeaderboardError::Network(format!("{:?}", e))
    }

    async fn send(url: &str, init: &RequestInit) -> Result<(u16, String), LeaderboardError> {
        let request = Request::new_with_str_and_init(url, init).map_err(js_err)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_err)?;

        let window = web_sys::window()
            .ok_or_else(|| LeaderboardError::Network("no window".to_string()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        let text = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?
            .as_string()
            .unwrap_or_default();
        Ok((response.status(), text))
    }

    /// `GET` the current list
    pub async fn fetch(url: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let init = RequestInit::new();
        init.set_method("GET");
        init.set_mode(RequestMode::Cors);
        let (status, body) = send(url, &init).await?;
        parse_list(status, &body)
    }

    /// `POST` a finished run
    pub async fn submit(url: &str, entry: &LeaderboardEntry) -> Result<(), LeaderboardError> {
        let body = serde_json::to_string(entry)?;
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(&body));
        let (status, body) = send(url, &init).await?;
        check_status(status, &body)?;
        log::info!("Score submitted: {}", body);
        Ok(())
    }
}
