//! One-shot status messages carried across a redirect.
//!
//! A handler loads the pending [`Feedback`] from the request, pushes or takes
//! messages, and writes it back with the response. Taking a category removes
//! it: the next render sees nothing.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedbackKind {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
    /// Failures reported by an external provider during a handshake.
    #[serde(rename = "strategyError")]
    StrategyError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feedback {
    messages: BTreeMap<FeedbackKind, Vec<String>>,
    changed: bool,
}

/// Everything that was pending, grouped for templates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub success: Vec<String>,
    pub error: Vec<String>,
    #[serde(rename = "strategyError")]
    pub strategy_error: Vec<String>,
}

impl FeedbackView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty() && self.strategy_error.is_empty()
    }
}

impl Feedback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: FeedbackKind, message: impl Into<String>) {
        self.messages.entry(kind).or_default().push(message.into());
        self.changed = true;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(FeedbackKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(FeedbackKind::Error, message);
    }

    pub fn strategy_error(&mut self, message: impl Into<String>) {
        self.push(FeedbackKind::StrategyError, message);
    }

    /// Remove and return the messages of one category.
    pub fn take(&mut self, kind: FeedbackKind) -> Vec<String> {
        let taken = self.messages.remove(&kind).unwrap_or_default();
        if !taken.is_empty() {
            self.changed = true;
        }
        taken
    }

    /// Remove and return every pending message.
    pub fn take_all(&mut self) -> FeedbackView {
        FeedbackView {
            success: self.take(FeedbackKind::Success),
            error: self.take(FeedbackKind::Error),
            strategy_error: self.take(FeedbackKind::StrategyError),
        }
    }

    /// Drop everything pending without reading it.
    pub fn clear(&mut self) {
        if !self.messages.is_empty() {
            self.messages.clear();
            self.changed = true;
        }
    }

    #[must_use]
    pub fn peek(&self, kind: FeedbackKind) -> &[String] {
        self.messages.get(&kind).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when the response must rewrite (or clear) the carrier cookie.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Encode pending messages as base64url JSON. `None` when nothing is pending.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        let json = serde_json::to_vec(&self.messages).ok()?;
        Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a carrier value. Anything unreadable decodes to empty feedback;
    /// the next response then clears the cookie.
    #[must_use]
    pub fn decode(value: &str) -> Self {
        let messages = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(value.trim())
            .ok()
            .and_then(|json| {
                serde_json::from_slice::<BTreeMap<FeedbackKind, Vec<String>>>(&json).ok()
            });
        match messages {
            Some(messages) => Self {
                messages,
                changed: false,
            },
            None => Self {
                messages: BTreeMap::new(),
                changed: true,
            },
        }
    }
}
