//! Best-effort stage results.
//!
//! Every detection and extraction stage returns an [`Outcome`]: the value it
//! managed to produce, a confidence clamped to `[0, 1]`, and an optional
//! reason describing why a fallback or degraded path was taken. The
//! orchestrator turns failure reasons into warnings instead of aborting.

use serde::{Deserialize, Serialize};

/// Clamp a confidence score to `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A stage result carrying a best-effort value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// The produced value (possibly a fallback)
    pub value: T,
    /// Heuristic confidence in `[0, 1]`
    pub confidence: f64,
    /// Why the stage degraded, if it did
    pub failure: Option<String>,
}

impl<T> Outcome<T> {
    /// A result produced by the primary strategy.
    pub fn ok(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
            failure: None,
        }
    }

    /// A result produced by a fallback, with the reason it was needed.
    pub fn degraded(value: T, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
            failure: Some(reason.into()),
        }
    }

    /// Whether a fallback or degraded path produced this value.
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    /// Transform the value, keeping confidence and failure reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            confidence: self.confidence,
            failure: self.failure,
        }
    }
}
