//! Extraction mode and arbiter states.

use crate::error::{Error, Result};
use crate::pipeline::ChartResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which strategy extracts the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Vision-language model only; its failure is the caller's failure
    Vision,
    /// Computer-vision pipeline only
    #[default]
    Pipeline,
    /// Vision model first, pipeline when it fails
    Auto,
}

impl ExtractionMode {
    /// Lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Vision => "vision",
            ExtractionMode::Pipeline => "pipeline",
            ExtractionMode::Auto => "auto",
        }
    }

    /// Whether this mode may call the vision model.
    pub fn uses_vision(&self) -> bool {
        !matches!(self, ExtractionMode::Pipeline)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = Error;

    /// Parse a mode token; `llm` and `cv` are accepted as aliases.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::hybrid::ExtractionMode;
    ///
    /// assert_eq!("llm".parse::<ExtractionMode>().unwrap(), ExtractionMode::Vision);
    /// assert_eq!("CV".parse::<ExtractionMode>().unwrap(), ExtractionMode::Pipeline);
    /// assert!("magic".parse::<ExtractionMode>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vision" | "llm" => Ok(ExtractionMode::Vision),
            "pipeline" | "cv" => Ok(ExtractionMode::Pipeline),
            "auto" => Ok(ExtractionMode::Auto),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// State of one extraction request.
///
/// ```text
/// TryVision ──ok──────────────▶ Accept ──▶ Done
///     │
///     └──failed (auto)──▶ FallbackToPipeline ──▶ Done
/// ```
///
/// Pipeline mode starts directly in `FallbackToPipeline` without a reason,
/// so no fallback warning is emitted.
#[derive(Debug)]
pub enum ArbiterState {
    /// Ask the vision model
    TryVision,
    /// The vision result is usable
    Accept(Box<ChartResult>),
    /// Run the pipeline; `reason` is set when vision failed first
    FallbackToPipeline {
        /// Why the vision attempt was abandoned
        reason: Option<String>,
    },
    /// Final result
    Done(Box<ChartResult>),
}

impl ArbiterState {
    /// Starting state for a mode.
    pub fn initial(mode: ExtractionMode) -> Self {
        match mode {
            ExtractionMode::Vision | ExtractionMode::Auto => ArbiterState::TryVision,
            ExtractionMode::Pipeline => ArbiterState::FallbackToPipeline { reason: None },
        }
    }

    /// State after a vision attempt.
    ///
    /// In vision mode a failed attempt is returned as the error; in auto
    /// mode it turns into a fallback carrying the failure message.
    pub fn after_vision(mode: ExtractionMode, attempt: Result<ChartResult>) -> Result<Self> {
        match attempt {
            Ok(result) => Ok(ArbiterState::Accept(Box::new(result))),
            Err(e) if mode == ExtractionMode::Vision => Err(e),
            Err(e) => Ok(ArbiterState::FallbackToPipeline {
                reason: Some(e.to_string()),
            }),
        }
    }

    /// Short state name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ArbiterState::TryVision => "TryVision",
            ArbiterState::Accept(_) => "Accept",
            ArbiterState::FallbackToPipeline { .. } => "FallbackToPipeline",
            ArbiterState::Done(_) => "Done",
        }
    }
}
