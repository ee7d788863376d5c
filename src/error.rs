//! Error types for the chart extraction library.
//!
//! Stages below the orchestrator prefer to degrade (returning an
//! [`Outcome`](crate::outcome::Outcome) with a failure reason) over raising.
//! The variants here are what reaches the caller when no strategy could
//! produce a usable result, or when the request itself is malformed.

/// Result type alias for chart extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad error category, used by callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unreadable image or unrecognized request token
    Input,
    /// Insufficient calibration or missing backend credential
    Configuration,
    /// Network or authentication failure on a remote call
    ExternalService,
    /// Unparsable structured response
    Parse,
    /// Every available strategy failed to produce data
    Extraction,
}

/// Error types that can occur during chart extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image could not be decoded or is empty
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Crop rectangle outside the image or empty
    #[error("Invalid crop box: {0}")]
    InvalidCrop(String),

    /// Unrecognized chart type token
    #[error("Unknown chart type: '{0}' (expected scatter, line or bar)")]
    UnknownChartType(String),

    /// Unrecognized extraction mode token
    #[error("Unknown extraction mode: '{0}' (expected vision, pipeline or auto)")]
    UnknownMode(String),

    /// Unrecognized axis scale token
    #[error("Unknown axis scale: '{0}' (expected linear or log)")]
    UnknownScale(String),

    /// Manual calibration without exactly two points on an axis
    #[error("Need exactly 2 calibration points for {axis}-axis, got {found}")]
    InsufficientCalibration {
        /// Axis name ("x" or "y")
        axis: &'static str,
        /// Number of points supplied
        found: usize,
    },

    /// Manual calibration whose two points cannot define a mapping
    #[error("Calibration points for {axis}-axis are degenerate: {reason}")]
    DegenerateCalibration {
        /// Axis name ("x" or "y")
        axis: &'static str,
        /// What is wrong with the points
        reason: String,
    },

    /// A required backend credential is not configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// A required backend is not configured or not installed
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Network/auth failure on a remote OCR or vision call
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Unparsable structured response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Vision-only extraction returned an error marker or no data
    #[error("Vision extraction failed: {0}")]
    VisionFailed(String),

    /// No stage could produce a usable result
    #[error("No usable result: {0}")]
    NoUsableResult(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Category of this error in the extraction error taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidImage(_)
            | Error::InvalidCrop(_)
            | Error::UnknownChartType(_)
            | Error::UnknownMode(_)
            | Error::UnknownScale(_)
            | Error::Image(_) => ErrorCategory::Input,
            Error::InsufficientCalibration { .. }
            | Error::DegenerateCalibration { .. }
            | Error::MissingCredential(_)
            | Error::BackendUnavailable(_) => ErrorCategory::Configuration,
            Error::ExternalService(_) | Error::Io(_) => ErrorCategory::ExternalService,
            Error::Parse(_) | Error::Json(_) => ErrorCategory::Parse,
            Error::VisionFailed(_) | Error::NoUsableResult(_) => ErrorCategory::Extraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_calibration_message() {
        let err = Error::InsufficientCalibration { axis: "x", found: 1 };
        let msg = format!("{}", err);
        assert!(msg.contains("x-axis"));
        assert!(msg.contains("got 1"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_unknown_chart_type_is_input_error() {
        let err = Error::UnknownChartType("pie".to_string());
        assert!(format!("{}", err).contains("'pie'"));
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.category(), ErrorCategory::ExternalService);
    }

    #[test]
    fn test_json_error_is_parse_category() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Parse);
    }
}
