//! Vision-language model access.
//!
//! The crate never opens network connections itself. Callers plug a
//! [`VisionChannel`] into [`ChartExtractor`](crate::hybrid::ChartExtractor);
//! the channel receives a fully built [`VisionRequest`] and returns the
//! model's text reply. Both whole-chart extraction ([`VisionExtractor`]) and
//! remote tick-label reading ([`RemoteOcr`](crate::ocr::RemoteOcr)) go
//! through it.

pub mod extractor;
pub mod response;

pub use extractor::{VisionExtraction, VisionExtractor, EXTRACTION_PROMPT};
pub use response::{extract_json_object, strip_code_fences};

use crate::error::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

/// Request/response channel to a vision-language service.
///
/// Implementations own transport, authentication and timeouts. A call
/// blocks until the service answers.
pub trait VisionChannel: Send + Sync {
    /// Send one request and return the text content of the reply.
    ///
    /// # Errors
    ///
    /// [`Error::ExternalService`](crate::Error::ExternalService) for network
    /// or authentication failures.
    fn complete(&self, request: &VisionRequest) -> Result<String>;
}

/// One chat request carrying a prompt and PNG images.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionRequest {
    /// Target model identifier
    pub model: String,
    /// Instruction text
    pub prompt: String,
    /// PNG-encoded images, in prompt order
    pub images: Vec<Vec<u8>>,
    /// Reply length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl VisionRequest {
    /// Create a request with no images.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: Vec::new(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Append a PNG image.
    pub fn with_image(mut self, png: Vec<u8>) -> Self {
        self.images.push(png);
        self
    }

    /// Set the reply length cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Chat-completions JSON body: one user message with a text part followed
    /// by one `image_url` part per image.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::vision::VisionRequest;
    ///
    /// let body = VisionRequest::new("pixtral-12b-2409", "Read the axis")
    ///     .with_image(vec![1, 2, 3])
    ///     .chat_body();
    /// let parts = &body["messages"][0]["content"];
    /// assert_eq!(parts[0]["type"], "text");
    /// assert_eq!(parts[1]["image_url"], "data:image/png;base64,AQID");
    /// ```
    pub fn chat_body(&self) -> Value {
        let mut content = vec![json!({ "type": "text", "text": self.prompt })];
        content.extend(
            self.images
                .iter()
                .map(|png| json!({ "type": "image_url", "image_url": png_data_uri(png) })),
        );

        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": self.max_tokens,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }
}

/// Base64 `data:` URI for PNG bytes.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}
