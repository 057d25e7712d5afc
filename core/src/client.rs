//! Stateless request builder and response parser for the Clarifai v1 API.
//!
//! # Design
//! `ClarifaiClient` holds only the versioned base URL. Every operation is
//! split into a `build_*` method that validates input and produces an
//! `HttpRequest`, and a `parse_*` method that decodes the raw response body.
//! The convenience methods (`info`, `tag`, `video_tag`, `feedback`) glue the
//! two halves together around exactly one `Transport::send` call.
//!
//! A non-`OK` `status_code` in an otherwise well-formed body is returned as
//! data, not as an error.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{Endpoint, HttpRequest};
use crate::transport::Transport;
use crate::types::{
    FeedbackForm, FeedbackResponse, ImageTagResponse, InfoResponse, TagRequest, VideoTagResponse,
    STATUS_OK,
};

/// Synchronous, stateless client for the Clarifai v1 API.
#[derive(Debug, Clone)]
pub struct ClarifaiClient {
    base_url: String,
}

impl ClarifaiClient {
    /// `base_url` includes the API version, e.g. `https://api.clarifai.com/v1`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_info(&self) -> HttpRequest {
        HttpRequest::get(Endpoint::Info, &self.base_url)
    }

    /// Image and video tagging share this request; only decoding differs.
    pub fn build_tag(&self, request: &TagRequest) -> Result<HttpRequest> {
        request.validate()?;
        self.post_json(Endpoint::Tag, request)
    }

    pub fn build_feedback(&self, form: &FeedbackForm) -> Result<HttpRequest> {
        form.validate()?;
        self.post_json(Endpoint::Feedback, form)
    }

    fn post_json<T: Serialize>(&self, endpoint: Endpoint, payload: &T) -> Result<HttpRequest> {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialization)?;
        tracing::debug!(%endpoint, bytes = body.len(), "built request");
        Ok(HttpRequest::post_json(endpoint, &self.base_url, body))
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_info(&self, body: &[u8]) -> Result<InfoResponse> {
        let info: InfoResponse = decode(body, "info")?;
        warn_on_status(Endpoint::Info, &info.status_code, &info.status_message);
        Ok(info)
    }

    pub fn parse_image_tag(&self, body: &[u8]) -> Result<ImageTagResponse> {
        let tags: ImageTagResponse = decode(body, "image tag")?;
        warn_on_status(Endpoint::Tag, &tags.status_code, &tags.status_message);
        Ok(tags)
    }

    pub fn parse_video_tag(&self, body: &[u8]) -> Result<VideoTagResponse> {
        let tags: VideoTagResponse = decode(body, "video tag")?;
        warn_on_status(Endpoint::Tag, &tags.status_code, &tags.status_message);
        Ok(tags)
    }

    pub fn parse_feedback(&self, body: &[u8]) -> Result<FeedbackResponse> {
        let feedback: FeedbackResponse = decode(body, "feedback")?;
        warn_on_status(Endpoint::Feedback, &feedback.status_code, &feedback.status_message);
        Ok(feedback)
    }

    // -----------------------------------------------------------------------
    // One-call operations
    // -----------------------------------------------------------------------

    /// Current service limits and defaults.
    pub fn info<T: Transport + ?Sized>(&self, transport: &T) -> Result<InfoResponse> {
        let body = transport.send(&self.build_info())?;
        self.parse_info(&body)
    }

    /// Tag one or more images. Same as [`ClarifaiClient::image_tag`].
    pub fn tag<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &TagRequest,
    ) -> Result<ImageTagResponse> {
        self.image_tag(transport, request)
    }

    pub fn image_tag<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &TagRequest,
    ) -> Result<ImageTagResponse> {
        let req = self.build_tag(request)?;
        let body = transport.send(&req)?;
        self.parse_image_tag(&body)
    }

    /// Tag one or more videos; each result holds one tag list per segment.
    pub fn video_tag<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &TagRequest,
    ) -> Result<VideoTagResponse> {
        let req = self.build_tag(request)?;
        let body = transport.send(&req)?;
        self.parse_video_tag(&body)
    }

    /// Send tag corrections and similarity hints for earlier results.
    pub fn feedback<T: Transport + ?Sized>(
        &self,
        transport: &T,
        form: &FeedbackForm,
    ) -> Result<FeedbackResponse> {
        let req = self.build_feedback(form)?;
        let body = transport.send(&req)?;
        self.parse_feedback(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8], context: &'static str) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ApiError::Decode { context, source })
}

fn warn_on_status(endpoint: Endpoint, status_code: &str, status_message: &str) {
    if status_code != STATUS_OK {
        tracing::warn!(%endpoint, status_code, status_message, "service reported non-OK status");
    }
}
