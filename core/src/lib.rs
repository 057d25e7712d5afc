//! Synchronous binding for the Clarifai v1 tagging API.
//!
//! # Overview
//! Typed requests and responses for `/info/`, `/tag/` and `/feedback/`, with
//! the two request preconditions checked before anything is sent. Network I/O
//! goes through the [`Transport`] trait; [`UreqTransport`] is a blocking
//! implementation that handles the client-credentials token.
//!
//! # Design
//! - `ClarifaiClient` is stateless; it holds only the versioned base URL.
//! - Each operation is split into `build_*` (validate, produce request) and
//!   `parse_*` (decode body), so callers may run the HTTP exchange themselves.
//! - Document ids are arbitrary-precision integers ([`DocId`]).
//!
//! ```no_run
//! use clarifai_core::{ClarifaiClient, ClientConfig, TagRequest, UreqTransport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = ClarifaiClient::from_config(&config);
//! let transport = UreqTransport::new(&config);
//!
//! let tags = client.tag(&transport, &TagRequest::new(["https://samples.clarifai.com/metro-north.jpg"]))?;
//! for result in &tags.results {
//!     println!("{}: {:?}", result.url, result.result.tag.classes);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ClarifaiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, Result, TransportError, ValidationError};
pub use http::{Endpoint, HttpMethod, HttpRequest};
pub use transport::{Transport, UreqTransport};
pub use types::{
    DocId, FeedbackForm, FeedbackResponse, ImageTag, ImageTagResponse, ImageTagResult,
    InfoResponse, InfoResults, TagMeta, TagMetaInfo, TagOutput, TagRequest, TagResponse,
    TagResult, TokenResponse, VideoTag, VideoTagResponse, VideoTagResult, STATUS_OK,
};
