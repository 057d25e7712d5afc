//! Transport seam and the blocking `ureq` implementation.
//!
//! # Design
//! `ClarifaiClient` hands each `HttpRequest` to a `Transport` and gets the raw
//! response body back. Everything stateful about talking to the service lives
//! on this side of the seam: the bearer token, the one-shot re-authentication
//! after a 401, and the throttle flag raised by a 429. The binding layer
//! itself never retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{Endpoint, HttpMethod, HttpRequest};
use crate::types::TokenResponse;

const AUTHORIZATION: &str = "authorization";

/// Executes a request and returns the body of a successful response.
///
/// Non-success HTTP statuses must be reported as `TransportError`s; the
/// caller only ever sees bodies that came with a 2xx status.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError>;
}

/// How a finished exchange should be treated.
#[derive(Debug)]
enum Outcome {
    Body(Vec<u8>),
    Unauthorized,
    Failed(TransportError),
}

fn classify(status: u16, body: Vec<u8>) -> Outcome {
    match status {
        200 | 201 => return Outcome::Body(body),
        401 => return Outcome::Unauthorized,
        429 => return Outcome::Failed(TransportError::Throttled),
        _ => {}
    }
    let body = String::from_utf8_lossy(&body).into_owned();
    Outcome::Failed(match status {
        400 => TransportError::BadRequest { body },
        500 => TransportError::Server { body },
        _ => TransportError::UnexpectedStatus { status, body },
    })
}

/// Blocking HTTP transport with client-credentials authentication.
///
/// Safe to share between threads: the token sits behind a `Mutex` and the
/// throttle flag is atomic.
pub struct UreqTransport {
    agent: ureq::Agent,
    token_url: String,
    client_id: String,
    client_secret: String,
    access_token: Mutex<Option<String>>,
    throttled: AtomicBool,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent, config)
    }

    pub fn with_agent(agent: ureq::Agent, config: &ClientConfig) -> Self {
        Self {
            agent,
            token_url: Endpoint::Token.url(&config.base_url()),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            access_token: Mutex::new(config.access_token.clone()),
            throttled: AtomicBool::new(false),
        }
    }

    /// True after a 429 until the next successful call.
    pub fn is_throttled(&self) -> bool {
        self.throttled.load(Ordering::Relaxed)
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests a fresh token with the client credentials and stores it.
    pub fn refresh_token(&self) -> Result<String, TransportError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let mut response = self
            .agent
            .post(&self.token_url)
            .send_form(form)
            .map_err(|source| TransportError::network(format!("POST {}", self.token_url), source))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|source| {
                TransportError::network(format!("reading body of POST {}", self.token_url), source)
            })?;

        if !(200..300).contains(&status) {
            return Err(TransportError::Token(format!(
                "HTTP {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| TransportError::Token(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(TransportError::Token("response carried no access_token".into()));
        }

        tracing::info!(expires_in = token.expires_in, scope = %token.scope, "obtained access token");
        *self.access_token.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(token.access_token.clone());
        Ok(token.access_token)
    }

    fn send_once(&self, request: &HttpRequest, retried: bool) -> Result<Vec<u8>, TransportError> {
        let token = match self.access_token() {
            Some(token) => token,
            None => self.refresh_token()?,
        };
        let (status, body) = self.execute(request, &token)?;
        tracing::debug!(method = %request.method, url = %request.url, status, "response received");

        match classify(status, body) {
            Outcome::Body(body) => {
                self.throttled.store(false, Ordering::Relaxed);
                Ok(body)
            }
            Outcome::Unauthorized if !retried => {
                tracing::info!(endpoint = %request.endpoint, "access token rejected, refreshing");
                self.refresh_token()?;
                self.send_once(request, true)
            }
            Outcome::Unauthorized => Err(TransportError::TokenInvalid),
            Outcome::Failed(err) => {
                if matches!(err, TransportError::Throttled) {
                    tracing::warn!(endpoint = %request.endpoint, "throttled by service");
                    self.throttled.store(true, Ordering::Relaxed);
                }
                Err(err)
            }
        }
    }

    fn execute(&self, request: &HttpRequest, token: &str) -> Result<(u16, Vec<u8>), TransportError> {
        let bearer = format!("Bearer {token}");
        let network = |source: ureq::Error| {
            TransportError::network(format!("{} {}", request.method, request.url), source)
        };

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&request.url).header(AUTHORIZATION, &bearer);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&request.url).header(AUTHORIZATION, &bearer);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec().map_err(network)?;
        Ok((status, body))
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        self.send_once(request, false)
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("throttled", &self.is_throttled())
            .finish_non_exhaustive()
    }
}
