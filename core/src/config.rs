//! Client configuration: where the API lives and which credentials to use.

use crate::error::ConfigError;

pub const DEFAULT_API_ROOT: &str = "https://api.clarifai.com";
pub const DEFAULT_API_VERSION: &str = "v1";

pub const ENV_CLIENT_ID: &str = "CLARIFAI_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CLARIFAI_CLIENT_SECRET";
pub const ENV_API_ROOT: &str = "CLARIFAI_API_ROOT";
pub const ENV_ACCESS_TOKEN: &str = "CLARIFAI_ACCESS_TOKEN";

/// Connection settings shared by `ClarifaiClient` and `UreqTransport`.
///
/// `access_token` is optional; when absent the transport requests one with the
/// client credentials before its first call.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_root: String,
    pub api_version: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
        }
    }

    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// `{api_root}/{api_version}`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Reads `CLARIFAI_CLIENT_ID` and `CLARIFAI_CLIENT_SECRET` (required) plus
    /// `CLARIFAI_API_ROOT` and `CLARIFAI_ACCESS_TOKEN` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key| lookup(key).filter(|value: &String| !value.is_empty());

        let client_id = get(ENV_CLIENT_ID).ok_or(ConfigError::MissingVar(ENV_CLIENT_ID))?;
        let client_secret =
            get(ENV_CLIENT_SECRET).ok_or(ConfigError::MissingVar(ENV_CLIENT_SECRET))?;

        let mut config = Self::new(client_id, client_secret);
        if let Some(root) = get(ENV_API_ROOT) {
            config.api_root = root;
        }
        config.access_token = get(ENV_ACCESS_TOKEN);
        Ok(config)
    }
}

// Keep the secret and token out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_root", &self.api_root)
            .field("api_version", &self.api_version)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
