//! Client configuration: endpoint, credentials and timeouts.
//!
//! # Design
//! The endpoint URL is assembled once, with credentials and the output
//! format embedded as query parameters. Every request starts from that URL
//! and only appends to it.

use std::time::Duration;

use crate::error::ApiError;
use crate::params::urlencode;

/// Default read timeout for a whole call.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Path of the form-encoded endpoint below the account URL.
pub const DEFAULT_API_PATH: &str = "/admin/api.php";
/// Response format requested from the server.
pub const OUTPUT_FORMAT: &str = "json";

/// How the client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    UserPass { user: String, pass: String },
}

impl Credentials {
    fn query(&self) -> String {
        match self {
            Credentials::ApiKey(key) => format!("api_key={}", urlencode(key)),
            Credentials::UserPass { user, pass } => {
                format!("api_user={}&api_pass={}", urlencode(user), urlencode(pass))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    api_path: String,
    credentials: Credentials,
    pub(crate) read_timeout: Duration,
    pub(crate) connect_timeout: Duration,
    send_empty_expect: bool,
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Build a configuration from `FORMAPI_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let url = std::env::var("FORMAPI_URL")
            .map_err(|_| ApiError::Configuration("FORMAPI_URL is not set".to_string()))?;
        let mut builder = ClientConfigBuilder::new(url);

        if let Ok(key) = std::env::var("FORMAPI_API_KEY") {
            builder = builder.api_key(key);
        } else if let (Ok(user), Ok(pass)) = (
            std::env::var("FORMAPI_API_USER"),
            std::env::var("FORMAPI_API_PASS"),
        ) {
            builder = builder.user_pass(user, pass);
        }
        if let Some(secs) = env_secs("FORMAPI_TIMEOUT_SECS")? {
            builder = builder.read_timeout(secs);
        }
        if let Some(secs) = env_secs("FORMAPI_CONNECT_TIMEOUT_SECS")? {
            builder = builder.connect_timeout(secs);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whether body-carrying requests send an empty `Expect` header.
    pub fn send_empty_expect(&self) -> bool {
        self.send_empty_expect
    }

    /// Endpoint URL with credentials and output format in the query string.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}{}?{}&api_output={OUTPUT_FORMAT}",
            self.base_url,
            self.api_path,
            self.credentials.query()
        )
    }

    /// Endpoint URL addressing a single remote action.
    pub fn action_url(&self, action: &str) -> String {
        format!("{}&api_action={}", self.endpoint_url(), urlencode(action))
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>, ApiError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| ApiError::Configuration(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    api_path: String,
    credentials: Option<Credentials>,
    read_timeout: Duration,
    connect_timeout: Duration,
    send_empty_expect: bool,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            credentials: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            send_empty_expect: true,
        }
    }

    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::ApiKey(key.into()));
        self
    }

    #[must_use]
    pub fn user_pass(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::UserPass {
            user: user.into(),
            pass: pass.into(),
        });
        self
    }

    #[must_use]
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = path.into();
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Toggle the empty `Expect` header some legacy servers need to avoid
    /// stalling on `100-continue`.
    #[must_use]
    pub fn send_empty_expect(mut self, enabled: bool) -> Self {
        self.send_empty_expect = enabled;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ApiError> {
        if self.base_url.is_empty() {
            return Err(ApiError::Configuration("base URL is empty".to_string()));
        }
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::Configuration("no API credentials supplied".to_string()))?;
        Ok(ClientConfig {
            base_url: self.base_url,
            api_path: self.api_path,
            credentials,
            read_timeout: self.read_timeout,
            connect_timeout: self.connect_timeout,
            send_empty_expect: self.send_empty_expect,
        })
    }
}
