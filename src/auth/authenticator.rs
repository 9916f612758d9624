//! Authenticator implementation
//!
//! Handles applying authentication to requests.

use crate::config::SourceConfig;
use reqwest::RequestBuilder;

/// Header carrying the Agora app id
pub const APP_ID_HEADER: &str = "x-agora-appid";

/// Header carrying the Agora customer id
pub const CUSTOMER_ID_HEADER: &str = "x-agora-customerid";

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Agora customer credentials
    Agora {
        /// App the data belongs to
        app_id: String,
        /// Customer id (Basic auth username)
        customer_id: String,
        /// Customer secret (Basic auth password)
        customer_secret: String,
    },
}

impl AuthConfig {
    /// Build Agora credentials from a validated config
    pub fn agora(config: &SourceConfig) -> Self {
        Self::Agora {
            app_id: config.app_id.clone(),
            customer_id: config.customer_id.clone(),
            customer_secret: config.customer_secret.clone(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Agora {
                app_id,
                customer_id,
                ..
            } => f
                .debug_struct("Agora")
                .field("app_id", app_id)
                .field("customer_id", customer_id)
                .field("customer_secret", &"***")
                .finish(),
        }
    }
}

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,

            AuthConfig::Agora {
                app_id,
                customer_id,
                customer_secret,
            } => req
                .header(APP_ID_HEADER, app_id.as_str())
                .header(CUSTOMER_ID_HEADER, customer_id.as_str())
                .basic_auth(customer_id, Some(customer_secret)),
        }
    }

    /// Whether any credentials are attached
    pub fn is_configured(&self) -> bool {
        !matches!(self.config, AuthConfig::None)
    }
}
