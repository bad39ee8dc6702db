use drydock_cloud::CloudError;
use drydock_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealError {
    #[error("Unknown healer: {0}")]
    UnknownHealer(String),

    /// A key the healer cannot run without. Aborts that healer only.
    #[error("Missing configuration key '{0}'")]
    ConfigurationMissing(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Healer {0} panicked")]
    Panicked(String),

    /// Another run of the same healer is still in progress.
    #[error("Healer {0} is already running")]
    Busy(String),

    #[error(transparent)]
    Provision(#[from] provision::Error),

    #[error(transparent)]
    Cloud(CloudError),
}

/// Connection and timeout failures surface as [`HealError::Network`].
impl From<CloudError> for HealError {
    fn from(e: CloudError) -> Self {
        if e.is_network() {
            Self::Network(e.to_string())
        } else {
            Self::Cloud(e)
        }
    }
}

impl From<ConfigError> for HealError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Missing(key) => Self::ConfigurationMissing(key.to_string()),
            other => Self::ConfigurationMissing(other.to_string()),
        }
    }
}

impl HealError {
    /// HTTP status for the trigger endpoints.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownHealer(_) | Self::Cloud(CloudError::NotFound(_)) => 404,
            Self::Busy(_) => 409,
            Self::Provision(e) => e.status_code(),
            _ => 500,
        }
    }
}

pub type Result<T, E = HealError> = std::result::Result<T, E>;
