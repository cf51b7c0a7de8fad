use std::path::PathBuf;
use thiserror::Error;

/// A failed remote call, or a client-side precondition that stopped one from
/// being made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
pub struct ClientError {
    pub message: String,
    pub status: Option<u16>,
    pub details: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: String::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot determine the home directory")]
    NoHome,
}

#[derive(Error, Debug)]
pub enum CirrusError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Unknown command: {}", display_command(.group, .name))]
    CommandNotFound {
        group: Option<String>,
        name: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_command(group: &Option<String>, name: &str) -> String {
    match group {
        Some(group) => format!("{} {}", group, name),
        None => name.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, CirrusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        assert_eq!(ClientError::new("Not Found").to_string(), "Not Found");
        assert_eq!(
            ClientError::new("Not Found").with_status(404).to_string(),
            "Not Found (404)"
        );
        let err: CirrusError = ClientError::new("boom").with_status(500).into();
        assert_eq!(err.to_string(), "boom (500)");
    }
}
