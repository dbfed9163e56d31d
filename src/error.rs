use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by media-query-manager.
///
/// Scanning and filtering never fail; only the edges that touch the
/// filesystem, the network or a watcher do.
#[derive(Debug, Error)]
pub enum MqmError {
    /// A document or config file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A config file was read but is not valid.
    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
    /// The file watcher could not be started.
    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, MqmError>;

/// Shorthand constructors.
impl MqmError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = MqmError::io(
            "styles/site.css",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let text = err.to_string();
        assert!(text.contains("styles/site.css"), "got: {text}");
        assert!(text.contains("missing"), "got: {text}");
    }

    #[test]
    fn config_error_display() {
        let err = MqmError::config("mqm.toml", "expected a table");
        assert_eq!(err.to_string(), "invalid config 'mqm.toml': expected a table");
    }
}
