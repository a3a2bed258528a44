//! CLI error type and exit codes.

use std::path::PathBuf;

use thiserror::Error;

use ctxprop_check::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read config '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode value graph '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// 2 = bad config or arguments, 3 = I/O or decoding failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigRead { .. } | CliError::Config { .. } => 2,
            CliError::Io { .. } | CliError::Decode { .. } | CliError::Render(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let config = CliError::Config {
            path: "c.json".into(),
            source: ConfigError::Invalid {
                reason: "directive must not be empty".into(),
            },
        };
        assert_eq!(config.exit_code(), 2);
        assert_eq!(
            config.to_string(),
            "config 'c.json': invalid config: directive must not be empty"
        );

        let io = CliError::Io {
            path: "g.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(io.exit_code(), 3);
    }
}
