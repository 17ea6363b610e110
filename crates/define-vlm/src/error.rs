use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VlmError {
    #[error("failed to read options file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, VlmError>;
