use thiserror::Error;

/// Errors returned by audio decoding and analysis.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("audio: decode error: {0}")]
    Decode(String),

    #[error("audio: invalid config: {0}")]
    InvalidConfig(String),
}
