use std::path::PathBuf;

/// Errors produced while constructing a [`crate::StoreLocation`].
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("invalid location URI `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("local location must be an absolute path: {}", path.display())]
    RelativePath { path: PathBuf },
}
