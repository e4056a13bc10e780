use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to read reference table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reference table is empty, expected a header row")]
    EmptyTable,

    #[error("Reference table header has no recognised column: {header}")]
    NoKnownColumns { header: String },

    #[error("Unable to compile lexicon pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("Invalid learning snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    /// Load errors are the ones raised while reading a reference table and building from it
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::EmptyTable | Error::NoKnownColumns { .. } | Error::Pattern(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
