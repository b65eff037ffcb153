use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unknown data kind: {data_type}/{sub_type:?}")]
    UnknownDataKind {
        data_type: String,
        sub_type: Option<String>,
    },

    #[error("Cannot save: {errors} validation error(s) outstanding")]
    ValidationFailed { errors: usize },

    #[error("Persistence gateway error: {0}")]
    Gateway(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
