use thiserror::Error;

/// Errors raised while walking an MSK event batch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("event has no `records` mapping")]
    MissingRecords,

    #[error("partition '{partition}' does not hold a list of records")]
    MalformedPartition { partition: String },

    #[error("record {index} of partition '{partition}' has no `value` field")]
    MissingValue { partition: String, index: usize },

    #[error("record {index} of partition '{partition}' is not valid base64: {source}")]
    Decode {
        partition: String,
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("record {index} of partition '{partition}' is not valid UTF-8: {source}")]
    Utf8 {
        partition: String,
        index: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
