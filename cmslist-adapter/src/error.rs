use thiserror::Error;

/// An item element lacks a structural marker the collector relies on.
///
/// Never fatal: the item is stored with empty properties instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("item markup is missing the `{0}` marker")]
    MissingMarker(String),
    #[error("item markup has an unreadable `{attribute}` value: {value}")]
    InvalidValue { attribute: String, value: String },
}

/// The product feed could not be read. Absorbed into an empty result at the boundary.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(String),
    #[error("feed responded with status {0}")]
    Status(u16),
    #[error("feed payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
