use thiserror::Error;

/// Error kinds surfaced by the extraction pipeline.
///
/// Extractors reserve `Err` for real failures (network, signing, payload
/// shape); "content not found" style outcomes map to [`ExtractorError::NoMediaFound`]
/// so callers can turn them into a plain message instead of a crash.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("no url found in input")]
    NoUrlFound,
    #[error("unsupported link format: {0}")]
    UnsupportedLinkFormat(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("signature engine unavailable: {0}")]
    SignatureEngineUnavailable(String),
    #[error("platform requires a login cookie: {0}")]
    UpstreamAuthRequired(String),
    #[error("upstream request failed: {0}")]
    UpstreamRequestFailed(#[from] reqwest::Error),
    #[error("upstream payload unparseable: {0}")]
    UpstreamPayloadUnparseable(String),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("no media found")]
    NoMediaFound,
    #[error("other: {0}")]
    Other(String),
}

impl From<crate::js_engine::JsError> for ExtractorError {
    fn from(err: crate::js_engine::JsError) -> Self {
        ExtractorError::SignatureEngineUnavailable(err.to_string())
    }
}
