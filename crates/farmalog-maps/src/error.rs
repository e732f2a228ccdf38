use thiserror::Error;

/// Errors returned by the Maps web-service client.
#[derive(Debug, Error)]
pub enum MapsError {
    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status other than `OK` or `ZERO_RESULTS`
    /// (`REQUEST_DENIED`, `OVER_QUERY_LIMIT`, `INVALID_REQUEST`, ...).
    #[error("Maps API error {status} from {endpoint}: {message}")]
    Api {
        endpoint: &'static str,
        status: String,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Maps base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
