use axum::http::StatusCode;
use thiserror::Error;

/// Failure modes of one ingestion attempt.
///
/// Client errors (4xx) are never retried by the service; server errors (5xx)
/// leave retrying to the caller. Internal detail is logged, never surfaced:
/// [`client_message`](Error::client_message) is the only text that reaches
/// the response body.
#[derive(Debug, Error)]
pub enum Error {
    /// Body was not valid JSON.
    #[error("invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    /// `email` or `message` missing or empty after trimming.
    #[error("email or message missing")]
    MissingFields,

    /// Message exceeds the 1024 character limit.
    #[error("message too long: {0} characters")]
    MessageTooLong(usize),

    /// No origin identifier could be resolved for the request.
    #[error("unable to determine source ip")]
    OriginUnresolved,

    /// The origin has reached its submission limit for the window.
    #[error("rate limit exceeded for {origin}: {count} submissions in window")]
    RateLimited {
        /// The origin identifier.
        origin: String,
        /// Submissions counted inside the window.
        count: u32,
    },

    /// The rate-limit count query failed.
    #[error("failed to check rate limit: {0}")]
    RateLimitCheck(String),

    /// Persisting the record failed.
    #[error("failed to store message: {0}")]
    Persistence(String),

    /// Publishing the notification failed.
    #[error("failed to publish notification: {0}")]
    Publish(String),
}

impl Error {
    /// The HTTP status this failure maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_)
            | Self::MissingFields
            | Self::MessageTooLong(_)
            | Self::OriginUnresolved => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::RateLimitCheck(_) | Self::Persistence(_) | Self::Publish(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The generic message returned to the caller.
    #[must_use]
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "Invalid JSON body.",
            Self::MissingFields => "Both email and message are required.",
            Self::MessageTooLong(_) => "Message is too long. Maximum length is 1024 characters.",
            Self::OriginUnresolved => "Unable to determine source IP.",
            Self::RateLimited { .. } => "Rate limit exceeded. Please try again later.",
            Self::RateLimitCheck(_) => "Failed to check rate limit.",
            Self::Persistence(_) => "Failed to store message.",
            Self::Publish(_) => "Failed to publish notification.",
        }
    }
}
