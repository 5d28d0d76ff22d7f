use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal or file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised while talking to the backend.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The log sink could not be set up.
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Errors produced by the HTTP and GraphQL transport.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}")]
    Http { status: u16, body: String },

    /// The response body was not the JSON we expected.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The GraphQL response carried errors.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The backend rejected the access token.
    #[error("Not authenticated")]
    Unauthenticated,

    /// No session is available to authorize the request.
    #[error("Not signed in")]
    NotSignedIn,

    /// A configured endpoint could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the refresh endpoint rejected the refresh token outright.
    pub fn is_invalid_refresh_token(&self) -> bool {
        matches!(self, FetchError::Http { status: 400, .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn fetch_error_is_transparent_in_app_error() {
        let err: AppError = FetchError::NotSignedIn.into();
        assert_eq!(err.to_string(), "Not signed in");
    }

    #[test]
    fn graphql_error_joins_messages() {
        let err = FetchError::GraphQl(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "GraphQL error: first; second");
    }

    #[test]
    fn only_http_400_is_invalid_refresh_token() {
        let bad_token = FetchError::Http {
            status: 400,
            body: String::new(),
        };
        let server_down = FetchError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(bad_token.is_invalid_refresh_token());
        assert!(!server_down.is_invalid_refresh_token());
        assert!(!FetchError::Network("offline".into()).is_invalid_refresh_token());
    }
}
