use thiserror::Error;

/// Failures that can occur while handling a single event.
///
/// None of these abort the event loop: fetch failures truncate the thread
/// walk, post failures are logged, and backend failures are handled per path
/// by the dispatcher. Only `Config` (at startup) and `Stream` are fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BotError {
    #[error("failed to fetch status: {0}")]
    Fetch(String),
    #[error("{0}")]
    Backend(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to post: {0}")]
    Post(String),
    #[error("stream error: {0}")]
    Stream(String),
}

pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_raw_message() {
        // The apology reply embeds this text, so it must not carry a prefix
        let err = BotError::Backend("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_config_error_display() {
        let err = BotError::Config("unsupported LLM provider: foo".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: unsupported LLM provider: foo"
        );
    }
}
