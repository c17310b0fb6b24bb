use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// A recipe that could not be loaded.
///
/// Carries the primary message plus an ordered list of context notes that are
/// appended as the error travels outwards (step, section, file).
#[derive(Error, Debug)]
#[error("{message}")]
pub struct LoadError {
    pub message: String,
    pub context: Vec<String>,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Attach a context note, innermost first
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.context.push(note.into());
        self
    }

    /// Render the message followed by every note on its own indented line
    pub fn report(&self) -> Report<'_> {
        Report(self)
    }
}

pub struct Report<'a>(&'a LoadError);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.message)?;
        for note in &self.0.context {
            write!(f, "\n  {note}")?;
        }
        if let Some(cause) = &self.0.cause {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Recipe load error: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get a sanitized error message safe for logging
    pub fn log_safe(&self) -> String {
        match self {
            // Paths inside the cookbook folder are fine to show, host paths are not
            Error::Io(_) => "File system operation failed".to_string(),
            Error::Internal(msg) => {
                if msg.to_lowercase().contains("secret") || msg.to_lowercase().contains("token") {
                    "Internal error (details redacted)".to_string()
                } else {
                    format!("Internal error: {msg}")
                }
            }
            Error::Load(e) => format!("Recipe load error: {e}"),
            Error::Config(msg) => format!("Configuration error: {msg}"),
            Error::NotFound(msg) => format!("Not found: {msg}"),
            Error::Validation(msg) => format!("Validation error: {msg}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("Request error: {}", self.log_safe());

        let (status, error_message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
