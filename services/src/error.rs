use db::models::diagnostic::DiagnosticStatus;
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

/// Every failure the service layer can report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot move diagnostic from {from} to {to}")]
    InvalidTransition {
        from: DiagnosticStatus,
        to: DiagnosticStatus,
    },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("metric collection failed: {0}")]
    Collection(String),

    #[error("all data providers failed: {0}")]
    AllProvidersFailed(Box<AppError>),

    #[error("diagnostic {id} failed: {message}")]
    DiagnosticFailed { id: String, message: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("token error: {0}")]
    Token(String),
}

impl AppError {
    /// The underlying error when this one only wraps another.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::AllProvidersFailed(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), AppError::NotFound(_))
    }

    /// The data itself was refused. Sending it again cannot succeed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.root(),
            AppError::Validation(_) | AppError::InvalidTransition { .. }
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Token(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

/// Flattens field messages into one `;`-separated line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
