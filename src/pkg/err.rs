use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Every failure the service can surface. Handlers return these and the
/// `IntoResponse` impl turns them into an error snippet the page renders
/// verbatim, so the variant message is the user-facing text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Ai(String),
    #[error("{0}")]
    Feedback(String),
    #[error("{0}")]
    Pdf(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Email(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error(transparent)]
    Header(#[from] axum::http::header::InvalidHeaderValue),
    #[error(transparent)]
    Input(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ERR-INPUT-001",
            Error::Auth(_) => "ERR-AUTH-001",
            Error::NotFound(_) => "ERR-RECORD-001",
            Error::Ai(_) => "ERR-AI-001",
            Error::Feedback(_) => "ERR-AI-002",
            Error::Pdf(_) => "ERR-PDF-001",
            Error::Storage(_) => "ERR-S3-001",
            Error::Email(_) => "ERR-SMTP-001",
            Error::Database(_) => "ERR-DB-001",
            Error::Migrate(_) => "ERR-DB-000",
            Error::Io(_) => "ERR-IO-001",
            Error::Json(_) => "ERR-JSON-001",
            Error::Template(_) => "ERR-TPL-001",
            Error::Multipart(_) => "ERR-FORM-001",
            Error::Header(_) => "ERR-HTTP-001",
            Error::Input(_) => "ERR-INPUT-002",
            Error::Http(_) => "ERR-HTTP-002",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Input(_) | Error::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Ai(_) | Error::Feedback(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        } else {
            tracing::warn!(code = self.code(), "{}", self);
        }
        let body = Html(format!(
            r#"<div class="form-error"><strong>Error:</strong> {}</div>"#,
            escape_html(&self.to_string())
        ));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Validation("Please fill in all fields".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("Resume not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Ai("no response".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Storage("upload failed".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_is_the_user_message() {
        let err = Error::Feedback("AI response is not in JSON format. Please try again.".into());
        assert_eq!(
            err.to_string(),
            "AI response is not in JSON format. Please try again."
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>"x" & 'y'</script>"#),
            "&lt;script&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }
}
