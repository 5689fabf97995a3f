use crate::github::GitHubError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<GitHubError> for AppError {
    fn from(err: GitHubError) -> Self {
        let status = match &err {
            GitHubError::Authentication | GitHubError::MissingToken => StatusCode::UNAUTHORIZED,
            GitHubError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GitHubError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GitHubError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_errors_keep_their_meaning() {
        assert_eq!(AppError::from(GitHubError::MissingToken).status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(GitHubError::RateLimited { reset: None }).status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AppError::from(GitHubError::NotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(GitHubError::Http { status: 500 }).status,
            StatusCode::BAD_GATEWAY
        );
    }
}
