//! Authenticated-caller extractor.
//!
//! Sessions are owned by the hosted auth provider. The gateway in front of this service
//! verifies them and forwards the subject in `x-profile-id`; a request without it never
//! reaches a handler.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const PROFILE_HEADER: &str = "x-profile-id";

/// Profile ids end up as S3 key segments (`jobs/{profile_id}/...`), so path separators,
/// dot segments and control characters are refused.
fn is_valid_profile_id(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// The profile every lookup in the request is scoped to.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthProfile(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthProfile
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PROFILE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| is_valid_profile_id(value))
            .map(|value| AuthProfile(value.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthProfile, AppError> {
        let (mut parts, _) = request.into_parts();
        AuthProfile::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_profile_header() {
        let request = Request::builder()
            .header(PROFILE_HEADER, " user_1 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap(), AuthProfile("user_1".into()));
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_unauthorized() {
        let missing = Request::builder().body(()).unwrap();
        let blank = Request::builder()
            .header(PROFILE_HEADER, "  ")
            .body(())
            .unwrap();
        assert!(matches!(extract(missing).await, Err(AppError::Unauthorized)));
        assert!(matches!(extract(blank).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_profile_id_with_path_segments_is_unauthorized() {
        for value in ["user_1/../other", "a\\b", ".."] {
            let request = Request::builder()
                .header(PROFILE_HEADER, value)
                .body(())
                .unwrap();
            assert!(
                matches!(extract(request).await, Err(AppError::Unauthorized)),
                "{value} should be refused"
            );
        }
        let request = Request::builder()
            .header(PROFILE_HEADER, "auth0|5f7c8ec7c33c6c004bbafe82")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_ok());
    }
}
