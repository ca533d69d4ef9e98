use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::IssuedCsrfToken;

/// Return the CSRF verifier for this browsing session.
///
/// The CSRF middleware has already minted (or re-derived) the pair and set
/// both cookies on the response; this handler just exposes the verifier in
/// the body for clients that prefer reading it there.
pub async fn csrf_token(
    Extension(issued): Extension<IssuedCsrfToken>,
) -> Result<ApiSuccess<CsrfTokenResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        CsrfTokenResponseData { token: issued.0 },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfTokenResponseData {
    pub token: String,
}
