use axum::{
    Form, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, TokenResponse};
use crate::auth::{self, Claims, TokenError};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

/// POST /oauth/token
/// Password-grant token endpoint. The client authenticates with HTTP
/// Basic; the user with form credentials.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(payload): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    verify_client(&state, &headers)?;

    if payload.grant_type != "password" {
        return Err(ApiError::validation(format!(
            "Unsupported grant type: {}",
            payload.grant_type
        )));
    }

    let is_valid = state
        .store
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Bad credentials".to_string()));
    }

    // The password already verified against this email, so the row must
    // exist; losing it here is an inconsistency, not a credential problem.
    let user = state
        .store
        .get_user_by_email(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::internal("Verified user missing from store"))?;

    let authorities: Vec<String> = user.roles.iter().map(|r| r.authority.clone()).collect();

    let claims = Claims::new(
        &user.email,
        authorities,
        user.id,
        &user.first_name,
        state.auth.token_duration_secs,
    );
    let token = auth::create_token(&claims, &state.auth.jwt_secret)
        .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))?;

    tracing::info!("Issued token for {}", user.email);

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        expires_in: state.auth.token_duration_secs,
        scope: auth::SCOPE,
        user_first_name: user.first_name,
        user_id: user.id,
    }))
}

/// Client credentials travel as `Authorization: Basic base64(id:secret)`.
fn verify_client(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or_else(|| ApiError::Unauthorized("Missing client credentials".to_string()))?;

    let decoded = BASE64
        .decode(header.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| ApiError::Unauthorized("Malformed client credentials".to_string()))?;

    let Some((client_id, client_secret)) = decoded.split_once(':') else {
        return Err(ApiError::Unauthorized(
            "Malformed client credentials".to_string(),
        ));
    };

    if client_id != state.auth.client_id || client_secret != state.auth.client_secret {
        return Err(ApiError::Unauthorized("Bad client credentials".to_string()));
    }

    Ok(())
}

fn bearer_claims(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    auth::decode_token(token, &state.auth.jwt_secret).map_err(|e| match e {
        TokenError::Expired => ApiError::Unauthorized("Token expired".to_string()),
        _ => ApiError::Unauthorized("Invalid token".to_string()),
    })
}

/// Route layer for the catalog write endpoints.
pub async fn require_operator_or_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &headers)?;

    if !claims.has_any_authority(&["ROLE_OPERATOR", "ROLE_ADMIN"]) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(next.run(request).await)
}

/// Route layer for the user management endpoints.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &headers)?;

    if !claims.has_any_authority(&["ROLE_ADMIN"]) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(next.run(request).await)
}
