use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, CredsRequest, RefreshRequest, TokenPairResponse, TokenResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password,
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

fn token_pair(keys: &JwtKeys, user_id: i64, email: &str) -> anyhow::Result<TokenPairResponse> {
    Ok(TokenPairResponse {
        token: keys.sign_access(user_id, email)?,
        refresh_token: keys.sign_refresh(user_id, email)?,
    })
}

#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<TokenPairResponse>), ApiError> {
    let creds = CredsRequest::parse(&body)?;
    let email = creds.email.trim().to_lowercase();

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered"));
    }

    let (salt, hash) = password::hash_password_blocking(creds.password).await?;
    let user_id = User::create(&state.db, &email, &hash, &salt).await?;

    let keys = JwtKeys::from_ref(&state);
    let tokens = token_pair(&keys, user_id, &email)?;

    info!(user_id, email = %email, "user registered");
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let creds = CredsRequest::parse(&body)?;
    let email = creds.email.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => {
            // Burn a verification anyway so unknown emails sit in the same
            // timing class as a wrong password.
            let (salt, hash) = password::dummy_credentials().clone();
            let _ = password::verify_password_blocking(creds.password, salt, hash).await;
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
    };

    let ok = password::verify_password_blocking(
        creds.password,
        user.salt.clone(),
        user.password_hash.clone(),
    )
    .await?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let tokens = token_pair(&keys, user.id, &user.email)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state, body))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, ApiError> {
    let req = RefreshRequest::parse(&body)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&req.refresh_token).map_err(|_| {
        warn!("refresh token rejected");
        ApiError::Unauthorized("Invalid or expired refresh token")
    })?;

    let token = keys.sign_access(claims.sub, &claims.email)?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, body))]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req = ChangePasswordRequest::parse(&body)?;

    // Token was valid, but the subject may have vanished since issuance.
    let stored = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("Invalid request"))?;

    let ok = password::verify_password_blocking(
        req.current_password,
        stored.salt.clone(),
        stored.password_hash.clone(),
    )
    .await?;
    if !ok {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let (salt, hash) = password::hash_password_blocking(req.new_password).await?;
    User::update_credentials(&state.db, user.id, &hash, &salt).await?;

    info!(user_id = user.id, "password changed");
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn signup_user(state: &AppState, email: &str, pass: &str) -> TokenPairResponse {
        let (status, Json(tokens)) = signup(
            State(state.clone()),
            Json(json!({ "email": email, "password": pass })),
        )
        .await
        .expect("signup");
        assert_eq!(status, StatusCode::CREATED);
        tokens
    }

    #[tokio::test]
    async fn signup_then_login_roundtrip() {
        let state = AppState::fake().await;
        let tokens = signup_user(&state, "a@b.com", "12345678").await;
        assert!(!tokens.token.is_empty());
        assert!(!tokens.refresh_token.is_empty());

        let Json(login_tokens) = login(
            State(state.clone()),
            Json(json!({ "email": "a@b.com", "password": "12345678" })),
        )
        .await
        .expect("login");
        assert!(!login_tokens.token.is_empty());

        // Issued access token carries the right identity.
        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify_access(&login_tokens.token).expect("verify");
        assert_eq!(claims.email, "a@b.com");
    }

    #[tokio::test]
    async fn signup_lowercases_email() {
        let state = AppState::fake().await;
        signup_user(&state, "Mixed@Case.COM", "12345678").await;
        let Json(tokens) = login(
            State(state.clone()),
            Json(json!({ "email": "mixed@case.com", "password": "12345678" })),
        )
        .await
        .expect("login with lowercased email");
        assert!(!tokens.token.is_empty());
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let state = AppState::fake().await;
        signup_user(&state, "a@b.com", "12345678").await;
        let err = signup(
            State(state.clone()),
            Json(json!({ "email": "a@b.com", "password": "12345678" })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict("Email already registered")));
    }

    #[tokio::test]
    async fn login_failure_is_uniform() {
        let state = AppState::fake().await;
        signup_user(&state, "a@b.com", "12345678").await;

        let wrong_password = login(
            State(state.clone()),
            Json(json!({ "email": "a@b.com", "password": "wrongwrong" })),
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            State(state.clone()),
            Json(json!({ "email": "nobody@b.com", "password": "12345678" })),
        )
        .await
        .unwrap_err();

        for err in [wrong_password, unknown_email] {
            assert!(matches!(err, ApiError::Unauthorized("Invalid credentials")));
        }
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let state = AppState::fake().await;
        let tokens = signup_user(&state, "a@b.com", "12345678").await;

        let Json(response) = refresh(
            State(state.clone()),
            Json(json!({ "refreshToken": tokens.refresh_token })),
        )
        .await
        .expect("refresh");

        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify_access(&response.token).expect("verify access");
        assert_eq!(claims.email, "a@b.com");
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let state = AppState::fake().await;
        let tokens = signup_user(&state, "a@b.com", "12345678").await;

        let err = refresh(
            State(state.clone()),
            Json(json!({ "refreshToken": tokens.token })),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthorized("Invalid or expired refresh token")
        ));
    }

    #[tokio::test]
    async fn change_password_happy_path() {
        let state = AppState::fake().await;
        signup_user(&state, "a@b.com", "oldpass123").await;
        let user = User::find_by_email(&state.db, "a@b.com")
            .await
            .expect("query")
            .expect("user");

        let auth = AuthUser {
            id: user.id,
            email: user.email.clone(),
        };
        let Json(response) = change_password(
            State(state.clone()),
            auth,
            Json(json!({
                "currentPassword": "oldpass123",
                "newPassword": "newpass123",
                "confirmPassword": "newpass123",
            })),
        )
        .await
        .expect("change password");
        assert_eq!(response["message"], "Password changed successfully");

        // New password logs in, old one no longer does.
        assert!(login(
            State(state.clone()),
            Json(json!({ "email": "a@b.com", "password": "newpass123" })),
        )
        .await
        .is_ok());
        let err = login(
            State(state.clone()),
            Json(json!({ "email": "a@b.com", "password": "oldpass123" })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized("Invalid credentials")));
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let state = AppState::fake().await;
        signup_user(&state, "a@b.com", "oldpass123").await;
        let user = User::find_by_email(&state.db, "a@b.com")
            .await
            .expect("query")
            .expect("user");

        let err = change_password(
            State(state.clone()),
            AuthUser {
                id: user.id,
                email: user.email,
            },
            Json(json!({
                "currentPassword": "wrongpassword",
                "newPassword": "newpass123",
                "confirmPassword": "newpass123",
            })),
        )
        .await
        .unwrap_err();
        let ApiError::Validation(detail) = err else {
            panic!("expected validation error");
        };
        assert_eq!(detail, json!("Current password is incorrect"));
    }

    #[tokio::test]
    async fn change_password_404_for_vanished_subject() {
        let state = AppState::fake().await;
        let err = change_password(
            State(state.clone()),
            AuthUser {
                id: 99999,
                email: "nonexistent@example.com".into(),
            },
            Json(json!({
                "currentPassword": "anypassword",
                "newPassword": "newpass123",
                "confirmPassword": "newpass123",
            })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Invalid request")));
    }
}
