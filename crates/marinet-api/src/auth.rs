use std::sync::LazyLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use regex::Regex;
use tracing::{error, info};
use uuid::Uuid;

use marinet_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::views::parse_id;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    validate_username(&username)?;
    if !email.contains('@') || email.len() > 120 {
        return Err(ApiError::Validation("A valid email address is required".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation("Password must be at least 6 characters".into()));
    }

    let password_hash = hash_password(&req.password)?;

    let user = run_db(&state, move |db| db.create_user(&username, &email, &password_hash)).await?;
    let user_id = parse_id(&user.id, "user");

    let token = create_token(&state.jwt_secret, user_id, &user.username).map_err(|e| {
        error!("Failed to sign token: {}", e);
        ApiError::Internal
    })?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    let user = run_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("Stored hash for {} is unreadable: {}", user.id, e);
        ApiError::Internal
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id = parse_id(&user.id, "user");
    let token = create_token(&state.jwt_secret, user_id, &user.username).map_err(|e| {
        error!("Failed to sign token: {}", e);
        ApiError::Internal
    })?;

    info!("User {} logged in", user.username);
    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

// Same `\w` class the mention scanner matches.
static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{3,80}$").expect("username pattern is valid"));

/// Usernames must be mentionable, so only word characters are allowed.
pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if !USERNAME.is_match(username) {
        return Err(ApiError::Validation(
            "Username must be 3-80 letters, digits or underscores".into(),
        ));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_follow_the_mention_pattern() {
        assert!(validate_username("alice_k").is_ok());
        assert!(validate_username("José").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(81)).is_err());
        assert!(validate_username("ab²").is_err());
        assert!(validate_username("half½").is_err());
        assert!(validate_username("a.b.c").is_err());
    }

    #[test]
    fn hashes_verify_against_their_password() {
        let hash = hash_password("secret123").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"secret123", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"secret124", &parsed).is_err());
    }
}
