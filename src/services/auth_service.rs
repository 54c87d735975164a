use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
    ActiveValue::NotSet,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        email_verifications::{
            ActiveModel as VerificationActive, Column as VerificationCol,
            Entity as EmailVerifications,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    mailer::verification_link,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    status::Role,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Trim and lower-case an address, rejecting anything that is clearly not one.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    Ok(email)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn expires_after(hours: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))
}

pub fn issue_token(secret: &str, user_id: Uuid, role: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = expires_after(ttl_hours)?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let email = normalize_email(&payload.email)?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(Role::User.as_str().to_string()),
        email_verified: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    send_verification(state, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let invalid = || AppError::BadRequest("Invalid email or password".into());
    let email = normalize_email(&payload.email).map_err(|_| invalid())?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.role,
        state.config.jwt_ttl_hours,
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", User::from(model), Some(Meta::empty())))
}

pub async fn verify_email(state: &AppState, token: &str) -> AppResult<ApiResponse<User>> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Invalid verification token".into()));
    }

    let txn = state.orm.begin().await?;
    let verification = EmailVerifications::find()
        .filter(VerificationCol::Token.eq(token))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid verification token".into()))?;

    if verification.used_at.is_some() {
        return Err(AppError::BadRequest("Verification token already used".into()));
    }
    if verification.expires_at.with_timezone(&Utc) < Utc::now() {
        return Err(AppError::BadRequest("Verification token expired".into()));
    }

    let user = Users::find_by_id(verification.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: VerificationActive = verification.into();
    active.used_at = Set(Some(Utc::now().into()));
    active.update(&txn).await?;

    let mut user: UserActive = user.into();
    user.email_verified = Set(true);
    let user = user.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "email_verified",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Email verified",
        User::from(user),
        Some(Meta::empty()),
    ))
}

pub async fn resend_verification(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if model.email_verified {
        return Err(AppError::BadRequest("Email is already verified".into()));
    }

    send_verification(state, &model).await?;

    Ok(ApiResponse::success(
        "Verification email sent",
        serde_json::json!({ "email": model.email }),
        Some(Meta::empty()),
    ))
}

/// Store a fresh token and mail the link. Delivery failures are logged only.
async fn send_verification(
    state: &AppState,
    user: &crate::entity::users::Model,
) -> AppResult<()> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = expires_after(state.config.email_token_ttl_hours)?;

    VerificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        token: Set(token.clone()),
        expires_at: Set(expires_at.into()),
        used_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let link = verification_link(&state.config.public_base_url, &token);
    if let Err(err) = state.mailer.send_verification(&user.email, &link).await {
        tracing::warn!(error = %err, user_id = %user.id, "verification email failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "plain", "@example.com", "a@b", "a@@b.com", "a@.com", "a@b.com."] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[test]
    fn out_of_range_ttl_is_an_error() {
        assert!(expires_after(24).is_ok());
        assert!(matches!(expires_after(i64::MAX), Err(AppError::Internal(_))));
        assert!(issue_token("secret", Uuid::new_v4(), "user", i64::MAX).is_err());
    }
}
