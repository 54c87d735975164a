mod common;

use storefront_api::{
    dto::auth::{LoginRequest, RegisterRequest},
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    services::auth_service,
};

fn token_from_link(link: &str) -> String {
    link.split("token=").nth(1).expect("token in link").to_string()
}

#[tokio::test]
async fn register_verify_and_login() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let email = format!("{}@Example.com", common::unique("Shopper"));
    let password = "correct horse battery";

    let user = auth_service::register_user(
        state,
        RegisterRequest {
            email: format!("  {email} "),
            password: password.into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(user.email, email.to_lowercase());
    assert_eq!(user.role, "user");
    assert!(!user.email_verified);

    let duplicate = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.clone(),
            password: password.into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let link = {
        let sent = app.mailer.sent.lock().unwrap();
        let (to, link) = sent
            .iter()
            .find(|(to, _)| *to == user.email)
            .cloned()
            .expect("verification mail sent");
        assert_eq!(to, user.email);
        link
    };
    assert!(link.starts_with("http://localhost:3000/api/auth/verify-email?token="));

    let token = token_from_link(&link);
    let verified = auth_service::verify_email(state, &token).await?.data.unwrap();
    assert!(verified.email_verified);

    let reused = auth_service::verify_email(state, &token).await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));

    let session = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };
    let resend = auth_service::resend_verification(state, &session).await;
    assert!(matches!(resend, Err(AppError::BadRequest(_))));

    let wrong = auth_service::login_user(
        state,
        LoginRequest {
            email: email.clone(),
            password: "not the password".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let login = auth_service::login_user(
        state,
        LoginRequest {
            email,
            password: password.into(),
        },
    )
    .await?
    .data
    .unwrap();
    let jwt = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let claims = decode_token(&state.config.jwt_secret, jwt)?;
    assert_eq!(claims.user_id, user.id);

    let me = auth_service::current_user(state, &claims).await?.data.unwrap();
    assert!(me.email_verified);

    Ok(())
}

#[tokio::test]
async fn short_passwords_and_bad_tokens_are_rejected() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let short = auth_service::register_user(
        state,
        RegisterRequest {
            email: format!("{}@example.com", common::unique("short")),
            password: "1234567".into(),
        },
    )
    .await;
    assert!(matches!(short, Err(AppError::BadRequest(_))));

    let bogus = auth_service::verify_email(state, "does-not-exist").await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));
    Ok(())
}
