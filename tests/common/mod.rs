#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use storefront_api::{
    config::{AppConfig, PaymentConfig},
    db::{create_orm_conn, run_migrations},
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    mailer::Mailer,
    middleware::auth::AuthUser,
    payments::{PaymentError, PaymentGateway, PaymentRequest, PaymentSession},
    state::AppState,
};
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Gateway that accepts every payment and remembers what it was asked for.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<PaymentRequest>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider(&self) -> &str {
        "fake"
    }

    async fn create_payment(&self, req: &PaymentRequest) -> Result<PaymentSession, PaymentError> {
        self.requests.lock().unwrap().push(req.clone());
        Ok(PaymentSession {
            provider_payment_id: format!("fake_{}", Uuid::new_v4().simple()),
            status: "pending".into(),
            confirmation_url: Some(format!("https://pay.example.test/{}", req.order_id)),
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &str, link: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), link.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`). `None` means the
/// caller should skip.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let Ok(database_url) =
        std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
        return Ok(None);
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-jwt-secret".into(),
        jwt_ttl_hours: 1,
        email_token_ttl_hours: 24,
        public_base_url: "http://localhost:3000".into(),
        cors_origin: None,
        payment: PaymentConfig {
            api_url: Some("http://payments.invalid".into()),
            api_key: "test-api-key".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            currency: "USD".into(),
            return_url: "http://localhost:3000/thanks".into(),
        },
    };

    let gateway = Arc::new(FakeGateway::default());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(orm, config, gateway.clone(), mailer.clone());

    Ok(Some(TestApp {
        state,
        gateway,
        mailer,
    }))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn create_user(state: &AppState, role: &str, verified: bool) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", unique(role))),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role.into()),
        email_verified: Set(verified),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    discount_percent: i32,
    stock_quantity: i32,
) -> anyhow::Result<storefront_api::entity::products::Model> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(unique("Widget")),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        discount_percent: Set(discount_percent),
        stock_quantity: Set(stock_quantity),
        images: Set(serde_json::json!([])),
        material: Set(None),
        color: Set(None),
        status: Set("active".into()),
        category_id: Set(None),
        brand_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
