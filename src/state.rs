use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, pool_of},
    mailer::Mailer,
    payments::PaymentGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        orm: OrmConn,
        config: AppConfig,
        payments: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pool: pool_of(&orm),
            orm,
            config: Arc::new(config),
            payments,
            mailer,
        }
    }
}
