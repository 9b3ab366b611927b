use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    auth::{MemoryOtpStore, OtpStore, SessionSigner},
    config::AppConfig,
    error::AppResult,
    notify::Notifier,
    storage::Presigner,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub otp: Arc<dyn OtpStore>,
    pub sessions: SessionSigner,
    pub notifier: Arc<Notifier>,
    pub uploads: Option<Presigner>,
    pub log_otp_codes: bool,
}

impl AppState {
    pub fn from_config(db: SqlitePool, config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            db,
            otp: Arc::new(MemoryOtpStore::new()),
            sessions: SessionSigner::new(&config.session_secret)?,
            notifier: Arc::new(Notifier::from_config(config)),
            uploads: config.storage.clone().map(Presigner::new),
            log_otp_codes: !config.production,
        })
    }
}
