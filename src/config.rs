use std::env;

use crate::error::{AppError, AppResult};

const DEV_SESSION_SECRET: &str = "folkstage-dev-secret-change-in-production";
pub const DEFAULT_ADMIN_PHONE: &str = "+910000000000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub production: bool,
    pub session_secret: String,
    pub admin_phone: String,
    pub admin_name: String,
    pub storage: Option<StorageConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
    pub email: Option<EmailConfig>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub account_id: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub public_url: String,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub phone_number_id: String,
    pub access_token: String,
    pub api_version: String,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or = |key: &str, fallback: &str| get(key).unwrap_or_else(|| fallback.to_string());
        let flag = |key: &str| get(key).as_deref() == Some("true");

        let production = get("APP_ENV").as_deref() == Some("production");
        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret,
            None if production => {
                return Err(AppError::Internal(
                    "SESSION_SECRET must be set in production".to_string(),
                ))
            }
            None => {
                log::warn!("SESSION_SECRET not set. Using development secret.");
                DEV_SESSION_SECRET.to_string()
            }
        };

        let storage = match (
            get("STORAGE_ACCOUNT_ID"),
            get("STORAGE_ACCESS_KEY"),
            get("STORAGE_SECRET_KEY"),
        ) {
            (Some(account_id), Some(access_key), Some(secret_key)) => Some(StorageConfig {
                account_id,
                access_key,
                secret_key,
                bucket: or("STORAGE_BUCKET", "folkstage-media"),
                public_url: or("STORAGE_PUBLIC_URL", ""),
            }),
            _ => None,
        };

        let whatsapp = if flag("WHATSAPP_ENABLED") {
            Some(WhatsAppConfig {
                phone_number_id: or("WHATSAPP_PHONE_NUMBER_ID", ""),
                access_token: or("WHATSAPP_ACCESS_TOKEN", ""),
                api_version: or("WHATSAPP_API_VERSION", "v20.0"),
            })
        } else {
            None
        };

        let email = if flag("EMAIL_ENABLED") {
            Some(EmailConfig {
                host: or("SMTP_HOST", "localhost"),
                port: get("SMTP_PORT")
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(587),
                username: or("SMTP_USER", ""),
                password: or("SMTP_PASS", ""),
                from: or("EMAIL_FROM", "bookings@folkstage.local"),
            })
        } else {
            None
        };

        Ok(Self {
            database_url: or("DATABASE_URL", "sqlite://./data/folkstage.db"),
            port: get("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(4000),
            production,
            session_secret,
            admin_phone: or("ADMIN_PHONE", DEFAULT_ADMIN_PHONE),
            admin_name: or("ADMIN_NAME", "Administrator"),
            storage,
            whatsapp,
            email,
        })
    }
}
