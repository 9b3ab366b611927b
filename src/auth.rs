use std::{
    collections::HashMap,
    future::{ready, Ready},
    sync::Mutex,
};

use actix_web::{
    dev::{Payload, ServiceRequest},
    http::header::Header,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use actix_web_httpauth::{
    extractors::bearer::BearerAuth,
    headers::authorization::{Authorization, Bearer},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{Role, UserRow},
    services::users,
    state::AppState,
};

pub const OTP_TTL_MINUTES: i64 = 5;
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpEntry {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Pending one-time codes keyed by phone. Entries are single-use: a
/// successful verification removes them.
pub trait OtpStore: Send + Sync {
    fn put(&self, phone: &str, entry: OtpEntry);
    fn get(&self, phone: &str) -> Option<OtpEntry>;
    fn remove(&self, phone: &str);
}

/// Process-local store. Codes are lost on restart and are not visible to
/// other instances.
#[derive(Default)]
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, OtpEntry>) -> R) -> R {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl OtpStore for MemoryOtpStore {
    fn put(&self, phone: &str, entry: OtpEntry) {
        let now = Utc::now();
        self.with_entries(|entries| {
            entries.retain(|_, existing| existing.expires_at > now);
            entries.insert(phone.to_string(), entry);
        });
    }

    fn get(&self, phone: &str) -> Option<OtpEntry> {
        self.with_entries(|entries| entries.get(phone).cloned())
    }

    fn remove(&self, phone: &str) {
        self.with_entries(|entries| {
            entries.remove(phone);
        });
    }
}

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Issues a fresh code for `phone`, replacing any pending one. Succeeds
/// whether or not the phone belongs to a known user.
pub fn request_code(store: &dyn OtpStore, phone: &str, log_code: bool) -> String {
    let code = generate_code();
    store.put(
        phone,
        OtpEntry {
            code: code.clone(),
            expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
        },
    );
    if log_code {
        log::info!("[dev] OTP for {phone}: {code}");
    }
    code
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserRow,
}

pub async fn verify_code(
    pool: &SqlitePool,
    store: &dyn OtpStore,
    signer: &SessionSigner,
    phone: &str,
    code: &str,
    requested_role: Option<Role>,
) -> AppResult<Session> {
    let entry = store
        .get(phone)
        .ok_or_else(|| AppError::unauthorized("Invalid or expired OTP"))?;

    if entry.expires_at <= Utc::now() {
        store.remove(phone);
        return Err(AppError::unauthorized("Invalid or expired OTP"));
    }
    if !constant_time_eq(entry.code.as_bytes(), code.as_bytes()) {
        return Err(AppError::unauthorized("Invalid or expired OTP"));
    }

    store.remove(phone);

    let user = match users::find_by_phone(pool, phone).await? {
        Some(user) => user,
        None => {
            let role = requested_role.unwrap_or(Role::Client);
            if role == Role::Admin {
                return Err(AppError::unauthorized(
                    "Admin accounts cannot be created via OTP",
                ));
            }
            users::create(pool, phone, role).await?
        }
    };

    let token = signer.issue(&user.id, user.role);
    Ok(Session { token, user })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Stateless bearer tokens: `base64url(claims).base64url(hmac_sha256(claims))`.
#[derive(Clone)]
pub struct SessionSigner {
    mac: Hmac<Sha256>,
}

impl SessionSigner {
    pub fn new(secret: &str) -> AppResult<Self> {
        let mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|err| AppError::Internal(format!("invalid session secret: {err}")))?;
        Ok(Self { mac })
    }

    pub fn issue(&self, user_id: &str, role: Role) -> String {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, role: Role, now: DateTime<Utc>) -> String {
        let claims = SessionClaims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{signature}")
    }

    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<SessionClaims> {
        let invalid = || AppError::unauthorized("Invalid or expired session");

        let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: SessionClaims = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
        if claims.exp <= now.timestamp() {
            return Err(invalid());
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden("You do not have permission to perform this action"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> AppResult<AuthUser> {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state missing".to_string()))?;
    let header = Authorization::<Bearer>::parse(req)
        .map_err(|_| AppError::unauthorized("Missing bearer token"))?;
    let credentials = header.into_scheme();

    state.sessions.verify(credentials.token()).map(AuthUser::from)
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let verified = match req.app_data::<web::Data<AppState>>() {
        Some(state) => state.sessions.verify(credentials.token()),
        None => Err(AppError::Internal("application state missing".to_string())),
    };

    match verified {
        Ok(claims) if claims.role == Role::Admin => {
            req.extensions_mut().insert(AuthUser::from(claims));
            Ok(req)
        }
        Ok(_) => Err((AppError::forbidden("Admin access required").into(), req)),
        Err(err) => Err((err.into(), req)),
    }
}
