#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    http::{header, StatusCode},
    test, App,
};
use serde_json::Value;

use folkstage::{
    auth::{MemoryOtpStore, SessionSigner},
    configure_app, db,
    models::{Role, UserRow},
    notify::Notifier,
    services::{
        admin,
        artists::{self, NewArtistProfile},
        users,
    },
    state::AppState,
};

pub async fn test_state() -> AppState {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");
    let config = folkstage::config::AppConfig::from_lookup(|_| None).expect("default config");
    db::seed_defaults(&pool, &config).await.expect("seed");

    AppState {
        db: pool,
        otp: Arc::new(MemoryOtpStore::new()),
        sessions: SessionSigner::new("test-secret").expect("signer"),
        notifier: Arc::new(Notifier::disabled()),
        uploads: None,
        log_otp_codes: false,
    }
}

/// Runs one request against a fresh service over the shared state.
pub async fn send(state: &AppState, req: test::TestRequest) -> (StatusCode, Value) {
    let app = test::init_service(App::new().configure(configure_app(state.clone()))).await;
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

pub fn token_for(state: &AppState, user: &UserRow) -> String {
    state.sessions.issue(&user.id, user.role)
}

pub async fn create_user(state: &AppState, phone: &str, name: &str, role: Role) -> UserRow {
    let user = users::create(&state.db, phone, role).await.expect("user");
    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(&user.id)
        .execute(&state.db)
        .await
        .expect("name");
    users::find_by_id(&state.db, &user.id)
        .await
        .expect("lookup")
        .expect("user exists")
}

pub async fn admin_user(state: &AppState) -> UserRow {
    users::find_by_phone(&state.db, folkstage::config::DEFAULT_ADMIN_PHONE)
        .await
        .expect("lookup")
        .expect("seeded admin")
}

pub async fn art_form_id(state: &AppState, slug: &str) -> String {
    sqlx::query_scalar("SELECT id FROM art_forms WHERE slug = ?")
        .bind(slug)
        .fetch_one(&state.db)
        .await
        .expect("seeded art form")
}

pub struct Artist {
    pub user: UserRow,
    pub token: String,
    pub profile_id: String,
}

/// An approved artist offering `slug`, based in `city`.
pub async fn approved_artist(
    state: &AppState,
    phone: &str,
    group_name: &str,
    city: &str,
    slug: &str,
) -> Artist {
    let user = create_user(state, phone, group_name, Role::Client).await;
    let art_form = art_form_id(state, slug).await;
    let created = artists::create(
        &state.db,
        &user.id,
        NewArtistProfile {
            group_name: group_name.to_string(),
            description: None,
            art_form_ids: vec![art_form],
            group_size: Some(8),
            base_price: 15_000,
            price_unit: None,
            service_areas: vec![city.to_string()],
            based_in: city.to_string(),
            languages: Some(vec!["Kannada".to_string()]),
            experience: Some(10),
        },
    )
    .await
    .expect("artist profile");

    let admin = admin_user(state).await;
    admin::approve(&state.db, &created.profile.id, &admin.id)
        .await
        .expect("approve");

    let user = users::find_by_id(&state.db, &user.id)
        .await
        .expect("lookup")
        .expect("artist user");
    Artist {
        token: token_for(state, &user),
        profile_id: created.profile.id,
        user,
    }
}
