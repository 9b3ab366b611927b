use std::{fs, path::Path, str::FromStr};

use chrono::{SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

use crate::{
    config::{AppConfig, DEFAULT_ADMIN_PHONE},
    models::{ActivityRow, Role},
};

const ART_FORM_CATALOG: &[(&str, &str, &str, &str)] = &[
    ("dollu-kunitha", "Dollu Kunitha", "North Karnataka", "Percussion"),
    ("yakshagana", "Yakshagana", "Coastal Karnataka", "Theater"),
    ("huli-vesha", "Huli Vesha", "Coastal Karnataka", "Dance"),
    ("veeragase", "Veeragase", "North Karnataka", "Ritualistic"),
    ("kamsale", "Kamsale", "South Karnataka", "Devotional"),
    ("pata-kunitha", "Pata Kunitha", "South Karnataka", "Dance"),
    ("pooja-kunitha", "Pooja Kunitha", "South Karnataka", "Ritualistic"),
    ("garudi-gombe", "Garudi Gombe", "South Karnataka", "Puppetry"),
    ("chenda-melam", "Chenda Melam", "Coastal Karnataka", "Percussion"),
];

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    ensure_sqlite_dir(db_url)?;

    let connect_options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
}

/// Single-connection in-memory pool. The connection is never recycled so the
/// database lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool, config: &AppConfig) -> Result<(), sqlx::Error> {
    seed_admin(pool, config).await?;
    seed_art_forms(pool).await?;
    Ok(())
}

async fn seed_admin(pool: &SqlitePool, config: &AppConfig) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(Role::Admin)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    if config.admin_phone == DEFAULT_ADMIN_PHONE {
        log::warn!("ADMIN_PHONE not set. Seeding admin with placeholder phone {DEFAULT_ADMIN_PHONE}.");
    }

    // An existing client with the admin phone is promoted rather than duplicated.
    sqlx::query(
        r#"INSERT INTO users (id, phone, name, email, role, created_at)
           VALUES (?, ?, ?, NULL, ?, ?)
           ON CONFLICT(phone) DO UPDATE SET role = excluded.role"#,
    )
    .bind(new_id())
    .bind(&config.admin_phone)
    .bind(&config.admin_name)
    .bind(Role::Admin)
    .bind(now())
    .execute(pool)
    .await?;

    log::info!("Seeded admin account for {}", config.admin_phone);
    Ok(())
}

async fn seed_art_forms(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for &(slug, name, region, category) in ART_FORM_CATALOG {
        sqlx::query(
            r#"INSERT INTO art_forms (id, slug, name, region, category, description, created_at)
               VALUES (?, ?, ?, ?, ?, NULL, ?)
               ON CONFLICT(slug) DO NOTHING"#,
        )
        .bind(new_id())
        .bind(slug)
        .bind(name)
        .bind(region)
        .bind(category)
        .bind(now())
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    subject_id: Option<&str>,
) {
    let result = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id, subject_id)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(now())
    .bind(user_id)
    .bind(subject_id)
    .execute(pool)
    .await;

    if let Err(err) = result {
        log::warn!("Failed to record activity {kind}: {err}");
    }
}

pub async fn recent_activity(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        r#"SELECT kind, message, created_at, user_id, subject_id
           FROM activities
           ORDER BY created_at DESC
           LIMIT ?"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
