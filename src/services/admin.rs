use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{log_activity, now, recent_activity},
    error::{AppError, AppResult},
    models::{ActivityRow, ArtistProfileRow, BookingStatus, KycStatus},
    services::{
        artists::{self, PROFILE_COLUMNS},
        bookings::{self, BookingView},
    },
};

pub const ACTIVITY_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: i64,
    pub total_artists: i64,
    pub approved_artists: i64,
    pub pending_artists: i64,
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub total_reviews: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingArtist {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: ArtistProfileRow,
    pub owner_name: String,
    pub owner_phone: String,
}

pub async fn stats(pool: &SqlitePool) -> AppResult<Stats> {
    let stats = sqlx::query_as::<_, Stats>(
        r#"SELECT
             (SELECT COUNT(*) FROM users) AS total_users,
             (SELECT COUNT(*) FROM artist_profiles) AS total_artists,
             (SELECT COUNT(*) FROM artist_profiles WHERE is_approved = 1) AS approved_artists,
             (SELECT COUNT(*) FROM artist_profiles WHERE is_approved = 0) AS pending_artists,
             (SELECT COUNT(*) FROM bookings) AS total_bookings,
             (SELECT COUNT(*) FROM bookings WHERE status = 'COMPLETED') AS completed_bookings,
             (SELECT COUNT(*) FROM reviews) AS total_reviews"#,
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Profiles still awaiting approval or identity verification.
pub async fn pending_artists(pool: &SqlitePool) -> AppResult<Vec<PendingArtist>> {
    let rows = sqlx::query_as::<_, PendingArtist>(&format!(
        r#"SELECT {PROFILE_COLUMNS}, u.name AS owner_name, u.phone AS owner_phone
           FROM artist_profiles p
           JOIN users u ON u.id = p.user_id
           WHERE p.is_approved = 0 OR p.kyc_status != ?
           ORDER BY p.created_at"#
    ))
    .bind(KycStatus::Verified)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn approve(pool: &SqlitePool, artist_profile_id: &str, admin_id: &str) -> AppResult<ArtistProfileRow> {
    let profile = set_approval(pool, artist_profile_id, true, true).await?;
    log_activity(
        pool,
        "artist_approved",
        &format!("{} approved", profile.group_name),
        Some(admin_id),
        Some(artist_profile_id),
    )
    .await;
    Ok(profile)
}

/// Rejection also deactivates the profile so it drops out of search.
pub async fn reject(pool: &SqlitePool, artist_profile_id: &str, admin_id: &str) -> AppResult<ArtistProfileRow> {
    let profile = set_approval(pool, artist_profile_id, false, false).await?;
    log_activity(
        pool,
        "artist_rejected",
        &format!("{} rejected", profile.group_name),
        Some(admin_id),
        Some(artist_profile_id),
    )
    .await;
    Ok(profile)
}

async fn set_approval(
    pool: &SqlitePool,
    artist_profile_id: &str,
    approved: bool,
    active: bool,
) -> AppResult<ArtistProfileRow> {
    let result = sqlx::query(
        "UPDATE artist_profiles SET is_approved = ?, is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(approved)
    .bind(active)
    .bind(now())
    .bind(artist_profile_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Artist profile not found"));
    }
    reload(pool, artist_profile_id).await
}

pub async fn set_kyc_status(
    pool: &SqlitePool,
    artist_profile_id: &str,
    status: KycStatus,
    admin_id: &str,
) -> AppResult<ArtistProfileRow> {
    let result =
        sqlx::query("UPDATE artist_profiles SET kyc_status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now())
            .bind(artist_profile_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Artist profile not found"));
    }
    let profile = reload(pool, artist_profile_id).await?;
    log_activity(
        pool,
        "artist_kyc",
        &format!("{} KYC set to {status:?}", profile.group_name),
        Some(admin_id),
        Some(artist_profile_id),
    )
    .await;
    Ok(profile)
}

/// All bookings, optionally narrowed to one status given by its wire name.
pub async fn bookings(pool: &SqlitePool, status: Option<&str>) -> AppResult<Vec<BookingView>> {
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<BookingStatus>().map_err(AppError::BadRequest)?),
        None => None,
    };
    bookings::list_all(pool, status).await
}

pub async fn activity(pool: &SqlitePool) -> AppResult<Vec<ActivityRow>> {
    Ok(recent_activity(pool, ACTIVITY_LIMIT).await?)
}

async fn reload(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<ArtistProfileRow> {
    artists::find_by_id(pool, artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))
}
