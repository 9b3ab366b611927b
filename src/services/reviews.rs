use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{new_id, now},
    error::{AppError, AppResult},
    models::{BookingStatus, ReviewRow},
    services::bookings,
};

pub(crate) const REVIEW_COLUMNS: &str = "r.id, r.booking_id, r.client_id, r.artist_profile_id, \
    r.rating, r.comment, r.created_at, r.flagged_at, r.flag_reason, r.removed_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: ReviewRow,
    pub reviewer_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<ReviewRow>> {
    let row = sqlx::query_as::<_, ReviewRow>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    client_id: &str,
    booking_id: &str,
    rating: i64,
    comment: Option<String>,
) -> AppResult<ReviewRow> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::bad_request("Rating must be between 1 and 5"));
    }

    let booking = bookings::find_by_id(pool, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    if booking.client_id != client_id {
        return Err(AppError::forbidden("You can only review your own bookings"));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::bad_request("You can only review completed bookings"));
    }

    let existing = sqlx::query_scalar::<_, String>("SELECT id FROM reviews WHERE booking_id = ?")
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::bad_request("A review already exists for this booking"));
    }

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO reviews (id, booking_id, client_id, artist_profile_id, rating, comment, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(booking_id)
    .bind(client_id)
    .bind(&booking.artist_profile_id)
    .bind(rating)
    .bind(comment)
    .bind(now())
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("review {id} vanished after insert")))
}

/// Visible reviews for an artist, newest first.
pub async fn list_by_artist(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<Vec<ReviewView>> {
    let rows = sqlx::query_as::<_, ReviewView>(&format!(
        r#"SELECT {REVIEW_COLUMNS}, u.name AS reviewer_name
           FROM reviews r
           JOIN users u ON u.id = r.client_id
           WHERE r.artist_profile_id = ? AND r.removed_at IS NULL
           ORDER BY r.created_at DESC"#
    ))
    .bind(artist_profile_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn rating_summary(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<RatingSummary> {
    let summary = sqlx::query_as::<_, RatingSummary>(
        r#"SELECT AVG(rating) AS average, COUNT(*) AS count
           FROM reviews
           WHERE artist_profile_id = ? AND removed_at IS NULL"#,
    )
    .bind(artist_profile_id)
    .fetch_one(pool)
    .await?;
    Ok(summary)
}
