use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    db::new_id,
    error::{AppError, AppResult},
    models::{AvailabilityRow, BookingStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookedDate {
    pub event_date: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub availability: Vec<AvailabilityRow>,
    pub bookings: Vec<BookedDate>,
}

impl MonthView {
    pub fn is_blocked(&self, date: &str) -> bool {
        self.availability
            .iter()
            .any(|row| row.date == date && row.is_blocked)
    }
}

/// Upserts one blocked row. Takes any executor so booking acceptance can
/// reuse it.
pub async fn block_date<'e, E>(executor: E, artist_profile_id: &str, date: &str) -> AppResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO availability (id, artist_profile_id, date, is_blocked)
           VALUES (?, ?, ?, 1)
           ON CONFLICT (artist_profile_id, date) DO UPDATE SET is_blocked = 1"#,
    )
    .bind(new_id())
    .bind(artist_profile_id)
    .bind(date)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn unblock_date<'e, E>(executor: E, artist_profile_id: &str, date: &str) -> AppResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "DELETE FROM availability WHERE artist_profile_id = ? AND date = ? AND is_blocked = 1",
    )
    .bind(artist_profile_id)
    .bind(date)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn block_dates(
    pool: &SqlitePool,
    artist_profile_id: &str,
    dates: &[NaiveDate],
) -> AppResult<Vec<AvailabilityRow>> {
    for date in dates {
        block_date(pool, artist_profile_id, &date.to_string()).await?;
    }
    rows_for(pool, artist_profile_id, dates).await
}

pub async fn unblock_dates(
    pool: &SqlitePool,
    artist_profile_id: &str,
    dates: &[NaiveDate],
) -> AppResult<u64> {
    let mut removed = 0;
    for date in dates {
        removed += unblock_date(pool, artist_profile_id, &date.to_string()).await?;
    }
    Ok(removed)
}

pub async fn is_blocked(pool: &SqlitePool, artist_profile_id: &str, date: &str) -> AppResult<bool> {
    let blocked = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM availability WHERE artist_profile_id = ? AND date = ? AND is_blocked = 1",
    )
    .bind(artist_profile_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(blocked > 0)
}

pub async fn month(
    pool: &SqlitePool,
    artist_profile_id: &str,
    year: i32,
    month: u32,
) -> AppResult<MonthView> {
    let (start, end) = month_bounds(year, month)?;

    let availability = sqlx::query_as::<_, AvailabilityRow>(
        r#"SELECT id, artist_profile_id, date, is_blocked
           FROM availability
           WHERE artist_profile_id = ? AND date >= ? AND date < ?
           ORDER BY date"#,
    )
    .bind(artist_profile_id)
    .bind(&start)
    .bind(&end)
    .fetch_all(pool)
    .await?;

    let bookings = sqlx::query_as::<_, BookedDate>(
        r#"SELECT event_date, status
           FROM bookings
           WHERE artist_profile_id = ? AND event_date >= ? AND event_date < ?
             AND status IN (?, ?)
           ORDER BY event_date"#,
    )
    .bind(artist_profile_id)
    .bind(&start)
    .bind(&end)
    .bind(BookingStatus::Requested)
    .bind(BookingStatus::Accepted)
    .fetch_all(pool)
    .await?;

    Ok(MonthView {
        availability,
        bookings,
    })
}

async fn rows_for(
    pool: &SqlitePool,
    artist_profile_id: &str,
    dates: &[NaiveDate],
) -> AppResult<Vec<AvailabilityRow>> {
    let mut rows = Vec::with_capacity(dates.len());
    for date in dates {
        let row = sqlx::query_as::<_, AvailabilityRow>(
            r#"SELECT id, artist_profile_id, date, is_blocked
               FROM availability
               WHERE artist_profile_id = ? AND date = ?"#,
        )
        .bind(artist_profile_id)
        .bind(date.to_string())
        .fetch_optional(pool)
        .await?;
        rows.extend(row);
    }
    Ok(rows)
}

/// Half-open `[first day, first day of next month)` as ISO date strings.
fn month_bounds(year: i32, month: u32) -> AppResult<(String, String)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::bad_request("Invalid year or month"))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| AppError::bad_request("Invalid year or month"))?;
    Ok((start.to_string(), end.to_string()))
}
