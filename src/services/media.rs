use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{new_id, now},
    error::{AppError, AppResult},
    models::{MediaKind, MediaRow},
    services::artists,
};

pub(crate) const MEDIA_COLUMNS: &str = "m.id, m.artist_profile_id, m.kind, m.url, m.caption, \
    m.sort_order, m.created_at, m.flagged_at, m.flag_reason, m.removed_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub caption: Option<String>,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<MediaRow>> {
    let row = sqlx::query_as::<_, MediaRow>(&format!(
        "SELECT {MEDIA_COLUMNS} FROM media m WHERE m.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Appends to the end of the owner's gallery.
pub async fn add(pool: &SqlitePool, user_id: &str, input: NewMedia) -> AppResult<MediaRow> {
    let profile = artists::profile_for_user(pool, user_id).await?;

    let next: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM media WHERE artist_profile_id = ?",
    )
    .bind(&profile.id)
    .fetch_one(pool)
    .await?;

    let id = new_id();
    sqlx::query(
        r#"INSERT INTO media (id, artist_profile_id, kind, url, caption, sort_order, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&profile.id)
    .bind(input.kind)
    .bind(&input.url)
    .bind(&input.caption)
    .bind(next)
    .bind(now())
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("media {id} vanished after insert")))
}

/// Soft delete by the owning artist.
pub async fn remove(pool: &SqlitePool, id: &str, user_id: &str) -> AppResult<MediaRow> {
    let media = find_by_id(pool, id)
        .await?
        .filter(|media| !media.moderation.is_removed())
        .ok_or_else(|| AppError::not_found("Media not found"))?;
    let profile = artists::find_by_id(pool, &media.artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;
    if profile.user_id != user_id {
        return Err(AppError::forbidden("You can only remove your own media"));
    }

    sqlx::query("UPDATE media SET removed_at = ? WHERE id = ?")
        .bind(now())
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Media not found"))
}

/// Rewrites sort order to each id's position. Ids owned by another artist
/// match no row and are left alone.
pub async fn reorder(
    pool: &SqlitePool,
    user_id: &str,
    ordered_ids: &[String],
) -> AppResult<Vec<MediaRow>> {
    let profile = artists::profile_for_user(pool, user_id).await?;

    let mut tx = pool.begin().await?;
    for (position, media_id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE media SET sort_order = ? WHERE id = ? AND artist_profile_id = ?")
            .bind(position as i64)
            .bind(media_id)
            .bind(&profile.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    list_by_artist(pool, &profile.id).await
}

pub async fn list_by_artist(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<Vec<MediaRow>> {
    let rows = sqlx::query_as::<_, MediaRow>(&format!(
        r#"SELECT {MEDIA_COLUMNS}
           FROM media m
           WHERE m.artist_profile_id = ? AND m.removed_at IS NULL
           ORDER BY m.sort_order, m.created_at"#
    ))
    .bind(artist_profile_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
