//! Flag and soft-delete overlay shared by media and reviews. Both tables
//! carry the same `flagged_at`, `flag_reason` and `removed_at` columns, so
//! every operation is written once against a [`ModeratedTable`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{log_activity, now},
    error::{AppError, AppResult},
    models::{MediaRow, Moderation, ReviewRow},
    services::{media::MEDIA_COLUMNS, reviews::REVIEW_COLUMNS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratedTable {
    Media,
    Reviews,
}

impl ModeratedTable {
    fn table(&self) -> &'static str {
        match self {
            ModeratedTable::Media => "media",
            ModeratedTable::Reviews => "reviews",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ModeratedTable::Media => "Media",
            ModeratedTable::Reviews => "Review",
        }
    }
}

impl FromStr for ModeratedTable {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "media" => Ok(ModeratedTable::Media),
            "reviews" => Ok(ModeratedTable::Reviews),
            other => Err(AppError::bad_request(format!(
                "Unknown moderation target: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedContent {
    pub media: Vec<MediaRow>,
    pub reviews: Vec<ReviewRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub id: String,
    #[serde(flatten)]
    pub moderation: Moderation,
}

pub async fn flag(
    pool: &SqlitePool,
    target: ModeratedTable,
    id: &str,
    reason: Option<String>,
    admin_id: &str,
) -> AppResult<ModerationResult> {
    let sql = format!(
        "UPDATE {} SET flagged_at = ?, flag_reason = ? WHERE id = ?",
        target.table()
    );
    apply(pool, target, id, sqlx::query(&sql).bind(now()).bind(reason).bind(id)).await?;
    log_activity(
        pool,
        "content_flagged",
        &format!("{} {id} flagged", target.label()),
        Some(admin_id),
        Some(id),
    )
    .await;
    state(pool, target, id).await
}

pub async fn unflag(
    pool: &SqlitePool,
    target: ModeratedTable,
    id: &str,
    admin_id: &str,
) -> AppResult<ModerationResult> {
    let sql = format!(
        "UPDATE {} SET flagged_at = NULL, flag_reason = NULL WHERE id = ?",
        target.table()
    );
    apply(pool, target, id, sqlx::query(&sql).bind(id)).await?;
    log_activity(
        pool,
        "content_unflagged",
        &format!("{} {id} unflagged", target.label()),
        Some(admin_id),
        Some(id),
    )
    .await;
    state(pool, target, id).await
}

/// Soft delete, independent of the flag.
pub async fn remove(
    pool: &SqlitePool,
    target: ModeratedTable,
    id: &str,
    admin_id: &str,
) -> AppResult<ModerationResult> {
    let sql = format!(
        "UPDATE {} SET removed_at = COALESCE(removed_at, ?) WHERE id = ?",
        target.table()
    );
    apply(pool, target, id, sqlx::query(&sql).bind(now()).bind(id)).await?;
    log_activity(
        pool,
        "content_removed",
        &format!("{} {id} removed", target.label()),
        Some(admin_id),
        Some(id),
    )
    .await;
    state(pool, target, id).await
}

pub async fn list_flagged(pool: &SqlitePool) -> AppResult<FlaggedContent> {
    let media = sqlx::query_as::<_, MediaRow>(&format!(
        r#"SELECT {MEDIA_COLUMNS}
           FROM media m
           WHERE m.flagged_at IS NOT NULL AND m.removed_at IS NULL
           ORDER BY m.flagged_at DESC"#
    ))
    .fetch_all(pool)
    .await?;

    let reviews = sqlx::query_as::<_, ReviewRow>(&format!(
        r#"SELECT {REVIEW_COLUMNS}
           FROM reviews r
           WHERE r.flagged_at IS NOT NULL AND r.removed_at IS NULL
           ORDER BY r.flagged_at DESC"#
    ))
    .fetch_all(pool)
    .await?;

    Ok(FlaggedContent { media, reviews })
}

async fn apply<'q>(
    pool: &SqlitePool,
    target: ModeratedTable,
    id: &str,
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
) -> AppResult<()> {
    let result = query.execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("{} {id} not found", target.label())));
    }
    Ok(())
}

async fn state(pool: &SqlitePool, target: ModeratedTable, id: &str) -> AppResult<ModerationResult> {
    let sql = format!(
        "SELECT flagged_at, flag_reason, removed_at FROM {} WHERE id = ?",
        target.table()
    );
    let moderation = sqlx::query_as::<_, Moderation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {id} not found", target.label())))?;
    Ok(ModerationResult {
        id: id.to_string(),
        moderation,
    })
}
