use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    db::{new_id, now},
    error::{AppError, AppResult},
    models::ArtFormRow,
    services::artists::{self, ArtistSummary},
};

const ART_FORM_COLUMNS: &str =
    "af.id, af.slug, af.name, af.region, af.category, af.description, af.created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArtFormWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub art_form: ArtFormRow,
    pub artist_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtFormDetail {
    #[serde(flatten)]
    pub art_form: ArtFormRow,
    pub artists: Vec<ArtistSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtForm {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtFormUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
}

pub async fn list_with_counts(pool: &SqlitePool) -> AppResult<Vec<ArtFormWithCount>> {
    let rows = sqlx::query_as::<_, ArtFormWithCount>(&format!(
        r#"SELECT {ART_FORM_COLUMNS},
                  (SELECT COUNT(*)
                   FROM artist_art_forms aaf
                   JOIN artist_profiles p ON p.id = aaf.artist_profile_id
                   WHERE aaf.art_form_id = af.id AND p.is_approved = 1 AND p.is_active = 1
                  ) AS artist_count
           FROM art_forms af
           ORDER BY af.name"#
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<ArtFormRow>> {
    let row = sqlx::query_as::<_, ArtFormRow>(&format!(
        "SELECT {ART_FORM_COLUMNS} FROM art_forms af WHERE af.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<Option<ArtFormRow>> {
    let row = sqlx::query_as::<_, ArtFormRow>(&format!(
        "SELECT {ART_FORM_COLUMNS} FROM art_forms af WHERE af.slug = ?"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn detail_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<ArtFormDetail> {
    let art_form = find_by_slug(pool, slug)
        .await?
        .ok_or_else(|| AppError::not_found("Art form not found"))?;
    let artists = artists::by_art_form_slug(pool, slug).await?;
    Ok(ArtFormDetail { art_form, artists })
}

pub async fn for_artist(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<Vec<ArtFormRow>> {
    let rows = sqlx::query_as::<_, ArtFormRow>(&format!(
        r#"SELECT {ART_FORM_COLUMNS}
           FROM art_forms af
           JOIN artist_art_forms aaf ON aaf.art_form_id = af.id
           WHERE aaf.artist_profile_id = ?
           ORDER BY af.name"#
    ))
    .bind(artist_profile_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Replaces the artist's art-form links inside the caller's transaction.
pub async fn link_artist(
    tx: &mut Transaction<'_, Sqlite>,
    artist_profile_id: &str,
    art_form_ids: &[String],
) -> AppResult<()> {
    for art_form_id in art_form_ids {
        let exists = sqlx::query_scalar::<_, String>("SELECT id FROM art_forms WHERE id = ?")
            .bind(art_form_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::bad_request(format!("Unknown art form: {art_form_id}")));
        }
    }

    sqlx::query("DELETE FROM artist_art_forms WHERE artist_profile_id = ?")
        .bind(artist_profile_id)
        .execute(&mut **tx)
        .await?;

    for art_form_id in art_form_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO artist_art_forms (artist_profile_id, art_form_id) VALUES (?, ?)",
        )
        .bind(artist_profile_id)
        .bind(art_form_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<ArtFormRow>> {
    let rows = sqlx::query_as::<_, ArtFormRow>(&format!(
        "SELECT {ART_FORM_COLUMNS} FROM art_forms af ORDER BY af.name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, input: NewArtForm) -> AppResult<ArtFormRow> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO art_forms (id, slug, name, region, category, description, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.region)
    .bind(&input.category)
    .bind(&input.description)
    .bind(now())
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("art form {id} vanished after insert")))
}

pub async fn update(pool: &SqlitePool, id: &str, input: ArtFormUpdate) -> AppResult<ArtFormRow> {
    if find_by_id(pool, id).await?.is_none() {
        return Err(AppError::not_found("Art form not found"));
    }

    sqlx::query(
        r#"UPDATE art_forms
           SET name = COALESCE(?, name),
               slug = COALESCE(?, slug),
               description = COALESCE(?, description),
               region = COALESCE(?, region),
               category = COALESCE(?, category)
           WHERE id = ?"#,
    )
    .bind(input.name)
    .bind(input.slug)
    .bind(input.description)
    .bind(input.region)
    .bind(input.category)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Art form not found"))
}

pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<ArtFormRow> {
    let art_form = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Art form not found"))?;

    let linked: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM artist_art_forms WHERE art_form_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if linked > 0 {
        return Err(AppError::bad_request(
            "Cannot delete art form with linked artists",
        ));
    }

    sqlx::query("DELETE FROM art_forms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(art_form)
}
