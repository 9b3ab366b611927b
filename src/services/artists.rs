use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{new_id, now},
    error::{AppError, AppResult},
    models::{ArtFormRow, ArtistProfileRow, MediaRow, Role},
    services::{
        art_forms, media,
        reviews::{self, RatingSummary, ReviewView},
        users,
    },
};

pub(crate) const PROFILE_COLUMNS: &str = "p.id, p.user_id, p.group_name, p.description, \
    p.base_price, p.price_unit, p.group_size, p.service_areas, p.languages, p.experience, \
    p.based_in, p.is_approved, p.is_active, p.kyc_status, p.created_at, p.updated_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtistProfile {
    pub group_name: String,
    pub description: Option<String>,
    pub art_form_ids: Vec<String>,
    pub group_size: Option<i64>,
    pub base_price: i64,
    pub price_unit: Option<String>,
    pub service_areas: Vec<String>,
    pub based_in: String,
    pub languages: Option<Vec<String>>,
    pub experience: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfileUpdate {
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub art_form_ids: Option<Vec<String>>,
    pub group_size: Option<i64>,
    pub base_price: Option<i64>,
    pub price_unit: Option<String>,
    pub service_areas: Option<Vec<String>>,
    pub based_in: Option<String>,
    pub languages: Option<Vec<String>>,
    pub experience: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistFilters {
    pub art_form: Option<String>,
    pub city: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistWithForms {
    #[serde(flatten)]
    pub profile: ArtistProfileRow,
    pub art_forms: Vec<ArtFormRow>,
}

/// A new profile plus a token carrying the owner's promoted role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedArtist {
    #[serde(flatten)]
    pub artist: ArtistWithForms,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    #[serde(flatten)]
    pub profile: ArtistProfileRow,
    pub owner_name: String,
    pub art_forms: Vec<ArtFormRow>,
    pub media: Vec<MediaRow>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDetail {
    #[serde(flatten)]
    pub summary: ArtistSummary,
    pub reviews: Vec<ReviewView>,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<ArtistProfileRow>> {
    let row = sqlx::query_as::<_, ArtistProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM artist_profiles p WHERE p.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<Option<ArtistProfileRow>> {
    let row = sqlx::query_as::<_, ArtistProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM artist_profiles p WHERE p.user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The calling artist's own profile, required by every artist-scoped write.
pub async fn profile_for_user(pool: &SqlitePool, user_id: &str) -> AppResult<ArtistProfileRow> {
    find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))
}

pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    input: NewArtistProfile,
) -> AppResult<ArtistWithForms> {
    let id = new_id();
    let timestamp = now();
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, String>("SELECT id FROM artist_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(AppError::bad_request("An artist profile already exists for this user"));
    }

    sqlx::query(
        r#"INSERT INTO artist_profiles
           (id, user_id, group_name, description, base_price, price_unit, group_size,
            service_areas, languages, experience, based_in, is_approved, is_active,
            kyc_status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 1, 'NOT_SUBMITTED', ?, ?)"#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&input.group_name)
    .bind(&input.description)
    .bind(input.base_price)
    .bind(input.price_unit.as_deref().unwrap_or("per event"))
    .bind(input.group_size)
    .bind(to_json(&input.service_areas))
    .bind(to_json(&input.languages.unwrap_or_default()))
    .bind(input.experience)
    .bind(&input.based_in)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    art_forms::link_artist(&mut tx, &id, &input.art_form_ids).await?;
    users::promote(&mut tx, user_id, Role::Artist).await?;

    tx.commit().await?;
    with_forms(pool, &id).await
}

pub async fn update(
    pool: &SqlitePool,
    artist_profile_id: &str,
    caller_id: &str,
    input: ArtistProfileUpdate,
) -> AppResult<ArtistWithForms> {
    let profile = find_by_id(pool, artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;
    if profile.user_id != caller_id {
        return Err(AppError::forbidden("You can only update your own profile"));
    }

    let mut tx = pool.begin().await?;
    if let Some(art_form_ids) = &input.art_form_ids {
        art_forms::link_artist(&mut tx, artist_profile_id, art_form_ids).await?;
    }

    sqlx::query(
        r#"UPDATE artist_profiles
           SET group_name = COALESCE(?, group_name),
               description = COALESCE(?, description),
               group_size = COALESCE(?, group_size),
               base_price = COALESCE(?, base_price),
               price_unit = COALESCE(?, price_unit),
               service_areas = COALESCE(?, service_areas),
               based_in = COALESCE(?, based_in),
               languages = COALESCE(?, languages),
               experience = COALESCE(?, experience),
               updated_at = ?
           WHERE id = ?"#,
    )
    .bind(input.group_name)
    .bind(input.description)
    .bind(input.group_size)
    .bind(input.base_price)
    .bind(input.price_unit)
    .bind(input.service_areas.as_ref().map(|areas| to_json(areas)))
    .bind(input.based_in)
    .bind(input.languages.as_ref().map(|languages| to_json(languages)))
    .bind(input.experience)
    .bind(now())
    .bind(artist_profile_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    with_forms(pool, artist_profile_id).await
}

pub async fn with_forms(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<ArtistWithForms> {
    let profile = find_by_id(pool, artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;
    let art_forms = art_forms::for_artist(pool, artist_profile_id).await?;
    Ok(ArtistWithForms { profile, art_forms })
}

pub async fn search(pool: &SqlitePool, filters: &ArtistFilters) -> AppResult<Vec<ArtistSummary>> {
    let art_form = non_empty(&filters.art_form);
    let city = non_empty(&filters.city);
    let search = non_empty(&filters.search);

    let profiles = sqlx::query_as::<_, ArtistProfileRow>(&format!(
        r#"SELECT {PROFILE_COLUMNS}
           FROM artist_profiles p
           WHERE p.is_approved = 1 AND p.is_active = 1
             AND (?1 IS NULL OR EXISTS (
                   SELECT 1 FROM artist_art_forms aaf
                   JOIN art_forms af ON af.id = aaf.art_form_id
                   WHERE aaf.artist_profile_id = p.id AND af.slug = ?1))
             AND (?2 IS NULL OR instr(lower(p.based_in), lower(?2)) > 0)
             AND (?3 IS NULL OR instr(lower(p.group_name), lower(?3)) > 0)
           ORDER BY p.created_at DESC"#
    ))
    .bind(art_form)
    .bind(city)
    .bind(search)
    .fetch_all(pool)
    .await?;

    summarize_all(pool, profiles).await
}

pub async fn by_art_form_slug(pool: &SqlitePool, slug: &str) -> AppResult<Vec<ArtistSummary>> {
    search(
        pool,
        &ArtistFilters {
            art_form: Some(slug.to_string()),
            ..ArtistFilters::default()
        },
    )
    .await
}

pub async fn detail(pool: &SqlitePool, artist_profile_id: &str) -> AppResult<ArtistDetail> {
    let profile = find_by_id(pool, artist_profile_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist profile not found"))?;
    let summary = summarize(pool, profile).await?;
    let reviews = reviews::list_by_artist(pool, artist_profile_id).await?;
    Ok(ArtistDetail { summary, reviews })
}

async fn summarize_all(
    pool: &SqlitePool,
    profiles: Vec<ArtistProfileRow>,
) -> AppResult<Vec<ArtistSummary>> {
    let mut summaries = Vec::with_capacity(profiles.len());
    for profile in profiles {
        summaries.push(summarize(pool, profile).await?);
    }
    Ok(summaries)
}

async fn summarize(pool: &SqlitePool, profile: ArtistProfileRow) -> AppResult<ArtistSummary> {
    let owner_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(&profile.user_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or_default();
    let art_forms = art_forms::for_artist(pool, &profile.id).await?;
    let media = media::list_by_artist(pool, &profile.id).await?;
    let RatingSummary { average, count } = reviews::rating_summary(pool, &profile.id).await?;

    Ok(ArtistSummary {
        profile,
        owner_name,
        art_forms,
        media,
        average_rating: average,
        review_count: count,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
