use actix_web::{web, HttpResponse};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::AuthUser,
    error::AppResult,
    models::Role,
    routes::{ok_json, parse_dates},
    services::{artists, availability},
    state::AppState,
};

#[derive(Deserialize)]
struct DatesRequest {
    dates: Vec<String>,
}

#[derive(Deserialize)]
struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/availability")
            .service(
                web::resource("")
                    .route(web::post().to(block))
                    .route(web::delete().to(unblock)),
            )
            .service(web::resource("/{artist_profile_id}").route(web::get().to(month))),
    );
}

async fn block(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<DatesRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let dates = parse_dates(&body.dates)?;
    let profile = artists::profile_for_user(&state.db, &auth.id).await?;
    let rows = availability::block_dates(&state.db, &profile.id, &dates).await?;
    Ok(ok_json(&rows))
}

async fn unblock(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<DatesRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let dates = parse_dates(&body.dates)?;
    let profile = artists::profile_for_user(&state.db, &auth.id).await?;
    let removed = availability::unblock_dates(&state.db, &profile.id, &dates).await?;
    Ok(ok_json(&json!({ "success": true, "removed": removed })))
}

/// Defaults to the current month when `year`/`month` are omitted.
async fn month(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<MonthQuery>,
) -> AppResult<HttpResponse> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let view = availability::month(&state.db, &path.into_inner(), year, month).await?;
    Ok(ok_json(&view))
}
