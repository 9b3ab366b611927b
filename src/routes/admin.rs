use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    auth::{admin_validator, AuthUser},
    error::AppResult,
    models::KycStatus,
    routes::{ok_json, required},
    services::{
        admin,
        art_forms::{self, ArtFormUpdate, NewArtForm},
        moderation::{self, ModeratedTable},
    },
    state::AppState,
};

#[derive(Deserialize)]
struct BookingFilter {
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KycRequest {
    kyc_status: KycStatus,
}

#[derive(Deserialize, Default)]
struct FlagRequest {
    reason: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::bearer(admin_validator))
            .service(web::resource("/stats").route(web::get().to(stats)))
            .service(web::resource("/activity").route(web::get().to(activity)))
            .service(web::resource("/artists/pending").route(web::get().to(pending_artists)))
            .service(web::resource("/artists/{id}/approve").route(web::patch().to(approve)))
            .service(web::resource("/artists/{id}/reject").route(web::patch().to(reject)))
            .service(web::resource("/artists/{id}/kyc").route(web::patch().to(set_kyc)))
            .service(web::resource("/bookings").route(web::get().to(bookings)))
            .service(
                web::resource("/art-forms")
                    .route(web::get().to(list_art_forms))
                    .route(web::post().to(create_art_form)),
            )
            .service(
                web::resource("/art-forms/{id}")
                    .route(web::patch().to(update_art_form))
                    .route(web::delete().to(delete_art_form)),
            )
            .service(web::resource("/moderation").route(web::get().to(flagged)))
            .service(
                web::resource("/moderation/{target}/{id}/flag").route(web::patch().to(flag)),
            )
            .service(
                web::resource("/moderation/{target}/{id}/unflag").route(web::patch().to(unflag)),
            )
            .service(
                web::resource("/moderation/{target}/{id}/remove").route(web::patch().to(remove)),
            ),
    );
}

async fn stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(ok_json(&admin::stats(&state.db).await?))
}

async fn activity(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(ok_json(&admin::activity(&state.db).await?))
}

async fn pending_artists(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(ok_json(&admin::pending_artists(&state.db).await?))
}

async fn approve(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let profile = admin::approve(&state.db, &path.into_inner(), &auth.id).await?;
    Ok(ok_json(&profile))
}

async fn reject(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let profile = admin::reject(&state.db, &path.into_inner(), &auth.id).await?;
    Ok(ok_json(&profile))
}

async fn set_kyc(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    body: web::Json<KycRequest>,
) -> AppResult<HttpResponse> {
    let profile =
        admin::set_kyc_status(&state.db, &path.into_inner(), body.kyc_status, &auth.id).await?;
    Ok(ok_json(&profile))
}

async fn bookings(
    state: web::Data<AppState>,
    query: web::Query<BookingFilter>,
) -> AppResult<HttpResponse> {
    let bookings = admin::bookings(&state.db, query.status.as_deref()).await?;
    Ok(ok_json(&bookings))
}

async fn list_art_forms(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(ok_json(&art_forms::list_all(&state.db).await?))
}

async fn create_art_form(
    state: web::Data<AppState>,
    body: web::Json<NewArtForm>,
) -> AppResult<HttpResponse> {
    let mut input = body.into_inner();
    input.name = required("name", &input.name)?;
    input.slug = required("slug", &input.slug)?.to_lowercase();
    let art_form = art_forms::create(&state.db, input).await?;
    Ok(HttpResponse::Created().json(art_form))
}

async fn update_art_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ArtFormUpdate>,
) -> AppResult<HttpResponse> {
    let mut input = body.into_inner();
    if let Some(name) = input.name.as_deref() {
        input.name = Some(required("name", name)?);
    }
    if let Some(slug) = input.slug.as_deref() {
        input.slug = Some(required("slug", slug)?.to_lowercase());
    }
    let art_form = art_forms::update(&state.db, &path.into_inner(), input).await?;
    Ok(ok_json(&art_form))
}

async fn delete_art_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let art_form = art_forms::delete(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&art_form))
}

async fn flagged(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(ok_json(&moderation::list_flagged(&state.db).await?))
}

async fn flag(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(String, String)>,
    body: Option<web::Json<FlagRequest>>,
) -> AppResult<HttpResponse> {
    let (target, id) = path.into_inner();
    let target = target.parse::<ModeratedTable>()?;
    let reason = body
        .map(|body| body.into_inner())
        .unwrap_or_default()
        .reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    let result = moderation::flag(&state.db, target, &id, reason, &auth.id).await?;
    Ok(ok_json(&result))
}

async fn unflag(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (target, id) = path.into_inner();
    let result = moderation::unflag(&state.db, target.parse()?, &id, &auth.id).await?;
    Ok(ok_json(&result))
}

async fn remove(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (target, id) = path.into_inner();
    let result = moderation::remove(&state.db, target.parse()?, &id, &auth.id).await?;
    Ok(ok_json(&result))
}
