use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{MediaKind, Role},
    routes::{ok_json, required},
    services::media::{self, NewMedia},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlRequest {
    filename: String,
    content_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    ordered_ids: Vec<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/media")
            .service(web::resource("").route(web::post().to(add)))
            .service(web::resource("/upload-url").route(web::post().to(upload_url)))
            .service(web::resource("/reorder").route(web::patch().to(reorder)))
            .service(
                web::resource("/artist/{artist_profile_id}").route(web::get().to(by_artist)),
            )
            .service(web::resource("/{id}").route(web::delete().to(remove))),
    );
}

async fn upload_url(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<UploadUrlRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let presigner = state
        .uploads
        .as_ref()
        .ok_or_else(|| AppError::bad_request("File upload is not configured"))?;
    let filename = required("filename", &body.filename)?;
    let ticket = presigner.upload_url(&auth.id, &filename, body.content_type.trim())?;
    Ok(ok_json(&ticket))
}

async fn add(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<NewMedia>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let mut input = body.into_inner();
    input.url = required("url", &input.url)?;
    if input.kind == MediaKind::VideoLink && !is_web_url(&input.url) {
        return Err(AppError::bad_request("Video links must be http(s) URLs"));
    }
    let media = media::add(&state.db, &auth.id, input).await?;
    Ok(HttpResponse::Created().json(media))
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

async fn remove(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let media = media::remove(&state.db, &path.into_inner(), &auth.id).await?;
    Ok(ok_json(&media))
}

async fn reorder(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<ReorderRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let gallery = media::reorder(&state.db, &auth.id, &body.ordered_ids).await?;
    Ok(ok_json(&gallery))
}

async fn by_artist(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let gallery = media::list_by_artist(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&gallery))
}
