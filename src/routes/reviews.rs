use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::AppResult,
    models::Role,
    routes::{ok_json, required},
    services::reviews,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewRequest {
    booking_id: String,
    rating: i64,
    comment: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reviews")
            .service(web::resource("").route(web::post().to(create)))
            .service(
                web::resource("/artist/{artist_profile_id}").route(web::get().to(by_artist)),
            ),
    );
}

async fn create(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<CreateReviewRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Client])?;
    let body = body.into_inner();
    let booking_id = required("bookingId", &body.booking_id)?;
    let comment = body
        .comment
        .map(|comment| comment.trim().to_string())
        .filter(|comment| !comment.is_empty());

    let review = reviews::create(&state.db, &auth.id, &booking_id, body.rating, comment).await?;
    Ok(HttpResponse::Created().json(review))
}

async fn by_artist(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let reviews = reviews::list_by_artist(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&reviews))
}
