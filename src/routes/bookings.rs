use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::Role,
    routes::{ok_json, parse_date, required},
    services::bookings::{self, CreateBooking},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    artist_profile_id: String,
    event_date: String,
    event_time: Option<String>,
    event_type: String,
    event_location: String,
    venue_address: Option<String>,
    duration: Option<i64>,
    message: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .service(web::resource("").route(web::post().to(create)))
            .service(web::resource("/my").route(web::get().to(mine)))
            .service(web::resource("/artist").route(web::get().to(for_artist)))
            .service(web::resource("/{id}").route(web::get().to(get)))
            .service(web::resource("/{id}/accept").route(web::patch().to(accept)))
            .service(web::resource("/{id}/decline").route(web::patch().to(decline)))
            .service(web::resource("/{id}/complete").route(web::patch().to(complete)))
            .service(web::resource("/{id}/cancel").route(web::patch().to(cancel))),
    );
}

async fn create(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<CreateBookingRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Client])?;
    let body = body.into_inner();

    if matches!(body.duration, Some(hours) if hours <= 0) {
        return Err(AppError::bad_request("duration must be positive"));
    }

    let input = CreateBooking {
        artist_profile_id: required("artistProfileId", &body.artist_profile_id)?,
        event_date: parse_date(&body.event_date)?,
        event_time: body.event_time,
        event_type: required("eventType", &body.event_type)?,
        event_location: required("eventLocation", &body.event_location)?,
        venue_address: body.venue_address,
        duration: body.duration,
        message: body.message,
    };
    let booking = bookings::create(&state.db, &state.notifier, &auth.id, input).await?;
    log::info!("Booking {} requested by {}", booking.id, auth.id);
    Ok(HttpResponse::Created().json(booking))
}

async fn mine(state: web::Data<AppState>, auth: AuthUser) -> AppResult<HttpResponse> {
    let bookings = bookings::list_for_client(&state.db, &auth.id).await?;
    Ok(ok_json(&bookings))
}

async fn for_artist(state: web::Data<AppState>, auth: AuthUser) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let bookings = bookings::list_for_artist(&state.db, &auth.id).await?;
    Ok(ok_json(&bookings))
}

async fn get(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let booking = bookings::get_authorized(&state.db, &path.into_inner(), &auth).await?;
    Ok(ok_json(&booking))
}

async fn accept(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let booking = bookings::accept(&state.db, &state.notifier, &path.into_inner(), &auth).await?;
    Ok(ok_json(&booking))
}

async fn decline(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist])?;
    let booking = bookings::decline(&state.db, &state.notifier, &path.into_inner(), &auth).await?;
    Ok(ok_json(&booking))
}

async fn complete(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Artist, Role::Admin])?;
    let booking = bookings::complete(&state.db, &state.notifier, &path.into_inner(), &auth).await?;
    Ok(ok_json(&booking))
}

async fn cancel(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let booking = bookings::cancel(&state.db, &state.notifier, &path.into_inner(), &auth).await?;
    Ok(ok_json(&booking))
}
