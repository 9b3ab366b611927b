use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{request_code, verify_code, AuthUser},
    error::AppResult,
    models::Role,
    routes::{ok_json, required},
    services::users::{self, UserUpdate},
    state::AppState,
};

#[derive(Deserialize)]
struct SendOtpRequest {
    phone: String,
}

#[derive(Deserialize)]
struct VerifyOtpRequest {
    phone: String,
    otp: String,
    role: Option<Role>,
}

#[derive(Deserialize)]
struct UpdateMeRequest {
    name: Option<String>,
    email: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(web::resource("/send-otp").route(web::post().to(send_otp)))
            .service(web::resource("/verify-otp").route(web::post().to(verify_otp)))
            .service(
                web::resource("/me")
                    .route(web::get().to(me))
                    .route(web::patch().to(update_me)),
            ),
    );
}

async fn send_otp(
    state: web::Data<AppState>,
    body: web::Json<SendOtpRequest>,
) -> AppResult<HttpResponse> {
    let phone = required("phone", &body.phone)?;
    request_code(state.otp.as_ref(), &phone, state.log_otp_codes);
    Ok(ok_json(&json!({ "success": true, "message": "OTP sent" })))
}

async fn verify_otp(
    state: web::Data<AppState>,
    body: web::Json<VerifyOtpRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let phone = required("phone", &body.phone)?;
    let otp = required("otp", &body.otp)?;
    let session = verify_code(
        &state.db,
        state.otp.as_ref(),
        &state.sessions,
        &phone,
        &otp,
        body.role,
    )
    .await?;
    log::info!("User {} signed in", session.user.id);
    Ok(ok_json(&session))
}

async fn me(state: web::Data<AppState>, auth: AuthUser) -> AppResult<HttpResponse> {
    let current = users::current_user(&state.db, &auth.id).await?;
    Ok(ok_json(&current))
}

async fn update_me(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<UpdateMeRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let name = body.name.as_deref().map(|name| required("name", name)).transpose()?;
    let email = body
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());
    let current = users::update(&state.db, &auth.id, UserUpdate { name, email }).await?;
    Ok(ok_json(&current))
}
