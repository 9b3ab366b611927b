pub mod admin;
pub mod art_forms;
pub mod artists;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod media;
pub mod public;
pub mod reviews;

use actix_web::{error::InternalError, web, HttpResponse};
use chrono::NaiveDate;

use crate::error::AppError;

/// Mounts the JSON API under `/api` and the health probe at the root.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config());
    public::configure(cfg);
    cfg.service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(art_forms::configure)
            .configure(artists::configure)
            .configure(bookings::configure)
            .configure(availability::configure)
            .configure(reviews::configure)
            .configure(media::configure)
            .configure(admin::configure),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = AppError::bad_request(err.to_string());
        InternalError::from_response(err, actix_web::ResponseError::error_response(&response))
            .into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = AppError::bad_request(err.to_string());
        InternalError::from_response(err, actix_web::ResponseError::error_response(&response))
            .into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = AppError::bad_request(err.to_string());
        InternalError::from_response(err, actix_web::ResponseError::error_response(&response))
            .into()
    })
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("Invalid date: {value} (expected YYYY-MM-DD)")))
}

pub(crate) fn parse_dates(values: &[String]) -> Result<Vec<NaiveDate>, AppError> {
    if values.is_empty() {
        return Err(AppError::bad_request("dates must not be empty"));
    }
    values.iter().map(|value| parse_date(value)).collect()
}

pub(crate) fn ok_json<T: serde::Serialize>(body: &T) -> HttpResponse {
    HttpResponse::Ok().json(body)
}
