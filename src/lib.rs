pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use actix_web::web;

use crate::state::AppState;

/// Registers shared state and every route; used by `main` and the tests.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state));
        routes::configure(cfg);
    }
}
