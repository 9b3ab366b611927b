use actix_web::{web, HttpResponse};

use crate::{error::AppResult, routes::ok_json, services::art_forms, state::AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/art-forms")
            .service(web::resource("").route(web::get().to(list)))
            .service(web::resource("/{slug}").route(web::get().to(detail))),
    );
}

async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let forms = art_forms::list_with_counts(&state.db).await?;
    Ok(ok_json(&forms))
}

async fn detail(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let detail = art_forms::detail_by_slug(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&detail))
}
