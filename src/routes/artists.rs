use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::Role,
    routes::{ok_json, required},
    services::artists::{
        self, ArtistFilters, ArtistProfileUpdate, CreatedArtist, NewArtistProfile,
    },
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArtistRequest {
    group_name: String,
    description: Option<String>,
    art_form_ids: Vec<String>,
    group_size: Option<i64>,
    base_price: i64,
    price_unit: Option<String>,
    service_areas: Option<Vec<String>>,
    based_in: String,
    languages: Option<Vec<String>>,
    experience: Option<i64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/artists")
            .service(
                web::resource("")
                    .route(web::get().to(search))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/art-form/{slug}").route(web::get().to(by_art_form)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(detail))
                    .route(web::patch().to(update)),
            ),
    );
}

async fn search(
    state: web::Data<AppState>,
    query: web::Query<ArtistFilters>,
) -> AppResult<HttpResponse> {
    let artists = artists::search(&state.db, &query).await?;
    Ok(ok_json(&artists))
}

async fn by_art_form(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let artists = artists::by_art_form_slug(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&artists))
}

async fn detail(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let artist = artists::detail(&state.db, &path.into_inner()).await?;
    Ok(ok_json(&artist))
}

async fn create(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<CreateArtistRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Client, Role::Artist])?;
    let body = body.into_inner();

    if body.art_form_ids.is_empty() {
        return Err(AppError::bad_request("At least one art form is required"));
    }
    if body.base_price < 0 {
        return Err(AppError::bad_request("basePrice must not be negative"));
    }

    let input = NewArtistProfile {
        group_name: required("groupName", &body.group_name)?,
        description: body.description,
        art_form_ids: body.art_form_ids,
        group_size: body.group_size,
        base_price: body.base_price,
        price_unit: body.price_unit,
        service_areas: body.service_areas.unwrap_or_default(),
        based_in: required("basedIn", &body.based_in)?,
        languages: body.languages,
        experience: body.experience,
    };
    let artist = artists::create(&state.db, &auth.id, input).await?;
    log::info!("Artist profile {} created by {}", artist.profile.id, auth.id);

    let role = if auth.role == Role::Client {
        Role::Artist
    } else {
        auth.role
    };
    let token = state.sessions.issue(&auth.id, role);
    Ok(HttpResponse::Created().json(CreatedArtist { artist, token }))
}

async fn update(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<ArtistProfileUpdate>,
) -> AppResult<HttpResponse> {
    let mut input = body.into_inner();
    if let Some(group_name) = input.group_name.as_deref() {
        input.group_name = Some(required("groupName", group_name)?);
    }
    if let Some(based_in) = input.based_in.as_deref() {
        input.based_in = Some(required("basedIn", based_in)?);
    }
    if matches!(input.base_price, Some(price) if price < 0) {
        return Err(AppError::bad_request("basePrice must not be negative"));
    }

    let artist = artists::update(&state.db, &path.into_inner(), &auth.id, input).await?;
    Ok(ok_json(&artist))
}
