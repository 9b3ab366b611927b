use actix_web::{middleware, App, HttpServer};

use folkstage::{config::AppConfig, configure_app, db, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, &config).await?;

    let state = AppState::from_config(pool, &config)?;
    if !state.notifier.enabled() {
        log::info!("Notifications disabled; booking events will not be delivered");
    }
    if state.uploads.is_none() {
        log::info!("Object storage not configured; presigned uploads are disabled");
    }

    let address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting Folkstage API on http://{address}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(configure_app(state.clone()))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
