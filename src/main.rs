use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use chrono::Duration as ChronoDuration;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod mailer;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use db::init_db;
use mailer::Mailer;

use crate::docs::ApiDoc;
use crate::utils::member_cache;
use crate::utils::member_filter;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Lab Management API"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;
    let mailer = Mailer::from_config(&config);

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();
    // Clone values for the closures before config is moved
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = member_filter::warmup_member_filter(&pool_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup member filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up active members in batches of 250
        if let Err(e) = member_cache::warmup_member_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup member cache: {:?}", e);
        }
    });

    // Daily auto-absent sweep: anyone without a record at midnight is
    // marked absent until an explicit mark overwrites it.
    if config.sweep_enabled {
        let pool_for_sweep = pool.clone();
        actix_web::rt::spawn(async move {
            loop {
                let now = chrono::Local::now();
                let next_midnight = (now.date_naive() + ChronoDuration::days(1))
                    .and_hms_opt(0, 0, 5)
                    .expect("valid wall-clock time");
                let wait = (next_midnight - now.naive_local())
                    .to_std()
                    .unwrap_or_else(|_| std::time::Duration::from_secs(60));

                actix_web::rt::time::sleep(wait).await;

                let today = chrono::Local::now().date_naive();
                match api::attendance::run_absence_sweep(&pool_for_sweep, today).await {
                    Ok(inserted) => {
                        info!(date = %today, inserted, "Daily absence sweep complete")
                    }
                    Err(e) => error!(error = %e, date = %today, "Daily absence sweep failed"),
                }
            }
        });
    }

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(mailer.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
