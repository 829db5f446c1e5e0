use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use seiman_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::Notifier,
    handlers,
    middlewares::{OwnerMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Prize pools are provisioned out of band and loaded once; the catalog
    // is immutable for the lifetime of the process
    let catalog = Arc::new(
        PoolCatalog::load(&pool)
            .await
            .expect("Failed to load prize pool catalog"),
    );
    log::info!("Loaded {} prize pools", catalog.pools().len());

    let notifier = Notifier::new(config.notifier.clone());

    let ledger_service = LedgerService::new(pool.clone());
    let reward_service = RewardService::new(pool.clone(), catalog.clone());
    let gacha_service = GachaService::new(
        pool.clone(),
        catalog.clone(),
        ledger_service.clone(),
        reward_service.clone(),
    );

    // Periodic balance-vs-log reconciliation
    tasks::spawn_all(pool.clone(), config.reconciliation.interval_secs);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(OwnerMiddleware)
            .app_data(web::Data::new(ledger_service.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(gacha_service.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::points_config)
                    .configure(handlers::gacha_config)
                    .configure(handlers::inventory_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
