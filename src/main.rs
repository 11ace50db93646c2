extern crate actix_multipart;
extern crate actix_web;
extern crate anyhow;
extern crate chrono;
extern crate dotenv;
extern crate env_logger;
extern crate futures_util;
extern crate hex;
extern crate itertools;
extern crate jsonwebtoken;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate sha2;
extern crate thiserror;

mod config;
mod context;
mod core;
mod error;
mod handlers;
mod impls;
mod middlewares;
pub mod request;
pub mod response;
mod session;

use actix_web::web::Data;
use actix_web::HttpServer;
use anyhow::anyhow;
use log::info;

use config::{Config, DataPaths};
use impls::store::json::JsonStore;
use session::Sessions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|e| anyhow!("failed to load configuration: {}", e))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,actix_web=info")).init();

    let paths = DataPaths::new(&config.data_root);
    let store = Data::new(JsonStore::new(paths).map_err(|e| anyhow!("failed to prepare the data directory: {}", e))?);
    core::services::user::ensure_admin(store.get_ref(), &config.admin_password)
        .await
        .map_err(|e| anyhow!("failed to bootstrap the admin account: {}", e))?;
    let sessions = Data::new(Sessions::new());

    let bind_addr = config.bind_addr.clone();
    info!("serving {} on {}", config.data_root.display(), bind_addr);
    let config = Data::new(config);
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(store.clone())
            .app_data(sessions.clone())
            .app_data(config.clone())
            .configure(handlers::routes::<JsonStore>(config.jwt_secret.clone()))
    })
    .bind(bind_addr)?
    .run()
    .await?;
    Ok(())
}
