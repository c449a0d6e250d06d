//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use helpdesk::inbound::http::health::HealthState;
use helpdesk::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{BuildMode, ServerConfig, ServerSettings, create_server, session_settings};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().wrap_err("failed to load settings")?;
    let session = session_settings(&settings, BuildMode::current())
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr().wrap_err("invalid bind address")?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_demo_data(settings.demo_data())
    .with_login_password(settings.login_password.clone());

    if let Some(url) = settings.database_url.as_deref() {
        run_migrations(url)
            .await
            .wrap_err("failed to apply migrations")?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_max_connections()))
            .await
            .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    info!(%bind_addr, "starting helpdesk server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await?;
    Ok(())
}
