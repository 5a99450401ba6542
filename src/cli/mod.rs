use anyhow::{Context, Result, anyhow};
use actix_web::{App, HttpServer, middleware, web};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::Services;
use crate::domain::BaseSwitchPolicy;
use crate::http::{self, AppState};
use crate::storage::Database;

/// ecom-admin - back-office API for currencies and pricing
#[derive(Parser, Debug)]
#[command(name = "ecom-admin")]
#[command(about = "Back-office REST API for currencies, exchange rates and price lists")]
#[command(version)]
pub struct Cli {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:ecom.db?mode=rwc", global = true)]
    pub database_url: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080", global = true)]
    pub bind: String,

    /// Runtime environment; `development` exposes internal error details
    #[arg(long, env = "APP_ENV", default_value = "production", global = true)]
    pub app_env: String,

    /// What to do when the base currency changes without an exchange rate:
    /// `best-effort` keeps product prices, `strict` refuses the switch
    #[arg(long, env = "BASE_SWITCH_POLICY", default_value = "best-effort", global = true)]
    pub base_switch_policy: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply migrations and serve the API until Ctrl-C
    Serve,

    /// Apply migrations and exit
    Migrate,
}

impl Cli {
    pub fn policy(&self) -> Result<BaseSwitchPolicy> {
        BaseSwitchPolicy::from_str(&self.base_switch_policy).ok_or_else(|| {
            anyhow!(
                "Invalid base switch policy '{}': expected best-effort or strict",
                self.base_switch_policy
            )
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    pub async fn run(self) -> Result<()> {
        let policy = self.policy()?;
        let db = Database::init(&self.database_url).await?;
        info!(database = %self.database_url, "database ready");

        let result = match self.command {
            Commands::Migrate => Ok(()),
            Commands::Serve => self.serve(&db, policy).await,
        };

        db.close().await;
        result
    }

    async fn serve(&self, db: &Database, policy: BaseSwitchPolicy) -> Result<()> {
        let state = web::Data::new(AppState::new(
            Services::new(db, policy),
            self.is_development(),
        ));

        info!(
            bind = %self.bind,
            env = %self.app_env,
            %policy,
            "starting HTTP server"
        );

        HttpServer::new(move || {
            App::new()
                .wrap(middleware::Logger::default())
                .configure(http::configure(state.clone()))
        })
        .bind(&self.bind)
        .with_context(|| format!("Failed to bind {}", self.bind))?
        .run()
        .await
        .context("HTTP server failed")?;

        info!("HTTP server stopped");
        Ok(())
    }
}
