use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::net::TcpListener;
use verity_adapters::Settings;
use verity_axum::AppState;
use verity_server::{
    AuthService, build_authenticator,
    cli::{Cli, Command, MigrateCommand},
    configure_email_client, configure_postgresql, connect_postgres, init_tracing, migrations,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let settings = Settings::load()?;
    init_tracing(&settings.logging)?;

    match cli.command_or_default() {
        Command::Serve => serve(settings).await,
        Command::Migrate { action } => migrate(&settings, action).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    tracing::info!(mode = %settings.app.mode, "starting {}", settings.app.name);

    let pg_pool = configure_postgresql(&settings.postgres).await?;
    let email_client = configure_email_client(&settings)?;
    let authenticator = build_authenticator(&settings, pg_pool, email_client)?;

    let listener = TcpListener::bind(settings.app.address()).await?;

    AuthService::new(AppState::new(Arc::new(authenticator)))
        .with_rate_limit(&settings.rate_limit)
        .run_standalone(listener, settings.app.allowed_origins())
        .await?;

    Ok(())
}

async fn migrate(settings: &Settings, action: &MigrateCommand) -> Result<()> {
    let pool = connect_postgres(&settings.postgres).await?;

    let statuses = match action {
        MigrateCommand::Up => migrations::run_pending(&pool).await?,
        MigrateCommand::Status => migrations::current_status(&pool).await?,
    };
    println!("{}", migrations::render(&statuses));

    Ok(())
}
