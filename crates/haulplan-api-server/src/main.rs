mod handlers;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use arc_swap::ArcSwap;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use haulplan_configuration::SystemConfigurations;
use haulplan_orchestrator::Scheduler;
use haulplan_orchestrator::logging::setup_logging;
use routes::api::v1::api_scope;
use tracing::Level;
use tracing::event;

#[derive(Parser, Debug)]
#[command(version, about = "Truck assignment planning api")]
struct Cli
{
    /// Configuration file to use instead of the one named by HAULPLAN_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()>
{
    let cli = Cli::parse();

    dotenvy::dotenv()
        .context("You need to provide an .env file. Look at the .env.example for guidance")?;

    let (log_handles, _logging_guards) = setup_logging()?;

    let system_configurations = match cli.config {
        Some(path) => Arc::new(ArcSwap::from_pointee(SystemConfigurations::from_path(&path)?)),
        None => SystemConfigurations::read_all_configs()?,
    };

    let scheduler = Arc::new(
        Scheduler::from_configurations(&system_configurations)
            .context("Scheduler could not be created")?
            .with_log_handles(log_handles),
    );

    let app = Router::new()
        .nest("/api/v1", api_scope(scheduler))
        .route("/health", get(|| async { "ok" }));

    let address = system_configurations.load().server.address;
    event!(Level::INFO, address = %address, "serving the planning api");

    axum_server::bind(address)
        .serve(app.into_make_service())
        .await
        .with_context(|| format!("the server on {address} stopped"))?;

    Ok(())
}
