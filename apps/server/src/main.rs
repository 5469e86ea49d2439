use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_api::build_router;
use parley_config::load as load_config;
use parley_database::ExternalIdentity;
use parley_runtime::{listen_address, telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley direct messaging backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Link a verified external identity and print a fresh session token
    LinkIdentity {
        #[arg(long)]
        external_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        avatar: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::LinkIdentity {
            external_id,
            email,
            name,
            avatar,
        } => {
            link_identity(ExternalIdentity {
                external_id,
                name,
                email,
                avatar,
            })
            .await
        }
    }
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Parley backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = build_router(services.state.clone());

    let address = listen_address(&config)?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(parley_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    services.shutdown().await;
    info!("backend shut down");
    Ok(())
}

async fn link_identity(identity: ExternalIdentity) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let (user, session) = services
        .authenticator
        .link_identity(&identity)
        .await
        .context("failed to link identity")?;

    println!("user id:    {}", user.id);
    println!("token:      {}", session.token);
    println!("expires at: {}", session.expires_at.to_rfc3339());

    services.shutdown().await;
    Ok(())
}
