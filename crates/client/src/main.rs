//! platepal-client CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platepal_client::cli::request::RequestCommand;
use platepal_client::cli::users::UsersAction;
use platepal_client::cli::{Cli, Commands};
use platepal_client::gateway::{GatewayEvent, RequestOptions};
use platepal_client::output::{format_aggregate, format_event, format_output};
use platepal_client::{ClientContext, Config, StoreKind};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platepal_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    config.gateway.base_url = cli.base_url.clone();

    let store = if cli.ephemeral {
        StoreKind::Memory
    } else {
        persistent_store()
    };
    let ctx = ClientContext::open(config, store)
        .await
        .context("failed to initialize client")?;

    let mut events = ctx.gateway.subscribe();
    let outcome = run(&cli, &ctx).await;
    print_events(&mut events, cli.quiet);

    outcome
}

#[cfg(feature = "sqlite")]
fn persistent_store() -> StoreKind {
    StoreKind::Sqlite
}

#[cfg(not(feature = "sqlite"))]
fn persistent_store() -> StoreKind {
    StoreKind::Memory
}

async fn run(cli: &Cli, ctx: &ClientContext) -> Result<()> {
    match &cli.command {
        Commands::Users(users_cmd) => match &users_cmd.action {
            UsersAction::Load { owner } => {
                let outcome = ctx.users.load(owner).await;
                println!("{}", format_aggregate(&ctx.users.snapshot(), cli.format));
                outcome?;
            }
            UsersAction::Refresh { owner } => {
                let outcome = ctx.users.refresh(owner).await;
                println!("{}", format_aggregate(&ctx.users.snapshot(), cli.format));
                outcome?;
            }
            UsersAction::More { owner, pages } => {
                ctx.users.load(owner).await?;
                for _ in 0..*pages {
                    if !ctx.users.snapshot().has_more_restaurants() {
                        break;
                    }
                    ctx.users.load_more_restaurants(owner).await?;
                }
                println!("{}", format_aggregate(&ctx.users.snapshot(), cli.format));
            }
            UsersAction::Clear { owner } => {
                ctx.users.clear_cache(owner).await;
                if !cli.quiet {
                    println!("Cleared cache for {}", owner);
                }
            }
        },
        Commands::Request(request) => {
            let value = send_request(ctx, request).await?;
            println!("{}", format_output(&value, cli.format));
        }
        Commands::Logout => {
            ctx.gateway.logout().await;
            if !cli.quiet {
                println!("Logged out");
            }
        }
    }

    Ok(())
}

async fn send_request(ctx: &ClientContext, request: &RequestCommand) -> Result<serde_json::Value> {
    let mut options = RequestOptions::new(request.method.into());
    if let Some(body) = &request.body {
        let body = serde_json::from_str(body).context("--body must be valid JSON")?;
        options = options.with_body(body);
    }
    Ok(ctx.gateway.request_value(&request.path, options).await?)
}

fn print_events(events: &mut broadcast::Receiver<GatewayEvent>, quiet: bool) {
    while let Ok(event) = events.try_recv() {
        if !quiet {
            eprintln!("{}", format_event(&event));
        }
    }
}
