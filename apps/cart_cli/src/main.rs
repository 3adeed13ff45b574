use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CartApiClient, CartNotification, CartSessionController, ChangeQuantityError, ViewEvent,
};
use shared::domain::ProductId;
use storage::Storage;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};

mod commands;
mod config;
mod render;

use commands::{parse_command, ViewCommand, HELP};
use render::{notification_message, render_state};

#[derive(Parser, Debug)]
#[command(about = "Terminal view of the shopping cart")]
struct Cli {
    #[arg(long, default_value = "cart.toml")]
    config: PathBuf,
    /// Overrides `api_url` from config and environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored cart.
    Show,
    Increment {
        product: ProductId,
        #[arg(default_value_t = 1)]
        amount: u32,
    },
    Decrement {
        product: ProductId,
        #[arg(default_value_t = 1)]
        amount: u32,
    },
    Remove {
        product: ProductId,
    },
    /// Interactive view reading commands from stdin.
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(
        api_url = %settings.api_url,
        database_url = %settings.database_url,
        "starting cart view"
    );

    let storage = Storage::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open identifier store '{}'", settings.database_url))?;
    let api = Arc::new(
        CartApiClient::new(&settings.api_url)
            .with_context(|| format!("invalid api url '{}'", settings.api_url))?,
    );
    let controller = CartSessionController::new(Arc::new(storage), api.clone(), api.clone());
    controller.bootstrap().await;

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => println!("{}", render_state(&controller.snapshot().await, &api)),
        Command::Increment { product, amount } => {
            apply_change(&controller, &api, product, i64::from(amount)).await?
        }
        Command::Decrement { product, amount } => {
            apply_change(&controller, &api, product, -i64::from(amount)).await?
        }
        Command::Remove { product } => {
            let outcome = controller.remove_entry(&product).await?;
            println!("{}", notification_message(&outcome));
            refresh_and_print(&controller, &api).await;
        }
        Command::Interactive => run_interactive(controller, &api).await?,
    }

    Ok(())
}

async fn apply_change(
    controller: &CartSessionController,
    api: &CartApiClient,
    product: ProductId,
    delta: i64,
) -> Result<(), ChangeQuantityError> {
    let outcome = controller.change_quantity(product, delta).await?;
    println!("{}", notification_message(&outcome));
    refresh_and_print(controller, api).await;
    Ok(())
}

/// One-shot commands have no later focus event, so the view re-activates once
/// to show the server's result.
async fn refresh_and_print(controller: &CartSessionController, api: &CartApiClient) {
    controller.activate().await;
    println!("{}", render_state(&controller.snapshot().await, api));
}

async fn run_interactive(
    controller: Arc<CartSessionController>,
    api: &CartApiClient,
) -> Result<()> {
    let (view_tx, view_rx) = mpsc::channel(16);
    let listener = controller.spawn_view_listener(view_rx);

    let mut notifications = controller.subscribe_notifications();
    let printer = tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            println!("* {}", notification_message(&notification));
        }
    });

    println!("{}", render_state(&controller.snapshot().await, api));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ViewCommand::Change { .. } | ViewCommand::Remove { .. } => {
                spawn_intent(&controller, command);
            }
            ViewCommand::Focus => {
                if view_tx.send(ViewEvent::Activated).await.is_err() {
                    break;
                }
            }
            ViewCommand::Blur => {
                if view_tx.send(ViewEvent::Deactivated).await.is_err() {
                    break;
                }
            }
            ViewCommand::Show => {
                println!("{}", render_state(&controller.snapshot().await, api))
            }
            ViewCommand::Help => println!("{HELP}"),
            ViewCommand::Quit => break,
        }
    }

    drop(view_tx);
    listener.await.context("view listener task failed")?;
    printer.abort();
    Ok(())
}

/// Starts a quantity intent as its own task. Rapid changes and removals are
/// independent requests; no ordering is imposed.
fn spawn_intent(
    controller: &Arc<CartSessionController>,
    command: ViewCommand,
) -> Option<JoinHandle<Result<CartNotification, ChangeQuantityError>>> {
    let controller = Arc::clone(controller);
    let task = match command {
        ViewCommand::Change { product, delta } => tokio::spawn(async move {
            print_rejection(controller.change_quantity(product, delta).await)
        }),
        ViewCommand::Remove { product } => tokio::spawn(async move {
            print_rejection(controller.remove_entry(&product).await)
        }),
        _ => return None,
    };
    Some(task)
}

fn print_rejection(
    outcome: Result<CartNotification, ChangeQuantityError>,
) -> Result<CartNotification, ChangeQuantityError> {
    if let Err(err) = &outcome {
        println!("{err}");
    }
    outcome
}
