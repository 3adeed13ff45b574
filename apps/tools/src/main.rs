use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use storage::{default_database_url, Storage, CART_ID_KEY};

#[derive(Parser, Debug)]
struct Cli {
    /// Defaults to the cart client's per-user database.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ShowCartId,
    /// Points the client at an existing server-side cart.
    SetCartId {
        cart_id: String,
    },
    ClearCartId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let database_url = cli.database_url.unwrap_or_else(default_database_url);
    let storage = Storage::new(&database_url).await?;

    match cli.command {
        Command::ShowCartId => match storage.get(CART_ID_KEY).await? {
            Some(cart_id) => println!("cart_id={cart_id}"),
            None => println!("no cart id stored"),
        },
        Command::SetCartId { cart_id } => {
            let cart_id = cart_id.trim();
            if cart_id.is_empty() {
                bail!("cart id must not be empty");
            }
            storage.put(CART_ID_KEY, cart_id).await?;
            println!("stored cart_id={cart_id}");
        }
        Command::ClearCartId => {
            if storage.remove(CART_ID_KEY).await? {
                println!("cleared cart id");
            } else {
                println!("no cart id stored");
            }
        }
    }

    Ok(())
}
