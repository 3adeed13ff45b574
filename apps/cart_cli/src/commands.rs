//! Line commands accepted by the interactive cart view.

use shared::domain::ProductId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Change { product: ProductId, delta: i64 },
    Remove { product: ProductId },
    Focus,
    Blur,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  + <product> [n]   increase quantity (default 1)
  - <product> [n]   decrease quantity (default 1)
  rm <product>      remove the entry
  focus | blur      re-activate / leave the cart view
  show              print the current cart
  quit";

pub fn parse_command(line: &str) -> Result<ViewCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(ViewCommand::Show);
    };

    let command = match verb {
        "+" | "inc" | "-" | "dec" => {
            let product = parse_product(parts.next())?;
            let amount = match parts.next() {
                Some(raw) => raw
                    .parse::<i64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("invalid amount '{raw}'"))?,
                None => 1,
            };
            let delta = if matches!(verb, "+" | "inc") {
                amount
            } else {
                -amount
            };
            ViewCommand::Change { product, delta }
        }
        "rm" | "remove" => ViewCommand::Remove {
            product: parse_product(parts.next())?,
        },
        "focus" => ViewCommand::Focus,
        "blur" => ViewCommand::Blur,
        "show" => ViewCommand::Show,
        "help" | "?" => ViewCommand::Help,
        "quit" | "exit" | "q" => ViewCommand::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };

    if parts.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }
    Ok(command)
}

fn parse_product(raw: Option<&str>) -> Result<ProductId, String> {
    let raw = raw.ok_or_else(|| "missing product id".to_string())?;
    raw.parse().map_err(|err| format!("{err}"))
}
