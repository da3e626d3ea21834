//! # cotiza
//!
//! Command-line access to a seller's stored quotes.
//!
//! ## Usage
//! ```bash
//! COTIZA_SELLER_ID=seller-dev cotiza list
//! COTIZA_SELLER_ID=seller-dev cotiza show 550e8400-e29b-41d4-a716-446655440000
//! COTIZA_SELLER_ID=seller-dev cotiza whatsapp 550e8400-e29b-41d4-a716-446655440000
//! cotiza --config ./cotiza.toml list
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

use cotiza_app::commands::{document, quote};
use cotiza_app::{init_tracing, ApiResult, AppConfig, AppState};
use cotiza_core::Session;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Show(String),
    Whatsapp(String),
}

fn print_help() {
    println!("Cotiza");
    println!();
    println!("Usage: cotiza [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  list                 List the seller's quotes, newest first");
    println!("  show <QUOTE_ID>      Print the quote document");
    println!("  whatsapp <QUOTE_ID>  Print the messaging link for the quote");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
    println!();
    println!("Environment:");
    println!("  COTIZA_SELLER_ID     Seller whose quotes are read (required)");
    println!("  COTIZA_SELLER_NAME   Display name (default: seller id)");
    println!("  COTIZA_DB_PATH       Database file");
}

/// What the command line asked for.
#[derive(Debug)]
enum Invocation {
    Help,
    Run {
        config_path: Option<PathBuf>,
        command: Command,
    },
}

/// Parses everything after the program name.
fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<Command> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} needs a path", args[i]))?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => return Ok(Invocation::Help),
            "list" => command = Some(Command::List),
            "show" | "whatsapp" => {
                let id = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} needs a quote id", args[i]))?;
                command = Some(if args[i] == "show" {
                    Command::Show(id.clone())
                } else {
                    Command::Whatsapp(id.clone())
                });
                i += 1;
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    command
        .map(|command| Invocation::Run {
            config_path,
            command,
        })
        .ok_or_else(|| "No command given".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (config_path, command) = match parse_args(&args) {
        Ok(Invocation::Run {
            config_path,
            command,
        }) => (config_path, command),
        Ok(Invocation::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{}", message);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let Ok(seller_id) = env::var("COTIZA_SELLER_ID") else {
        eprintln!("COTIZA_SELLER_ID is not set");
        return ExitCode::FAILURE;
    };
    let session = Session {
        user_id: seller_id.clone(),
        display_name: env::var("COTIZA_SELLER_NAME").unwrap_or_else(|_| seller_id.clone()),
        seller_id,
    };

    match run(config_path, &session, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = ?e.code, "{}", e.message);
            eprintln!("{}", e.message);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<PathBuf>, session: &Session, command: Command) -> ApiResult<()> {
    let config = AppConfig::load(config_path)?;
    let state = AppState::open(config).await?;

    match command {
        Command::List => {
            let quotes = quote::list_quotes(&state, session).await?;
            if quotes.is_empty() {
                println!("No quotes yet.");
            }
            for q in quotes {
                println!(
                    "{:<10} {:<10} {:>14}  {}  {}",
                    q.number,
                    q.status.as_str(),
                    q.total.to_string(),
                    q.created_at.format("%d/%m/%Y"),
                    q.client_name
                );
            }
        }
        Command::Show(id) => {
            let rendered = document::render_document(&state, session, &id).await?;
            println!("{}", rendered.text);
            if !rendered.skipped_images.is_empty() {
                eprintln!(
                    "{} product image(s) could not be fetched",
                    rendered.skipped_images.len()
                );
            }
        }
        Command::Whatsapp(id) => {
            println!("{}", document::whatsapp_link(&state, session, &id).await?);
        }
    }

    state.db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_then_command() {
        match parse_args(&args(&["-c", "/etc/cotiza.toml", "show", "q-1"])).unwrap() {
            Invocation::Run {
                config_path,
                command,
            } => {
                assert_eq!(config_path, Some(PathBuf::from("/etc/cotiza.toml")));
                assert_eq!(command, Command::Show("q-1".to_string()));
            }
            Invocation::Help => panic!("expected a command"),
        }
    }

    #[test]
    fn test_config_without_path_is_rejected() {
        let err = parse_args(&args(&["list", "--config"])).unwrap_err();
        assert_eq!(err, "--config needs a path");
    }

    #[test]
    fn test_missing_quote_id_and_command() {
        assert!(parse_args(&args(&["whatsapp"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
        assert!(matches!(parse_args(&args(&["-h"])), Ok(Invocation::Help)));
    }
}
