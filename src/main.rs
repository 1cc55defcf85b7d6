use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement funding projector (deterministic plan, Monte Carlo bands, chart series)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run a single plan form from a JSON file and print the response.
    Plan {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = nestegg::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Plan { input } => {
            let raw = match std::fs::read_to_string(&input) {
                Ok(raw) => raw,
                Err(e) => {
                    eprintln!("Cannot read {}: {e}", input.display());
                    std::process::exit(1);
                }
            };
            match nestegg::api::plan_response_json(&raw) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
