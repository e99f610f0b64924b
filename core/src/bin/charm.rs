/// Charm CLI
///
/// Evaluates charm source text from the command line or a file, lists the
/// built-in macros, and prints the effective configuration.

use charm_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
