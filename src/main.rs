use anyhow::Result;
use card_draw::cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    cli::init_tracing(args.log_file.as_deref(), !is_non_tui)?;

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for one-shot output modes
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
