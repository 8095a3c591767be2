//! ject binary entry point. See the `ject` library for the functionality.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::DisableMouseCapture;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, LeaveAlternateScreen};
use ject::Config;

#[derive(Parser)]
#[command(name = "ject")]
#[command(version)]
#[command(about = "Terminal code playground with a sandboxed content frame")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the playground workspace
    Run {
        /// Restore a previously saved session over the fresh one
        #[arg(long)]
        saved: Option<String>,
    },
    /// Run the content-frame shim (spawned by `run`, rarely by hand)
    Frame {
        /// URL of the page this frame hosts
        #[arg(long)]
        url: String,
    },
    /// Serve the compile proxy
    CompileServer {
        /// Listen port (defaults to the configured one)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// TUI subcommands log to a file so log output cannot corrupt the screen;
/// the servers log to stderr as usual.
fn init_logging(to_file: bool) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if to_file {
        let path = std::env::var("JECT_LOG_FILE").unwrap_or_else(|_| "/tmp/ject.log".to_string());
        let file = std::fs::File::create(&path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.format_timestamp_secs().init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load();

    match cli.command {
        Commands::Run { saved } => {
            init_logging(true)?;

            // Panics must restore the terminal before they print.
            let default_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |panic_info| {
                log::error!("PANIC: {panic_info:?}");
                let _ = disable_raw_mode();
                let _ = execute!(
                    std::io::stdout(),
                    LeaveAlternateScreen,
                    DisableMouseCapture,
                    crossterm::cursor::Show
                );
                default_hook(panic_info);
            }));

            ject::tui::run(&config, saved.as_deref())
        }
        Commands::Frame { url } => {
            init_logging(false)?;
            ject::relay::shim::run(&config, &url)
        }
        Commands::CompileServer { port } => {
            init_logging(false)?;
            if let Some(port) = port {
                config.compile_port = port;
            }
            ject::compile::serve_blocking(&config)
        }
    }
}
