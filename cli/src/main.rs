use clap::{Parser, Subcommand};
use radartrack_cli::commands;
use radartrack_cli::logging;
use radartrack_cli::readline;
use radartrack_cli::CliContext;
use radartrack_core::{AppConfig, AppConfigExt};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let args = Args::parse();
    let config = AppConfig::load();

    match args.command.unwrap_or(Mode::Repl) {
        Mode::Replay { path, every } => commands::replay(&path, every, &config),
        Mode::Decode { path, interval_ms } => commands::decode(&path, interval_ms, &config).await,
        Mode::Repl => repl(CliContext::new(config)).await,
    }
}

async fn repl(ctx: CliContext) -> Result<(), String> {
    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "Radar target tracker")]
struct Args {
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Track a newline-delimited JSON recording
    Replay {
        #[arg(short, long)]
        path: String,
        /// Print every N-th snapshot
        #[arg(short, long)]
        every: Option<usize>,
    },
    /// Track a raw sensor UART capture
    Decode {
        #[arg(short, long)]
        path: String,
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
    /// Interactive session (default)
    Repl,
}

#[derive(Parser)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one frame of `x,y,z[,v[,c]]` detections
    Frame {
        #[arg(long)]
        at: Option<u64>,
        #[arg(allow_hyphen_values = true)]
        points: Vec<String>,
    },
    /// Process an empty frame after skipping ahead
    Advance { ms: u64 },
    TrailLimit { limit: usize },
    Snapshot,
    Config,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "radartrack".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Frame { at, points }) => commands::frame(ctx, *at, points).await?,
        Some(Commands::Advance { ms }) => commands::advance(ctx, *ms).await?,
        Some(Commands::TrailLimit { limit }) => commands::set_trail_limit(ctx, *limit).await?,
        Some(Commands::Snapshot) => commands::show_snapshot(ctx).await,
        Some(Commands::Config) => commands::show_config(ctx).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
