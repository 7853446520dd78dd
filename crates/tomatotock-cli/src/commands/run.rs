use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tomatotock_core::{Command, Config, SessionRunner};

use crate::sinks;

const HELP: &str = "[enter]/t start-pause-resume  r reset  s status  q quit";

#[derive(Args)]
pub struct RunArgs {
    /// Start a work phase immediately
    #[arg(long)]
    start: bool,
    /// Seconds between config file checks (0 disables reloading)
    #[arg(long, default_value_t = 2)]
    reload_secs: u64,
    /// Print notifications only, without desktop popups
    #[arg(long)]
    no_desktop: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    config.validate()?;
    let path = Config::file_path()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(session(config, path, args));
    // A pending stdin read would otherwise hold the shutdown.
    runtime.shutdown_background();
    result
}

async fn session(
    config: Config,
    path: PathBuf,
    args: RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = SessionRunner::new(config.settings(), sinks::build(&config, !args.no_desktop));
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runner.run(rx));

    eprintln!("{HELP}");
    if args.start {
        send(&tx, Command::Toggle).await?;
    }

    if args.reload_secs > 0 {
        tokio::spawn(watch_config(
            path,
            Duration::from_secs(args.reload_secs),
            tx.clone(),
        ));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" | "t" => send(&tx, Command::Toggle).await?,
            "r" => send(&tx, Command::Reset).await?,
            "s" => {
                let (reply, state) = oneshot::channel();
                send(&tx, Command::Snapshot(reply)).await?;
                let state = state.await.map_err(|_| "session stopped")?;
                let json = serde_json::to_string_pretty(&state)?;
                if let Err(e) = writeln!(std::io::stdout().lock(), "{json}") {
                    tracing::warn!(error = %e, "status not printed");
                }
            }
            "q" => break,
            other => eprintln!("unknown command '{other}'. {HELP}"),
        }
    }

    // Stdin closing ends the session like `q`.
    let _ = tx.send(Command::Quit).await;
    let last = handle.await?;
    tracing::info!(units = last.completed_work_units, "session ended");
    Ok(())
}

async fn send(tx: &mpsc::Sender<Command>, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    tx.send(command).await.map_err(|_| "session stopped")?;
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the config file and push a fresh settings snapshot whenever it
/// changes and still validates.
async fn watch_config(path: PathBuf, every: Duration, tx: mpsc::Sender<Command>) {
    let mut seen = modified(&path);
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let current = modified(&path);
        if current == seen {
            continue;
        }
        seen = current;

        let config = match Config::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "config reload skipped");
                continue;
            }
        };
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "config reload rejected");
            continue;
        }
        tracing::info!("config changed, reloading settings");
        if tx.send(Command::Reload(config.settings())).await.is_err() {
            break;
        }
    }
}
