mod sync;

use std::{
    env::var,
    io::{self, BufRead as _, IsTerminal as _, Write as _},
};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use env::Env;
use eyre::{bail, Context as _, Error};
use log::{error, info};
use model::{credentials::Credentials, range::DateRange};
use storage::Storage;
use tokio_cron_scheduler::{Job, JobScheduler};

/// 06:00 on the first day of every month.
const MONTHLY: &str = "0 0 6 1 * *";

#[derive(Parser)]
#[command(
    name = "lesson-sync",
    version,
    about = "Collects lesson attendance from the portal into an xlsx ledger"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Store portal credentials in the OS keychain.
    Setup,
    /// Scrape a date range and merge it into the ledger.
    Scrape(RangeArgs),
    /// Scrape the previous month without prompting.
    Cron,
    /// Remove stored portal credentials.
    ClearCredentials,
    /// Keep running and scrape the previous month on the first of every month.
    Schedule,
}

#[derive(Args, Default)]
struct RangeArgs {
    /// First day, DD-MM-YYYY.
    #[arg(long = "start-date", requires = "end_date")]
    start_date: Option<String>,
    /// Last day, DD-MM-YYYY.
    #[arg(long = "end-date", requires = "start_date")]
    end_date: Option<String>,
}

impl RangeArgs {
    fn range(&self) -> Result<DateRange, Error> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => Ok(DateRange::parse(start, end)?),
            _ => Ok(default_range()),
        }
    }
}

fn default_range() -> DateRange {
    DateRange::previous_month(Local::now().date_naive())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    // Loads .env first so RUST_LOG can come from it.
    let env = Env::load();
    pretty_env_logger::formatted_builder()
        .parse_filters(&var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    color_eyre::install()?;
    let env = env.context("Failed to load configuration")?;
    let storage = Storage::new(env.session_state_path());

    match Cli::parse().mode.unwrap_or(Mode::Scrape(RangeArgs::default())) {
        Mode::Setup => setup(&storage),
        Mode::ClearCredentials => {
            if storage.keyring.clear()? {
                info!("Stored credentials removed");
            } else {
                info!("No stored credentials found");
            }
            Ok(())
        }
        Mode::Scrape(args) => {
            let range = args.range()?;
            if !sync::has_credentials(&env, &storage) && interactive(&env) {
                info!("No credentials found, running setup first");
                setup(&storage)?;
            }
            sync::run(&env, range).await.map(|_| ())
        }
        Mode::Cron => sync::run(&env, default_range()).await.map(|_| ()),
        Mode::Schedule => schedule(env).await,
    }
}

fn interactive(env: &Env) -> bool {
    !env.ledger_ephemeral() && io::stdin().is_terminal()
}

fn setup(storage: &Storage) -> Result<(), Error> {
    let username = prompt("Portal username: ")?;
    let password = prompt("Portal password: ")?;
    let creds = Credentials::new(&username, &password);
    if !creds.is_complete() {
        bail!("Username and password must not be empty");
    }
    storage.keyring.store(&creds)?;
    info!("Credentials stored");
    Ok(())
}

fn prompt(label: &str) -> Result<String, Error> {
    let mut stderr = io::stderr();
    stderr.write_all(label.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_owned())
}

async fn schedule(env: Env) -> Result<(), Error> {
    let mut scheduler = JobScheduler::new().await?;
    scheduler
        .add(Job::new_async(MONTHLY, move |_, _| {
            let env = env.clone();
            Box::pin(async move {
                if let Err(err) = sync::run(&env, default_range()).await {
                    error!("Scheduled sync failed: {:#}", err);
                }
            })
        })?)
        .await?;
    scheduler.start().await?;
    info!("Scheduler started, next run at 06:00 on the first of the month");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down scheduler");
    scheduler.shutdown().await?;
    Ok(())
}
