use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tourdesk_booking::{DueDateSweep, Notifier};
use tourdesk_core::clock::{Clock, SystemClock};
use tourdesk_core::mail::LogMailer;
use tourdesk_store::app_config::Config;
use tourdesk_store::{DbClient, PgStore};
use tourdesk_worker::scheduler::{parse_sweep_at, Scheduler};
use tourdesk_worker::{drain_once, DrainOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tourdesk-worker")]
#[command(about = "Background jobs for the tour booking back office")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily due-date sweep and the notification drain until stopped (default)
    Run,
    /// Run the due-date sweep once and print its report
    Sweep,
    /// Deliver one batch of queued notifications
    Drain {
        /// Overrides scheduler.drain_batch_size
        #[arg(long)]
        batch_size: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tourdesk_worker=debug,tourdesk_booking=info,tourdesk_store=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(db.pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mailer = Arc::new(LogMailer::new(&config.mail.from_address));
    let notifier = Notifier::new(store.clone(), store.clone());
    let sweep = DueDateSweep::new(store.clone(), notifier, clock.clone())
        .with_window_days(config.business_rules.reminder_window_days);

    let drain = DrainOptions {
        batch_size: config.scheduler.drain_batch_size,
        max_attempts: config.scheduler.max_attempts,
        visibility_timeout: config.scheduler.visibility_timeout(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let scheduler = Scheduler {
                sweep,
                queue: store,
                mailer,
                clock,
                sweep_at: parse_sweep_at(&config.scheduler.sweep_at)?,
                drain_interval: Duration::from_secs(config.scheduler.drain_interval_seconds.max(1)),
                drain,
            };
            scheduler.run().await
        }
        Commands::Sweep => {
            let report = sweep.run().await?;
            println!(
                "{}: {} selected, {} cancelled, {} reminded, {} failed",
                report.today,
                report.selected,
                report.cancelled.len(),
                report.reminded.len(),
                report.failures.len()
            );
            for failure in &report.failures {
                println!("  booking {}: {}", failure.booking_id, failure.detail);
            }
            Ok(())
        }
        Commands::Drain { batch_size } => {
            let options = DrainOptions {
                batch_size: batch_size.unwrap_or(drain.batch_size),
                ..drain
            };
            let report = drain_once(store.as_ref(), mailer.as_ref(), &options, clock.now()).await?;
            println!(
                "{} claimed, {} sent, {} retried, {} failed",
                report.claimed, report.sent, report.retried, report.failed
            );
            Ok(())
        }
    }
}
