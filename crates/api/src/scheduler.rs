//! Daily recurring expense sweep.
//!
//! The timer and `POST /expenses/recurring/run` go through the same
//! [`RecurringExpenseScheduler`], whose mutex keeps at most one sweep running
//! in this process. Sweeps in other processes are deduplicated by the
//! recurring run table.

use chrono::{DateTime, Days, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use crmdesk_core::BillingError;
use crmdesk_db::repositories::{RecurringRepository, SweepReport};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serializes recurring expense sweeps.
#[derive(Debug)]
pub struct RecurringExpenseScheduler {
    repo: RecurringRepository,
    running: Mutex<()>,
}

impl RecurringExpenseScheduler {
    /// Creates a scheduler over the given pool.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            repo: RecurringRepository::new(db),
            running: Mutex::new(()),
        }
    }

    /// Runs one sweep for `today`, waiting for any sweep already in progress.
    pub async fn run_now(&self, today: NaiveDate) -> Result<SweepReport, BillingError> {
        let _guard = self.running.lock().await;
        self.repo.run_sweep(today).await
    }

    /// Spawns the daily timer. It fires at `run_at` local time in `tz` and
    /// stops when `shutdown` is cancelled.
    pub fn spawn(
        self: Arc<Self>,
        run_at: NaiveTime,
        tz: Tz,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(%run_at, %tz, "Recurring expense scheduler started");

            loop {
                let now = Utc::now().with_timezone(&tz);
                let next = next_run(now, run_at);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    () = shutdown.cancelled() => {
                        info!("Recurring expense scheduler shutting down");
                        break;
                    }
                    () = tokio::time::sleep(wait) => {
                        let today = next.date_naive();
                        match self.run_now(today).await {
                            Ok(report) => info!(
                                %today,
                                created = report.created,
                                skipped = report.skipped,
                                failed = report.failed,
                                "Scheduled recurring sweep finished"
                            ),
                            Err(e) => error!(%today, error = %e, "Scheduled recurring sweep failed"),
                        }
                    }
                }
            }
        })
    }
}

/// First instant strictly after `now` whose local time is `run_at`.
///
/// A `run_at` that falls into a DST gap moves to the first valid minute after it.
pub fn next_run(now: DateTime<Tz>, run_at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..=2)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|day| local_instant(&tz, day, run_at))
        .find(|candidate| *candidate > now)
        .unwrap_or_else(|| now + ChronoDuration::days(1))
}

fn local_instant(tz: &Tz, day: NaiveDate, at: NaiveTime) -> Option<DateTime<Tz>> {
    let mut naive = day.and_time(at);
    for _ in 0..=120 {
        if let Some(instant) = tz.from_local_datetime(&naive).earliest() {
            return Some(instant);
        }
        naive += ChronoDuration::minutes(1);
    }
    None
}
