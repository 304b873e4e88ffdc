use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use pairbot_core::config::PairingConfig;
use pairbot_engine::AppState;
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    db::init_db,
    error::{Result, SchedulerError},
};

/// Whether the daily run is due at `now`.
///
/// Due once the UTC hour reaches `hour`, and only if it has not already
/// fired today.
pub fn should_fire(now: DateTime<Utc>, hour: u8, watermark: Option<NaiveDate>) -> bool {
    let today = now.date_naive();
    now.hour() >= u32::from(hour) && watermark.map_or(true, |last| today > last)
}

/// Drives the daily matching run for every active channel.
pub struct PairingTrigger {
    conn: Connection,
    app: Arc<AppState>,
    trigger_hour: u8,
    interval: Duration,
}

impl PairingTrigger {
    /// Create the trigger, initialising its table if needed.
    ///
    /// `conn` should be a connection of its own, separate from the store's.
    pub fn new(conn: Connection, app: Arc<AppState>, config: &PairingConfig) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn,
            app,
            trigger_hour: config.trigger_hour,
            interval: Duration::from_secs(config.check_interval_secs),
        })
    }

    /// The last date the trigger fired, if ever.
    pub fn watermark(&self) -> Result<Option<NaiveDate>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT last_fired FROM trigger_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        raw.map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| SchedulerError::CorruptWatermark(format!("{s:?}: {e}")))
        })
        .transpose()
    }

    fn set_watermark(&mut self, date: NaiveDate) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO trigger_state (id, last_fired, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET last_fired = excluded.last_fired,
                                            updated_at = excluded.updated_at",
            rusqlite::params![date.format("%Y-%m-%d").to_string(), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Main loop. Checks every `interval` until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            trigger_hour = self.trigger_hour,
            interval_secs = self.interval.as_secs(),
            "pairing trigger started"
        );

        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("pairing trigger tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("pairing trigger shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire if due at `now`. Returns whether the daily run happened.
    ///
    /// The watermark only advances after every channel was attempted, so a
    /// failure to list channels is retried on the next tick.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<bool> {
        if !should_fire(now, self.trigger_hour, self.watermark()?) {
            return Ok(false);
        }
        let today = now.date_naive();
        let app = Arc::clone(&self.app);
        fire(&app, today).await?;
        self.set_watermark(today)?;
        Ok(true)
    }
}

/// Run today's matching in every active channel.
///
/// Channels whose conversation no longer exists are deactivated instead.
async fn fire(app: &AppState, today: NaiveDate) -> Result<()> {
    let channels = app.store.active_channels()?;
    info!(%today, channels = channels.len(), "daily pairing run");

    for channel in channels {
        match app.messenger.resolve_conversation(channel.channel_id.into()).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(guild = %channel.guild_id, channel = %channel.channel_id, "pairing channel is gone, deactivating");
                if let Err(e) = app.store.deactivate_channel(channel.channel_id) {
                    error!(channel = %channel.channel_id, error = %e, "deactivation failed");
                }
                continue;
            }
            Err(e) => {
                warn!(channel = %channel.channel_id, error = %e, "channel lookup failed, matching anyway");
            }
        }

        for (block, result) in app.matching.run_for_date(&channel, today).await {
            info!(channel = %channel.channel_id, %block, ?result, "channel matched");
        }
    }
    Ok(())
}
