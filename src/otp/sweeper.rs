use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use super::service::OtpService;

/// Spawn a background task that drops expired codes every `every`.
///
/// Expiry is still enforced on `verify`; the sweeper only bounds memory held by
/// codes nobody comes back for.
pub fn spawn_sweeper(service: Arc<OtpService>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "purged expired OTP records"),
                Err(err) => error!("OTP sweep failed: {err}"),
            }
        }
    })
}
