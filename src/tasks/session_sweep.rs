use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::service::session::SessionStore;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn sweep_once(sessions: &Mutex<SessionStore>) -> usize {
    let purged = sessions.lock().await.purge_expired(Utc::now());
    if purged > 0 {
        debug!(purged, "expired pending prompts removed");
    }
    purged
}

pub async fn run_session_sweep(sessions: Arc<Mutex<SessionStore>>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        sweep_once(&sessions).await;
    }
}
