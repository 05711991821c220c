//! Recurring background jobs. Call `spawn_all` once during startup.

use crate::services::AuthService;

const TOKEN_JANITOR_INTERVAL_SECS: u64 = 10 * 60;

/// Spawns all background tasks. Each task is detached via `tokio::spawn`;
/// this function does not block.
pub fn spawn_all(auth_service: AuthService) {
    // Expired refresh tokens are useless for the refresh flow; this just
    // keeps the table from growing without bound.
    {
        let svc = auth_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.delete_expired_tokens().await {
                    Ok(n) if n > 0 => log::info!("Expired refresh tokens removed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to remove expired refresh tokens: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(TOKEN_JANITOR_INTERVAL_SECS))
                    .await;
            }
        });
    }
}
