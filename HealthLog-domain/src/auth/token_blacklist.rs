use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use once_cell::sync::Lazy;

/// Process-wide set of revoked token ids (the `jti` claim)
static TOKEN_BLACKLIST: Lazy<TokenBlacklist> = Lazy::new(TokenBlacklist::new);

const DEFAULT_MAX_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct RevokedEntry {
    /// When the token would have expired on its own
    expires_at: SystemTime,
    revoked_at: SystemTime,
}

/// Revoked tokens keyed by JWT id
///
/// Entries only need to live until the token's own expiry, so the periodic
/// cleanup drops anything already past it. When the map reaches `max_size`
/// expired entries are purged first and then the oldest half is evicted.
pub struct TokenBlacklist {
    revoked: Mutex<HashMap<String, RevokedEntry>>,
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revoked: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned guard is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, RevokedEntry>> {
        self.revoked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Revoke `jti` until `expires_at`
    pub fn revoke_token(&self, jti: &str, expires_at: SystemTime) {
        let mut entries = self.entries();

        if entries.len() >= self.max_size {
            warn!("Token blacklist reached max size ({}), pruning", self.max_size);
            Self::purge_expired(&mut entries);

            if entries.len() >= self.max_size {
                Self::evict_oldest(&mut entries, self.max_size / 2);
            }
        }

        entries.insert(
            jti.to_string(),
            RevokedEntry { expires_at, revoked_at: SystemTime::now() },
        );
        info!("Token revoked: {}", jti);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.entries().contains_key(jti)
    }

    pub fn size(&self) -> usize {
        self.entries().len()
    }

    /// Drop entries whose token has expired anyway. Returns how many were removed.
    pub fn cleanup_expired_tokens(&self) -> usize {
        let mut entries = self.entries();
        Self::purge_expired(&mut entries)
    }

    fn purge_expired(entries: &mut HashMap<String, RevokedEntry>) -> usize {
        let now = SystemTime::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);

        let removed = before - entries.len();
        if removed > 0 {
            debug!("Removed {} expired tokens from blacklist", removed);
        }
        removed
    }

    fn evict_oldest(entries: &mut HashMap<String, RevokedEntry>, count: usize) {
        let mut by_age: Vec<(String, SystemTime)> = entries
            .iter()
            .map(|(jti, entry)| (jti.clone(), entry.revoked_at))
            .collect();
        by_age.sort_by_key(|(_, revoked_at)| *revoked_at);

        for (jti, _) in by_age.into_iter().take(count) {
            entries.remove(&jti);
        }
        debug!("Evicted {} oldest entries from token blacklist", count);
    }
}

/// The global blacklist consulted by token validation
pub fn blacklist() -> &'static TokenBlacklist {
    &TOKEN_BLACKLIST
}

/// Spawn an hourly cleanup of the global blacklist. Must be called from within a Tokio runtime.
pub fn start_cleanup_task() {
    use std::time::Duration;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));

        loop {
            interval.tick().await;
            let removed = blacklist().cleanup_expired_tokens();
            debug!("Blacklist cleanup removed {} tokens, {} remain", removed, blacklist().size());
        }
    });
}
