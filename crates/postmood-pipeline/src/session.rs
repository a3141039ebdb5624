//! Session-scoped analysis state.
//!
//! Each user session owns one [`AnalysisSession`]. The pipeline is its only
//! writer; views read cloned snapshots. A new run bumps the generation
//! counter, which discards the previous results and any cached insight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use postmood_core::{AggregateStats, ResultSet, ScrapedPost};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

/// Lifecycle of the insight text for the current result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightState {
    /// Not requested yet, or the last attempt failed.
    Idle,
    /// A fetch is in flight.
    Pending,
    Ready(String),
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub generation: u64,
    pub scraped: Option<ScrapedPost>,
    pub results: ResultSet,
    pub stats: Option<AggregateStats>,
    pub result_key: Option<String>,
    pub skipped: usize,
    pub insight: InsightState,
    pub last_error: Option<String>,
}

impl SessionState {
    fn empty(generation: u64) -> Self {
        Self {
            generation,
            scraped: None,
            results: ResultSet::default(),
            stats: None,
            result_key: None,
            skipped: 0,
            insight: InsightState::Idle,
            last_error: None,
        }
    }
}

/// Read-only copy of a session for the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub generation: u64,
    pub scraped: Option<ScrapedPost>,
    pub results: ResultSet,
    pub stats: Option<AggregateStats>,
    pub result_key: Option<String>,
    pub skipped: usize,
    pub insight: InsightState,
    pub last_error: Option<String>,
}

pub struct AnalysisSession {
    id: Uuid,
    pub(crate) state: RwLock<SessionState>,
    run_lock: Mutex<()>,
}

impl AnalysisSession {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: RwLock::new(SessionState::empty(0)),
            run_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            id: self.id,
            generation: state.generation,
            scraped: state.scraped.clone(),
            results: state.results.clone(),
            stats: state.stats,
            result_key: state.result_key.clone(),
            skipped: state.skipped,
            insight: state.insight.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Serializes runs on this session.
    pub(crate) async fn lock_runs(&self) -> MutexGuard<'_, ()> {
        self.run_lock.lock().await
    }

    /// Starts a new run: clears the previous results and cached insight and
    /// returns the new generation.
    pub(crate) async fn begin_run(&self) -> u64 {
        let mut state = self.state.write().await;
        let generation = state.generation + 1;
        *state = SessionState::empty(generation);
        generation
    }

    /// Stores a finished run. Ignored if a newer run has started since.
    pub(crate) async fn publish(
        &self,
        generation: u64,
        scraped: ScrapedPost,
        results: ResultSet,
        stats: Option<AggregateStats>,
        skipped: usize,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                session = %self.id,
                generation,
                "discarding results from superseded run"
            );
            return None;
        }

        let key = result_key(&results, stats.as_ref());
        state.scraped = Some(scraped);
        state.results = results;
        state.stats = stats;
        state.result_key = Some(key.clone());
        state.skipped = skipped;
        state.insight = InsightState::Idle;
        state.last_error = None;
        Some(key)
    }

    pub(crate) async fn record_failure(&self, generation: u64, message: String) {
        let mut state = self.state.write().await;
        if state.generation == generation {
            state.last_error = Some(message);
        }
    }
}

/// SHA-256 over the serialized result set and stats, hex encoded.
fn result_key(results: &ResultSet, stats: Option<&AggregateStats>) -> String {
    let mut hasher = Sha256::new();
    // Both types serialize infallibly (plain structs, string map keys).
    hasher.update(serde_json::to_vec(results).unwrap_or_default());
    hasher.update(serde_json::to_vec(&stats).unwrap_or_default());
    format!("{:x}", hasher.finalize())
}

/// Idle lifetime used by [`SessionStore::new`].
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct StoredSession {
    session: Arc<AnalysisSession>,
    last_seen: Instant,
}

/// All live sessions, keyed by id.
///
/// A session that has not been looked up for longer than the store's TTL is
/// dropped the next time a session is created.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self) -> Arc<AnalysisSession> {
        let session = Arc::new(AnalysisSession::new(Uuid::new_v4()));
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let evicted = prune_idle(&mut sessions, now, self.ttl);
        if evicted > 0 {
            tracing::debug!(evicted, "idle sessions evicted");
        }
        sessions.insert(
            session.id(),
            StoredSession {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        tracing::debug!(session = %session.id(), "session created");
        session
    }

    /// Looks up a live session and marks it as used.
    pub async fn get(&self, id: Uuid) -> Option<Arc<AnalysisSession>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired = now.duration_since(sessions.get(&id)?.last_seen) > self.ttl;
        if expired {
            sessions.remove(&id);
            tracing::debug!(session = %id, "session expired");
            return None;
        }
        let stored = sessions.get_mut(&id)?;
        stored.last_seen = now;
        Some(Arc::clone(&stored.session))
    }

    /// Removes a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn prune_idle(sessions: &mut HashMap<Uuid, StoredSession>, now: Instant, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, stored| now.duration_since(stored.last_seen) <= ttl);
    before - sessions.len()
}
