//! Supervised background load sessions.
//!
//! Sessions are owned by a supervisor that tracks and can cancel them, so
//! overlapping triggers stay observable and boundable instead of becoming
//! detached fire-and-forget tasks. Failures inside a session are logged and
//! swallowed; the deliberate-failure entry point fails by design.

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{info, warn};

pub type SessionId = String;

pub fn generate_session_id() -> SessionId {
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx: u8 = rng.random_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + (idx - 10)) as char
            }
        })
        .collect();
    format!("load-{}-{}", timestamp, suffix)
}

/// Shape of one load session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSpec {
    /// How long the session keeps firing entry points.
    pub duration: Duration,
    /// Bounded timeout applied to each outbound call.
    pub per_call_timeout: Duration,
    /// Random pause between calls is drawn from `min_pause..=max_pause`.
    pub min_pause: Duration,
    pub max_pause: Duration,
}

impl Default for LoadSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(60),
            per_call_timeout: Duration::from_secs(5),
            min_pause: Duration::from_millis(100),
            max_pause: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Running,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Observable state of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Configured duration, in seconds.
    pub duration_secs: u64,
    pub status: SessionStatus,
}

struct SessionEntry {
    info: SessionInfo,
    handle: Option<JoinHandle<()>>,
}

/// Owns every in-flight load session.
#[derive(Default)]
pub struct LoadSupervisor {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl LoadSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start one session. Each tick invokes `work` once under the per-call
    /// timeout, then pauses for a random interval. Overlapping sessions are
    /// independent; there is no shared state or rate limiting between them.
    pub async fn start<W, Fut>(&self, spec: LoadSpec, work: W) -> SessionId
    where
        W: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = generate_session_id();
        let info = SessionInfo {
            id: id.clone(),
            started_at: Utc::now(),
            duration_secs: spec.duration.as_secs(),
            status: SessionStatus::Running,
        };
        self.sessions.write().await.insert(
            id.clone(),
            SessionEntry {
                info,
                handle: None,
            },
        );

        let sessions = Arc::clone(&self.sessions);
        let session_id = id.clone();
        let handle = tokio::spawn(async move {
            info!(session = %session_id, duration_secs = spec.duration.as_secs(), "🚦 load session started");
            let deadline = Instant::now() + spec.duration;
            while Instant::now() < deadline {
                if timeout(spec.per_call_timeout, work()).await.is_err() {
                    warn!(session = %session_id, "load call exceeded its timeout");
                }
                sleep(pause_between(&spec)).await;
            }
            info!(session = %session_id, "🏁 load session finished");
            if let Some(entry) = sessions.write().await.get_mut(&session_id) {
                entry.info.status = SessionStatus::Completed;
            }
        });

        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.handle = Some(handle);
        }
        id
    }

    /// Snapshot of every known session, oldest first.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .map(|entry| entry.info.clone())
            .collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        infos
    }

    pub async fn active_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.info.status == SessionStatus::Running)
            .count()
    }

    /// Abort a running session. Returns false for unknown or finished ids.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(entry) if !entry.info.status.is_terminal() => {
                if let Some(handle) = entry.handle.take() {
                    handle.abort();
                }
                entry.info.status = SessionStatus::Cancelled;
                info!(session = %id, "load session cancelled");
                true
            }
            _ => false,
        }
    }
}

fn pause_between(spec: &LoadSpec) -> Duration {
    let lo = spec.min_pause.as_millis() as u64;
    let hi = (spec.max_pause.as_millis() as u64).max(lo);
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(lo..=hi))
}
