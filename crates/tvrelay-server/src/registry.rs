//! Session registry: maps pairing codes to live receiver connections.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tvrelay_common::{ConnectionId, PairingCode, RelayError};

use crate::code::CodeSource;
use crate::protocol::ServerEvent;

/// Push side of one connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queue an event without waiting. A full or closed queue is a transport
    /// error; the caller decides whether to log or propagate it.
    pub fn push(&self, event: ServerEvent) -> Result<(), RelayError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::Transport("outbound queue full".into()),
            TrySendError::Closed(_) => RelayError::Transport("connection closed".into()),
        })
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tx.same_channel(&other.tx)
    }
}

impl Eq for ConnectionHandle {}

/// One paired receiver.
struct Session {
    code: PairingCode,
    handle: ConnectionHandle,
    last_value: String,
    created_at: Instant,
}

#[derive(Default)]
struct Sessions {
    by_code: HashMap<PairingCode, Session>,
    by_connection: HashMap<ConnectionId, PairingCode>,
}

impl Sessions {
    fn session_of(&self, connection_id: &ConnectionId) -> Option<&Session> {
        let code = self.by_connection.get(connection_id)?;
        self.by_code.get(code)
    }

    fn detach(&mut self, connection_id: &ConnectionId) -> Option<Session> {
        let code = self.by_connection.remove(connection_id)?;
        self.by_code.remove(&code)
    }
}

/// Thread-safe session registry.
///
/// Both indexes live behind one lock, so they are always updated together.
/// Nothing is sent to a connection while the lock is held: lookups hand out a
/// cloned [`ConnectionHandle`] and the caller pushes after the guard drops.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<Sessions>>,
    codes: Arc<dyn CodeSource>,
    max_code_attempts: u32,
}

impl SessionRegistry {
    pub fn new(codes: Arc<dyn CodeSource>, max_code_attempts: u32) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Sessions::default())),
            codes,
            max_code_attempts: max_code_attempts.max(1),
        }
    }

    /// Create a session for the handle's connection under a fresh pairing code.
    ///
    /// Codes already held by an active session are redrawn, up to
    /// `max_code_attempts` draws. A connection that is already registered
    /// swaps its previous session for the new one; if no code is free, the
    /// previous session is kept.
    pub async fn register(&self, handle: ConnectionHandle) -> Result<PairingCode, RelayError> {
        let connection_id = handle.id().clone();
        let mut map = self.sessions.write().await;

        for attempt in 1..=self.max_code_attempts {
            let code = self.codes.generate();
            if map.by_code.contains_key(&code) {
                tracing::debug!(code = %code, attempt, "Pairing code collision, redrawing");
                continue;
            }

            if let Some(old) = map.detach(&connection_id) {
                tracing::warn!(
                    connection = %connection_id,
                    code = %old.code,
                    "Connection re-registered, dropping previous session"
                );
            }

            map.by_connection.insert(connection_id, code.clone());
            map.by_code.insert(
                code.clone(),
                Session {
                    code: code.clone(),
                    handle,
                    last_value: String::new(),
                    created_at: Instant::now(),
                },
            );
            return Ok(code);
        }

        tracing::error!(
            connection = %connection_id,
            attempts = self.max_code_attempts,
            active = map.by_code.len(),
            "No free pairing code"
        );
        Err(RelayError::CapacityExhausted {
            attempts: self.max_code_attempts,
        })
    }

    /// Handle of the connection paired under `code`.
    pub async fn lookup(&self, code: &str) -> Option<ConnectionHandle> {
        let map = self.sessions.read().await;
        map.by_code.get(code).map(|session| session.handle.clone())
    }

    /// Check if a session holds `code`.
    pub async fn exists(&self, code: &str) -> bool {
        self.sessions.read().await.by_code.contains_key(code)
    }

    /// Remove the session owned by `connection_id`. Absent ids are a no-op.
    pub async fn remove(&self, connection_id: &ConnectionId) -> Option<PairingCode> {
        let mut map = self.sessions.write().await;
        let session = map.detach(connection_id)?;
        tracing::info!(
            connection = %connection_id,
            code = %session.code,
            age_secs = session.created_at.elapsed().as_secs(),
            remaining = map.by_code.len(),
            "Session removed"
        );
        Some(session.code)
    }

    /// Store the last value a connection reported. Returns false if the
    /// connection has no session.
    pub async fn record_last_value(&self, connection_id: &ConnectionId, value: String) -> bool {
        let mut map = self.sessions.write().await;
        let Some(code) = map.by_connection.get(connection_id).cloned() else {
            return false;
        };
        match map.by_code.get_mut(&code) {
            Some(session) => {
                session.last_value = value;
                true
            }
            None => false,
        }
    }

    pub async fn last_value(&self, connection_id: &ConnectionId) -> Option<String> {
        let map = self.sessions.read().await;
        map.session_of(connection_id)
            .map(|session| session.last_value.clone())
    }

    /// Pairing code currently held by `connection_id`.
    pub async fn code_of(&self, connection_id: &ConnectionId) -> Option<PairingCode> {
        self.sessions
            .read()
            .await
            .by_connection
            .get(connection_id)
            .cloned()
    }

    /// Number of active sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.by_code.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{RandomCodes, ScriptedCodes};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn code(raw: &str) -> PairingCode {
        PairingCode::parse(raw).unwrap()
    }

    fn scripted(codes: &[&str], max_attempts: u32) -> SessionRegistry {
        let codes = codes.iter().map(|c| code(c)).collect();
        SessionRegistry::new(Arc::new(ScriptedCodes::new(codes)), max_attempts)
    }

    fn handle() -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(ConnectionId::new(), tx), rx)
    }

    /// Cycles through a small fixed pool so collisions are frequent.
    struct NarrowCodes {
        pool: Vec<PairingCode>,
        next: AtomicUsize,
    }

    impl CodeSource for NarrowCodes {
        fn generate(&self) -> PairingCode {
            let i = self.next.fetch_add(1, Ordering::Relaxed);
            self.pool[i % self.pool.len()].clone()
        }
    }

    #[tokio::test]
    async fn register_returns_well_formed_code() {
        let registry = SessionRegistry::new(Arc::new(RandomCodes::new()), 64);
        let (h, _rx) = handle();
        let code = registry.register(h).await.unwrap();
        assert!(PairingCode::is_well_formed(code.as_str()));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn lookup_returns_registered_handle() {
        let registry = scripted(&["AB12"], 8);
        let (h, _rx) = handle();
        let code = registry.register(h.clone()).await.unwrap();
        assert_eq!(code.as_str(), "AB12");

        let found = registry.lookup("AB12").await.unwrap();
        assert_eq!(found, h);
    }

    #[tokio::test]
    async fn lookup_unknown_code_is_none() {
        let registry = scripted(&["AB12"], 8);
        assert!(registry.lookup("ZZZZ").await.is_none());
        assert!(!registry.exists("ZZZZ").await);
    }

    #[tokio::test]
    async fn collision_is_redrawn() {
        let registry = scripted(&["AB12", "AB12", "AB12", "CD34"], 8);
        let (a, _ra) = handle();
        let (b, _rb) = handle();

        let first = registry.register(a).await.unwrap();
        let second = registry.register(b).await.unwrap();
        assert_eq!(first.as_str(), "AB12");
        assert_eq!(second.as_str(), "CD34");
    }

    #[tokio::test]
    async fn exhausted_attempts_is_capacity_error() {
        let registry = scripted(&["AB12"], 5);
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        registry.register(a).await.unwrap();

        let err = registry.register(b.clone()).await.unwrap_err();
        assert_eq!(err, RelayError::CapacityExhausted { attempts: 5 });
        assert_eq!(registry.count().await, 1);
        assert!(registry.code_of(b.id()).await.is_none());
    }

    #[tokio::test]
    async fn remove_clears_both_indexes() {
        let registry = scripted(&["AB12"], 8);
        let (h, _rx) = handle();
        let id = h.id().clone();
        registry.register(h).await.unwrap();

        assert_eq!(registry.remove(&id).await, Some(code("AB12")));
        assert!(!registry.exists("AB12").await);
        assert!(registry.lookup("AB12").await.is_none());
        assert!(registry.code_of(&id).await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let registry = scripted(&["AB12"], 8);
        let (h, _rx) = handle();
        registry.register(h).await.unwrap();

        assert_eq!(registry.remove(&ConnectionId::new()).await, None);
        assert!(registry.exists("AB12").await);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn remove_twice_is_noop() {
        let registry = scripted(&["AB12"], 8);
        let (h, _rx) = handle();
        let id = h.id().clone();
        registry.register(h).await.unwrap();

        assert!(registry.remove(&id).await.is_some());
        assert!(registry.remove(&id).await.is_none());
    }

    #[tokio::test]
    async fn removed_code_can_be_reissued() {
        let registry = scripted(&["AB12"], 8);
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        registry.register(a.clone()).await.unwrap();
        registry.remove(a.id()).await;

        let code = registry.register(b.clone()).await.unwrap();
        assert_eq!(code.as_str(), "AB12");
        assert_eq!(registry.lookup("AB12").await.unwrap(), b);
    }

    #[tokio::test]
    async fn re_register_replaces_previous_session() {
        let registry = scripted(&["AB12", "CD34"], 8);
        let (h, _rx) = handle();
        let id = h.id().clone();

        registry.register(h.clone()).await.unwrap();
        let second = registry.register(h).await.unwrap();

        assert_eq!(second.as_str(), "CD34");
        assert!(!registry.exists("AB12").await);
        assert_eq!(registry.code_of(&id).await, Some(second));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn failed_re_register_keeps_previous_session() {
        let registry = scripted(&["AB12"], 3);
        let (h, mut rx) = handle();
        let id = h.id().clone();
        registry.register(h.clone()).await.unwrap();
        registry.record_last_value(&id, "ch4".into()).await;

        let err = registry.register(h.clone()).await.unwrap_err();
        assert_eq!(err, RelayError::CapacityExhausted { attempts: 3 });
        assert_eq!(registry.code_of(&id).await, Some(code("AB12")));
        assert_eq!(registry.last_value(&id).await.as_deref(), Some("ch4"));
        assert_eq!(registry.count().await, 1);

        registry
            .lookup("AB12")
            .await
            .unwrap()
            .push(ServerEvent::Control {
                command: "play".into(),
            })
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::Control {
                command: "play".into()
            })
        );
    }

    #[tokio::test]
    async fn last_value_round_trip() {
        let registry = scripted(&["AB12"], 8);
        let (h, _rx) = handle();
        let id = h.id().clone();
        registry.register(h).await.unwrap();

        assert_eq!(registry.last_value(&id).await.as_deref(), Some(""));
        assert!(registry.record_last_value(&id, "ch7".into()).await);
        assert_eq!(registry.last_value(&id).await.as_deref(), Some("ch7"));
    }

    #[tokio::test]
    async fn last_value_for_unknown_connection() {
        let registry = scripted(&["AB12"], 8);
        let id = ConnectionId::new();
        assert!(!registry.record_last_value(&id, "x".into()).await);
        assert!(registry.last_value(&id).await.is_none());
    }

    #[tokio::test]
    async fn handle_push_reaches_receiver() {
        let (h, mut rx) = handle();
        h.push(ServerEvent::Control {
            command: "play".into(),
        })
        .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::Control {
                command: "play".into()
            })
        );
    }

    #[tokio::test]
    async fn handle_push_to_closed_connection_is_transport_error() {
        let (h, rx) = handle();
        drop(rx);
        let err = h.push(ServerEvent::Control { command: "x".into() }).unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[tokio::test]
    async fn handle_push_to_full_queue_is_transport_error() {
        let (tx, _rx) = mpsc::channel(1);
        let h = ConnectionHandle::new(ConnectionId::new(), tx);
        h.push(ServerEvent::Control { command: "a".into() }).unwrap();
        let err = h.push(ServerEvent::Control { command: "b".into() }).unwrap_err();
        assert_eq!(err, RelayError::Transport("outbound queue full".into()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn narrow_pool_still_yields_distinct_codes() {
        let pool: Vec<_> = ["AAAA", "BBBB", "CCCC", "DDDD", "EEEE", "FFFF", "GGGG", "HHHH"]
            .iter()
            .map(|c| code(c))
            .collect();
        let registry = SessionRegistry::new(
            Arc::new(NarrowCodes {
                pool,
                next: AtomicUsize::new(0),
            }),
            64,
        );

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (h, rx) = handle();
                let code = registry.register(h).await.unwrap();
                (code, rx)
            }));
        }

        let mut codes = HashSet::new();
        let mut receivers = Vec::new();
        for task in tasks {
            let (code, rx) = task.await.unwrap();
            codes.insert(code);
            receivers.push(rx);
        }
        assert_eq!(codes.len(), 8);

        let (h, _rx) = handle();
        let err = registry.register(h).await.unwrap_err();
        assert!(matches!(err, RelayError::CapacityExhausted { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_register_remove_keeps_codes_unique() {
        let registry = SessionRegistry::new(Arc::new(RandomCodes::new()), 64);

        let mut tasks = Vec::new();
        for i in 0..200 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (h, rx) = handle();
                let id = h.id().clone();
                registry.register(h).await.unwrap();
                tokio::task::yield_now().await;
                if i % 2 == 0 {
                    registry.remove(&id).await;
                    None
                } else {
                    Some((id, rx))
                }
            }));
        }

        let mut live = Vec::new();
        for task in tasks {
            if let Some(entry) = task.await.unwrap() {
                live.push(entry);
            }
        }

        assert_eq!(registry.count().await, live.len());
        let mut codes = HashSet::new();
        for (id, _rx) in &live {
            let code = registry.code_of(id).await.expect("live session has a code");
            assert!(registry.exists(code.as_str()).await);
            assert_eq!(registry.lookup(code.as_str()).await.unwrap().id(), id);
            assert!(codes.insert(code), "duplicate active code");
        }
    }
}
