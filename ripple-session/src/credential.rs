//! Credential store with cross-context synchronization.
//!
//! Each execution context (one running instance of the client runtime, e.g.
//! one browser tab) keeps a local authoritative copy of the session token.
//! Contexts sharing a storage scope publish origin-tagged set/clear events
//! over a broadcast channel; a context applies events from *other* origins to
//! its local copy without re-emitting, which is what prevents propagation
//! loops. There is no ordering guarantee beyond arrival order - callers
//! tolerate this as eventually consistent, last write wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use ripple_core::{RippleResult, SessionError};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Name of the credential value inside the shared scope. The full storage key
/// is namespaced per application; absence of the key means Unauthenticated.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// An opaque session token.
///
/// Debug output is redacted so tokens never leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Identity of one execution context, used to origin-tag credential events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Generate a fresh context identity.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What happened to the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialEventKind {
    /// The credential was set to this token.
    Set(Token),
    /// The credential was cleared.
    Cleared,
}

/// A credential change broadcast between contexts sharing a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEvent {
    /// The context that originated the change.
    pub origin: ContextId,
    /// The change itself.
    pub kind: CredentialEventKind,
}

/// The storage scope shared by all execution contexts of one application:
/// a namespaced key-value store plus the credential event channel.
#[derive(Debug)]
pub struct SharedScope {
    namespace: String,
    values: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<CredentialEvent>,
}

impl SharedScope {
    /// Create a scope from configuration.
    pub fn new(config: &SessionConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.broadcast_capacity);
        Arc::new(Self {
            namespace: config.storage_namespace.clone(),
            values: RwLock::new(HashMap::new()),
            events,
        })
    }

    /// The full, application-namespaced storage key for a value name.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Read a value from the scope.
    pub fn get(&self, key: &str) -> RippleResult<Option<String>> {
        let values = self.values.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(values.get(&self.prefixed_key(key)).cloned())
    }

    /// Write a value to the scope. Last write wins across contexts.
    pub fn set(&self, key: &str, value: impl Into<String>) -> RippleResult<()> {
        let mut values = self.values.write().map_err(|_| SessionError::LockPoisoned)?;
        values.insert(self.prefixed_key(key), value.into());
        Ok(())
    }

    /// Remove a value from the scope.
    pub fn remove(&self, key: &str) -> RippleResult<()> {
        let mut values = self.values.write().map_err(|_| SessionError::LockPoisoned)?;
        values.remove(&self.prefixed_key(key));
        Ok(())
    }

    fn publish(&self, event: CredentialEvent) {
        // A send error just means no other context is listening right now.
        let _ = self.events.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.events.subscribe()
    }
}

/// Per-context credential store.
///
/// Holds the local authoritative token value, persists changes to the shared
/// scope, and emits origin-tagged events so sibling contexts stay in sync.
#[derive(Debug)]
pub struct CredentialStore {
    scope: Arc<SharedScope>,
    context: ContextId,
    local: RwLock<Option<Token>>,
}

impl CredentialStore {
    /// Create a store for a new execution context against the shared scope,
    /// picking up any credential already persisted there.
    pub fn new(scope: Arc<SharedScope>) -> RippleResult<Self> {
        let local = scope.get(AUTH_TOKEN_KEY)?.map(Token::new);
        Ok(Self {
            scope,
            context: ContextId::new(),
            local: RwLock::new(local),
        })
    }

    /// This context's identity.
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// The current credential, or `None` when unauthenticated.
    pub fn get(&self) -> RippleResult<Option<Token>> {
        let local = self.local.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(local.clone())
    }

    /// Replace the credential: update the local copy, persist to the shared
    /// scope, and notify sibling contexts.
    pub fn set(&self, token: Token) -> RippleResult<()> {
        {
            let mut local = self.local.write().map_err(|_| SessionError::LockPoisoned)?;
            *local = Some(token.clone());
        }
        self.scope.set(AUTH_TOKEN_KEY, token.as_str())?;
        self.scope.publish(CredentialEvent {
            origin: self.context,
            kind: CredentialEventKind::Set(token),
        });
        Ok(())
    }

    /// Clear the credential: empty the local copy, persist the removal, and
    /// notify sibling contexts.
    pub fn clear(&self) -> RippleResult<()> {
        {
            let mut local = self.local.write().map_err(|_| SessionError::LockPoisoned)?;
            *local = None;
        }
        self.scope.remove(AUTH_TOKEN_KEY)?;
        self.scope.publish(CredentialEvent {
            origin: self.context,
            kind: CredentialEventKind::Cleared,
        });
        Ok(())
    }

    /// Apply a credential event received from another context.
    ///
    /// Updates the local copy only - no re-emission (that would loop) and no
    /// cache side effects (only the originating context runs the session
    /// boundary locally). Events from this context itself are ignored.
    pub fn apply_remote(&self, event: &CredentialEvent) -> RippleResult<()> {
        if event.origin == self.context {
            return Ok(());
        }
        let mut local = self.local.write().map_err(|_| SessionError::LockPoisoned)?;
        match &event.kind {
            CredentialEventKind::Set(token) => *local = Some(token.clone()),
            CredentialEventKind::Cleared => *local = None,
        }
        Ok(())
    }

    /// Subscribe to credential events from sibling contexts.
    pub fn subscribe(&self) -> CredentialSync {
        CredentialSync {
            origin: self.context,
            rx: self.scope.subscribe(),
        }
    }
}

/// Receiver for credential events originating in *other* contexts.
#[derive(Debug)]
pub struct CredentialSync {
    origin: ContextId,
    rx: broadcast::Receiver<CredentialEvent>,
}

impl CredentialSync {
    /// Wait for the next remote credential event.
    ///
    /// Events originating in this context are filtered out, and a lagged
    /// receiver skips ahead (last write wins makes dropped intermediate
    /// events harmless). Returns `None` once the scope is gone.
    pub async fn recv(&mut self) -> Option<CredentialEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin != self.origin => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "credential sync lagged, skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Spawn a background task that keeps a credential store in sync with its
/// sibling contexts for the lifetime of the scope.
pub fn spawn_sync(store: Arc<CredentialStore>) -> tokio::task::JoinHandle<()> {
    let mut sync = store.subscribe();
    tokio::spawn(async move {
        while let Some(event) = sync.recv().await {
            if let Err(error) = store.apply_remote(&event) {
                tracing::warn!(%error, "failed to apply remote credential event");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Arc<SharedScope> {
        SharedScope::new(&SessionConfig::default())
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("super-secret");
        assert_eq!(format!("{:?}", token), "Token(***)");
    }

    #[test]
    fn test_scope_keys_are_namespaced() {
        let config = SessionConfig {
            storage_namespace: "myapp".to_string(),
            ..SessionConfig::default()
        };
        let scope = SharedScope::new(&config);
        assert_eq!(scope.prefixed_key(AUTH_TOKEN_KEY), "myapp:authToken");
    }

    #[test]
    fn test_store_picks_up_persisted_credential() {
        let scope = scope();
        scope.set(AUTH_TOKEN_KEY, "tok1").expect("set");

        let store = CredentialStore::new(scope).expect("store");
        assert_eq!(store.get().expect("get"), Some(Token::new("tok1")));
    }

    #[test]
    fn test_set_and_clear_round_trip() {
        let scope = scope();
        let store = CredentialStore::new(Arc::clone(&scope)).expect("store");

        store.set(Token::new("tok1")).expect("set");
        assert_eq!(store.get().expect("get"), Some(Token::new("tok1")));
        assert_eq!(scope.get(AUTH_TOKEN_KEY).expect("get"), Some("tok1".to_string()));

        store.clear().expect("clear");
        assert_eq!(store.get().expect("get"), None);
        assert_eq!(scope.get(AUTH_TOKEN_KEY).expect("get"), None);
    }

    #[tokio::test]
    async fn test_cross_context_set_propagates() {
        let scope = scope();
        let a = CredentialStore::new(Arc::clone(&scope)).expect("store a");
        let b = CredentialStore::new(Arc::clone(&scope)).expect("store b");

        let mut sync_b = b.subscribe();
        a.set(Token::new("tok1")).expect("set");

        let event = sync_b.recv().await.expect("event");
        assert_eq!(event.origin, a.context_id());
        b.apply_remote(&event).expect("apply");

        // B observes the token without ever calling set itself.
        assert_eq!(b.get().expect("get"), Some(Token::new("tok1")));
    }

    #[tokio::test]
    async fn test_own_events_are_filtered() {
        let scope = scope();
        let a = CredentialStore::new(Arc::clone(&scope)).expect("store a");
        let b = CredentialStore::new(Arc::clone(&scope)).expect("store b");

        let mut sync_a = a.subscribe();
        a.set(Token::new("mine")).expect("set");
        b.set(Token::new("theirs")).expect("set");

        // A's own event is skipped; the first thing A sees is B's.
        let event = sync_a.recv().await.expect("event");
        assert_eq!(event.origin, b.context_id());
    }

    #[tokio::test]
    async fn test_apply_remote_does_not_reemit() {
        let scope = scope();
        let a = CredentialStore::new(Arc::clone(&scope)).expect("store a");
        let b = CredentialStore::new(Arc::clone(&scope)).expect("store b");

        let mut sync_b = b.subscribe();
        a.clear().expect("clear");

        let event = sync_b.recv().await.expect("event");
        b.apply_remote(&event).expect("apply");

        // Applying must not have published anything new.
        assert!(matches!(
            sync_b.rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_clear_received_after_set_wins() {
        let scope = scope();
        let a = CredentialStore::new(Arc::clone(&scope)).expect("store a");
        let b = CredentialStore::new(Arc::clone(&scope)).expect("store b");

        let mut sync_b = b.subscribe();
        a.set(Token::new("tok1")).expect("set");
        a.clear().expect("clear");

        // B applies both in arrival order; the clear is what sticks.
        while let Ok(event) = sync_b.rx.try_recv() {
            b.apply_remote(&event).expect("apply");
        }
        assert_eq!(b.get().expect("get"), None);
    }

    #[tokio::test]
    async fn test_spawn_sync_applies_in_background() {
        let scope = scope();
        let a = CredentialStore::new(Arc::clone(&scope)).expect("store a");
        let b = Arc::new(CredentialStore::new(Arc::clone(&scope)).expect("store b"));

        let handle = spawn_sync(Arc::clone(&b));
        a.set(Token::new("tok1")).expect("set");

        // Yield until the sync task has applied the event.
        for _ in 0..100 {
            if b.get().expect("get").is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(b.get().expect("get"), Some(Token::new("tok1")));
        handle.abort();
    }
}
