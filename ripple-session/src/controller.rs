//! Session boundary controller.
//!
//! Two stable states, Authenticated and Unauthenticated, with three
//! transitions: `login`, `logout`, and `auth_rejected` (the transport's
//! 401-class signal, which carries the same side effects as an explicit
//! logout).

use std::sync::Arc;

use ripple_cache::{CacheStore, ResourceRegistry};
use ripple_core::RippleResult;

use crate::credential::{CredentialStore, Token};

/// Authentication state, derived from credential presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Unauthenticated,
}

/// Whether a transport status code means the credential was rejected and the
/// session boundary must run. Transport glue calls this before propagating
/// the original error.
pub fn is_auth_rejection(status: u16) -> bool {
    status == 401
}

/// Drives the session boundary over the credential store, the registry, and
/// the cache store.
pub struct SessionController<S: CacheStore> {
    credentials: Arc<CredentialStore>,
    registry: Arc<ResourceRegistry>,
    store: Arc<S>,
}

impl<S: CacheStore> SessionController<S> {
    /// Create a controller over the given collaborators.
    pub fn new(
        credentials: Arc<CredentialStore>,
        registry: Arc<ResourceRegistry>,
        store: Arc<S>,
    ) -> Self {
        Self {
            credentials,
            registry,
            store,
        }
    }

    /// Get a reference to the credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Current session state.
    pub fn state(&self) -> RippleResult<SessionState> {
        Ok(match self.credentials.get()? {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Unauthenticated,
        })
    }

    /// Transition to Authenticated.
    ///
    /// Sets the credential only - whatever anonymous cache exists stays
    /// untouched; whether it remains valid is caller policy per resource.
    pub fn login(&self, token: Token) -> RippleResult<()> {
        self.credentials.set(token)?;
        tracing::info!("session authenticated");
        Ok(())
    }

    /// Transition to Unauthenticated, scrubbing all cached data.
    ///
    /// Strictly ordered: mark everything stale first (so active subscribers
    /// learn their data is outdated), then evict it entirely (no residual
    /// authenticated data may be servable), then prune the registry, then
    /// clear the credential.
    pub async fn logout(&self) -> RippleResult<()> {
        let marked = self.store.mark_all_stale().await?;
        let evicted = self.store.evict_all().await?;
        self.registry.clear()?;
        self.credentials.clear()?;
        tracing::info!(marked, evicted, "session ended, cache scrubbed");
        Ok(())
    }

    /// React to a rejected or expired credential reported by the transport.
    ///
    /// Deterministically clears session state with the same ordering as
    /// [`logout`](Self::logout) before the original transport error (if any)
    /// propagates further.
    pub async fn auth_rejected(&self) -> RippleResult<()> {
        tracing::warn!("credential rejected by transport, ending session");
        self.logout().await
    }
}

impl<S: CacheStore> Clone for SessionController<S> {
    fn clone(&self) -> Self {
        Self {
            credentials: Arc::clone(&self.credentials),
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
        }
    }
}
