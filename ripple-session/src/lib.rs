//! RIPPLE Session - session boundary and credential synchronization.
//!
//! Logging in only touches the credential; logging out (or an authorization
//! rejection from the transport) is a privacy boundary: every cached read
//! result is invalidated and then evicted, the registry is pruned, and the
//! credential is cleared - in that order. Execution contexts sharing a
//! storage scope observe each other's credential changes through an
//! origin-tagged broadcast, so a logout in one browser tab is visible in all
//! of them.

pub mod config;
pub mod controller;
pub mod credential;

pub use config::SessionConfig;
pub use controller::{is_auth_rejection, SessionController, SessionState};
pub use credential::{
    spawn_sync, ContextId, CredentialEvent, CredentialEventKind, CredentialStore, CredentialSync,
    SharedScope, Token, AUTH_TOKEN_KEY,
};
