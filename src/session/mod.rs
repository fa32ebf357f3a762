//! Browser session state for the GUI.
//!
//! Each browser session owns the bound user identifier and the chat history
//! shown in its chat panel. Sessions are identified by UUID and share nothing
//! with each other.
//!
//! # Architecture
//!
//! - [`ChatTurn`]: one `(speaker, text)` entry of the chat panel
//! - [`Session`]: a single browser session
//! - [`SessionStore`]: thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use hazel::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! assert!(store.get(session.id()).is_some());
//! ```

mod thread;

pub use thread::{ChatTurn, DEFAULT_SESSION_TIMEOUT, Session, SessionState, SessionStore};
