//! Server-side sessions.
//!
//! A session is a random identifier handed to the browser in a signed cookie
//! and a [`SessionState`] kept on the server under that identifier. The
//! signature lets the server discard forged or truncated cookies without a
//! store lookup; the store holds the only mutable bit, `authenticated`.

mod store;
mod token;

pub use store::{MemorySessionStore, SessionState, SessionStore, DEFAULT_SESSION_TTL};
pub use token::{SessionSigner, TokenError, SESSION_ID_BYTES};
