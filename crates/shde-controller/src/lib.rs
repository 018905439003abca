//! Debug Loop Controller (C9): wires every other SHDE component into the
//! session state machine — run, triage, escalate, apply, revalidate,
//! revert, and abandon, bounded by `SESSION_MAX_RETRIES`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod session;
mod state;

pub use error::ControllerError;
pub use session::DebugSession;
pub use state::SessionState;
