//! Session domain module.
//!
//! The session aggregate and its lifecycle rules.

mod aggregate;

pub use aggregate::{Session, END_REASON_MAX_TURNS, END_REASON_TIMEOUT};
