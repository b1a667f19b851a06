//! Background Tasks Module
//!
//! Optional periodic maintenance for in-process backends. Expiry is always
//! enforced on access, so these tasks only reclaim memory earlier.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
