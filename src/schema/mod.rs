//! Unified screen.session.v1 schema
//!
//! Defines the on-disk format for recorded screening sessions so they can
//! be replayed and re-scored offline with any calibration.

mod session;

pub use session::*;
