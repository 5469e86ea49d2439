//! Internal utilities.

pub mod validation;
