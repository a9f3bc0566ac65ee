//! Shared constants.

pub mod methods;
