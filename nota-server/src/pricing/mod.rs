//! Resale Pricing Module
//!
//! Derives every displayed/stored monetary quantity for a receipt item from
//! its current parameter values. Pure and side-effect free; the edit session
//! reruns it after every change.

mod engine;

pub use engine::*;
