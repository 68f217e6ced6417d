//! Shared model infrastructure used by the architecture implementations.
//!
//! Nothing here depends on a specific network layout.

pub mod device;
pub mod lstm;
pub mod weights;
