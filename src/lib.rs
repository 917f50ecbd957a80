// src/lib.rs
pub mod analysis;
pub use analysis::*;
