//! Core Module
//!
//! Boot, handoff do Multiboot, logging e panic.

pub mod boot;
pub mod logging;
pub mod multiboot;
#[cfg(all(not(test), target_os = "none"))]
pub mod panic;

pub use boot::{kernel_init, BootError};
