//! Traits do Hardware Abstraction Layer (HAL).
//! Interfaces públicas que o núcleo usa para falar com o hardware.

pub mod cpu;
pub mod mmu;
pub mod ports;

pub use cpu::CpuOps;
pub use mmu::MmuOps;
pub use ports::PortIo;
