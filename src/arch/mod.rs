//! # Hardware Abstraction Layer (HAL)
//!
//! Única ponte entre a lógica do núcleo e o hardware real.
//!
//! - `traits/` define as interfaces (`CpuOps`, `PortIo`, `MmuOps`).
//! - `x86/` implementa para i386 com assembly inline.
//! - `hosted` implementa sem hardware para builds no host (testes).
//!
//! `platform` é escolhido por `cfg` e exporta `Cpu`, `Ports`, `Mmu`,
//! `load_idt` e `exception_stubs`.

pub mod traits;

/// Seletor do segmento de código do kernel na GDT do boot
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Seletor do segmento de dados do kernel na GDT do boot
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;

// Seleção de Arquitetura: i386
#[cfg(target_arch = "x86")]
pub mod x86;

#[cfg(target_arch = "x86")]
pub use x86 as platform;

// Qualquer outro alvo: plataforma sem hardware
#[cfg(not(target_arch = "x86"))]
pub mod hosted;

#[cfg(not(target_arch = "x86"))]
pub use hosted as platform;

pub use platform::Cpu;
pub use traits::*;
