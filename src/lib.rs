//! Anvil Kernel Library.
//!
//! Núcleo de interrupções e memória de um kernel i386 (modo protegido,
//! paginação de dois níveis, sem PAE). O trampolim Multiboot (`_start`) e o
//! linker script ficam fora deste crate e chamam [`core::boot::kernel_init`].
//!
//! Fora de `target_arch = "x86"` o crate compila sobre uma plataforma
//! hosted sem hardware, usada pelos testes de unidade.

#![cfg_attr(not(test), no_std)]

// --- Baixo nível (Hardware) ---
pub mod arch; // HAL (CPU, portas, MMU, stubs)
pub mod drivers; // Serial, PIC, console
pub mod interrupts; // IDT e exceções

// --- Núcleo ---
pub mod core; // Boot, Multiboot, logging, panic
pub mod klib; // Bitmap, framework de self test
pub mod mm; // PMM, VMM, heap
pub mod sync; // Spinlock

#[cfg(test)]
pub(crate) mod testing;
