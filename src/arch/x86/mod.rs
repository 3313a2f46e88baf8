//! Implementação i386 (modo protegido 32-bit) do HAL.

pub mod cpu;
pub mod mmu;
pub mod ports;
pub mod stubs;

use crate::interrupts::idt::IdtPointer;
use core::arch::asm;

pub type Cpu = cpu::X86Cpu;
pub type Ports = ports::X86Ports;
pub type Mmu = mmu::X86Mmu;

pub use stubs::exception_stubs;

/// Carrega o IDTR.
///
/// # Safety
/// `pointer.base` deve apontar para uma IDT que continue viva e no mesmo
/// endereço enquanto estiver carregada.
pub unsafe fn load_idt(pointer: &IdtPointer) {
    asm!("lidt [{}]", in(reg) pointer, options(readonly, nostack, preserves_flags));
}
