//! Implementação i386 das operações de CPU (HAL).

use crate::arch::traits::CpuOps;
use core::arch::asm;

/// EFLAGS.IF (bit 9)
const EFLAGS_IF: u32 = 1 << 9;

pub struct X86Cpu;

impl CpuOps for X86Cpu {
    #[inline]
    fn halt() {
        // SAFETY: HLT só suspende até a próxima interrupção
        unsafe { asm!("hlt", options(nomem, nostack, preserves_flags)) };
    }

    #[inline]
    fn disable_interrupts() {
        unsafe { asm!("cli", options(nomem, nostack)) };
    }

    #[inline]
    fn enable_interrupts() {
        unsafe { asm!("sti", options(nomem, nostack)) };
    }

    #[inline]
    fn are_interrupts_enabled() -> bool {
        let eflags: u32;
        unsafe {
            asm!("pushfd", "pop {}", out(reg) eflags, options(nomem, preserves_flags));
        }
        eflags & EFLAGS_IF != 0
    }
}
