//! Registradores de controle da MMU i386 (CR0, CR2, CR3) e INVLPG.

use crate::arch::traits::MmuOps;
use crate::mm::addr::{PhysAddr, VirtAddr};
use core::arch::asm;

/// CR0.PG (bit 31)
const CR0_PAGING: u32 = 1 << 31;

#[inline]
fn read_cr0() -> u32 {
    let value: u32;
    unsafe { asm!("mov {}, cr0", out(reg) value, options(nomem, nostack, preserves_flags)) };
    value
}

#[inline]
fn read_cr2() -> u32 {
    let value: u32;
    unsafe { asm!("mov {}, cr2", out(reg) value, options(nomem, nostack, preserves_flags)) };
    value
}

#[inline]
fn read_cr3() -> u32 {
    let value: u32;
    unsafe { asm!("mov {}, cr3", out(reg) value, options(nomem, nostack, preserves_flags)) };
    value
}

#[inline]
unsafe fn write_cr3(value: u32) {
    asm!("mov cr3, {}", in(reg) value, options(nostack, preserves_flags));
}

pub struct X86Mmu {
    _private: (),
}

impl X86Mmu {
    /// # Safety
    /// Só o VMM (e o caminho de exceção, para ler CR2) deve ter um handle.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl MmuOps for X86Mmu {
    fn fault_address(&self) -> VirtAddr {
        VirtAddr::new(read_cr2())
    }

    fn root_table(&self) -> PhysAddr {
        PhysAddr::new(read_cr3())
    }

    unsafe fn load_root_table(&mut self, root: PhysAddr) {
        write_cr3(root.page_align_down().as_u32());
    }

    #[inline]
    fn invalidate_page(&mut self, page: VirtAddr) {
        // SAFETY: INVLPG só descarta cache, nunca altera mapeamentos
        unsafe {
            asm!("invlpg [{}]", in(reg) page.as_u32(), options(nostack, preserves_flags));
        }
    }

    fn flush_all(&mut self) {
        // SAFETY: recarregar o mesmo CR3 só descarta a TLB
        unsafe { write_cr3(read_cr3()) };
    }

    unsafe fn enable_paging(&mut self) {
        let cr0 = read_cr0() | CR0_PAGING;
        asm!("mov cr0, {}", in(reg) cr0, options(nostack, preserves_flags));
    }

    fn paging_enabled(&self) -> bool {
        read_cr0() & CR0_PAGING != 0
    }
}
