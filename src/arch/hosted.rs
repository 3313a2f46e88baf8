//! Plataforma "hosted": HAL sem hardware para builds fora do i386.
//!
//! Permite compilar e testar a lógica do núcleo no host. Nenhuma instrução
//! privilegiada é emitida; portas leem 0xFF (barramento flutuante) e a MMU
//! só guarda o último CR3 carregado.

use crate::arch::traits::{CpuOps, MmuOps, PortIo};
use crate::interrupts::idt::IdtPointer;
use crate::mm::addr::{PhysAddr, VirtAddr};
#[cfg(not(test))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(test)]
std::thread_local! {
    static INTERRUPTS: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

// Nos testes cada thread tem seu próprio EFLAGS.IF simulado
#[cfg(test)]
fn set_interrupt_flag(enabled: bool) {
    INTERRUPTS.with(|flag| flag.set(enabled));
}

#[cfg(test)]
fn interrupt_flag() -> bool {
    INTERRUPTS.with(|flag| flag.get())
}

#[cfg(not(test))]
static INTERRUPTS: AtomicBool = AtomicBool::new(false);

#[cfg(not(test))]
fn set_interrupt_flag(enabled: bool) {
    INTERRUPTS.store(enabled, Ordering::Relaxed);
}

#[cfg(not(test))]
fn interrupt_flag() -> bool {
    INTERRUPTS.load(Ordering::Relaxed)
}

pub struct HostedCpu;

impl CpuOps for HostedCpu {
    fn halt() {
        core::hint::spin_loop();
    }

    fn disable_interrupts() {
        set_interrupt_flag(false);
    }

    fn enable_interrupts() {
        set_interrupt_flag(true);
    }

    fn are_interrupts_enabled() -> bool {
        interrupt_flag()
    }
}

pub struct HostedPorts {
    _private: (),
}

impl HostedPorts {
    /// # Safety
    /// Mesmo contrato de `X86Ports::new`.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for HostedPorts {
    fn read_u8(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn write_u8(&mut self, _port: u16, _value: u8) {}

    fn read_u16(&mut self, _port: u16) -> u16 {
        0xFFFF
    }

    fn write_u16(&mut self, _port: u16, _value: u16) {}

    fn read_u32(&mut self, _port: u16) -> u32 {
        0xFFFF_FFFF
    }

    fn write_u32(&mut self, _port: u16, _value: u32) {}
}

pub struct HostedMmu {
    root: PhysAddr,
    paging: bool,
}

impl HostedMmu {
    /// # Safety
    /// Mesmo contrato de `X86Mmu::new`.
    pub const unsafe fn new() -> Self {
        Self {
            root: PhysAddr::new(0),
            paging: false,
        }
    }
}

impl MmuOps for HostedMmu {
    fn fault_address(&self) -> VirtAddr {
        VirtAddr::new(0)
    }

    fn root_table(&self) -> PhysAddr {
        self.root
    }

    unsafe fn load_root_table(&mut self, root: PhysAddr) {
        self.root = root;
    }

    fn invalidate_page(&mut self, _page: VirtAddr) {}

    fn flush_all(&mut self) {}

    unsafe fn enable_paging(&mut self) {
        self.paging = true;
    }

    fn paging_enabled(&self) -> bool {
        self.paging
    }
}

pub type Cpu = HostedCpu;
pub type Ports = HostedPorts;
pub type Mmu = HostedMmu;

/// Sem IDTR no host.
///
/// # Safety
/// Sem efeito; existe para manter a mesma assinatura do i386.
pub unsafe fn load_idt(_pointer: &IdtPointer) {}

/// Sem stubs de exceção no host: todos os gates apontariam para 0.
pub fn exception_stubs() -> [u32; 32] {
    [0; 32]
}
