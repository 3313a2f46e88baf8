//! Gerenciamento da Interrupt Descriptor Table (IDT) do i386.
//!
//! Tabela de 256 gates de 8 bytes usada pela CPU para despachar exceções
//! (vetores 0-31) e IRQs remapeadas (0x20-0x2F).
//!
//! Layout de cada gate (bit-exato):
//! `offset[15:0] | selector | zero | type_attr | offset[31:16]`

use crate::sync::Spinlock;
use core::mem::size_of;

/// Número de vetores da IDT
pub const IDT_ENTRIES: usize = 256;

/// Present | DPL 0 | Interrupt Gate 32-bit
pub const GATE_KERNEL_INTERRUPT: u8 = 0x8E;

/// Present | DPL 3 | Interrupt Gate 32-bit (alcançável por `int` em ring 3)
pub const GATE_USER_INTERRUPT: u8 = 0xEE;

/// Entrada da IDT (8 bytes em modo protegido 32-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    /// Cria uma entrada vazia (não presente)
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    /// Cria uma entrada apontando para `handler` no segmento `selector`
    pub const fn new(handler: u32, selector: u16, flags: u8) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            zero: 0,
            type_attr: flags,
            offset_high: (handler >> 16) as u16,
        }
    }

    /// Endereço do handler reconstruído das duas metades
    pub const fn handler(&self) -> u32 {
        (self.offset_high as u32) << 16 | self.offset_low as u32
    }

    pub const fn selector(&self) -> u16 {
        self.selector
    }

    pub const fn flags(&self) -> u8 {
        self.type_attr
    }

    /// Bit P do type_attr
    pub const fn is_present(&self) -> bool {
        self.type_attr & 0x80 != 0
    }
}

/// Imagem do registrador IDTR (operando de `lidt`)
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtPointer {
    pub limit: u16,
    pub base: u32,
}

/// A Tabela IDT propriamente dita
#[repr(C, align(8))]
pub struct Idt {
    entries: [IdtEntry; IDT_ENTRIES],
}

impl Idt {
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::missing(); IDT_ENTRIES],
        }
    }

    /// Zera todos os 256 gates
    pub fn clear(&mut self) {
        self.entries = [IdtEntry::missing(); IDT_ENTRIES];
    }

    /// Instala um gate. Reinstalar o mesmo vetor só sobrescreve a entrada.
    ///
    /// O chamador garante que `handler` é código válido alcançável em `selector`.
    pub fn set_gate(&mut self, vector: u8, handler: u32, selector: u16, flags: u8) {
        self.entries[vector as usize] = IdtEntry::new(handler, selector, flags);
    }

    /// Lê de volta um gate
    pub fn entry(&self, vector: u8) -> IdtEntry {
        self.entries[vector as usize]
    }

    /// Monta o par limit/base desta tabela
    pub fn pointer(&self) -> IdtPointer {
        IdtPointer {
            limit: (size_of::<Self>() - 1) as u16,
            base: self as *const Self as usize as u32,
        }
    }
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

/// IDT global do kernel
pub static IDT: Spinlock<Idt> = Spinlock::new(Idt::new());

/// Zera a IDT global e carrega no IDTR.
pub fn init() {
    let mut idt = IDT.lock();
    idt.clear();

    let pointer = idt.pointer();
    // SAFETY: IDT é estática; o guard só protege a escrita das entradas
    unsafe { crate::arch::platform::load_idt(&pointer) };

    crate::kdebug!("(IDT) Carregada em base=", pointer.base);
}

/// Instala um gate na IDT global.
pub fn set_gate(vector: u8, handler: u32, selector: u16, flags: u8) {
    IDT.lock().set_gate(vector, handler, selector, flags);
}
