/// Arquivo: x86/ports.rs
///
/// Propósito: instruções `in`/`out` do espaço de I/O legado do x86.
/// Essenciais para configurar o PIC 8259 e a UART da COM1.
use crate::arch::traits::PortIo;
use core::arch::asm;

/// Lê um byte de uma porta IO
#[inline]
pub fn inb(port: u16) -> u8 {
    let value: u8;
    // SAFETY: IO ports são operações privilegiadas mas seguras do ponto de vista de memória
    unsafe {
        asm!("in al, dx", in("dx") port, out("al") value, options(nomem, nostack));
    }
    value
}

/// Escreve um byte em uma porta IO
#[inline]
pub fn outb(port: u16, value: u8) {
    unsafe {
        asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack));
    }
}

/// Lê um word (16 bits) de uma porta IO
#[inline]
pub fn inw(port: u16) -> u16 {
    let value: u16;
    unsafe {
        asm!("in ax, dx", in("dx") port, out("ax") value, options(nomem, nostack));
    }
    value
}

/// Escreve um word em uma porta IO
#[inline]
pub fn outw(port: u16, value: u16) {
    unsafe {
        asm!("out dx, ax", in("dx") port, in("ax") value, options(nomem, nostack));
    }
}

/// Lê um dword (32 bits) de uma porta IO
#[inline]
pub fn inl(port: u16) -> u32 {
    let value: u32;
    unsafe {
        asm!("in eax, dx", in("dx") port, out("eax") value, options(nomem, nostack));
    }
    value
}

/// Escreve um dword em uma porta IO
#[inline]
pub fn outl(port: u16, value: u32) {
    unsafe {
        asm!("out dx, eax", in("dx") port, in("eax") value, options(nomem, nostack));
    }
}

/// Acesso real ao espaço de portas.
pub struct X86Ports {
    _private: (),
}

impl X86Ports {
    /// # Safety
    /// Quem cria o handle assume a posse das portas que vai tocar; dois
    /// drivers programando o mesmo chip corrompem o estado dele.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for X86Ports {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        inb(port)
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        outb(port, value)
    }

    #[inline]
    fn read_u16(&mut self, port: u16) -> u16 {
        inw(port)
    }

    #[inline]
    fn write_u16(&mut self, port: u16, value: u16) {
        outw(port, value)
    }

    #[inline]
    fn read_u32(&mut self, port: u16) -> u32 {
        inl(port)
    }

    #[inline]
    fn write_u32(&mut self, port: u16, value: u32) {
        outl(port, value)
    }
}
