//! Panic Handler.
//!
//! # Comportamento
//! 1. Desabilita interrupções (evita panic reentrante).
//! 2. Escreve local e mensagem no console (ou serial).
//! 3. Trava a CPU (hlt loop).

use crate::arch::platform::Cpu;
use crate::arch::traits::CpuOps;
use crate::drivers::console::Console;
use core::fmt::Write;
use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    Cpu::disable_interrupts();

    crate::kerror!("================ KERNEL PANIC ================");
    let mut console = Console;
    // Nada a fazer se o próprio console falhar
    let _ = match info.location() {
        Some(location) => writeln!(console, "Location: {}:{}", location.file(), location.line()),
        None => writeln!(console, "Location: Unknown"),
    };
    let _ = writeln!(console, "Reason:   {}", info.message());
    crate::kerror!("==============================================");

    Cpu::hang();
}
