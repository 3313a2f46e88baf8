//! # Interrupções
//!
//! | Arquivo         | Papel |
//! |-----------------|-------|
//! | `idt.rs`        | Tabela de 256 gates + `lidt` |
//! | `exceptions.rs` | Vetores 0-31: política, diagnóstico e halt |
//!
//! IRQs de hardware (0x20-0x2F) são instaladas pelos próprios drivers com
//! `idt::set_gate` e reconhecidas com `drivers::pic::send_eoi`.

pub mod exceptions;
pub mod idt;

pub use exceptions::{ExceptionClass, ExceptionPolicy, ExceptionRegisters, ExceptionVector};
pub use idt::{set_gate, IdtEntry, IdtPointer};

/// IDT vazia, exceções instaladas e PICs remapeados (tudo mascarado).
///
/// As interrupções continuam desligadas; quem chama decide quando fazer `sti`.
pub fn init() {
    idt::init();
    exceptions::init();
    crate::drivers::pic::init();
}
