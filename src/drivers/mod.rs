//! # Drivers do núcleo
//!
//! Apenas o mínimo para o núcleo de interrupções e memória funcionar:
//!
//! | Driver   | Arquivo      | Papel |
//! |----------|--------------|-------|
//! | Serial   | `serial.rs`  | UART 16550 na COM1, logs de kernel |
//! | PIC      | `pic.rs`     | 8259 em cascata, remap + EOI |
//! | Console  | `console.rs` | Saída de diagnóstico (sink registrado ou serial) |
//!
//! Vídeo, teclado e timer são colaboradores externos: usam `pic::unmask`,
//! `pic::send_eoi` e `console::register`.

pub mod console;
pub mod pic;
pub mod serial;
