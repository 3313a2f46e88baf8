//! Console de diagnóstico.
//!
//! O driver de vídeo (fora do núcleo) registra um `ConsoleSink` uma única
//! vez no boot. Enquanto nada for registrado, o texto vai para a COM1.

use crate::drivers::serial;
use core::fmt;
use spin::Once;

/// Destino de texto para mensagens do kernel (ex: VGA em modo texto).
pub trait ConsoleSink: Sync {
    fn write(&self, text: &str);
}

static SINK: Once<&'static dyn ConsoleSink> = Once::new();

/// Registra o console. Registros posteriores são ignorados.
pub fn register(sink: &'static dyn ConsoleSink) {
    SINK.call_once(|| sink);
}

/// Verifica se algum console já foi registrado
pub fn is_registered() -> bool {
    SINK.is_completed()
}

/// Writer de `fmt` sobre o console registrado (ou serial).
pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match SINK.get() {
            Some(sink) => sink.write(s),
            None => serial::emit_str(s),
        }
        Ok(())
    }
}
