// =============================================================================
// SERIAL DRIVER - ZERO OVERHEAD
// =============================================================================
//
// Driver da Porta Serial (COM1) para logging de kernel.
//
// ARQUITETURA:
// - SEM Spinlock: escrita direta via I/O ports (usável dentro de exceções)
// - SEM core::fmt: apenas bytes, strings e valores em hex
// - SEM alocação
//
// FUNÇÕES DISPONÍVEIS:
// - emit(byte)       : Envia um byte
// - emit_str(s)      : Envia string
// - emit_hex(v)      : Envia u64 em hexadecimal
// - emit_nl()        : Envia newline (\r\n)
//
// As variantes `*_on` recebem o `PortIo` explicitamente (usadas nos testes).
//
// =============================================================================

use crate::arch::platform::Ports;
use crate::arch::traits::PortIo;

// Porta de dados da COM1
const COM1_DATA: u16 = 0x3F8;

// Porta de status da COM1 (Line Status Register)
const COM1_STATUS: u16 = 0x3FD;

// LSR bit 5: Transmitter Holding Register vazio
const LSR_THR_EMPTY: u8 = 0x20;

#[inline(always)]
fn ports() -> Ports {
    // SAFETY: a COM1 só é tocada por este driver
    unsafe { Ports::new() }
}

// =============================================================================
// FUNÇÕES DE INICIALIZAÇÃO
// =============================================================================

/// Inicializa a porta serial COM1 (UART 16550).
///
/// Deve ser chamada uma vez durante o early-boot.
/// Configura: 38400 baud, 8N1, FIFO habilitado.
pub fn init() {
    init_on(&mut ports());
}

pub fn init_on<P: PortIo>(io: &mut P) {
    // Disable interrupts
    io.write_u8(COM1_DATA + 1, 0x00);

    // Enable DLAB (set baud rate divisor)
    io.write_u8(COM1_DATA + 3, 0x80);

    // Divisor 3 = 38400 baud (lo byte, hi byte)
    io.write_u8(COM1_DATA, 0x03);
    io.write_u8(COM1_DATA + 1, 0x00);

    // 8 bits, no parity, one stop bit
    io.write_u8(COM1_DATA + 3, 0x03);

    // Enable FIFO, clear them, with 14-byte threshold
    io.write_u8(COM1_DATA + 2, 0xC7);

    // IRQs enabled, RTS/DSR set
    io.write_u8(COM1_DATA + 4, 0x0B);
}

// =============================================================================
// FUNÇÕES DE ESCRITA
// =============================================================================

/// Envia um único byte, esperando o buffer de transmissão esvaziar.
#[inline]
pub fn emit_on<P: PortIo>(io: &mut P, byte: u8) {
    while io.read_u8(COM1_STATUS) & LSR_THR_EMPTY == 0 {
        core::hint::spin_loop();
    }
    io.write_u8(COM1_DATA, byte);
}

/// Envia um único byte para a porta serial.
pub fn emit(byte: u8) {
    emit_on(&mut ports(), byte);
}

/// Envia uma string para a porta serial.
#[inline(never)]
pub fn emit_str(s: &str) {
    let mut io = ports();
    s.bytes().for_each(|b| emit_on(&mut io, b));
}

/// Envia uma nova linha (CRLF) para a porta serial.
#[inline(never)]
pub fn emit_nl() {
    let mut io = ports();
    emit_on(&mut io, b'\r');
    emit_on(&mut io, b'\n');
}

/// Envia um valor u64 em hexadecimal.
///
/// Formato de saída: 0x0123456789ABCDEF (sempre 18 caracteres)
pub fn emit_hex_on<P: PortIo>(io: &mut P, value: u64) {
    emit_on(io, b'0');
    emit_on(io, b'x');
    for shift in (0..16).rev() {
        emit_on(io, nibble_to_ascii(((value >> (shift * 4)) & 0xF) as u8));
    }
}

#[inline(never)]
pub fn emit_hex(value: u64) {
    emit_hex_on(&mut ports(), value);
}

// =============================================================================
// FUNÇÕES AUXILIARES
// =============================================================================

/// Converte nibble (0-15) para caractere ASCII ('0'-'9', 'A'-'F').
#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + (n - 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPorts;

    fn ready_uart() -> RecordingPorts {
        let mut io = RecordingPorts::new();
        io.preset(COM1_STATUS, LSR_THR_EMPTY);
        io
    }

    #[test]
    fn init_programs_38400_8n1_with_fifo() {
        let mut io = RecordingPorts::new();
        init_on(&mut io);
        assert_eq!(
            io.writes,
            [
                (0x3F9, 0x00),
                (0x3FB, 0x80),
                (0x3F8, 0x03),
                (0x3F9, 0x00),
                (0x3FB, 0x03),
                (0x3FA, 0xC7),
                (0x3FC, 0x0B),
            ]
        );
    }

    #[test]
    fn hex_is_zero_padded_uppercase() {
        let mut io = ready_uart();
        emit_hex_on(&mut io, 0xBEEF);
        let text: std::string::String = io
            .writes
            .iter()
            .filter(|(port, _)| *port == COM1_DATA)
            .map(|(_, b)| *b as char)
            .collect();
        assert_eq!(text, "0x000000000000BEEF");
    }
}
