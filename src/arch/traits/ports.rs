//! Interface de I/O por portas (espaço de I/O legado do x86).

/// Porta usada pelo BIOS para POST codes; escrever nela só gasta um ciclo de barramento.
pub const IO_WAIT_PORT: u16 = 0x80;

/// Acesso ao espaço de portas de I/O.
///
/// Os drivers (PIC, serial) recebem um `PortIo` em vez de emitir `in`/`out`
/// diretamente, assim a sequência de escritas pode ser verificada no host.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
    fn read_u16(&mut self, port: u16) -> u16;
    fn write_u16(&mut self, port: u16, value: u16);
    fn read_u32(&mut self, port: u16) -> u32;
    fn write_u32(&mut self, port: u16, value: u32);

    /// Delay de IO (espera ciclo de barramento).
    ///
    /// Usado quando o hardware precisa de tempo para processar um comando
    /// antes de receber o próximo (ex: remapeamento do PIC).
    fn io_wait(&mut self) {
        self.write_u8(IO_WAIT_PORT, 0);
    }
}
