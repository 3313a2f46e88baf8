//! Driver do 8259 PIC (Programmable Interrupt Controller).
//!
//! Dois controladores em cascata (master + slave no pino 2) entregam as
//! IRQs 0-15 à CPU.
//!
//! # Remapeamento
//! Por padrão o PIC usa os vetores 0x08-0x0F, que colidem com exceções da
//! CPU. Remapeamos para 0x20-0x27 (master) e 0x28-0x2F (slave) e deixamos
//! todas as linhas mascaradas; cada driver desmascara a sua.

use crate::arch::platform::Ports;
use crate::arch::traits::PortIo;
use crate::sync::Spinlock;

const PIC1_CMD: u16 = 0x20;
const PIC1_DATA: u16 = 0x21;
const PIC2_CMD: u16 = 0xA0;
const PIC2_DATA: u16 = 0xA1;

/// ICW1: inicialização + ICW4 necessário
const ICW1_INIT: u8 = 0x11;
/// ICW4: modo 8086/88
const ICW4_8086: u8 = 0x01;
/// OCW2: EOI não específico
const PIC_EOI: u8 = 0x20;

/// Vetor base do master após remapeamento
pub const PIC_1_OFFSET: u8 = 0x20;
/// Vetor base do slave após remapeamento
pub const PIC_2_OFFSET: u8 = 0x28;

/// Uma linha de IRQ válida (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IrqLine(u8);

impl IrqLine {
    pub const TIMER: Self = Self(0);
    pub const KEYBOARD: Self = Self(1);
    /// Linha do master onde o slave está ligado
    pub const CASCADE: Self = Self(2);

    /// Retorna `None` para números >= 16
    pub const fn new(irq: u8) -> Option<Self> {
        if irq < 16 {
            Some(Self(irq))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Linhas 8-15 vêm do slave
    pub const fn is_slave(self) -> bool {
        self.0 >= 8
    }

    /// Vetor da CPU para esta linha depois do remapeamento
    pub const fn vector(self) -> u8 {
        if self.is_slave() {
            PIC_2_OFFSET + (self.0 - 8)
        } else {
            PIC_1_OFFSET + self.0
        }
    }

    /// Converte de volta um vetor remapeado
    pub const fn from_vector(vector: u8) -> Option<Self> {
        if vector >= PIC_1_OFFSET && vector < PIC_2_OFFSET + 8 {
            Some(Self(vector - PIC_1_OFFSET))
        } else {
            None
        }
    }

    const fn mask_bit(self) -> u8 {
        1 << (self.0 % 8)
    }
}

struct Pic {
    offset: u8,
    command: u16,
    data: u16,
}

/// Cadeia de PICs (Master + Slave).
pub struct ChainedPics<B: PortIo> {
    pics: [Pic; 2],
    bus: B,
}

impl<B: PortIo> ChainedPics<B> {
    pub const fn new(offset1: u8, offset2: u8, bus: B) -> Self {
        Self {
            pics: [
                Pic {
                    offset: offset1,
                    command: PIC1_CMD,
                    data: PIC1_DATA,
                },
                Pic {
                    offset: offset2,
                    command: PIC2_CMD,
                    data: PIC2_DATA,
                },
            ],
            bus,
        }
    }

    fn write(&mut self, port: u16, value: u8) {
        self.bus.write_u8(port, value);
        self.bus.io_wait();
    }

    /// Reprograma os dois controladores e mascara todas as 16 linhas.
    pub fn init(&mut self) {
        crate::kdebug!("(PIC) init: Remapeando IRQs para 0x20-0x2F...");
        // (command, data, offset)
        let master = (self.pics[0].command, self.pics[0].data, self.pics[0].offset);
        let slave = (self.pics[1].command, self.pics[1].data, self.pics[1].offset);

        // ICW1: início da sequência de inicialização
        self.write(master.0, ICW1_INIT);
        self.write(slave.0, ICW1_INIT);

        // ICW2: vetores base
        self.write(master.1, master.2);
        self.write(slave.1, slave.2);
        crate::ktrace!("(PIC) init: ICW2 offset1=", master.2);
        crate::ktrace!("(PIC) init: ICW2 offset2=", slave.2);

        // ICW3: master tem slave no pino 2, slave tem identidade 2
        self.write(master.1, 1 << IrqLine::CASCADE.0);
        self.write(slave.1, IrqLine::CASCADE.0);

        // ICW4: modo 8086
        self.write(master.1, ICW4_8086);
        self.write(slave.1, ICW4_8086);

        // Tudo mascarado até cada driver pedir a sua linha
        self.bus.write_u8(master.1, 0xFF);
        self.bus.write_u8(slave.1, 0xFF);

        crate::kinfo!("(PIC) Inicializado e Remapeado (todas as linhas mascaradas)");
    }

    /// Envia "End of Interrupt" (EOI).
    ///
    /// Para IRQs do slave, o slave precisa ser reconhecido antes do master;
    /// caso contrário o ISR do slave fica setado e a linha trava.
    pub fn send_eoi(&mut self, irq: IrqLine) {
        if irq.is_slave() {
            self.bus.write_u8(self.pics[1].command, PIC_EOI);
        }
        self.bus.write_u8(self.pics[0].command, PIC_EOI);
    }

    /// Habilita (unmask) uma IRQ. Linhas do slave também liberam a cascata.
    pub fn unmask(&mut self, irq: IrqLine) {
        let port = self.data_port(irq);
        let value = self.bus.read_u8(port);
        self.bus.write_u8(port, value & !irq.mask_bit());

        if irq.is_slave() {
            self.unmask(IrqLine::CASCADE);
        }
        crate::ktrace!("(PIC) unmask irq=", irq.0);
    }

    /// Desabilita (mask) uma IRQ.
    pub fn mask(&mut self, irq: IrqLine) {
        let port = self.data_port(irq);
        let value = self.bus.read_u8(port);
        self.bus.write_u8(port, value | irq.mask_bit());
    }

    /// Máscaras atuais (master, slave)
    pub fn masks(&mut self) -> (u8, u8) {
        let master = self.bus.read_u8(self.pics[0].data);
        let slave = self.bus.read_u8(self.pics[1].data);
        (master, slave)
    }

    /// Vetor base (master, slave)
    pub fn offsets(&self) -> (u8, u8) {
        (self.pics[0].offset, self.pics[1].offset)
    }

    fn data_port(&self, irq: IrqLine) -> u16 {
        self.pics[usize::from(irq.is_slave())].data
    }
}

// Instância global protegida (remapeando para 0x20 e 0x28)
// SAFETY: único dono das portas 0x20/0x21/0xA0/0xA1
pub static PICS: Spinlock<ChainedPics<Ports>> =
    Spinlock::new(ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET, unsafe {
        Ports::new()
    }));

/// Remapeia os PICs globais.
pub fn init() {
    PICS.lock().init();
}

/// EOI para os PICs globais (chamado no fim de todo handler de IRQ).
pub fn send_eoi(irq: IrqLine) {
    PICS.lock().send_eoi(irq);
}

/// Libera uma linha nos PICs globais.
pub fn unmask(irq: IrqLine) {
    PICS.lock().unmask(irq);
}
