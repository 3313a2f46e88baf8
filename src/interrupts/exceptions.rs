//! Exceções da CPU (vetores 0-31).
//!
//! Os stubs em assembly salvam o estado e chamam [`handle`] com um
//! [`ExceptionRegisters`] montado na pilha. Cada vetor tem uma
//! [`ExceptionClass`] na política global:
//!
//! - `Terminal`: bloco de diagnóstico no console e halt (padrão de todos).
//! - `Recoverable`: page fault vai para o VMM; sem resolução, vira terminal.
//! - `Ignorable`: só log e retorno.
//!
//! O caminho de exceção nunca bloqueia em lock: política e VMM são lidos com
//! `try_*`. Se estiverem ocupados vale a política padrão / fault sem resolução.

use crate::arch::platform::{self, Cpu};
use crate::arch::traits::{CpuOps, MmuOps};
use crate::arch::KERNEL_CODE_SELECTOR;
use crate::drivers::console::Console;
use crate::interrupts::idt::{self, Idt, GATE_KERNEL_INTERRUPT};
use crate::mm::addr::VirtAddr;
use crate::mm::fault::{FaultResolution, PageFault, PageFaultErrorCode};
use crate::mm::vmm::VMM;
use core::fmt;
use spin::RwLock;

/// Vetores reservados pela Intel para exceções
pub const EXCEPTION_VECTORS: usize = 32;

/// Estado salvo pelo stub, na ordem em que fica na pilha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ExceptionRegisters {
    pub ds: u32,
    // pushad
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub esp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
    // stub
    pub int_no: u32,
    pub err_code: u32,
    // CPU
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    pub useresp: u32,
    pub ss: u32,
}

/// Vetor de exceção com nome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionVector {
    DivideError,
    Debug,
    NonMaskableInterrupt,
    Breakpoint,
    Overflow,
    BoundRangeExceeded,
    InvalidOpcode,
    DeviceNotAvailable,
    DoubleFault,
    CoprocessorSegmentOverrun,
    InvalidTss,
    SegmentNotPresent,
    StackSegmentFault,
    GeneralProtection,
    PageFault,
    X87FloatingPoint,
    AlignmentCheck,
    MachineCheck,
    SimdFloatingPoint,
    Virtualization,
    ControlProtection,
    HypervisorInjection,
    VmmCommunication,
    Security,
    /// 15, 22-27 e 31
    Reserved(u8),
    /// Qualquer número >= 32
    Unknown(u32),
}

impl ExceptionVector {
    pub const fn from_number(vector: u32) -> Self {
        match vector {
            0 => Self::DivideError,
            1 => Self::Debug,
            2 => Self::NonMaskableInterrupt,
            3 => Self::Breakpoint,
            4 => Self::Overflow,
            5 => Self::BoundRangeExceeded,
            6 => Self::InvalidOpcode,
            7 => Self::DeviceNotAvailable,
            8 => Self::DoubleFault,
            9 => Self::CoprocessorSegmentOverrun,
            10 => Self::InvalidTss,
            11 => Self::SegmentNotPresent,
            12 => Self::StackSegmentFault,
            13 => Self::GeneralProtection,
            14 => Self::PageFault,
            16 => Self::X87FloatingPoint,
            17 => Self::AlignmentCheck,
            18 => Self::MachineCheck,
            19 => Self::SimdFloatingPoint,
            20 => Self::Virtualization,
            21 => Self::ControlProtection,
            28 => Self::HypervisorInjection,
            29 => Self::VmmCommunication,
            30 => Self::Security,
            15 | 22..=27 | 31 => Self::Reserved(vector as u8),
            _ => Self::Unknown(vector),
        }
    }

    pub const fn number(self) -> u32 {
        match self {
            Self::DivideError => 0,
            Self::Debug => 1,
            Self::NonMaskableInterrupt => 2,
            Self::Breakpoint => 3,
            Self::Overflow => 4,
            Self::BoundRangeExceeded => 5,
            Self::InvalidOpcode => 6,
            Self::DeviceNotAvailable => 7,
            Self::DoubleFault => 8,
            Self::CoprocessorSegmentOverrun => 9,
            Self::InvalidTss => 10,
            Self::SegmentNotPresent => 11,
            Self::StackSegmentFault => 12,
            Self::GeneralProtection => 13,
            Self::PageFault => 14,
            Self::X87FloatingPoint => 16,
            Self::AlignmentCheck => 17,
            Self::MachineCheck => 18,
            Self::SimdFloatingPoint => 19,
            Self::Virtualization => 20,
            Self::ControlProtection => 21,
            Self::HypervisorInjection => 28,
            Self::VmmCommunication => 29,
            Self::Security => 30,
            Self::Reserved(n) => n as u32,
            Self::Unknown(n) => n,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DivideError => "Divide by Zero",
            Self::Debug => "Debug",
            Self::NonMaskableInterrupt => "Non-Maskable Interrupt",
            Self::Breakpoint => "Breakpoint",
            Self::Overflow => "Overflow",
            Self::BoundRangeExceeded => "Bound Range Exceeded",
            Self::InvalidOpcode => "Invalid Opcode",
            Self::DeviceNotAvailable => "Device Not Available",
            Self::DoubleFault => "Double Fault",
            Self::CoprocessorSegmentOverrun => "Coprocessor Segment Overrun",
            Self::InvalidTss => "Invalid TSS",
            Self::SegmentNotPresent => "Segment Not Present",
            Self::StackSegmentFault => "Stack Segment Fault",
            Self::GeneralProtection => "General Protection Fault",
            Self::PageFault => "Page Fault",
            Self::X87FloatingPoint => "x87 FPU Error",
            Self::AlignmentCheck => "Alignment Check",
            Self::MachineCheck => "Machine Check",
            Self::SimdFloatingPoint => "SIMD Floating Point Exception",
            Self::Virtualization => "Virtualization Exception",
            Self::ControlProtection => "Control Protection Exception",
            Self::HypervisorInjection => "Hypervisor Injection Exception",
            Self::VmmCommunication => "VMM Communication Exception",
            Self::Security => "Security Exception",
            Self::Reserved(_) => "Reserved",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// A CPU empilha um error code nestes vetores; nos outros o stub empilha 0.
    pub const fn has_error_code(self) -> bool {
        matches!(
            self,
            Self::DoubleFault
                | Self::InvalidTss
                | Self::SegmentNotPresent
                | Self::StackSegmentFault
                | Self::GeneralProtection
                | Self::PageFault
                | Self::AlignmentCheck
                | Self::ControlProtection
                | Self::VmmCommunication
                | Self::Security
        )
    }
}

/// O que fazer quando um vetor dispara
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionClass {
    Terminal,
    Recoverable,
    Ignorable,
}

/// Classe de cada um dos 32 vetores de exceção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionPolicy {
    classes: [ExceptionClass; EXCEPTION_VECTORS],
}

impl ExceptionPolicy {
    /// Todos os vetores terminais
    pub const fn new() -> Self {
        Self {
            classes: [ExceptionClass::Terminal; EXCEPTION_VECTORS],
        }
    }

    /// Vetores fora de 0-31 são sempre terminais.
    pub fn class(&self, vector: u32) -> ExceptionClass {
        self.classes
            .get(vector as usize)
            .copied()
            .unwrap_or(ExceptionClass::Terminal)
    }

    /// Vetores fora de 0-31 são ignorados.
    pub fn set(&mut self, vector: u8, class: ExceptionClass) {
        if let Some(slot) = self.classes.get_mut(usize::from(vector)) {
            *slot = class;
        }
    }
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

static POLICY: RwLock<ExceptionPolicy> = RwLock::new(ExceptionPolicy::new());

/// Muda a classe de um vetor na política global.
pub fn set_class(vector: u8, class: ExceptionClass) {
    POLICY.write().set(vector, class);
}

/// Cópia da política global (padrão se alguém estiver escrevendo).
pub fn policy() -> ExceptionPolicy {
    POLICY.try_read().map(|p| *p).unwrap_or_default()
}

/// Resultado do despacho para o stub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// `iretd` de volta para o código interrompido
    Resume,
    /// Interrupções desligadas e halt para sempre
    Halt,
}

/// Instala os 32 gates de exceção (seletor 0x08, flags 0x8E).
pub fn init() {
    install(&mut idt::IDT.lock(), &platform::exception_stubs());
    crate::kinfo!("(EXC) Handlers instalados: vetores=", EXCEPTION_VECTORS);
}

/// Grava um gate por stub na tabela dada.
pub fn install(table: &mut Idt, stubs: &[u32; EXCEPTION_VECTORS]) {
    for (vector, handler) in stubs.iter().enumerate() {
        table.set_gate(vector as u8, *handler, KERNEL_CODE_SELECTOR, GATE_KERNEL_INTERRUPT);
    }
}

/// Decide o destino de uma exceção.
///
/// `fault_address` é o CR2 (só usado no vetor 14); `resolver` é o gancho
/// de page fault do VMM. O bloco de diagnóstico vai para `out` sempre que
/// o resultado for `Halt`.
pub fn dispatch<W, R>(
    regs: &ExceptionRegisters,
    policy: &ExceptionPolicy,
    fault_address: VirtAddr,
    resolver: R,
    out: &mut W,
) -> Disposition
where
    W: fmt::Write,
    R: FnOnce(&PageFault) -> FaultResolution,
{
    let vector = ExceptionVector::from_number(regs.int_no);

    match policy.class(regs.int_no) {
        ExceptionClass::Ignorable => {
            crate::kwarn!("(EXC) Exceção ignorada: vetor=", regs.int_no);
            return Disposition::Resume;
        }
        ExceptionClass::Recoverable if vector == ExceptionVector::PageFault => {
            let fault = PageFault::new(fault_address, regs.err_code);
            if resolver(&fault) == FaultResolution::Resolved {
                crate::kdebug!("(EXC) Page fault resolvido em ", fault_address.as_u32());
                return Disposition::Resume;
            }
        }
        // Só o vetor 14 tem gancho de recuperação
        ExceptionClass::Recoverable | ExceptionClass::Terminal => {}
    }

    crate::kerror!("(EXC) Exceção terminal: vetor=", regs.int_no);
    // Nada mais a fazer se o console falhar
    let _ = report(out, regs, fault_address);
    Disposition::Halt
}

const BANNER: &str = "======================================\n";

/// Escreve o bloco de diagnóstico de uma exceção terminal.
pub fn report<W: fmt::Write>(
    out: &mut W,
    regs: &ExceptionRegisters,
    fault_address: VirtAddr,
) -> fmt::Result {
    let vector = ExceptionVector::from_number(regs.int_no);

    write!(out, "\n{BANNER}    KERNEL PANIC - EXCEPTION!\n{BANNER}\n")?;
    writeln!(out, "Exception: {} ({})", vector.name(), regs.int_no)?;
    write!(out, "Error Code: {:#010X}\n\n", regs.err_code)?;

    if vector == ExceptionVector::PageFault {
        let cause = PageFaultErrorCode::from_bits_truncate(regs.err_code).cause();
        writeln!(out, "Page Fault Details:")?;
        writeln!(out, "  Faulting Address: {:#010X}", fault_address.as_u32())?;
        write!(out, "  Cause: {cause}\n\n")?;
    }

    writeln!(out, "Register Dump:")?;
    writeln!(
        out,
        "  EAX={:#010X}  EBX={:#010X}  ECX={:#010X}  EDX={:#010X}",
        regs.eax, regs.ebx, regs.ecx, regs.edx
    )?;
    writeln!(
        out,
        "  ESI={:#010X}  EDI={:#010X}  EBP={:#010X}  ESP={:#010X}",
        regs.esi, regs.edi, regs.ebp, regs.esp
    )?;
    write!(
        out,
        "  EIP={:#010X}  CS={:#010X}  DS={:#010X}  EFLAGS={:#010X}\n\n",
        regs.eip, regs.cs, regs.ds, regs.eflags
    )?;

    writeln!(out, "Stack Segment: {:#010X}", regs.ss)?;
    write!(out, "User ESP: {:#010X}\n\n", regs.useresp)?;
    write!(out, "{BANNER}System Halted - Cannot Continue\n{BANNER}")
}

/// Entrada comum chamada pelos stubs de assembly.
pub fn handle(regs: &ExceptionRegisters) {
    // SAFETY: só lê o CR2
    let fault_address = unsafe { platform::Mmu::new() }.fault_address();
    let policy = policy();

    let resolver = |fault: &PageFault| match VMM.try_lock() {
        Some(mut vmm) => vmm.resolve_fault(fault),
        None => FaultResolution::Unresolved,
    };

    if dispatch(regs, &policy, fault_address, resolver, &mut Console) == Disposition::Halt {
        Cpu::hang();
    }
}
