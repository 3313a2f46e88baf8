//! Page faults: decodificação do error code e ponto de extensão do VMM.

use crate::mm::addr::VirtAddr;
use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Error code empilhado pela CPU no vetor 14
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFaultErrorCode: u32 {
        /// 0 = página não presente, 1 = violação de proteção
        const PROTECTION_VIOLATION = 1 << 0;
        /// 0 = leitura, 1 = escrita
        const CAUSED_BY_WRITE = 1 << 1;
        /// 0 = kernel (CPL 0), 1 = usuário (CPL 3)
        const USER_MODE = 1 << 2;
        const MALFORMED_TABLE = 1 << 3;
        const INSTRUCTION_FETCH = 1 << 4;
    }
}

impl PageFaultErrorCode {
    /// Texto de diagnóstico dos três bits baixos
    pub fn cause(self) -> FaultCause {
        FaultCause(self)
    }
}

/// Ex: "Page not present, write access (Kernel mode)"
#[derive(Debug, Clone, Copy)]
pub struct FaultCause(PageFaultErrorCode);

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.0;
        if code.contains(PageFaultErrorCode::PROTECTION_VIOLATION) {
            f.write_str("Protection violation")?;
        } else {
            f.write_str("Page not present")?;
        }
        if code.contains(PageFaultErrorCode::CAUSED_BY_WRITE) {
            f.write_str(", write access")?;
        } else {
            f.write_str(", read access")?;
        }
        if code.contains(PageFaultErrorCode::USER_MODE) {
            f.write_str(" (User mode)")
        } else {
            f.write_str(" (Kernel mode)")
        }
    }
}

/// Um page fault capturado (CR2 + error code)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFault {
    pub address: VirtAddr,
    pub error: PageFaultErrorCode,
}

impl PageFault {
    pub fn new(address: VirtAddr, raw_error: u32) -> Self {
        Self {
            address,
            error: PageFaultErrorCode::from_bits_truncate(raw_error),
        }
    }
}

/// Resultado do tratamento de um fault pelo VMM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResolution {
    /// Mapeamento corrigido, a instrução pode ser reexecutada
    Resolved,
    /// Nada a fazer; o despachante decide (normalmente halt)
    Unresolved,
}
