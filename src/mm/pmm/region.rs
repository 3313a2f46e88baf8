use crate::mm::config::PAGE_SIZE;
use core::ops::Range;

/// Tipos de região de memória (numeração do Multiboot)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegionType {
    Available,
    Reserved,
    AcpiReclaimable,
    AcpiNvs,
    BadMemory,
}

impl MemoryRegionType {
    /// Converte o campo `type` de uma entrada do mmap.
    /// Valores desconhecidos são tratados como reservados.
    pub const fn from_multiboot(kind: u32) -> Self {
        match kind {
            1 => Self::Available,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::BadMemory,
            _ => Self::Reserved,
        }
    }
}

/// Uma região contígua de memória física informada pelo firmware.
///
/// Endereços são 64-bit porque o mapa do BIOS pode descrever RAM acima de 4 GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub len: u64,
    pub kind: MemoryRegionType,
}

impl MemoryRegion {
    pub const fn new(start: u64, len: u64, kind: MemoryRegionType) -> Self {
        Self { start, len, kind }
    }

    /// Fim exclusivo da região
    pub const fn end(&self) -> u64 {
        self.start.saturating_add(self.len)
    }

    pub fn is_available(&self) -> bool {
        self.kind == MemoryRegionType::Available
    }

    /// Frames inteiramente contidos na região, ignorando o que está abaixo de `floor`.
    pub fn frame_range(&self, floor: u64) -> Range<u64> {
        let first = self.start.max(floor).div_ceil(PAGE_SIZE as u64);
        let end = self.end() / PAGE_SIZE as u64;
        first..end.max(first)
    }
}

/// Fonte de informação de memória entregue pelo bootloader.
#[derive(Debug, Clone)]
pub enum BootMemory<I> {
    /// Apenas `mem_lower`/`mem_upper` em KB (caminho legado)
    Sizes { lower_kb: u32, upper_kb: u32 },
    /// Mapa de memória detalhado
    Map(I),
}
