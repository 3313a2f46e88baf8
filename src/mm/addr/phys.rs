use crate::mm::config::PAGE_MASK;
use core::fmt;

/// Endereço físico de 32 bits (wrapper type-safe)
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u32);

impl PhysAddr {
    /// Cria novo endereço físico
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Retorna o valor interno como u32
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Retorna o valor interno como u64
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    /// Alinha para baixo na fronteira de página
    #[inline]
    pub const fn page_align_down(self) -> Self {
        Self(self.0 & PAGE_MASK)
    }

    /// Offset dentro da página (12 bits baixos)
    #[inline]
    pub const fn page_offset(self) -> u32 {
        self.0 & !PAGE_MASK
    }

    /// Verifica alinhamento de página
    #[inline]
    pub const fn is_page_aligned(self) -> bool {
        self.page_offset() == 0
    }

    /// Verifica se é nulo
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Adiciona offset (wrapping no espaço de 4 GiB)
    #[inline]
    pub const fn add(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
