use crate::mm::config::PAGE_MASK;
use core::fmt;

/// Endereço virtual de 32 bits.
///
/// Layout x86 sem PAE: `[31..22]` índice no directory, `[21..12]` índice na
/// table, `[11..0]` offset na página.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u32);

impl VirtAddr {
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    /// Retorna ponteiro raw mut
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as usize as *mut T
    }

    /// Índice no page directory (10 bits altos)
    #[inline]
    pub const fn directory_index(self) -> usize {
        (self.0 >> 22) as usize
    }

    /// Índice na page table (10 bits do meio)
    #[inline]
    pub const fn table_index(self) -> usize {
        ((self.0 >> 12) & 0x3FF) as usize
    }

    /// Offset dentro da página
    #[inline]
    pub const fn page_offset(self) -> u32 {
        self.0 & !PAGE_MASK
    }

    #[inline]
    pub const fn page_align_down(self) -> Self {
        Self(self.0 & PAGE_MASK)
    }

    /// Adiciona offset (wrapping no espaço de 4 GiB)
    #[inline]
    pub const fn add(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
