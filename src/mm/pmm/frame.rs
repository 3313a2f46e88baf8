use crate::mm::addr::PhysAddr;
use crate::mm::config::{PAGE_OFFSET_BITS, PAGE_SIZE};
use core::fmt;

/// Um frame de memória física (tamanho fixo PAGE_SIZE = 4KiB).
///
/// Guarda o número do frame; o endereço só é calculado quando vai para
/// uma entrada de tabela ou para um registrador.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysFrame {
    number: u32,
}

impl PhysFrame {
    /// Retorna o frame que contém o endereço físico dado
    #[inline]
    pub const fn containing_address(addr: PhysAddr) -> Self {
        Self {
            number: addr.as_u32() >> PAGE_OFFSET_BITS,
        }
    }

    /// Frame pelo índice no bitmap
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self {
            number: index as u32,
        }
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.number as usize
    }

    /// Retorna o endereço inicial do frame
    #[inline]
    pub const fn start_address(&self) -> PhysAddr {
        PhysAddr::new(self.number << PAGE_OFFSET_BITS)
    }

    #[inline]
    pub const fn size(&self) -> usize {
        PAGE_SIZE
    }
}

impl fmt::Debug for PhysFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysFrame({:#x})", self.start_address().as_u32())
    }
}
