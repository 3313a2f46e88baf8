//! Estruturas de paginação do i386 (sem PAE).
//!
//! Directory e tables têm o mesmo formato: 1024 entradas de 32 bits,
//! `[31..12]` endereço do frame, `[11..0]` flags.

use crate::mm::addr::PhysAddr;
use crate::mm::config::{ENTRIES_PER_TABLE, PAGE_MASK};
use crate::mm::pmm::PhysFrame;
use bitflags::bitflags;
use core::fmt;
use core::ops::{Index, IndexMut};

bitflags! {
    /// Flags de entrada de page directory / page table
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        const PRESENT = 1 << 0;
        const WRITABLE = 1 << 1;
        const USER = 1 << 2;
        const WRITE_THROUGH = 1 << 3;
        const NO_CACHE = 1 << 4;
        const ACCESSED = 1 << 5;
        const DIRTY = 1 << 6;
        const PAT = 1 << 7;
        const GLOBAL = 1 << 8;
    }
}

impl PageFlags {
    /// Dados do kernel: presente + escrita
    pub const KERNEL_DATA: Self = Self::PRESENT.union(Self::WRITABLE);

    /// Dados de usuário: presente + escrita + ring 3
    pub const USER_DATA: Self = Self::KERNEL_DATA.union(Self::USER);
}

/// Uma entrada de 32 bits (PDE ou PTE)
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageTableEntry(u32);

impl PageTableEntry {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Endereço alinhado para baixo combinado com as flags
    pub const fn new(addr: PhysAddr, flags: PageFlags) -> Self {
        Self((addr.as_u32() & PAGE_MASK) | (flags.bits() & !PAGE_MASK))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn address(self) -> PhysAddr {
        PhysAddr::new(self.0 & PAGE_MASK)
    }

    pub const fn frame(self) -> PhysFrame {
        PhysFrame::containing_address(self.address())
    }

    pub const fn flags(self) -> PageFlags {
        PageFlags::from_bits_truncate(self.0)
    }

    pub const fn is_present(self) -> bool {
        self.0 & PageFlags::PRESENT.bits() != 0
    }

    pub const fn is_unused(self) -> bool {
        self.0 == 0
    }

    pub fn set_unused(&mut self) {
        self.0 = 0;
    }
}

impl fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("addr", &self.address())
            .field("flags", &self.flags())
            .finish()
    }
}

/// Page directory ou page table (um frame de 4 KiB)
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [PageTableEntry; ENTRIES_PER_TABLE],
}

impl PageTable {
    pub const fn new() -> Self {
        Self {
            entries: [PageTableEntry::empty(); ENTRIES_PER_TABLE],
        }
    }

    pub fn zero(&mut self) {
        self.entries.iter_mut().for_each(PageTableEntry::set_unused);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.iter()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for PageTable {
    type Output = PageTableEntry;

    fn index(&self, index: usize) -> &PageTableEntry {
        &self.entries[index]
    }
}

impl IndexMut<usize> for PageTable {
    fn index_mut(&mut self, index: usize) -> &mut PageTableEntry {
        &mut self.entries[index]
    }
}
