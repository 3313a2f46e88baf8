//! Interface de Handoff (Multiboot 1 -> Kernel).
//!
//! O bootloader deixa em EAX a assinatura `MULTIBOOT_BOOTLOADER_MAGIC` e
//! em EBX o endereço físico do bloco de informações abaixo.

use crate::mm::pmm::{BootMemory, MemoryRegion, MemoryRegionType};
use bitflags::bitflags;
use core::marker::PhantomData;
use core::mem::size_of;

/// Valor de EAX quando o kernel foi carregado por um bootloader Multiboot
pub const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

bitflags! {
    /// Quais campos do `MultibootInfo` são válidos
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MultibootFlags: u32 {
        /// `mem_lower` / `mem_upper`
        const MEM = 1 << 0;
        const BOOT_DEVICE = 1 << 1;
        const CMDLINE = 1 << 2;
        const MODS = 1 << 3;
        const AOUT_SYMS = 1 << 4;
        const ELF_SHDR = 1 << 5;
        /// `mmap_length` / `mmap_addr`
        const MMAP = 1 << 6;
        const DRIVES = 1 << 7;
        const CONFIG_TABLE = 1 << 8;
        const BOOT_LOADER_NAME = 1 << 9;
    }
}

/// Bloco de informações Multiboot (até `boot_loader_name`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MultibootInfo {
    pub flags: u32,
    /// KB abaixo de 1 MiB
    pub mem_lower: u32,
    /// KB acima de 1 MiB
    pub mem_upper: u32,
    pub boot_device: u32,
    pub cmdline: u32,
    pub mods_count: u32,
    pub mods_addr: u32,
    pub syms: [u32; 4],
    pub mmap_length: u32,
    pub mmap_addr: u32,
    pub drives_length: u32,
    pub drives_addr: u32,
    pub config_table: u32,
    pub boot_loader_name: u32,
}

impl MultibootInfo {
    pub fn flags(&self) -> MultibootFlags {
        MultibootFlags::from_bits_truncate(self.flags)
    }

    /// Fonte de memória para o PMM: mapa completo se houver, senão os tamanhos.
    ///
    /// # Safety
    /// Com `MMAP` ligado, `[mmap_addr, mmap_addr + mmap_length)` precisa ser
    /// legível e continuar intacto enquanto o iterador for usado.
    pub unsafe fn boot_memory(&self) -> Option<BootMemory<MemoryMapIter<'_>>> {
        let flags = self.flags();
        if flags.contains(MultibootFlags::MMAP) {
            let base = self.mmap_addr as usize as *const u8;
            Some(BootMemory::Map(MemoryMapIter::new(base, self.mmap_length as usize)))
        } else if flags.contains(MultibootFlags::MEM) {
            Some(BootMemory::Sizes {
                lower_kb: self.mem_lower,
                upper_kb: self.mem_upper,
            })
        } else {
            None
        }
    }
}

/// Entrada do mapa de memória. `size` não conta o próprio campo.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct MemoryMapEntry {
    pub size: u32,
    pub addr: u64,
    pub len: u64,
    pub kind: u32,
}

/// Percorre o mapa com passo `size + 4`.
#[derive(Clone)]
pub struct MemoryMapIter<'a> {
    cursor: *const u8,
    end: *const u8,
    _info: PhantomData<&'a MultibootInfo>,
}

impl<'a> MemoryMapIter<'a> {
    /// # Safety
    /// `[base, base + length)` precisa ser legível durante `'a`.
    pub unsafe fn new(base: *const u8, length: usize) -> Self {
        Self {
            cursor: base,
            end: base.wrapping_add(length),
            _info: PhantomData,
        }
    }
}

impl Iterator for MemoryMapIter<'_> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<MemoryRegion> {
        if (self.end as usize).saturating_sub(self.cursor as usize) < size_of::<MemoryMapEntry>() {
            return None;
        }
        // SAFETY: entrada inteira dentro da faixa garantida em `new`
        let entry = unsafe { (self.cursor as *const MemoryMapEntry).read_unaligned() };
        // Entrada com size 0 faria o loop nunca terminar
        let stride = (entry.size as usize + size_of::<u32>()).max(size_of::<MemoryMapEntry>());
        self.cursor = self.cursor.wrapping_add(stride);

        let (addr, len, kind) = (entry.addr, entry.len, entry.kind);
        Some(MemoryRegion::new(addr, len, MemoryRegionType::from_multiboot(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn push_entry(buf: &mut Vec<u8>, size: u32, addr: u64, len: u64, kind: u32) {
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&addr.to_le_bytes());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&kind.to_le_bytes());
        // bytes extras declarados em `size`
        buf.resize(buf.len() + (size as usize - 20), 0xAA);
    }

    fn regions(buf: &[u8]) -> Vec<MemoryRegion> {
        unsafe { MemoryMapIter::new(buf.as_ptr(), buf.len()) }.collect()
    }

    #[test]
    fn info_layout_matches_multiboot() {
        assert_eq!(core::mem::offset_of!(MultibootInfo, mmap_length), 44);
        assert_eq!(core::mem::offset_of!(MultibootInfo, mmap_addr), 48);
        assert_eq!(core::mem::offset_of!(MultibootInfo, boot_loader_name), 64);
        assert_eq!(size_of::<MemoryMapEntry>(), 24);
    }

    #[test]
    fn memory_map_walk_uses_size_field_as_stride() {
        let mut buf = Vec::new();
        push_entry(&mut buf, 20, 0, 0x9_FC00, 1);
        push_entry(&mut buf, 24, 0x10_0000, 0x7F0_0000, 1);
        push_entry(&mut buf, 20, 0xFFFC_0000, 0x4_0000, 2);
        push_entry(&mut buf, 20, 0x7FF_0000, 0x1_0000, 3);

        let found = regions(&buf);
        assert_eq!(found.len(), 4);
        assert_eq!(found[1], MemoryRegion::new(0x10_0000, 0x7F0_0000, MemoryRegionType::Available));
        assert_eq!(found[2].kind, MemoryRegionType::Reserved);
        assert_eq!(found[3].kind, MemoryRegionType::AcpiReclaimable);
    }

    #[test]
    fn truncated_trailing_entry_is_ignored() {
        let mut buf = Vec::new();
        push_entry(&mut buf, 20, 0x10_0000, 0x1000, 1);
        buf.extend_from_slice(&[0; 10]);
        assert_eq!(regions(&buf).len(), 1);
    }

    #[test]
    fn boot_memory_falls_back_to_sizes() {
        let info = MultibootInfo {
            flags: MultibootFlags::MEM.bits(),
            mem_lower: 639,
            mem_upper: 64 * 1024,
            ..Default::default()
        };

        match unsafe { info.boot_memory() } {
            Some(BootMemory::Sizes { lower_kb, upper_kb }) => {
                assert_eq!(lower_kb, 639);
                assert_eq!(upper_kb, 64 * 1024);
            }
            _ => panic!("esperava mem_lower/mem_upper"),
        }
    }

    #[test]
    fn boot_memory_uses_map_when_flagged() {
        let info = MultibootInfo {
            flags: (MultibootFlags::MEM | MultibootFlags::MMAP).bits(),
            mmap_length: 0,
            ..Default::default()
        };
        match unsafe { info.boot_memory() } {
            Some(BootMemory::Map(mut regions)) => assert!(regions.next().is_none()),
            _ => panic!("esperava mapa de memoria"),
        }
    }

    #[test]
    fn no_memory_information() {
        assert!(unsafe { MultibootInfo::default().boot_memory() }.is_none());
    }
}
