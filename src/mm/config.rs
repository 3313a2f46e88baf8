//! # Configuração do Módulo de Memória
//!
//! Constantes de tamanho e layout usadas pelo PMM, VMM e heap.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página/frame (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: u32 = !(PAGE_SIZE as u32 - 1);

/// Bits de offset dentro de uma página
pub const PAGE_OFFSET_BITS: u32 = 12;

/// Entradas por page directory / page table
pub const ENTRIES_PER_TABLE: usize = 1024;

/// Bytes cobertos por uma page table inteira (4 MiB)
pub const TABLE_COVERAGE: usize = PAGE_SIZE * ENTRIES_PER_TABLE;

// =============================================================================
// LAYOUT DE MEMÓRIA FÍSICA
// =============================================================================

/// Abaixo de 1 MiB nada é entregue pelo alocador (BIOS, VGA, IVT)
pub const LOW_MEMORY_LIMIT: u64 = 0x10_0000;

/// Capacidade do bitmap: 4 GiB em frames de 4 KiB
pub const MAX_FRAMES: usize = 1 << 20;

/// Palavras de 64 bits no bitmap do PMM
pub const BITMAP_WORDS: usize = MAX_FRAMES / 64;

// =============================================================================
// LAYOUT DE MEMÓRIA VIRTUAL
// =============================================================================

/// Região identity-mapped pelo VMM no init (código/dados do boot + VGA)
pub const IDENTITY_MAP_SIZE: usize = 4 * 1024 * 1024;

/// Máximo de page directories vivos ao mesmo tempo
pub const MAX_DIRECTORIES: usize = 8;

/// Base virtual do heap do kernel (logo abaixo do limite de 3 GiB)
pub const HEAP_VIRT_BASE: u32 = 0xBF00_0000;

/// Tamanho inicial do heap (1 MiB)
pub const HEAP_INITIAL_SIZE: usize = 1024 * 1024;

// =============================================================================
// HELPERS DE ALINHAMENTO (64-bit para regiões do firmware)
// =============================================================================

/// Alinha para baixo (align deve ser potência de 2)
#[inline]
pub const fn align_down(addr: u64, align: u64) -> u64 {
    addr & !(align - 1)
}

/// Alinha para cima (align deve ser potência de 2)
#[inline]
pub const fn align_up(addr: u64, align: u64) -> u64 {
    (addr + align - 1) & !(align - 1)
}

/// Verifica alinhamento
#[inline]
pub const fn is_aligned(addr: u64, align: u64) -> bool {
    addr & (align - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_helpers() {
        assert_eq!(align_down(0x1FFF, 0x1000), 0x1000);
        assert_eq!(align_up(0x1001, 0x1000), 0x2000);
        assert_eq!(align_up(0x2000, 0x1000), 0x2000);
        assert!(is_aligned(0x40_0000, PAGE_SIZE as u64));
        assert!(!is_aligned(0x40_0010, PAGE_SIZE as u64));
    }

    #[test]
    fn bitmap_covers_four_gib() {
        assert_eq!(MAX_FRAMES as u64 * PAGE_SIZE as u64, 1 << 32);
        assert_eq!(BITMAP_WORDS, 16384);
        assert_eq!(TABLE_COVERAGE, 0x40_0000);
    }
}
