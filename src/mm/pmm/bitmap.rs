//! # Bitmap Frame Allocator
//!
//! Um bit por frame de 4 KiB, capacidade fixa de 4 GiB (1M frames).
//! Bit = 1 significa "em uso": alocado, reservado pelo firmware ou abaixo de
//! 1 MiB. Frames acima de `total_frames` são sempre tratados como usados.
//!
//! ## Invariantes
//!
//! * `used_frames + free_frames == total_frames` depois de toda operação.
//! * Liberar um frame já livre não altera nada.
//! * Toda palavra do bitmap abaixo de `next_free` está cheia; a busca
//!   começa ali e continua devolvendo o frame livre de menor número.

use super::frame::PhysFrame;
use super::region::{BootMemory, MemoryRegion};
use super::stats::PmmStats;
use super::FrameAllocator;
use crate::klib::Bitmap;
use crate::mm::addr::PhysAddr;
use crate::mm::config::{BITMAP_WORDS, LOW_MEMORY_LIMIT, MAX_FRAMES, PAGE_SIZE};

/// Primeiro frame entregue pelo alocador (1 MiB)
const FIRST_ALLOCATABLE_FRAME: usize = (LOW_MEMORY_LIMIT / PAGE_SIZE as u64) as usize;

// ============================================================================
// ESTRUTURA PRINCIPAL
// ============================================================================

/// BitmapFrameAllocator - Gerencia memória física usando um bitmap.
pub struct BitmapFrameAllocator {
    bitmap: Bitmap<BITMAP_WORDS>,
    total_frames: usize,
    used_frames: usize,
    /// Palavra do bitmap onde a próxima busca começa
    next_free: usize,
    failed_allocs: usize,
}

impl BitmapFrameAllocator {
    /// Alocador vazio: `total_frames == 0`, nenhuma alocação possível.
    pub const fn empty() -> Self {
        Self {
            bitmap: Bitmap::new(),
            total_frames: 0,
            used_frames: 0,
            next_free: 0,
            failed_allocs: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Inicialização
    // ------------------------------------------------------------------------

    /// Inicializa a partir do que o bootloader entregou.
    pub fn init<I>(&mut self, memory: BootMemory<I>)
    where
        I: Iterator<Item = MemoryRegion> + Clone,
    {
        match memory {
            BootMemory::Sizes { lower_kb, upper_kb } => self.init_from_sizes(lower_kb, upper_kb),
            BootMemory::Map(regions) => self.init_from_regions(regions),
        }
    }

    /// Caminho legado: só os tamanhos `mem_lower`/`mem_upper` em KB.
    pub fn init_from_sizes(&mut self, lower_kb: u32, upper_kb: u32) {
        crate::kdebug!("(PMM) init: usando mem_lower/mem_upper");
        self.reset();

        let bytes = (lower_kb as u64 + upper_kb as u64) * 1024;
        self.total_frames = (bytes / PAGE_SIZE as u64).min(MAX_FRAMES as u64) as usize;

        for frame in FIRST_ALLOCATABLE_FRAME..self.total_frames {
            self.bitmap.clear(frame);
        }
        self.finish_init();
    }

    /// Inicializa a partir do mapa de memória (duas passadas).
    pub fn init_from_regions<I>(&mut self, regions: I)
    where
        I: Iterator<Item = MemoryRegion> + Clone,
    {
        crate::kdebug!("(PMM) init: usando memory map");
        self.reset();

        // Passo 1: maior fim de região utilizável limita o total
        let highest = regions
            .clone()
            .filter(MemoryRegion::is_available)
            .map(|r| r.end())
            .max()
            .unwrap_or(0);
        self.total_frames = (highest / PAGE_SIZE as u64).min(MAX_FRAMES as u64) as usize;
        crate::ktrace!("(PMM) init: maior endereço utilizável=", highest);

        // Passo 2: liberar frames utilizáveis acima de 1 MiB
        for region in regions.filter(MemoryRegion::is_available) {
            let range = region.frame_range(LOW_MEMORY_LIMIT);
            let end = range.end.min(self.total_frames as u64);
            for frame in range.start..end {
                self.bitmap.clear(frame as usize);
            }
            crate::ktrace!("(PMM) init: região livre start=", region.start);
        }

        self.finish_init();
    }

    /// Tudo marcado como usado, contadores zerados.
    fn reset(&mut self) {
        self.bitmap.fill(true);
        self.total_frames = 0;
        self.used_frames = 0;
        self.next_free = 0;
        self.failed_allocs = 0;
    }

    /// Recalcula `used_frames` varrendo o bitmap em vez de confiar nos passos anteriores.
    fn finish_init(&mut self) {
        self.used_frames = self.bitmap.count_ones(self.total_frames);
        self.next_free = 0;

        crate::kinfo!("(PMM) total_frames=", self.total_frames);
        crate::kinfo!("(PMM) free_frames=", self.free_frames());
    }

    // ------------------------------------------------------------------------
    // Alocação
    // ------------------------------------------------------------------------

    /// Aloca o frame livre de menor número. `None` quando o bitmap esgotou.
    pub fn alloc_page(&mut self) -> Option<PhysFrame> {
        match self.bitmap.find_first_zero(self.next_free, self.total_frames) {
            Some(index) => {
                self.bitmap.set(index);
                self.used_frames += 1;
                self.next_free = index / 64;
                Some(PhysFrame::from_index(index))
            }
            None => {
                self.failed_allocs += 1;
                crate::ktrace!("(PMM) alloc_page: sem frames livres");
                None
            }
        }
    }

    /// Libera o frame que contém `addr`. Fora do range ou já livre: no-op.
    pub fn free_page(&mut self, addr: PhysAddr) {
        let index = PhysFrame::containing_address(addr).index();
        if index >= self.total_frames {
            return;
        }
        if self.bitmap.clear(index) {
            self.used_frames -= 1;
            self.next_free = self.next_free.min(index / 64);
        }
    }

    /// Marca um frame fixo como usado (ex: reservado pelo firmware).
    pub fn mark_used(&mut self, addr: PhysAddr) {
        let index = PhysFrame::containing_address(addr).index();
        if index < self.total_frames && self.bitmap.set(index) {
            self.used_frames += 1;
        }
    }

    /// Marca um frame fixo como livre. Mesmas regras de `free_page`.
    pub fn mark_free(&mut self, addr: PhysAddr) {
        self.free_page(addr);
    }

    /// Reserva todo frame que toca `[start, start + len)`.
    ///
    /// Retorna quantos frames passaram de livres para usados.
    pub fn reserve_region(&mut self, start: u64, len: u64) -> usize {
        if len == 0 {
            return 0;
        }
        let first = start / PAGE_SIZE as u64;
        let end = start
            .saturating_add(len)
            .div_ceil(PAGE_SIZE as u64)
            .min(self.total_frames as u64);

        let mut reserved = 0;
        for frame in first..end {
            if self.bitmap.set(frame as usize) {
                self.used_frames += 1;
                reserved += 1;
            }
        }
        reserved
    }

    // ------------------------------------------------------------------------
    // Consultas
    // ------------------------------------------------------------------------

    /// Verifica se o frame que contém `addr` está livre.
    pub fn is_page_free(&self, addr: PhysAddr) -> bool {
        let index = PhysFrame::containing_address(addr).index();
        index < self.total_frames && !self.bitmap.test(index)
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn free_frames(&self) -> usize {
        self.total_frames - self.used_frames
    }

    /// Contadores atuais (sem efeitos colaterais)
    pub fn stats(&self) -> PmmStats {
        PmmStats {
            total_frames: self.total_frames,
            used_frames: self.used_frames,
            free_frames: self.free_frames(),
            failed_allocs: self.failed_allocs,
        }
    }
}

impl FrameAllocator for BitmapFrameAllocator {
    fn allocate_frame(&mut self) -> Option<PhysFrame> {
        self.alloc_page()
    }

    fn deallocate_frame(&mut self, frame: PhysFrame) {
        self.free_page(frame.start_address());
    }
}
