//! # PMM - Physical Memory Manager
//!
//! Gerencia alocação de frames físicos com um bitmap global.
//! Inicializado uma vez no boot a partir do mapa do Multiboot; depois disso
//! só é alterado através de `FRAME_ALLOCATOR` (interrupções mascaradas).

pub mod bitmap;
pub mod frame;
pub mod region;
pub mod stats;

pub use bitmap::BitmapFrameAllocator;
pub use frame::PhysFrame;
pub use region::{BootMemory, MemoryRegion, MemoryRegionType};
pub use stats::PmmStats;

use crate::sync::Spinlock;

/// Fonte de frames físicos para quem precisa de memória (VMM, heap).
pub trait FrameAllocator {
    /// `None` quando não há frames; quem chamou decide como falhar.
    fn allocate_frame(&mut self) -> Option<PhysFrame>;

    fn deallocate_frame(&mut self, frame: PhysFrame);
}

/// Alocador global de frames físicos
pub static FRAME_ALLOCATOR: Spinlock<BitmapFrameAllocator> =
    Spinlock::new(BitmapFrameAllocator::empty());

/// Atalho para inicializar o PMM global
pub fn init<I>(memory: BootMemory<I>)
where
    I: Iterator<Item = MemoryRegion> + Clone,
{
    FRAME_ALLOCATOR.lock().init(memory);
}

/// Estatísticas do PMM global
pub fn stats() -> PmmStats {
    FRAME_ALLOCATOR.lock().stats()
}
