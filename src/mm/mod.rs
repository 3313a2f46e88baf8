//! # Memory Management Subsystem (MM)
//!
//! | Módulo   | Responsabilidade |
//! |----------|------------------|
//! | `pmm`    | Frames físicos de 4 KiB em um bitmap global |
//! | `vmm`    | Page directory/tables do i386, map/unmap/tradução, CR3 |
//! | `heap`   | `linked_list_allocator` sobre uma janela mapeada pelo VMM |
//! | `fault`  | Decodificação de page faults e gancho de resolução |
//! | `addr`   | `PhysAddr` / `VirtAddr` |
//! | `config` | Constantes de layout |
//!
//! ## Ordem de inicialização
//!
//! ```text
//! PMM  ──▶ frames físicos (mapa do Multiboot)
//!  │
//!  ▼
//! VMM  ──▶ directory do kernel, identity map da RAM, CR3, CR0.PG
//!  │
//!  ▼
//! Heap ──▶ frames do PMM mapeados em HEAP_VIRT_BASE
//! ```
//!
//! ## Locks
//! Sempre `VMM` antes de `FRAME_ALLOCATOR`. O VMM nunca pega o lock do PMM
//! sozinho: recebe o alocador já travado por parâmetro.

pub mod addr;
pub mod config;
pub mod error;
pub mod fault;
pub mod heap;
pub mod pmm;
#[cfg(any(test, feature = "self_test"))]
pub mod test;
pub mod vmm;

pub use addr::{PhysAddr, VirtAddr};
pub use error::{MmError, MmResult};
pub use pmm::FrameAllocator;

use crate::mm::config::{HEAP_VIRT_BASE, PAGE_SIZE};
use crate::mm::pmm::{BootMemory, MemoryRegion, FRAME_ALLOCATOR};
use crate::mm::vmm::{PageFlags, VMM};
use core::ops::Range;

/// Inicializa PMM, VMM (com paginação ligada) e heap, nessa ordem.
///
/// `kernel_image` é a faixa física ocupada pela imagem do kernel; esses
/// frames nunca são entregues pelo PMM.
///
/// # Safety
/// Chamar uma vez, no boot, com interrupções desligadas e o kernel
/// carregado em memória física identity-mapped pela faixa de RAM descrita.
pub unsafe fn init<I>(memory: BootMemory<I>, kernel_image: Range<u64>) -> MmResult<()>
where
    I: Iterator<Item = MemoryRegion> + Clone,
{
    crate::kinfo!("(MM) Inicializando subsistema de memoria...");

    pmm::init(memory);
    let reserved = FRAME_ALLOCATOR
        .lock()
        .reserve_region(kernel_image.start, kernel_image.end.saturating_sub(kernel_image.start));
    crate::kdebug!("(MM) Frames da imagem do kernel reservados=", reserved);

    {
        let mut vmm = VMM.lock();
        let mut frames = FRAME_ALLOCATOR.lock();
        vmm.init(&mut *frames)?;

        // Identity map de toda a RAM gerenciada, abaixo da janela do heap
        let managed = frames.total_frames() as u64 * PAGE_SIZE as u64;
        let window = managed.min(u64::from(HEAP_VIRT_BASE));
        // Paginação ainda desligada; as tables deste mapa ficam dentro da janela
        vmm.memory_mut().set_window_end(window);
        vmm.identity_map_region(&mut *frames, None, PhysAddr::new(0), window, PageFlags::KERNEL_DATA)?;
        crate::kdebug!("(MM) Identity map ate ", window);

        vmm.enable_paging()?;
    }

    heap::init()?;

    let stats = pmm::stats();
    crate::kinfo!("(MM) Memoria livre (KB)=", stats.free_kb());
    Ok(())
}
