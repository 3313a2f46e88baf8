//! # VMM - Virtual Memory Manager
//!
//! | Arquivo      | Papel |
//! |--------------|-------|
//! | `paging.rs`  | `PageFlags`, `PageTableEntry`, `PageTable` (formato do hardware) |
//! | `memory.rs`  | Como o VMM enxerga os frames das tables (`FrameMemory`) |
//! | `manager.rs` | `VirtualMemoryManager`: directories, map/unmap, tradução |
//!
//! As funções livres deste módulo operam no VMM global pegando os locks na
//! ordem `VMM` -> `FRAME_ALLOCATOR`.

pub mod manager;
pub mod memory;
pub mod paging;

pub use manager::{DirectoryId, VirtualMemoryManager};
pub use memory::{FrameMemory, IdentityFrameMemory};
pub use paging::{PageFlags, PageTable, PageTableEntry};

use crate::arch::platform::Mmu;
use crate::mm::addr::{PhysAddr, VirtAddr};
use crate::mm::error::MmResult;
use crate::mm::pmm::FRAME_ALLOCATOR;
use crate::sync::Spinlock;

pub type KernelVmm = VirtualMemoryManager<IdentityFrameMemory, Mmu>;

// SAFETY: o kernel roda com os primeiros 4 MiB identity-mapped; o VMM só
// aceita frames de tables dentro da janela de `IdentityFrameMemory`, que só
// cresce em `mm::init` junto com o identity map.
pub static VMM: Spinlock<KernelVmm> = Spinlock::new(VirtualMemoryManager::new(
    unsafe { IdentityFrameMemory::new() },
    unsafe { Mmu::new() },
));

/// Monta o directory do kernel no VMM global.
pub fn init() -> MmResult<DirectoryId> {
    let mut vmm = VMM.lock();
    let mut frames = FRAME_ALLOCATOR.lock();
    vmm.init(&mut *frames)
}

/// Mapeia uma página no directory dado (`None` = ativo).
pub fn map_page(
    dir: Option<DirectoryId>,
    virt: VirtAddr,
    phys: PhysAddr,
    flags: PageFlags,
) -> MmResult<()> {
    let mut vmm = VMM.lock();
    let mut frames = FRAME_ALLOCATOR.lock();
    vmm.map_page(&mut *frames, dir, virt, phys, flags)
}

pub fn unmap_page(dir: Option<DirectoryId>, virt: VirtAddr) {
    VMM.lock().unmap_page(dir, virt);
}

/// Endereço físico de `virt`, ou 0 se não mapeado.
pub fn get_physical(dir: Option<DirectoryId>, virt: VirtAddr) -> u32 {
    VMM.lock().get_physical(dir, virt)
}

pub fn identity_map_region(
    dir: Option<DirectoryId>,
    start: PhysAddr,
    size: u64,
    flags: PageFlags,
) -> MmResult<()> {
    let mut vmm = VMM.lock();
    let mut frames = FRAME_ALLOCATOR.lock();
    vmm.identity_map_region(&mut *frames, dir, start, size, flags)
}

/// Liga a paginação no VMM global.
///
/// # Safety
/// O directory ativo precisa mapear o kernel em execução.
pub unsafe fn enable_paging() -> MmResult<()> {
    VMM.lock().enable_paging()
}
