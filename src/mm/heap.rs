//! Heap do kernel.
//!
//! `linked_list_allocator::Heap` atrás do spinlock do núcleo. A região
//! virtual `[HEAP_VIRT_BASE, +HEAP_INITIAL_SIZE)` é apoiada por frames do PMM
//! mapeados pelo VMM antes de o heap ser entregue ao alocador.
//!
//! `kmalloc`/`kfree` existem para quem não usa `alloc`; com o alvo bare-metal
//! o mesmo heap também é o `#[global_allocator]`.

use crate::arch::traits::MmuOps;
use crate::mm::addr::VirtAddr;
use crate::mm::config::{HEAP_INITIAL_SIZE, HEAP_VIRT_BASE, PAGE_SIZE};
use crate::mm::error::{MmError, MmResult};
use crate::mm::pmm::{FrameAllocator, PhysFrame, FRAME_ALLOCATOR};
use crate::mm::vmm::{FrameMemory, PageFlags, VirtualMemoryManager, VMM};
use crate::sync::Spinlock;
use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use linked_list_allocator::Heap;

/// Alinhamento padrão de `kmalloc`
pub const KMALLOC_ALIGN: usize = 8;

/// Uso do heap em bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub size: usize,
    pub used: usize,
    pub free: usize,
}

pub struct KernelHeap {
    inner: Spinlock<Heap>,
}

impl KernelHeap {
    pub const fn empty() -> Self {
        Self {
            inner: Spinlock::new(Heap::empty()),
        }
    }

    /// # Safety
    /// `[start, start + size)` precisa estar mapeado, gravável e sem outro
    /// dono. Só pode ser chamado uma vez.
    pub unsafe fn init(&self, start: *mut u8, size: usize) {
        self.inner.lock().init(start, size);
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().size() > 0
    }

    pub fn allocate(&self, layout: Layout) -> MmResult<NonNull<u8>> {
        let mut heap = self.inner.lock();
        if heap.size() == 0 {
            return Err(MmError::HeapNotInitialized);
        }
        heap.allocate_first_fit(layout)
            .map_err(|_| MmError::OutOfMemory)
    }

    /// # Safety
    /// `ptr` veio de `allocate` com o mesmo `layout` e ainda não foi liberado.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.lock().deallocate(ptr, layout);
    }

    pub fn stats(&self) -> HeapStats {
        let heap = self.inner.lock();
        HeapStats {
            size: heap.size(),
            used: heap.used(),
            free: heap.free(),
        }
    }
}

unsafe impl GlobalAlloc for KernelHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocate(layout)
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(ptr) = NonNull::new(ptr) {
            self.deallocate(ptr, layout);
        }
    }
}

#[cfg_attr(all(not(test), target_os = "none"), global_allocator)]
pub static HEAP: KernelHeap = KernelHeap::empty();

/// Apoia `[start, start + size)` com frames novos do PMM.
///
/// Se faltar frame ou page table no meio, tudo o que esta chamada mapeou é
/// desfeito e os frames voltam ao PMM.
pub fn map_heap_region<M, U, A>(
    vmm: &mut VirtualMemoryManager<M, U>,
    frames: &mut A,
    start: VirtAddr,
    size: usize,
) -> MmResult<()>
where
    M: FrameMemory,
    U: MmuOps,
    A: FrameAllocator,
{
    if start.page_offset() != 0 {
        return Err(MmError::NotAligned);
    }
    let pages = size.div_ceil(PAGE_SIZE);
    if u64::from(start.as_u32()) + pages as u64 * PAGE_SIZE as u64 > 1 << 32 {
        return Err(MmError::InvalidSize);
    }

    for i in 0..pages {
        let page = start.add((i * PAGE_SIZE) as u32);
        let result = match frames.allocate_frame() {
            Some(frame) => {
                let mapped =
                    vmm.map_page(frames, None, page, frame.start_address(), PageFlags::KERNEL_DATA);
                if mapped.is_err() {
                    frames.deallocate_frame(frame);
                }
                mapped
            }
            None => Err(MmError::OutOfMemory),
        };

        if let Err(err) = result {
            crate::ktrace!("(Heap) sem memoria para a pagina ", page.as_u32());
            for done in 0..i {
                let page = start.add((done * PAGE_SIZE) as u32);
                if let Some(phys) = vmm.translate(None, page) {
                    vmm.unmap_page(None, page);
                    frames.deallocate_frame(PhysFrame::containing_address(phys));
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Mapeia a região padrão do heap e entrega ao alocador.
pub fn init() -> MmResult<()> {
    {
        let mut vmm = VMM.lock();
        let mut frames = FRAME_ALLOCATOR.lock();
        map_heap_region(
            &mut *vmm,
            &mut *frames,
            VirtAddr::new(HEAP_VIRT_BASE),
            HEAP_INITIAL_SIZE,
        )?;
    }

    // SAFETY: região acabou de ser mapeada e só o heap a usa
    unsafe { HEAP.init(VirtAddr::new(HEAP_VIRT_BASE).as_mut_ptr(), HEAP_INITIAL_SIZE) };
    crate::kinfo!("(Heap) Inicializado em ", HEAP_VIRT_BASE);
    crate::kinfo!("(Heap) Tamanho=", HEAP_INITIAL_SIZE);
    Ok(())
}

pub fn kmalloc(size: usize) -> MmResult<NonNull<u8>> {
    kmalloc_aligned(size, KMALLOC_ALIGN)
}

/// `align` precisa ser potência de dois. Tamanho 0 vira 1 byte.
pub fn kmalloc_aligned(size: usize, align: usize) -> MmResult<NonNull<u8>> {
    let layout = Layout::from_size_align(size.max(1), align).map_err(|_| MmError::InvalidSize)?;
    HEAP.allocate(layout)
}

/// # Safety
/// `ptr` veio de `kmalloc_aligned(size, align)` (ou `kmalloc(size)` com
/// `KMALLOC_ALIGN`) e ainda não foi liberado.
pub unsafe fn kfree(ptr: NonNull<u8>, size: usize, align: usize) {
    if let Ok(layout) = Layout::from_size_align(size.max(1), align) {
        HEAP.deallocate(ptr, layout);
    }
}

pub fn stats() -> HeapStats {
    HEAP.stats()
}
