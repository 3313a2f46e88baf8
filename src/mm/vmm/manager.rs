//! # Virtual Memory Manager
//!
//! Paginação de dois níveis do i386: um page directory (1024 PDEs) aponta
//! para page tables (1024 PTEs) que mapeiam páginas de 4 KiB.
//!
//! ## Directories
//! Cada directory ocupa um slot com contador de geração. O `DirectoryId`
//! carrega slot + geração; um id de directory destruído deixa de casar e
//! passa a ser rejeitado em vez de apontar para frames reaproveitados.
//!
//! O VMM lembra qual page table está em cada PDE (`tables`), então nunca
//! precisa ler de volta um endereço físico para achar a table.
//!
//! ## Locks
//! O VMM recebe o alocador de frames por parâmetro. Quem segura os dois
//! locks globais pega `VMM` antes de `FRAME_ALLOCATOR`.

use super::memory::FrameMemory;
use super::paging::{PageFlags, PageTableEntry};
use crate::arch::traits::MmuOps;
use crate::mm::addr::{PhysAddr, VirtAddr};
use crate::mm::config::{
    align_down, align_up, ENTRIES_PER_TABLE, IDENTITY_MAP_SIZE, MAX_DIRECTORIES, PAGE_SIZE,
};
use crate::mm::error::{MmError, MmResult};
use crate::mm::fault::{FaultResolution, PageFault, PageFaultErrorCode};
use crate::mm::pmm::{FrameAllocator, PhysFrame};

/// Fim do espaço de endereçamento de 32 bits
const ADDRESS_SPACE_END: u64 = 1 << 32;
const PAGE: u64 = PAGE_SIZE as u64;

/// Handle opaco para um page directory criado por este VMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectoryId {
    slot: u8,
    generation: u16,
}

struct PageDirectory {
    root: PhysFrame,
    /// Page table de cada PDE (espelho do que está no frame `root`)
    tables: [Option<PhysFrame>; ENTRIES_PER_TABLE],
}

struct DirectorySlot {
    generation: u16,
    directory: Option<PageDirectory>,
}

const EMPTY_SLOT: DirectorySlot = DirectorySlot {
    generation: 0,
    directory: None,
};

pub struct VirtualMemoryManager<M: FrameMemory, U: MmuOps> {
    memory: M,
    mmu: U,
    slots: [DirectorySlot; MAX_DIRECTORIES],
    kernel: Option<DirectoryId>,
    current: Option<DirectoryId>,
}

impl<M: FrameMemory, U: MmuOps> VirtualMemoryManager<M, U> {
    pub const fn new(memory: M, mmu: U) -> Self {
        Self {
            memory,
            mmu,
            slots: [EMPTY_SLOT; MAX_DIRECTORIES],
            kernel: None,
            current: None,
        }
    }

    // ------------------------------------------------------------------------
    // Inicialização
    // ------------------------------------------------------------------------

    /// Cria o directory do kernel, faz identity map dos primeiros 4 MiB e
    /// carrega o CR3. A paginação continua desligada até `enable_paging`.
    pub fn init<A: FrameAllocator>(&mut self, frames: &mut A) -> MmResult<DirectoryId> {
        crate::kdebug!("(VMM) init: criando directory do kernel");
        let id = self.create_directory(frames)?;

        if let Err(err) = self.identity_map_region(
            frames,
            Some(id),
            PhysAddr::new(0),
            IDENTITY_MAP_SIZE as u64,
            PageFlags::KERNEL_DATA,
        ) {
            crate::kerror!("(VMM) init: falha no identity map inicial");
            self.destroy_directory(frames, Some(id));
            return Err(err);
        }

        let root = self.root_address(id).ok_or(MmError::InitFailed)?;
        self.kernel = Some(id);
        self.current = Some(id);
        // SAFETY: o directory recém criado mapeia o kernel (primeiros 4 MiB)
        unsafe { self.mmu.load_root_table(root) };

        crate::kinfo!("(VMM) Directory do kernel em ", root.as_u32());
        Ok(id)
    }

    // ------------------------------------------------------------------------
    // Directories
    // ------------------------------------------------------------------------

    /// Aloca e zera um page directory novo.
    pub fn create_directory<A: FrameAllocator>(&mut self, frames: &mut A) -> MmResult<DirectoryId> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.directory.is_none())
            .ok_or(MmError::DirectoryLimit)?;

        let root = self.allocate_table_frame(frames)?;
        // SAFETY: frame acabou de sair do PMM
        unsafe { self.memory.zero_frame(root) };

        let entry = &mut self.slots[slot];
        entry.directory = Some(PageDirectory {
            root,
            tables: [None; ENTRIES_PER_TABLE],
        });
        crate::ktrace!("(VMM) directory criado em ", root.start_address().as_u32());
        Ok(DirectoryId {
            slot: slot as u8,
            generation: entry.generation,
        })
    }

    /// Devolve ao PMM todas as page tables e o próprio directory.
    ///
    /// As páginas mapeadas não são liberadas: pertencem a quem mapeou.
    /// `None`, ids velhos e o directory ativo são ignorados.
    pub fn destroy_directory<A: FrameAllocator>(&mut self, frames: &mut A, dir: Option<DirectoryId>) {
        let Some(id) = dir else { return };
        if self.current == Some(id) {
            crate::kwarn!("(VMM) destroy: recusando destruir o directory ativo");
            return;
        }

        let Some(slot) = self.slots.get_mut(usize::from(id.slot)) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(directory) = slot.directory.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);

        for table in directory.tables.iter().flatten() {
            frames.deallocate_frame(*table);
        }
        frames.deallocate_frame(directory.root);

        if self.kernel == Some(id) {
            self.kernel = None;
        }
        crate::ktrace!("(VMM) directory destruido em ", directory.root.start_address().as_u32());
    }

    /// Troca o directory ativo e recarrega o CR3. `None` não faz nada.
    ///
    /// # Safety
    /// O directory precisa mapear o código e a pilha em execução, senão a
    /// próxima instrução já gera page fault.
    pub unsafe fn switch_directory(&mut self, dir: Option<DirectoryId>) -> MmResult<()> {
        let Some(id) = dir else { return Ok(()) };
        let root = self.root_address(id).ok_or(MmError::InvalidDirectory)?;
        self.current = Some(id);
        self.mmu.load_root_table(root);
        Ok(())
    }

    pub fn current_directory(&self) -> Option<DirectoryId> {
        self.current
    }

    pub fn kernel_directory(&self) -> Option<DirectoryId> {
        self.kernel
    }

    /// Endereço físico do directory (valor que vai no CR3)
    pub fn root_address(&self, id: DirectoryId) -> Option<PhysAddr> {
        self.lookup(id).map(|d| d.root.start_address())
    }

    // ------------------------------------------------------------------------
    // Mapeamento
    // ------------------------------------------------------------------------

    /// Mapeia uma página de 4 KiB. Endereços são alinhados para baixo.
    ///
    /// A page table é criada sob demanda; a PDE fica presente + escrita (e
    /// usuário quando `flags` tem `USER`). Sempre invalida a TLB da página.
    pub fn map_page<A: FrameAllocator>(
        &mut self,
        frames: &mut A,
        dir: Option<DirectoryId>,
        virt: VirtAddr,
        phys: PhysAddr,
        flags: PageFlags,
    ) -> MmResult<()> {
        let id = self.resolve(dir)?;
        let user = flags.contains(PageFlags::USER);
        let table = self.ensure_table(frames, id, virt.directory_index(), user)?;

        // SAFETY: table pertence a este directory
        unsafe {
            self.memory.table_mut(table)[virt.table_index()] = PageTableEntry::new(phys, flags);
        }
        self.mmu.invalidate_page(virt.page_align_down());
        Ok(())
    }

    /// Remove o mapeamento de uma página. Sem page table, não faz nada.
    /// A page table não é liberada mesmo que fique vazia.
    pub fn unmap_page(&mut self, dir: Option<DirectoryId>, virt: VirtAddr) {
        let Ok(id) = self.resolve(dir) else { return };
        let Some(table) = self.lookup(id).and_then(|d| d.tables[virt.directory_index()]) else {
            return;
        };

        // SAFETY: table pertence a este directory
        unsafe { self.memory.table_mut(table)[virt.table_index()].set_unused() };
        self.mmu.invalidate_page(virt.page_align_down());
    }

    /// PTE de `virt`, se existir page table para ela
    pub fn entry(&self, dir: Option<DirectoryId>, virt: VirtAddr) -> Option<PageTableEntry> {
        let id = self.resolve(dir).ok()?;
        let table = self.lookup(id)?.tables[virt.directory_index()]?;
        // SAFETY: table pertence a este directory
        Some(unsafe { self.memory.table(table)[virt.table_index()] })
    }

    /// Traduz virtual -> físico (frame + offset). `None` se não mapeado.
    pub fn translate(&self, dir: Option<DirectoryId>, virt: VirtAddr) -> Option<PhysAddr> {
        let entry = self.entry(dir, virt)?;
        entry
            .is_present()
            .then(|| entry.address().add(virt.page_offset()))
    }

    /// Como `translate`, mas com 0 significando "não mapeado".
    pub fn get_physical(&self, dir: Option<DirectoryId>, virt: VirtAddr) -> u32 {
        self.translate(dir, virt).map_or(0, PhysAddr::as_u32)
    }

    /// Identity map de `[start, start + size)` arredondado para páginas.
    pub fn identity_map_region<A: FrameAllocator>(
        &mut self,
        frames: &mut A,
        dir: Option<DirectoryId>,
        start: PhysAddr,
        size: u64,
        flags: PageFlags,
    ) -> MmResult<()> {
        self.map_region(frames, dir, VirtAddr::new(start.as_u32()), start, size, flags)
    }

    /// Mapeia uma faixa contígua: virtual e físico andam juntos página a página.
    ///
    /// Em caso de falha as páginas mapeadas por esta chamada são removidas;
    /// page tables criadas no caminho ficam no directory.
    pub fn map_region<A: FrameAllocator>(
        &mut self,
        frames: &mut A,
        dir: Option<DirectoryId>,
        virt: VirtAddr,
        phys: PhysAddr,
        size: u64,
        flags: PageFlags,
    ) -> MmResult<()> {
        let id = self.resolve(dir)?;
        if size == 0 {
            return Ok(());
        }

        let virt_end = virt
            .as_u64()
            .checked_add(size)
            .filter(|&end| end <= ADDRESS_SPACE_END)
            .ok_or(MmError::InvalidSize)?;
        let first = align_down(virt.as_u64(), PAGE);
        let end = align_up(virt_end, PAGE);
        let phys_base = align_down(phys.as_u64(), PAGE);
        let pages = (end - first) / PAGE;
        if phys_base + pages * PAGE > ADDRESS_SPACE_END {
            return Err(MmError::InvalidSize);
        }

        for i in 0..pages {
            let page = VirtAddr::new((first + i * PAGE) as u32);
            let frame = PhysAddr::new((phys_base + i * PAGE) as u32);
            if let Err(err) = self.map_page(frames, Some(id), page, frame, flags) {
                crate::ktrace!("(VMM) map_region: falha em ", page.as_u32());
                for done in 0..i {
                    self.unmap_page(Some(id), VirtAddr::new((first + done * PAGE) as u32));
                }
                return Err(err);
            }
        }

        crate::ktrace!("(VMM) map_region: paginas=", pages);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Page faults e TLB
    // ------------------------------------------------------------------------

    /// Ponto de entrada do vetor 14: lê o CR2 e tenta resolver o fault.
    pub fn page_fault_handler(&mut self, error: PageFaultErrorCode) -> FaultResolution {
        let fault = PageFault {
            address: self.mmu.fault_address(),
            error,
        };
        self.resolve_fault(&fault)
    }

    /// Sem demand paging nem swap: todo fault fica sem resolução.
    pub fn resolve_fault(&mut self, fault: &PageFault) -> FaultResolution {
        crate::kdebug!("(VMM) page fault sem resolucao em ", fault.address.as_u32());
        FaultResolution::Unresolved
    }

    /// Recarrega o CR3 (descarta todas as entradas não globais da TLB).
    pub fn flush_tlb(&mut self) {
        self.mmu.flush_all();
    }

    /// Liga o bit PG do CR0.
    ///
    /// # Safety
    /// O CR3 precisa apontar para um directory que mapeia o código em execução.
    pub unsafe fn enable_paging(&mut self) -> MmResult<()> {
        if self.current.is_none() {
            return Err(MmError::NoActiveDirectory);
        }
        self.mmu.enable_paging();
        crate::kinfo!("(VMM) Paginacao habilitada");
        Ok(())
    }

    pub fn paging_enabled(&self) -> bool {
        self.mmu.paging_enabled()
    }

    pub fn mmu(&self) -> &U {
        &self.mmu
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    // ------------------------------------------------------------------------
    // Internos
    // ------------------------------------------------------------------------

    fn lookup(&self, id: DirectoryId) -> Option<&PageDirectory> {
        let slot = self.slots.get(usize::from(id.slot))?;
        if slot.generation != id.generation {
            return None;
        }
        slot.directory.as_ref()
    }

    fn lookup_mut(&mut self, id: DirectoryId) -> Option<&mut PageDirectory> {
        let slot = self.slots.get_mut(usize::from(id.slot))?;
        if slot.generation != id.generation {
            return None;
        }
        slot.directory.as_mut()
    }

    /// Frame para directory/table. Um frame fora da janela do `FrameMemory`
    /// volta para o PMM e a alocação falha.
    fn allocate_table_frame<A: FrameAllocator>(&mut self, frames: &mut A) -> MmResult<PhysFrame> {
        let frame = frames.allocate_frame().ok_or(MmError::OutOfMemory)?;
        if !self.memory.reaches(frame) {
            crate::ktrace!("(VMM) frame fora da janela de tables: ", frame.start_address().as_u32());
            frames.deallocate_frame(frame);
            return Err(MmError::OutOfMemory);
        }
        Ok(frame)
    }

    /// `None` vira o directory ativo; ids velhos viram erro.
    fn resolve(&self, dir: Option<DirectoryId>) -> MmResult<DirectoryId> {
        match dir {
            Some(id) if self.lookup(id).is_some() => Ok(id),
            Some(_) => Err(MmError::InvalidDirectory),
            None => self.current.ok_or(MmError::NoActiveDirectory),
        }
    }

    /// Page table da PDE `index`, criada (zerada) se ainda não existir.
    fn ensure_table<A: FrameAllocator>(
        &mut self,
        frames: &mut A,
        id: DirectoryId,
        index: usize,
        user: bool,
    ) -> MmResult<PhysFrame> {
        let directory = self.lookup(id).ok_or(MmError::InvalidDirectory)?;
        let root = directory.root;

        if let Some(table) = directory.tables[index] {
            if user {
                // SAFETY: root é o directory deste id
                let pde = unsafe { &mut self.memory.table_mut(root)[index] };
                if !pde.flags().contains(PageFlags::USER) {
                    *pde = PageTableEntry::new(table.start_address(), pde.flags() | PageFlags::USER);
                }
            }
            return Ok(table);
        }

        let table = self.allocate_table_frame(frames)?;
        let mut pde_flags = PageFlags::PRESENT | PageFlags::WRITABLE;
        if user {
            pde_flags |= PageFlags::USER;
        }

        // SAFETY: table acabou de sair do PMM; root é o directory deste id
        unsafe {
            self.memory.zero_frame(table);
            self.memory.table_mut(root)[index] = PageTableEntry::new(table.start_address(), pde_flags);
        }
        if let Some(directory) = self.lookup_mut(id) {
            directory.tables[index] = Some(table);
        }
        crate::ktrace!("(VMM) page table criada para PDE ", index);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::pmm::{BitmapFrameAllocator, MemoryRegion, MemoryRegionType};
    use crate::testing::{MockFrameMemory, RecordingMmu};
    use std::boxed::Box;

    type TestVmm = VirtualMemoryManager<MockFrameMemory, RecordingMmu>;

    const MIB: u64 = 0x10_0000;

    fn vmm() -> Box<TestVmm> {
        Box::new(VirtualMemoryManager::new(MockFrameMemory::new(), RecordingMmu::new()))
    }

    /// PMM com `frames` frames livres a partir de 1 MiB
    fn pmm(frames: u64) -> Box<BitmapFrameAllocator> {
        let mut pmm = Box::new(BitmapFrameAllocator::empty());
        let region = MemoryRegion::new(MIB, frames * PAGE, MemoryRegionType::Available);
        pmm.init_from_regions(core::iter::once(region));
        pmm
    }

    fn va(addr: u32) -> VirtAddr {
        VirtAddr::new(addr)
    }

    fn pa(addr: u32) -> PhysAddr {
        PhysAddr::new(addr)
    }

    #[test]
    fn init_identity_maps_first_four_mib_and_loads_root() {
        let mut vmm = vmm();
        let mut pmm = pmm(64);
        let free_before = pmm.free_frames();
        let kernel = vmm.init(&mut *pmm).expect("init");

        assert_eq!(vmm.kernel_directory(), Some(kernel));
        assert_eq!(vmm.current_directory(), Some(kernel));
        assert_eq!(vmm.mmu().root, vmm.root_address(kernel));
        assert!(!vmm.paging_enabled());

        for addr in (0..IDENTITY_MAP_SIZE as u32).step_by(0x7F0) {
            assert_eq!(vmm.translate(None, va(addr)), Some(pa(addr)), "addr {addr:#x}");
        }
        assert_eq!(vmm.translate(None, va(0x003F_FFFF)), Some(pa(0x003F_FFFF)));
        assert_eq!(vmm.translate(None, va(0x0040_0000)), None);
        // Directory + uma page table
        assert_eq!(pmm.free_frames(), free_before - 2);
    }

    #[test]
    fn map_then_translate_keeps_offset() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        vmm.map_page(&mut *pmm, Some(dir), va(0x4000_0000), pa(0x0020_0000), PageFlags::KERNEL_DATA)
            .unwrap();

        assert_eq!(vmm.translate(Some(dir), va(0x4000_0123)), Some(pa(0x0020_0123)));
        assert_eq!(vmm.get_physical(Some(dir), va(0x4000_1000)), 0);
        assert_eq!(vmm.mmu().invalidated, [va(0x4000_0000)]);
    }

    #[test]
    fn unaligned_addresses_are_rounded_down() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        vmm.map_page(&mut *pmm, Some(dir), va(0x0800_0FFF), pa(0x0030_0ABC), PageFlags::KERNEL_DATA)
            .unwrap();

        let entry = vmm.entry(Some(dir), va(0x0800_0000)).unwrap();
        assert_eq!(entry.address(), pa(0x0030_0000));
        assert_eq!(vmm.get_physical(Some(dir), va(0x0800_0010)), 0x0030_0010);
    }

    #[test]
    fn remap_overwrites_previous_entry() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        vmm.map_page(&mut *pmm, Some(dir), va(0x1000), pa(0x5000), PageFlags::KERNEL_DATA).unwrap();
        vmm.map_page(&mut *pmm, Some(dir), va(0x1000), pa(0x9000), PageFlags::PRESENT).unwrap();

        let entry = vmm.entry(Some(dir), va(0x1000)).unwrap();
        assert_eq!(entry.address(), pa(0x9000));
        assert_eq!(entry.flags(), PageFlags::PRESENT);
        assert_eq!(vmm.mmu().invalidated.len(), 2);
    }

    #[test]
    fn unmap_clears_entry_and_keeps_table() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        vmm.map_page(&mut *pmm, Some(dir), va(0x0040_2000), pa(0x0010_0000), PageFlags::KERNEL_DATA)
            .unwrap();
        let used = pmm.stats().used_frames;

        vmm.unmap_page(Some(dir), va(0x0040_2000));

        assert_eq!(vmm.translate(Some(dir), va(0x0040_2000)), None);
        assert_eq!(pmm.stats().used_frames, used);
        assert_eq!(vmm.mmu().invalidated.last(), Some(&va(0x0040_2000)));
    }

    #[test]
    fn unmap_without_table_is_a_no_op() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        vmm.unmap_page(Some(dir), va(0x8000_0000));
        assert!(vmm.mmu().invalidated.is_empty());
    }

    #[test]
    fn user_mapping_marks_directory_entry_user() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        let root = vmm.lookup(dir).unwrap().root;

        vmm.map_page(&mut *pmm, Some(dir), va(0x0000_1000), pa(0x1000), PageFlags::KERNEL_DATA).unwrap();
        let pde = unsafe { vmm.memory.table(root)[0] };
        assert_eq!(pde.flags(), PageFlags::PRESENT | PageFlags::WRITABLE);

        vmm.map_page(&mut *pmm, Some(dir), va(0x0000_2000), pa(0x2000), PageFlags::USER_DATA).unwrap();
        let pde = unsafe { vmm.memory.table(root)[0] };
        assert!(pde.flags().contains(PageFlags::USER));
    }

    #[test]
    fn out_of_frames_for_table_fails_without_mapping() {
        let mut vmm = vmm();
        let mut pmm = pmm(1);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        let result = vmm.map_page(&mut *pmm, Some(dir), va(0x1000), pa(0x1000), PageFlags::KERNEL_DATA);
        assert_eq!(result, Err(MmError::OutOfMemory));
        assert_eq!(vmm.translate(Some(dir), va(0x1000)), None);
    }

    #[test]
    fn failed_region_rolls_back_pages_of_this_call() {
        let mut vmm = vmm();
        // directory + uma única page table
        let mut pmm = pmm(2);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        let result = vmm.map_region(
            &mut *pmm,
            Some(dir),
            va(0x003F_E000),
            pa(0x0050_0000),
            0x4000,
            PageFlags::KERNEL_DATA,
        );

        assert_eq!(result, Err(MmError::OutOfMemory));
        assert_eq!(vmm.translate(Some(dir), va(0x003F_E000)), None);
        assert_eq!(vmm.translate(Some(dir), va(0x003F_F000)), None);
        assert_eq!(vmm.translate(Some(dir), va(0x0040_0000)), None);
    }

    #[test]
    fn region_covers_partial_pages() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        vmm.map_region(&mut *pmm, Some(dir), va(0x0000_1800), pa(0x0009_0800), 0x1000, PageFlags::KERNEL_DATA)
            .unwrap();

        assert_eq!(vmm.get_physical(Some(dir), va(0x0000_1000)), 0x0009_0000);
        assert_eq!(vmm.get_physical(Some(dir), va(0x0000_2000)), 0x0009_1000);
        assert_eq!(vmm.translate(Some(dir), va(0x0000_3000)), None);
    }

    #[test]
    fn region_past_end_of_address_space_is_rejected() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();

        let result = vmm.identity_map_region(
            &mut *pmm,
            Some(dir),
            pa(0xFFFF_F000),
            0x2000,
            PageFlags::KERNEL_DATA,
        );
        assert_eq!(result, Err(MmError::InvalidSize));
        assert_eq!(vmm.mmu().invalidated.len(), 0);
    }

    #[test]
    fn region_size_overflowing_u64_is_rejected() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        let free = pmm.free_frames();

        let result = vmm.map_region(
            &mut *pmm,
            Some(dir),
            va(0x1000),
            pa(0x1000),
            u64::MAX - 0x10,
            PageFlags::KERNEL_DATA,
        );

        assert_eq!(result, Err(MmError::InvalidSize));
        assert_eq!(pmm.free_frames(), free);
        assert!(vmm.mmu().invalidated.is_empty());
    }

    #[test]
    fn table_frame_outside_window_is_refused() {
        // Directory em 1 MiB dentro da janela, próxima table em 1 MiB + 4 KiB fora dela
        let mut vmm = Box::new(VirtualMemoryManager::new(
            MockFrameMemory::with_window(MIB + PAGE),
            RecordingMmu::new(),
        ));
        let mut pmm = pmm(2);
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        let free = pmm.free_frames();

        let result = vmm.map_page(&mut *pmm, Some(dir), va(0x1000), pa(0x1000), PageFlags::KERNEL_DATA);

        assert_eq!(result, Err(MmError::OutOfMemory));
        assert_eq!(pmm.free_frames(), free);
        assert!(pmm.is_page_free(pa((MIB + PAGE) as u32)));
        assert_eq!(vmm.translate(Some(dir), va(0x1000)), None);
    }

    #[test]
    fn directory_frame_outside_window_is_refused() {
        let mut vmm = Box::new(VirtualMemoryManager::new(MockFrameMemory::with_window(MIB), RecordingMmu::new()));
        let mut pmm = pmm(4);
        let free = pmm.free_frames();

        assert_eq!(vmm.create_directory(&mut *pmm), Err(MmError::OutOfMemory));
        assert_eq!(pmm.free_frames(), free);
        assert_eq!(vmm.memory().touched(), 0);
    }

    #[test]
    fn zero_size_region_is_a_no_op() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        let used = pmm.stats().used_frames;

        vmm.identity_map_region(&mut *pmm, Some(dir), pa(0x1000), 0, PageFlags::KERNEL_DATA).unwrap();
        assert_eq!(pmm.stats().used_frames, used);
    }

    #[test]
    fn destroy_returns_tables_and_directory_to_pmm() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let free_before = pmm.free_frames();
        let dir = vmm.create_directory(&mut *pmm).unwrap();
        vmm.map_page(&mut *pmm, Some(dir), va(0x0000_1000), pa(0x1000), PageFlags::KERNEL_DATA).unwrap();
        vmm.map_page(&mut *pmm, Some(dir), va(0x0080_0000), pa(0x2000), PageFlags::KERNEL_DATA).unwrap();
        assert_eq!(pmm.free_frames(), free_before - 3);

        vmm.destroy_directory(&mut *pmm, Some(dir));
        assert_eq!(pmm.free_frames(), free_before);
    }

    #[test]
    fn stale_directory_id_is_rejected() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let old = vmm.create_directory(&mut *pmm).unwrap();
        vmm.destroy_directory(&mut *pmm, Some(old));
        let new = vmm.create_directory(&mut *pmm).unwrap();
        assert_ne!(old, new);

        let result = vmm.map_page(&mut *pmm, Some(old), va(0x1000), pa(0x1000), PageFlags::KERNEL_DATA);
        assert_eq!(result, Err(MmError::InvalidDirectory));
        assert_eq!(unsafe { vmm.switch_directory(Some(old)) }, Err(MmError::InvalidDirectory));

        // Destruir de novo não devolve frames duas vezes
        let free = pmm.free_frames();
        vmm.destroy_directory(&mut *pmm, Some(old));
        assert_eq!(pmm.free_frames(), free);
    }

    #[test]
    fn active_directory_cannot_be_destroyed() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let kernel = vmm.init(&mut *pmm).unwrap();
        let free = pmm.free_frames();

        vmm.destroy_directory(&mut *pmm, Some(kernel));
        assert_eq!(pmm.free_frames(), free);
        assert_eq!(vmm.get_physical(None, va(0x2000)), 0x2000);
    }

    #[test]
    fn null_directory_operations_are_ignored() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        vmm.destroy_directory(&mut *pmm, None);
        assert_eq!(unsafe { vmm.switch_directory(None) }, Ok(()));
        assert_eq!(vmm.mmu().root, None);
    }

    #[test]
    fn operations_without_active_directory_fail() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        let result = vmm.map_page(&mut *pmm, None, va(0x1000), pa(0x1000), PageFlags::KERNEL_DATA);
        assert_eq!(result, Err(MmError::NoActiveDirectory));
        assert_eq!(vmm.translate(None, va(0x1000)), None);
        assert_eq!(unsafe { vmm.enable_paging() }, Err(MmError::NoActiveDirectory));
    }

    #[test]
    fn switch_directory_loads_root_and_changes_default() {
        let mut vmm = vmm();
        let mut pmm = pmm(32);
        vmm.init(&mut *pmm).unwrap();
        let other = vmm.create_directory(&mut *pmm).unwrap();
        vmm.identity_map_region(&mut *pmm, Some(other), pa(0), IDENTITY_MAP_SIZE as u64, PageFlags::KERNEL_DATA)
            .unwrap();
        vmm.map_page(&mut *pmm, Some(other), va(0x4000_0000), pa(0x0070_0000), PageFlags::KERNEL_DATA)
            .unwrap();

        unsafe { vmm.switch_directory(Some(other)) }.unwrap();

        assert_eq!(vmm.current_directory(), Some(other));
        assert_eq!(vmm.mmu().root, vmm.root_address(other));
        assert_eq!(vmm.get_physical(None, va(0x4000_0000)), 0x0070_0000);
    }

    #[test]
    fn directory_slots_are_bounded() {
        let mut vmm = vmm();
        let mut pmm = pmm(32);
        for _ in 0..MAX_DIRECTORIES {
            vmm.create_directory(&mut *pmm).unwrap();
        }
        assert_eq!(vmm.create_directory(&mut *pmm), Err(MmError::DirectoryLimit));
    }

    #[test]
    fn page_faults_are_reported_unresolved() {
        let mut vmm = vmm();
        vmm.mmu.fault = va(0xDEAD_B000);
        let resolution = vmm.page_fault_handler(PageFaultErrorCode::CAUSED_BY_WRITE);
        assert_eq!(resolution, FaultResolution::Unresolved);
    }

    #[test]
    fn enable_paging_and_flush_reach_the_mmu() {
        let mut vmm = vmm();
        let mut pmm = pmm(16);
        vmm.init(&mut *pmm).unwrap();

        unsafe { vmm.enable_paging() }.unwrap();
        vmm.flush_tlb();

        assert!(vmm.paging_enabled());
        assert_eq!(vmm.mmu().flushes, 1);
    }
}
