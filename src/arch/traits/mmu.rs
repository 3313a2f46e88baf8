//! Interface da MMU: registradores de controle e cache de tradução (TLB).

use crate::mm::addr::{PhysAddr, VirtAddr};

pub trait MmuOps {
    /// Endereço linear que causou o último page fault (CR2).
    fn fault_address(&self) -> VirtAddr;

    /// Endereço físico do page directory ativo (CR3).
    fn root_table(&self) -> PhysAddr;

    /// Carrega um novo page directory (escrita em CR3, descarta a TLB inteira).
    ///
    /// # Safety
    /// `root` deve apontar para um page directory válido que mantenha o código
    /// em execução mapeado.
    unsafe fn load_root_table(&mut self, root: PhysAddr);

    /// Invalida a tradução de uma única página (INVLPG).
    fn invalidate_page(&mut self, page: VirtAddr);

    /// Descarta toda a TLB (recarrega CR3 com o mesmo valor).
    fn flush_all(&mut self);

    /// Liga a paginação (CR0.PG).
    ///
    /// # Safety
    /// CR3 já deve conter um directory que identity-mapeia o código atual.
    unsafe fn enable_paging(&mut self);

    /// Verifica se CR0.PG está ligado.
    fn paging_enabled(&self) -> bool;
}
