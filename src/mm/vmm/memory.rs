//! Acesso do VMM aos frames que guardam directories e tables.
//!
//! As entradas só carregam endereços físicos; para escrever nelas o VMM
//! precisa de uma janela virtual sobre o frame. No kernel essa janela é o
//! identity map dos primeiros MiB; nos testes é um mapa em memória.

use super::paging::PageTable;
use crate::mm::config::IDENTITY_MAP_SIZE;
use crate::mm::pmm::PhysFrame;
use core::ptr::NonNull;
use volatile::VolatilePtr;

pub trait FrameMemory {
    /// # Safety
    /// `frame` deve conter um directory/table deste VMM e ninguém mais pode
    /// estar escrevendo nele.
    unsafe fn table(&self, frame: PhysFrame) -> &PageTable;

    /// # Safety
    /// Mesmo contrato de `table`, com acesso exclusivo.
    unsafe fn table_mut(&mut self, frame: PhysFrame) -> &mut PageTable;

    /// Zera um frame recém alocado antes de virar directory/table.
    ///
    /// # Safety
    /// `frame` precisa ter vindo do PMM agora e não estar em uso.
    unsafe fn zero_frame(&mut self, frame: PhysFrame);

    /// Se o VMM consegue enxergar `frame`. Frames fora da janela nunca
    /// viram directory nem table.
    fn reaches(&self, frame: PhysFrame) -> bool;
}

/// Frames acessados no próprio endereço físico (identity map ou paginação desligada).
///
/// Só frames abaixo de `window_end` são aceitos; começa nos 4 MiB do
/// identity map inicial.
pub struct IdentityFrameMemory {
    window_end: u64,
}

impl IdentityFrameMemory {
    /// # Safety
    /// `[0, IDENTITY_MAP_SIZE)` precisa estar identity-mapped (ou a
    /// paginação ainda desligada) sempre que o VMM tocar em um frame.
    pub const unsafe fn new() -> Self {
        Self {
            window_end: IDENTITY_MAP_SIZE as u64,
        }
    }

    /// Fim (exclusivo) da faixa física identity-mapped
    pub fn window_end(&self) -> u64 {
        self.window_end
    }

    /// Amplia a janela depois de um identity map maior.
    ///
    /// # Safety
    /// `[0, end)` precisa estar identity-mapped no directory ativo (ou a
    /// paginação desligada) em todo acesso futuro do VMM.
    pub unsafe fn set_window_end(&mut self, end: u64) {
        self.window_end = end;
    }

    fn table_ptr(frame: PhysFrame) -> *mut PageTable {
        frame.start_address().as_u32() as usize as *mut PageTable
    }
}

impl FrameMemory for IdentityFrameMemory {
    unsafe fn table(&self, frame: PhysFrame) -> &PageTable {
        &*Self::table_ptr(frame)
    }

    unsafe fn table_mut(&mut self, frame: PhysFrame) -> &mut PageTable {
        &mut *Self::table_ptr(frame)
    }

    unsafe fn zero_frame(&mut self, frame: PhysFrame) {
        let base = Self::table_ptr(frame) as *mut u32;
        // Escritas voláteis: o frame pode ter lixo do firmware e o
        // compilador não pode descartar a limpeza
        for i in 0..frame.size() / core::mem::size_of::<u32>() {
            VolatilePtr::new(NonNull::new_unchecked(base.add(i))).write(0);
        }
    }

    fn reaches(&self, frame: PhysFrame) -> bool {
        frame.start_address().as_u64() + frame.size() as u64 <= self.window_end
    }
}
