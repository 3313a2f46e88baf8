//! Dublês de hardware para os testes de host.
//!
//! Registram tudo o que o código do núcleo faria com portas, CR3/CR2 e
//! frames físicos, para que os testes comparem a sequência exata.

use crate::arch::traits::{MmuOps, PortIo};
use crate::mm::addr::{PhysAddr, VirtAddr};
use crate::mm::pmm::PhysFrame;
use crate::mm::vmm::memory::FrameMemory;
use crate::mm::vmm::paging::PageTable;
use std::boxed::Box;
use std::collections::HashMap;
use std::vec::Vec;

/// Barramento de I/O que grava toda escrita e devolve o último valor
/// escrito em cada porta.
#[derive(Default)]
pub struct RecordingPorts {
    pub writes: Vec<(u16, u8)>,
    values: HashMap<u16, u8>,
}

impl RecordingPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valor lido da porta sem registrar escrita (ex: status da UART)
    pub fn preset(&mut self, port: u16, value: u8) {
        self.values.insert(port, value);
    }
}

impl PortIo for RecordingPorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        self.values.get(&port).copied().unwrap_or(0)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        self.writes.push((port, value));
        self.values.insert(port, value);
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        u16::from(self.read_u8(port))
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        self.write_u8(port, value as u8);
    }

    fn read_u32(&mut self, port: u16) -> u32 {
        u32::from(self.read_u8(port))
    }

    fn write_u32(&mut self, port: u16, value: u32) {
        self.write_u8(port, value as u8);
    }
}

/// MMU falsa: guarda CR3, invalidações e o bit de paginação.
#[derive(Default)]
pub struct RecordingMmu {
    pub root: Option<PhysAddr>,
    pub invalidated: Vec<VirtAddr>,
    pub flushes: usize,
    pub paging: bool,
    pub fault: VirtAddr,
}

impl RecordingMmu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MmuOps for RecordingMmu {
    fn fault_address(&self) -> VirtAddr {
        self.fault
    }

    fn root_table(&self) -> PhysAddr {
        self.root.unwrap_or_default()
    }

    unsafe fn load_root_table(&mut self, root: PhysAddr) {
        self.root = Some(root);
    }

    fn invalidate_page(&mut self, addr: VirtAddr) {
        self.invalidated.push(addr);
    }

    fn flush_all(&mut self) {
        self.flushes += 1;
    }

    unsafe fn enable_paging(&mut self) {
        self.paging = true;
    }

    fn paging_enabled(&self) -> bool {
        self.paging
    }
}

/// Frames físicos simulados: cada frame tocado vira uma `PageTable` no heap.
#[derive(Default)]
pub struct MockFrameMemory {
    frames: HashMap<u32, Box<PageTable>>,
    /// `None` = todo frame alcançável
    window_end: Option<u64>,
}

static EMPTY_TABLE: PageTable = PageTable::new();

impl MockFrameMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Só frames que terminam até `end` são alcançáveis
    pub fn with_window(end: u64) -> Self {
        Self {
            window_end: Some(end),
            ..Self::default()
        }
    }

    /// Quantos frames já foram escritos/zerados
    pub fn touched(&self) -> usize {
        self.frames.len()
    }
}

impl FrameMemory for MockFrameMemory {
    unsafe fn table(&self, frame: PhysFrame) -> &PageTable {
        self.frames
            .get(&frame.start_address().as_u32())
            .map_or(&EMPTY_TABLE, |table| &**table)
    }

    unsafe fn table_mut(&mut self, frame: PhysFrame) -> &mut PageTable {
        self.frames
            .entry(frame.start_address().as_u32())
            .or_insert_with(|| Box::new(PageTable::new()))
    }

    unsafe fn zero_frame(&mut self, frame: PhysFrame) {
        self.table_mut(frame).zero();
    }

    fn reaches(&self, frame: PhysFrame) -> bool {
        self.window_end
            .map_or(true, |end| frame.start_address().as_u64() + frame.size() as u64 <= end)
    }
}
