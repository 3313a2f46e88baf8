//! # Self tests de memória
//!
//! Rodam dentro do kernel (feature `self_test`) logo depois de a paginação
//! ser ligada, sobre o PMM e o VMM reais:
//! - `pmm_test.rs` - alocação, double free, contadores
//! - `vmm_test.rs` - map/translate/unmap, identity map, directories
//!
//! As suites recebem o contexto por parâmetro; os testes de host rodam as
//! mesmas suites sobre dublês de hardware.

pub mod vmm_test;

use crate::arch::traits::MmuOps;
use crate::klib::test_framework::{run_test_suite, SuiteSummary};
use crate::mm::pmm::{BitmapFrameAllocator, FRAME_ALLOCATOR};
use crate::mm::vmm::{FrameMemory, VirtualMemoryManager, VMM};

/// Endereço virtual livre usado pelos testes de mapeamento
pub const SCRATCH_VIRT: u32 = 0xBFF0_0000;

/// Subsistemas sob teste
pub struct MemoryTestContext<'a, M: FrameMemory, U: MmuOps> {
    pub frames: &'a mut BitmapFrameAllocator,
    pub vmm: &'a mut VirtualMemoryManager<M, U>,
}

/// Roda as suites de PMM e VMM sobre o contexto dado.
pub fn run_suites<M: FrameMemory, U: MmuOps>(ctx: &mut MemoryTestContext<'_, M, U>) -> SuiteSummary {
    let pmm = run_test_suite("PMM", &pmm_test::tests::<M, U>(), ctx);
    let vmm = run_test_suite("VMM", &vmm_test::tests::<M, U>(), ctx);
    SuiteSummary {
        passed: pmm.passed + vmm.passed,
        failed: pmm.failed + vmm.failed,
        skipped: pmm.skipped + vmm.skipped,
    }
}

/// Self test sobre os globais (locks na ordem VMM -> FRAME_ALLOCATOR).
pub fn run_memory_tests() -> SuiteSummary {
    let mut vmm = VMM.lock();
    let mut frames = FRAME_ALLOCATOR.lock();
    let mut ctx = MemoryTestContext {
        frames: &mut *frames,
        vmm: &mut *vmm,
    };
    run_suites(&mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::config::LOW_MEMORY_LIMIT;
    use crate::mm::pmm::{MemoryRegion, MemoryRegionType};
    use crate::testing::{MockFrameMemory, RecordingMmu};
    use std::boxed::Box;

    #[test]
    fn suites_pass_on_fresh_memory_manager() {
        let mut frames = Box::new(BitmapFrameAllocator::empty());
        let region = MemoryRegion::new(LOW_MEMORY_LIMIT, 256 * 4096, MemoryRegionType::Available);
        frames.init_from_regions(core::iter::once(region));
        let mut vmm = Box::new(VirtualMemoryManager::new(MockFrameMemory::new(), RecordingMmu::new()));
        vmm.init(&mut *frames).unwrap();

        let mut ctx = MemoryTestContext {
            frames: &mut *frames,
            vmm: &mut *vmm,
        };
        let summary = run_suites(&mut ctx);

        assert!(summary.all_passed());
        assert_eq!(summary.skipped, 0);
        assert!(summary.passed >= 6);
    }

    #[test]
    fn vmm_suite_skips_without_kernel_directory() {
        let mut frames = Box::new(BitmapFrameAllocator::empty());
        let region = MemoryRegion::new(LOW_MEMORY_LIMIT, 64 * 4096, MemoryRegionType::Available);
        frames.init_from_regions(core::iter::once(region));
        let mut vmm = Box::new(VirtualMemoryManager::new(MockFrameMemory::new(), RecordingMmu::new()));

        let mut ctx = MemoryTestContext {
            frames: &mut *frames,
            vmm: &mut *vmm,
        };
        let summary = run_suites(&mut ctx);

        assert!(summary.all_passed());
        assert!(summary.skipped > 0);
    }
}
