//! Testes do VMM (Virtual Memory Manager)

use super::{MemoryTestContext, SCRATCH_VIRT};
use crate::arch::traits::MmuOps;
use crate::klib::test_framework::{TestCase, TestResult};
use crate::mm::addr::VirtAddr;
use crate::mm::pmm::FrameAllocator;
use crate::mm::vmm::{FrameMemory, PageFlags};

type Ctx<'a, M, U> = MemoryTestContext<'a, M, U>;

pub fn tests<'a, M: FrameMemory, U: MmuOps>() -> [TestCase<Ctx<'a, M, U>>; 3] {
    [
        TestCase::new("vmm_identity_window", identity_window::<M, U>),
        TestCase::new("vmm_map_translate_unmap", map_translate_unmap::<M, U>),
        TestCase::new("vmm_directory_lifecycle", directory_lifecycle::<M, U>),
    ]
}

/// O directory ativo traduz os primeiros 4 MiB para eles mesmos
fn identity_window<M: FrameMemory, U: MmuOps>(ctx: &mut Ctx<'_, M, U>) -> TestResult {
    if ctx.vmm.kernel_directory().is_none() {
        return TestResult::Skipped;
    }
    for addr in [0x1000u32, 0x0010_0123, 0x003F_F000] {
        if ctx.vmm.get_physical(None, VirtAddr::new(addr)) != addr {
            crate::kerror!("(VMM) identity map quebrado em ", addr);
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}

fn map_translate_unmap<M: FrameMemory, U: MmuOps>(ctx: &mut Ctx<'_, M, U>) -> TestResult {
    if ctx.vmm.current_directory().is_none() {
        return TestResult::Skipped;
    }
    let Some(frame) = ctx.frames.allocate_frame() else {
        return TestResult::Failed;
    };
    let page = VirtAddr::new(SCRATCH_VIRT);
    let phys = frame.start_address();

    let mut result = TestResult::Failed;
    if ctx
        .vmm
        .map_page(&mut *ctx.frames, None, page, phys, PageFlags::KERNEL_DATA)
        .is_ok()
    {
        let mapped = ctx.vmm.translate(None, page.add(0x10)) == Some(phys.add(0x10));
        ctx.vmm.unmap_page(None, page);
        let unmapped = ctx.vmm.translate(None, page).is_none();
        if mapped && unmapped {
            result = TestResult::Passed;
        }
    }

    ctx.frames.deallocate_frame(frame);
    result
}

/// Criar + mapear + destruir devolve todos os frames do directory
fn directory_lifecycle<M: FrameMemory, U: MmuOps>(ctx: &mut Ctx<'_, M, U>) -> TestResult {
    let free = ctx.frames.free_frames();

    let Ok(dir) = ctx.vmm.create_directory(&mut *ctx.frames) else {
        return TestResult::Failed;
    };
    let mapped = ctx
        .vmm
        .map_page(
            &mut *ctx.frames,
            Some(dir),
            VirtAddr::new(SCRATCH_VIRT),
            crate::mm::addr::PhysAddr::new(0x1000),
            PageFlags::KERNEL_DATA,
        )
        .is_ok();
    ctx.vmm.destroy_directory(&mut *ctx.frames, Some(dir));

    if mapped && ctx.frames.free_frames() == free {
        TestResult::Passed
    } else {
        TestResult::Failed
    }
}
