use crate::mm::config::PAGE_SIZE;

/// Fotografia dos contadores do PMM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PmmStats {
    pub total_frames: usize,
    pub used_frames: usize,
    pub free_frames: usize,
    pub failed_allocs: usize,
}

impl PmmStats {
    const KB_PER_FRAME: usize = PAGE_SIZE / 1024;

    pub const fn total_kb(&self) -> usize {
        self.total_frames * Self::KB_PER_FRAME
    }

    pub const fn used_kb(&self) -> usize {
        self.used_frames * Self::KB_PER_FRAME
    }

    pub const fn free_kb(&self) -> usize {
        self.free_frames * Self::KB_PER_FRAME
    }
}
