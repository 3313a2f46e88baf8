//! # Synchronization Primitives
//!
//! O núcleo roda em uma única CPU; "concorrência" aqui é reentrância por
//! interrupção. Por isso o único lock é um spinlock que mascara IRQs.
//!
//! ## Regras
//!
//! - **Spinlock**: toda estrutura global (IDT, PIC, PMM, VMM, heap)
//! - **Ordem de Lock**: VMM → FRAME_ALLOCATOR, sempre nessa ordem

pub mod spinlock;

pub use spinlock::{Spinlock, SpinlockGuard};
