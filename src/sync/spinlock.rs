//! Spinlock - bloqueio com busy-wait que mascara interrupções

use crate::arch::traits::CpuOps;
use crate::arch::Cpu;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// Enquanto o guard vive as interrupções ficam desabilitadas; o estado
/// anterior de EFLAGS.IF é restaurado no drop. Toda mutação de PMM, VMM,
/// IDT e PIC passa por aqui.
///
/// # Ordem de Lock
///
/// `VMM` antes de `FRAME_ALLOCATOR`. Handlers de exceção só usam `try_lock`.
pub struct Spinlock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        // Desabilitar interrupções antes de adquirir
        let interrupts_enabled = Cpu::are_interrupts_enabled();
        Cpu::disable_interrupts();

        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }

        SpinlockGuard {
            lock: self,
            interrupts_were_enabled: interrupts_enabled,
        }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        let interrupts_enabled = Cpu::are_interrupts_enabled();
        Cpu::disable_interrupts();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinlockGuard {
                lock: self,
                interrupts_were_enabled: interrupts_enabled,
            })
        } else {
            // Não conseguiu, restaurar interrupções
            if interrupts_enabled {
                Cpu::enable_interrupts();
            }
            None
        }
    }

    /// Verifica se o lock está tomado (apenas diagnóstico)
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
    interrupts_were_enabled: bool,
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);

        // Restaurar interrupções se estavam habilitadas
        if self.interrupts_were_enabled {
            Cpu::enable_interrupts();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_masks_interrupts_and_restores_them() {
        Cpu::enable_interrupts();
        let lock = Spinlock::new(0u32);
        {
            let mut guard = lock.lock();
            *guard += 1;
            assert!(!Cpu::are_interrupts_enabled());
            assert!(lock.is_locked());
        }
        assert!(Cpu::are_interrupts_enabled());
        assert!(!lock.is_locked());
        assert_eq!(*lock.lock(), 1);
    }

    #[test]
    fn nested_lock_keeps_interrupts_masked_until_outer_drop() {
        Cpu::enable_interrupts();
        let outer = Spinlock::new(());
        let inner = Spinlock::new(());
        let g1 = outer.lock();
        {
            let _g2 = inner.lock();
        }
        assert!(!Cpu::are_interrupts_enabled());
        drop(g1);
        assert!(Cpu::are_interrupts_enabled());
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = Spinlock::new(5u8);
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert_eq!(lock.try_lock().map(|g| *g), Some(5));
    }
}
