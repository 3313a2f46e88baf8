//! Sequência de boot do núcleo.
//!
//! Chamada pelo trampolim em assembly (`_start`, fora deste crate) já em
//! modo protegido, com pilha montada e interrupções desligadas.
//!
//! # Ordem
//! 1. Serial (logs)
//! 2. IDT vazia + 32 exceções + PIC remapeado e mascarado
//! 3. PMM a partir do Multiboot, imagem do kernel reservada
//! 4. VMM: directory do kernel, identity map, paginação ligada
//! 5. Heap
//! 6. Self tests (feature `self_test`)
//!
//! Quem chama instala os gates de IRQ, desmascara as linhas e faz `sti`.

use crate::core::multiboot::{MultibootInfo, MULTIBOOT_BOOTLOADER_MAGIC};
use crate::drivers::serial;
use crate::mm::MmError;
use core::fmt;
use core::ops::Range;

/// Falhas que impedem o kernel de continuar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// EAX não tinha a assinatura Multiboot
    BadMagic(u32),
    /// Nem `MEM` nem `MMAP` nas flags do Multiboot
    NoMemoryInfo,
    Memory(MmError),
}

impl From<MmError> for BootError {
    fn from(err: MmError) -> Self {
        Self::Memory(err)
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic(magic) => write!(f, "bad multiboot magic {magic:#010X}"),
            Self::NoMemoryInfo => f.write_str("bootloader gave no memory information"),
            Self::Memory(err) => write!(f, "memory init failed: {err}"),
        }
    }
}

/// Inicializa interrupções e memória.
///
/// # Safety
/// Chamar uma única vez, com interrupções desligadas. `info` é o bloco
/// Multiboot recebido em EBX e `kernel_image` a faixa física da imagem.
pub unsafe fn kernel_init(
    magic: u32,
    info: &MultibootInfo,
    kernel_image: Range<u64>,
) -> Result<(), BootError> {
    serial::init();
    crate::kinfo!("Anvil Kernel - Iniciando");

    if magic != MULTIBOOT_BOOTLOADER_MAGIC {
        crate::kerror!("(Boot) Assinatura Multiboot invalida=", magic);
        return Err(BootError::BadMagic(magic));
    }

    crate::kinfo!("(Boot) Inicializando interrupcoes (IDT/Excecoes/PIC)...");
    crate::interrupts::init();

    let Some(memory) = info.boot_memory() else {
        crate::kerror!("(Boot) Multiboot sem informacao de memoria, flags=", info.flags);
        return Err(BootError::NoMemoryInfo);
    };

    crate::kinfo!("(Boot) Inicializando memoria (PMM/VMM/Heap)...");
    crate::mm::init(memory, kernel_image)?;

    #[cfg(feature = "self_test")]
    {
        let summary = crate::mm::test::run_memory_tests();
        if !summary.all_passed() {
            crate::kwarn!("(Boot) Self tests com falhas=", summary.failed);
        }
    }

    crate::kok!("(Boot) Nucleo pronto");
    Ok(())
}
