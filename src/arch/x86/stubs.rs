//! Stubs de entrada das 32 exceções (assembly i386).
//!
//! Cada stub deixa a pilha no formato de `ExceptionRegisters`:
//! empilha um error code falso (vetores sem código) e o número do vetor,
//! e salta para o caminho comum, que salva GPRs + DS, carrega os
//! segmentos de dados do kernel e chama `exception_entry` com o ponteiro
//! para o frame. Na volta, restaura tudo e descarta vetor + error code
//! antes do `iretd`.

use crate::arch::KERNEL_DATA_SELECTOR;
use crate::interrupts::exceptions::{self, ExceptionRegisters, EXCEPTION_VECTORS};
use core::arch::global_asm;

global_asm!(
    r#"
.macro ISR_NOERR num
.global anvil_isr\num
anvil_isr\num:
    push 0
    push \num
    jmp anvil_exception_common
.endm

.macro ISR_ERR num
.global anvil_isr\num
anvil_isr\num:
    push \num
    jmp anvil_exception_common
.endm

.section .text

ISR_NOERR 0
ISR_NOERR 1
ISR_NOERR 2
ISR_NOERR 3
ISR_NOERR 4
ISR_NOERR 5
ISR_NOERR 6
ISR_NOERR 7
ISR_ERR   8
ISR_NOERR 9
ISR_ERR   10
ISR_ERR   11
ISR_ERR   12
ISR_ERR   13
ISR_ERR   14
ISR_NOERR 15
ISR_NOERR 16
ISR_ERR   17
ISR_NOERR 18
ISR_NOERR 19
ISR_NOERR 20
ISR_ERR   21
ISR_NOERR 22
ISR_NOERR 23
ISR_NOERR 24
ISR_NOERR 25
ISR_NOERR 26
ISR_NOERR 27
ISR_NOERR 28
ISR_ERR   29
ISR_ERR   30
ISR_NOERR 31

anvil_exception_common:
    pushad
    mov ax, ds
    push eax

    mov ax, {data_sel}
    mov ds, ax
    mov es, ax
    mov fs, ax
    mov gs, ax

    push esp
    call {entry}
    add esp, 4

    pop eax
    mov ds, ax
    mov es, ax
    mov fs, ax
    mov gs, ax
    popad

    add esp, 8
    iretd

.section .rodata
.balign 4
.global anvil_exception_stub_table
anvil_exception_stub_table:
.irp n, 0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26,27,28,29,30,31
    .long anvil_isr\n
.endr

.section .text
"#,
    data_sel = const KERNEL_DATA_SELECTOR,
    entry = sym exception_entry,
);

extern "C" {
    static anvil_exception_stub_table: [u32; EXCEPTION_VECTORS];
}

extern "C" fn exception_entry(regs: &ExceptionRegisters) {
    exceptions::handle(regs);
}

/// Endereços dos 32 stubs, na ordem dos vetores.
pub fn exception_stubs() -> [u32; EXCEPTION_VECTORS] {
    // SAFETY: tabela só de leitura montada pelo assembler acima
    unsafe { anvil_exception_stub_table }
}
