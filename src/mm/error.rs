//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas em MM.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem memória física disponível (OOM)
    OutOfMemory,
    /// Região não mapeada
    NotMapped,
    /// Endereço inválido (fora do range gerenciado)
    InvalidAddress,
    /// Endereço não alinhado a página
    NotAligned,
    /// Tamanho inválido (zero ou estoura o espaço de 4 GiB)
    InvalidSize,
    /// Handle de directory destruído ou nunca criado
    InvalidDirectory,
    /// Nenhum directory carregado (VMM não inicializado)
    NoActiveDirectory,
    /// Todos os slots de directory estão ocupados
    DirectoryLimit,
    /// Falha na inicialização
    InitFailed,
    /// Heap usado antes de `init`
    HeapNotInitialized,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem frames físicos disponíveis",
            Self::NotMapped => "Região não mapeada",
            Self::InvalidAddress => "Endereço inválido",
            Self::NotAligned => "Endereço não alinhado a página",
            Self::InvalidSize => "Tamanho inválido",
            Self::InvalidDirectory => "Page directory inválido ou destruído",
            Self::NoActiveDirectory => "Nenhum page directory ativo",
            Self::DirectoryLimit => "Limite de page directories atingido",
            Self::InitFailed => "Falha na inicialização",
            Self::HeapNotInitialized => "Heap não inicializado",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
