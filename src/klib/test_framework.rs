//! Framework de testes do kernel
//!
//! Roda dentro do kernel (feature `self_test`), sem `std` e sem harness.
//! Cada caso recebe um contexto mutável com os subsistemas sob teste.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste sobre o contexto `C`
pub struct TestCase<C> {
    pub name: &'static str,
    pub func: fn(&mut C) -> TestResult,
}

impl<C> TestCase<C> {
    pub const fn new(name: &'static str, func: fn(&mut C) -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Totais de uma suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteSummary {
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Executa suite de testes
pub fn run_test_suite<C>(name: &str, tests: &[TestCase<C>], ctx: &mut C) -> SuiteSummary {
    crate::kinfo!("=== Executando suite: ");
    crate::klog!(name);
    crate::klog!("\r\n");

    let mut summary = SuiteSummary::default();

    for test in tests {
        match (test.func)(ctx) {
            TestResult::Passed => {
                crate::kok!(test.name);
                summary.passed += 1;
            }
            TestResult::Failed => {
                crate::kfail!(test.name);
                summary.failed += 1;
            }
            TestResult::Skipped => {
                crate::kwarn!(test.name);
                summary.skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", summary.passed);
    if summary.failed > 0 {
        crate::kerror!("Resultados: failed=", summary.failed);
    }
    summary
}
