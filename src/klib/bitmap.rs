//! Bitmap genérico de tamanho fixo

/// Bitmap com armazenamento próprio de `WORDS` palavras de 64 bits.
///
/// Bits fora da capacidade são sempre reportados como setados, assim quem
/// usa o bitmap como mapa de ocupação trata esses índices como "em uso".
pub struct Bitmap<const WORDS: usize> {
    data: [u64; WORDS],
}

impl<const WORDS: usize> Bitmap<WORDS> {
    /// Capacidade em bits
    pub const CAPACITY: usize = WORDS * 64;

    /// Cria bitmap com todos os bits limpos
    pub const fn new() -> Self {
        Self { data: [0; WORDS] }
    }

    /// Preenche todas as palavras com 1 (`true`) ou 0 (`false`)
    pub fn fill(&mut self, value: bool) {
        let word = if value { u64::MAX } else { 0 };
        self.data.iter_mut().for_each(|w| *w = word);
    }

    /// Define um bit. Retorna `true` se ele estava limpo.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        let (word, mask) = Self::locate(index);
        let was_clear = self.data[word] & mask == 0;
        self.data[word] |= mask;
        was_clear
    }

    /// Limpa um bit. Retorna `true` se ele estava setado.
    pub fn clear(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        let (word, mask) = Self::locate(index);
        let was_set = self.data[word] & mask != 0;
        self.data[word] &= !mask;
        was_set
    }

    /// Testa um bit
    pub fn test(&self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return true;
        }
        let (word, mask) = Self::locate(index);
        self.data[word] & mask != 0
    }

    /// Encontra o primeiro bit livre (0) abaixo de `limit`, começando na
    /// palavra `start_word`.
    pub fn find_first_zero(&self, start_word: usize, limit: usize) -> Option<usize> {
        let limit = limit.min(Self::CAPACITY);
        let end_word = limit.div_ceil(64);

        for (i, &word) in self.data[..end_word].iter().enumerate().skip(start_word) {
            if word != u64::MAX {
                let index = i * 64 + word.trailing_ones() as usize;
                // Bits acima do primeiro zero desta palavra são >= index
                return (index < limit).then_some(index);
            }
        }
        None
    }

    /// Conta bits setados em `[0, limit)`
    pub fn count_ones(&self, limit: usize) -> usize {
        let limit = limit.min(Self::CAPACITY);
        let full_words = limit / 64;
        let mut count: usize = self.data[..full_words]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum();

        let rest = limit % 64;
        if rest != 0 {
            let mask = (1u64 << rest) - 1;
            count += (self.data[full_words] & mask).count_ones() as usize;
        }
        count
    }

    #[inline]
    const fn locate(index: usize) -> (usize, u64) {
        (index / 64, 1 << (index % 64))
    }
}

impl<const WORDS: usize> Default for Bitmap<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clear_report_previous_state() {
        let mut bm = Bitmap::<2>::new();
        assert!(bm.set(5));
        assert!(!bm.set(5));
        assert!(bm.test(5));
        assert!(bm.clear(5));
        assert!(!bm.clear(5));
        assert!(!bm.test(5));
    }

    #[test]
    fn out_of_capacity_reads_as_used() {
        let mut bm = Bitmap::<1>::new();
        assert!(bm.test(64));
        assert!(!bm.set(64));
        assert!(!bm.clear(1000));
    }

    #[test]
    fn find_first_zero_respects_start_and_limit() {
        let mut bm = Bitmap::<2>::new();
        bm.fill(true);
        bm.clear(70);
        bm.clear(3);
        assert_eq!(bm.find_first_zero(0, 128), Some(3));
        assert_eq!(bm.find_first_zero(1, 128), Some(70));
        assert_eq!(bm.find_first_zero(1, 70), None);
        assert_eq!(bm.find_first_zero(0, 3), None);
    }

    #[test]
    fn count_ones_partial_word() {
        let mut bm = Bitmap::<2>::new();
        for i in [0, 1, 63, 64, 100] {
            bm.set(i);
        }
        assert_eq!(bm.count_ones(128), 5);
        assert_eq!(bm.count_ones(64), 3);
        assert_eq!(bm.count_ones(65), 4);
        assert_eq!(bm.count_ones(2), 2);
    }
}
