/// Bit-packed boolean storage, used both for boolean columns and for row masks.
///
/// Bits are little-endian within each `u64` word: bit 0 is the LSB of word 0. Bits past `len` in
/// the last word are always zero, so word-level popcounts stay exact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

fn word_count(bits: usize) -> usize {
    (bits + 63) / 64
}

fn tail_mask(len: usize) -> u64 {
    match len % 64 {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

impl BitVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(word_count(bits)),
            len: 0,
            ones: 0,
        }
    }

    /// A vector of `len` bits, all set to `value`.
    pub fn filled(len: usize, value: bool) -> Self {
        if len == 0 {
            return Self::new();
        }
        let fill = if value { u64::MAX } else { 0 };
        let mut words = vec![fill; word_count(len)];
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(len);
        }
        Self {
            words,
            len,
            ones: if value { len } else { 0 },
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }
        if value {
            self.words[self.len / 64] |= 1u64 << bit;
            self.ones += 1;
        }
        self.len += 1;
    }

    /// Panics if `index >= len`, like slice indexing.
    pub fn get(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "bit {index} out of bounds for length {}",
            self.len
        );
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        assert!(
            index < self.len,
            "bit {index} out of bounds for length {}",
            self.len
        );
        let mask = 1u64 << (index % 64);
        let word = &mut self.words[index / 64];
        let was_set = *word & mask != 0;
        if was_set == value {
            return;
        }
        if value {
            *word |= mask;
            self.ones += 1;
        } else {
            *word &= !mask;
            self.ones -= 1;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Positions of the set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(w * 64 + bit)
            })
        })
    }

    pub fn and_inplace(&mut self, other: &BitVec) {
        self.zip_words(other, |a, b| a & b);
    }

    pub fn or_inplace(&mut self, other: &BitVec) {
        self.zip_words(other, |a, b| a | b);
    }

    pub fn not_inplace(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= tail_mask(self.len);
        }
        self.ones = self.len - self.ones;
    }

    fn zip_words(&mut self, other: &BitVec, op: impl Fn(u64, u64) -> u64) {
        assert_eq!(self.len, other.len, "BitVec length mismatch");
        let mut ones = 0usize;
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word = op(*word, rhs);
            ones += word.count_ones() as usize;
        }
        self.ones = ones;
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut bits = BitVec::with_capacity(iter.size_hint().0);
        for value in iter {
            bits.push(value);
        }
        bits
    }
}
