//! Draw derivation.
//!
//! Expands the oracle's 256-bit value into a stream of 32-bit words with
//! SHA-256 in counter mode:
//!
//! ```text
//! block_i = SHA256("keno:draw:v1:" || value || i_le)
//! ```
//!
//! Words are reduced into a bound by rejection sampling, so every index is
//! equally likely, and drive a partial Fisher-Yates shuffle of `1..=range`.
//! The same value always yields the same draw.

use keno_types::RandomValue;
use sha2::{Digest, Sha256};

const DRAW_DOMAIN: &[u8] = b"keno:draw:v1:";

/// Deterministic word stream derived from a random value.
pub struct DrawStream {
    value: [u8; 32],
    counter: u64,
    block: [u8; 32],
    offset: usize,
}

impl DrawStream {
    #[must_use]
    pub fn new(value: &RandomValue) -> Self {
        Self {
            value: *value.as_bytes(),
            counter: 0,
            block: [0; 32],
            // Force a refill on first use.
            offset: 32,
        }
    }

    fn refill(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(DRAW_DOMAIN);
        hasher.update(self.value);
        hasher.update(self.counter.to_le_bytes());
        self.block = hasher.finalize().into();
        self.counter += 1;
        self.offset = 0;
    }

    /// Next 32-bit word.
    pub fn next_u32(&mut self) -> u32 {
        if self.offset + 4 > self.block.len() {
            self.refill();
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.block[self.offset..self.offset + 4]);
        self.offset += 4;
        u32::from_le_bytes(word)
    }

    /// Uniform index in `0..bound`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: usize) -> usize {
        let Ok(bound) = u64::try_from(bound) else {
            return 0;
        };
        if bound == 0 {
            return 0;
        }
        let space = 1u64 << 32;
        let zone = space - (space % bound);
        loop {
            let word = u64::from(self.next_u32());
            if word < zone {
                return usize::try_from(word % bound).unwrap_or(0);
            }
        }
    }
}

/// Draw `count` distinct numbers from `1..=range`, sorted ascending.
/// `count` is clamped to `range`.
#[must_use]
pub fn draw_numbers(value: &RandomValue, range: u8, count: u8) -> Vec<u8> {
    let mut deck: Vec<u8> = (1..=range).collect();
    let count = usize::from(count.min(range));
    let mut stream = DrawStream::new(value);

    for i in 0..count {
        let j = i + stream.next_below(deck.len() - i);
        deck.swap(i, j);
    }

    deck.truncate(count);
    deck.sort_unstable();
    deck
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn twenty_distinct_numbers_in_range() {
        let drawn = draw_numbers(&RandomValue([0xAB; 32]), 80, 20);
        assert_eq!(drawn.len(), 20);
        assert!(drawn.iter().all(|n| (1..=80).contains(n)));
        assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 20);
        assert!(drawn.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn deterministic_in_value() {
        let v = RandomValue([7; 32]);
        assert_eq!(draw_numbers(&v, 80, 20), draw_numbers(&v, 80, 20));
        assert_ne!(
            draw_numbers(&v, 80, 20),
            draw_numbers(&RandomValue([8; 32]), 80, 20)
        );
    }

    #[test]
    fn random_values_always_valid() {
        for _ in 0..200 {
            let drawn = draw_numbers(&RandomValue(rand::random()), 80, 20);
            assert_eq!(drawn.len(), 20);
            assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 20);
            assert!(drawn.iter().all(|n| (1..=80).contains(n)));
        }
    }

    #[test]
    fn full_draw_is_a_permutation() {
        let drawn = draw_numbers(&RandomValue([1; 32]), 10, 10);
        assert_eq!(drawn, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn count_clamped_to_range() {
        assert_eq!(draw_numbers(&RandomValue([1; 32]), 5, 9).len(), 5);
        assert!(draw_numbers(&RandomValue([1; 32]), 0, 20).is_empty());
    }

    #[test]
    fn next_below_stays_in_bound() {
        let mut stream = DrawStream::new(&RandomValue([3; 32]));
        for bound in 1..=80 {
            assert!(stream.next_below(bound) < bound);
        }
        assert_eq!(stream.next_below(0), 0);
    }

    #[test]
    fn stream_crosses_block_boundary() {
        let mut stream = DrawStream::new(&RandomValue([9; 32]));
        let words: Vec<u32> = (0..20).map(|_| stream.next_u32()).collect();
        // 8 words per block: the ninth starts a fresh block
        assert_eq!(stream.counter, 3);
        assert_ne!(words[0], words[8]);
    }
}
