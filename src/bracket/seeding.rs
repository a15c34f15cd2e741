//! Seed pairing math for single-elimination brackets.
//!
//! Pure functions over seed numbers and entrant lists; the bracket
//! manager turns their output into persisted heats.

use serde::{Deserialize, Serialize};

/// One slot of the opening round, expressed in seed numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPairing {
    /// Two seeds meet head to head
    Contest { first: u32, second: u32 },
    /// A seed advances without playing
    Bye { seed: u32 },
}

/// Round-1 pairings for a field of the given size.
///
/// An even field pairs `i` against `N - i + 1`, so seed 1 meets seed
/// N and the middle seeds meet each other. An odd field gives seed 1
/// the bye and pairs `i` against `N - i + 2` for the rest. Pairings
/// come back in heat order: the bye first, then contests from the top
/// seed down.
pub fn round1_pairings(field_size: u32) -> Vec<SeedPairing> {
    let n = field_size;
    let mut pairings = Vec::with_capacity(field_size.div_ceil(2) as usize);
    if n == 0 {
        return pairings;
    }

    if n % 2 == 0 {
        for i in 1..=n / 2 {
            pairings.push(SeedPairing::Contest {
                first: i,
                second: n - i + 1,
            });
        }
    } else {
        pairings.push(SeedPairing::Bye { seed: 1 });
        for i in 2..=n.div_ceil(2) {
            pairings.push(SeedPairing::Contest {
                first: i,
                second: n - i + 2,
            });
        }
    }
    pairings
}

/// Number of rounds a field of the given size needs to produce a
/// champion, `ceil(log2(N))`
pub fn rounds_for(field_size: u32) -> u32 {
    if field_size <= 1 {
        return 0;
    }
    u32::BITS - (field_size - 1).leading_zeros()
}

/// Pair entrants sequentially, returning the pairs and the unpaired
/// leftover of an odd field.
///
/// Later rounds use this on the ordered winner list: each pair plays
/// a heat and the leftover, when present, takes the round's single
/// bye. Keeping at most one bye per round is what makes the bracket
/// finish in exactly [`rounds_for`] rounds.
pub fn sequential_pairs<T: Copy>(entrants: &[T]) -> (Vec<(T, T)>, Option<T>) {
    let mut pairs = Vec::with_capacity(entrants.len() / 2);
    for chunk in entrants.chunks_exact(2) {
        pairs.push((chunk[0], chunk[1]));
    }
    let leftover = if entrants.len() % 2 == 1 {
        entrants.last().copied()
    } else {
        None
    };
    (pairs, leftover)
}
