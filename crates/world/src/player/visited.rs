use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

const WORD_BITS: u64 = 64;

/// Sparse record of visited cells, one bitset per touched row.
///
/// Bit `x % 64` of word `x / 64` in row `y` marks cell `(x, y)`. Rows that were
/// never touched are absent and stored rows carry no trailing zero words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisitedTracker {
    rows: BTreeMap<u32, Vec<u64>>,
}

impl VisitedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a cell. Returns `true` only on the first visit.
    pub fn visit(&mut self, x: u32, y: u32) -> bool {
        let (word, mask) = word_and_mask(x);
        let row = self.rows.entry(y).or_default();
        if row.len() <= word {
            row.resize(word + 1, 0);
        }
        let first = row[word] & mask == 0;
        row[word] |= mask;
        first
    }

    pub fn has_visited(&self, x: u32, y: u32) -> bool {
        let (word, mask) = word_and_mask(x);
        self.rows
            .get(&y)
            .and_then(|row| row.get(word))
            .is_some_and(|bits| bits & mask != 0)
    }

    /// Whether any cell of the 3x3 block centred on `(x, y)` was visited.
    pub fn has_visited_near(&self, x: u32, y: u32) -> bool {
        let cols = x.saturating_sub(1)..=x.saturating_add(1);
        (y.saturating_sub(1)..=y.saturating_add(1))
            .any(|row| cols.clone().any(|col| self.has_visited(col, row)))
    }

    pub fn visited_count(&self) -> usize {
        self.rows
            .values()
            .flatten()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    pub fn rows(&self) -> &BTreeMap<u32, Vec<u64>> {
        &self.rows
    }

    /// Rebuilds a tracker from stored rows, dropping empty rows and trailing
    /// zero words.
    pub fn from_rows(rows: BTreeMap<u32, Vec<u64>>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|(y, mut words)| {
                while words.last() == Some(&0) {
                    words.pop();
                }
                (!words.is_empty()).then_some((y, words))
            })
            .collect();
        Self { rows }
    }
}

fn word_and_mask(x: u32) -> (usize, u64) {
    let x = u64::from(x);
    ((x / WORD_BITS) as usize, 1u64 << (x % WORD_BITS))
}

impl<'de> Deserialize<'de> for VisitedTracker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<u32, Vec<u64>>::deserialize(deserializer).map(Self::from_rows)
    }
}
