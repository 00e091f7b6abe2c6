//! Candidate page-size search.

/// Binary search over page sizes between `min` and `max`.
///
/// With `pot` the search runs over exponents so every candidate is a power of
/// two; with `multiple_of_four` candidates are rounded up to a multiple of four.
/// The search stops early once the remaining interval is narrower than
/// `fuzziness` (ignored for `pot`).
#[derive(Debug, Clone)]
pub struct BinarySearch {
    pot: bool,
    multiple_of_four: bool,
    min: u32,
    max: u32,
    fuzziness: u32,
    low: i64,
    high: i64,
    current: i64,
}

impl BinarySearch {
    pub fn new(min: u32, max: u32, fuzziness: u32, pot: bool, multiple_of_four: bool) -> Self {
        let (min, max) = if pot {
            (log2_ceil(min), log2_ceil(max))
        } else if multiple_of_four {
            (round_up4(min), round_up4(max))
        } else {
            (min, max)
        };
        Self {
            pot,
            multiple_of_four,
            min,
            max,
            fuzziness: if pot { 0 } else { fuzziness },
            low: 0,
            high: 0,
            current: 0,
        }
    }

    /// Restarts the search and returns the first candidate.
    pub fn reset(&mut self) -> u32 {
        self.low = self.min as i64;
        self.high = self.max as i64;
        self.current = (self.low + self.high) / 2;
        self.candidate()
    }

    /// Narrows the interval after an attempt and returns the next candidate, or
    /// `None` once the search has converged. `failed` reports whether the
    /// previous candidate was too small.
    pub fn next(&mut self, failed: bool) -> Option<u32> {
        if self.low >= self.high {
            return None;
        }
        if failed {
            self.low = self.current + 1;
        } else {
            self.high = self.current - 1;
        }
        self.current = (self.low + self.high) / 2;
        if (self.low - self.high).unsigned_abs() < self.fuzziness as u64 {
            return None;
        }
        Some(self.candidate())
    }

    fn candidate(&self) -> u32 {
        let current = self.current.max(0) as u32;
        if self.pot {
            1u32 << current.min(31)
        } else if self.multiple_of_four {
            round_up4(current)
        } else {
            current
        }
    }
}

fn log2_ceil(v: u32) -> u32 {
    v.max(1).next_power_of_two().trailing_zeros()
}

pub(crate) fn round_up4(v: u32) -> u32 {
    v.div_ceil(4) * 4
}
