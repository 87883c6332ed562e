use crate::equation::{is_valid, DIGITS};
use crate::stats::SearchStats;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// A complete assignment of the digits 1..=9 to the nine positions.
pub type Candidate = [i32; DIGITS];

/// How the permutation space is traversed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Sequential,
    /// One rayon task per first digit. Results are concatenated in first-digit order.
    Parallel
}

/// Output of a full enumeration.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// Accepted candidates, in lexicographic order.
    pub solutions: Vec<Candidate>,
    /// Wall-clock time of the enumeration alone.
    pub elapsed: Duration,
    pub stats: SearchStats
}

impl SearchReport {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// The scratch buffer shared by every level of one DFS.
struct Backtrack {
    numbers: Candidate,
    /// `used[d]` is set while digit `d` occupies some earlier position. Index 0 is unused.
    used: [bool; DIGITS + 1]
}

impl Backtrack {
    fn new() -> Self {
        Backtrack { numbers: [0; DIGITS], used: [false; DIGITS + 1] }
    }

    /// A buffer with `first` already placed at position 0.
    fn seeded(first: i32) -> Self {
        let mut backtrack = Self::new();
        backtrack.place(0, first);
        backtrack
    }

    fn place(&mut self, position: usize, digit: i32) {
        self.used[digit as usize] = true;
        self.numbers[position] = digit;
    }

    fn unplace(&mut self, digit: i32) {
        self.used[digit as usize] = false;
    }

    /// Fill positions `position..DIGITS`, trying digits in ascending order.
    fn dfs(&mut self, position: usize, solutions: &mut Vec<Candidate>) -> SearchStats {
        if position == DIGITS {
            if is_valid(&self.numbers) {
                // `Candidate` is `Copy`, so this pushes a snapshot and not the buffer.
                solutions.push(self.numbers);
                return SearchStats { leaves: 1, accepted: 1 };
            }
            return SearchStats { leaves: 1, accepted: 0 };
        }

        let mut acc = SearchStats::default();
        for digit in 1..=DIGITS as i32 {
            if self.used[digit as usize] { continue }
            self.place(position, digit);
            acc.add(self.dfs(position + 1, solutions));
            self.unplace(digit);
        }
        acc
    }
}

/// Enumerate every permutation of 1..=9 on the current thread and keep the valid ones.
pub fn enumerate_solutions() -> SearchReport {
    enumerate_solutions_with(SearchMode::Sequential)
}

/// Enumerate every permutation of 1..=9 with the given traversal.
/// Both modes return the same solutions in the same order.
pub fn enumerate_solutions_with(mode: SearchMode) -> SearchReport {
    let start = Instant::now();
    let (solutions, stats) = match mode {
        SearchMode::Sequential => {
            let mut solutions = Vec::new();
            let stats = Backtrack::new().dfs(0, &mut solutions);
            (solutions, stats)
        }
        SearchMode::Parallel => {
            // `collect` on an indexed parallel iterator keeps the order of the digits.
            let subtrees: Vec<(Vec<Candidate>, SearchStats)> = (1..=DIGITS as i32).into_par_iter().map(|first| {
                let mut solutions = Vec::new();
                let stats = Backtrack::seeded(first).dfs(1, &mut solutions);
                (solutions, stats)
            }).collect();

            let mut solutions = Vec::new();
            let mut acc = SearchStats::default();
            for (subtree, stats) in subtrees {
                solutions.extend(subtree);
                acc.add(stats);
            }
            (solutions, acc)
        }
    };
    SearchReport { solutions, elapsed: start.elapsed(), stats }
}
