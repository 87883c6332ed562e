/// Counters from a DFS subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Complete candidates that reached the validity check.
    pub leaves: u32,
    /// Candidates that passed the check.
    pub accepted: u32
}

impl SearchStats {
    /// Add `other` into `self`.
    pub fn add(&mut self, other: Self) {
        self.leaves += other.leaves;
        self.accepted += other.accepted;
    }

    /// Fraction of leaves that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.leaves == 0 { return 0.0 }
        self.accepted as f64 / self.leaves as f64
    }
}
