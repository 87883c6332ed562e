use puzzle87_core::equation;
use serde::{Deserialize, Serialize};

/// Store-assigned identity of a `Solution`.
pub type SolutionId = u64;

/// A stored guess. `correct` is derived from `numbers` whenever they are set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// `None` until the store assigns one.
    pub id: Option<SolutionId>,
    pub numbers: Vec<i32>,
    pub correct: bool
}

impl Solution {
    pub fn new(id: Option<SolutionId>, numbers: Vec<i32>) -> Self {
        let correct = equation::is_valid(&numbers);
        Solution { id, numbers, correct }
    }

    /// Re-evaluates the equation on the current `numbers`.
    pub fn is_valid(&self) -> bool {
        equation::is_valid(&self.numbers)
    }

    /// Replace `numbers` and recompute `correct`.
    pub fn set_numbers(&mut self, numbers: Vec<i32>) {
        self.correct = equation::is_valid(&numbers);
        self.numbers = numbers;
    }

    /// Overrides the flag without checking it against `numbers`.
    pub fn set_correct(&mut self, correct: bool) {
        self.correct = correct;
    }
}

impl From<[i32; equation::DIGITS]> for Solution {
    fn from(numbers: [i32; equation::DIGITS]) -> Self {
        Solution::new(None, numbers.to_vec())
    }
}
