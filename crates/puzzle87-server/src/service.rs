use crate::error::ServiceError;
use crate::model::{Solution, SolutionId};
use crate::store::SolutionStore;
use puzzle87_core::equation::DIGITS;
use puzzle87_core::search::{enumerate_solutions_with, SearchMode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Result of regenerating the stored solutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummary {
    /// Enumeration plus bulk insert, in milliseconds.
    pub calculation_time_ms: u64,
    pub total_solutions: usize
}

/// Generation and CRUD over a `SolutionStore`.
/// Submitted numbers are unique by value: writes never create a second record with equal numbers.
pub struct SolverService {
    store: Arc<dyn SolutionStore>,
    mode: SearchMode
}

fn check_length(numbers: &[i32]) -> Result<(), ServiceError> {
    if numbers.len() != DIGITS {
        return Err(ServiceError::InvalidLength { len: numbers.len() });
    }
    Ok(())
}

impl SolverService {
    pub fn new(store: Arc<dyn SolutionStore>, mode: SearchMode) -> Self {
        SolverService { store, mode }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Replace the store contents with every valid permutation.
    pub fn generate_solutions(&self) -> Result<GenerateSummary, ServiceError> {
        self.store.delete_all()?;

        let start = Instant::now();
        let report = enumerate_solutions_with(self.mode);
        log::debug!("enumerated {} leaves in {} ms", report.stats.leaves, report.elapsed_ms());
        self.store.save_all(report.solutions.into_iter().map(Solution::from).collect())?;
        let calculation_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let total_solutions = self.store.find_all()?.len();
        log::info!("generated {} solutions in {} ms ({:?})", total_solutions, calculation_time_ms, self.mode);
        Ok(GenerateSummary { calculation_time_ms, total_solutions })
    }

    pub fn all_solutions(&self) -> Result<Vec<Solution>, ServiceError> {
        Ok(self.store.find_all()?)
    }

    /// Store a guess, or return the stored record that already holds the same numbers.
    pub fn create_solution(&self, numbers: Vec<i32>) -> Result<Solution, ServiceError> {
        check_length(&numbers)?;
        if let Some(existing) = self.store.find_by_numbers(&numbers)? {
            log::debug!("solution {:?} already stored as {:?}", numbers, existing.id);
            return Ok(existing);
        }
        let saved = self.store.save(Solution::new(None, numbers))?;
        log::debug!("stored solution {:?} (correct: {})", saved.id, saved.correct);
        Ok(saved)
    }

    pub fn solution_by_id(&self, id: SolutionId) -> Result<Option<Solution>, ServiceError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Returns false, deleting nothing, when `id` is not stored.
    pub fn delete_solution_by_id(&self, id: SolutionId) -> Result<bool, ServiceError> {
        if !self.store.exists_by_id(id)? {
            return Ok(false);
        }
        self.store.delete_by_id(id)?;
        log::debug!("deleted solution {}", id);
        Ok(true)
    }

    /// Clear the store, returning how many records it held.
    pub fn delete_all_solutions(&self) -> Result<u64, ServiceError> {
        let count = self.store.count()?;
        self.store.delete_all()?;
        log::debug!("deleted {} solutions", count);
        Ok(count)
    }

    /// Overwrite the numbers of `id`. Another record already holding `numbers` is deleted first.
    pub fn update_solution(&self, id: SolutionId, numbers: Vec<i32>) -> Result<Option<Solution>, ServiceError> {
        check_length(&numbers)?;
        let Some(mut solution) = self.store.find_by_id(id)? else {
            return Ok(None);
        };

        if let Some(duplicate) = self.store.find_other_by_numbers(&numbers, id)? {
            if let Some(duplicate_id) = duplicate.id {
                log::info!("removing solution {} to keep {:?} unique", duplicate_id, numbers);
                self.store.delete_by_id(duplicate_id)?;
            }
        }

        solution.set_numbers(numbers);
        Ok(Some(self.store.save(solution)?))
    }
}
