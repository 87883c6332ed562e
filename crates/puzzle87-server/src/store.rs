use crate::error::StoreError;
use crate::model::{Solution, SolutionId};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Persistence for `Solution`s, keyed by store-assigned identity.
/// `find_all` returns records in ascending id order, which is also insertion order.
pub trait SolutionStore: Send + Sync {
    fn find_all(&self) -> Result<Vec<Solution>, StoreError>;

    fn find_by_id(&self, id: SolutionId) -> Result<Option<Solution>, StoreError>;

    fn exists_by_id(&self, id: SolutionId) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id)?.is_some())
    }

    /// The first record, in `find_all` order, whose numbers equal `numbers` element-wise.
    fn find_by_numbers(&self, numbers: &[i32]) -> Result<Option<Solution>, StoreError> {
        Ok(self.find_all()?.into_iter().find(|solution| solution.numbers == numbers))
    }

    /// Like `find_by_numbers`, skipping the record with id `excluding`.
    fn find_other_by_numbers(&self, numbers: &[i32], excluding: SolutionId) -> Result<Option<Solution>, StoreError> {
        Ok(self.find_all()?.into_iter()
            .find(|solution| solution.id != Some(excluding) && solution.numbers == numbers))
    }

    /// Insert when `id` is unset, otherwise write the record under its id.
    /// Returns the record as stored.
    fn save(&self, solution: Solution) -> Result<Solution, StoreError>;

    fn save_all(&self, solutions: Vec<Solution>) -> Result<Vec<Solution>, StoreError>;

    fn delete_by_id(&self, id: SolutionId) -> Result<(), StoreError>;

    fn delete_all(&self) -> Result<(), StoreError>;

    fn count(&self) -> Result<u64, StoreError>;
}

/// On-disk form of a `MemoryStore`.
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: SolutionId,
    solutions: Vec<Solution>
}

#[derive(Clone, Default)]
struct Records {
    next_id: SolutionId,
    by_id: BTreeMap<SolutionId, Solution>,
    /// Content index. Each set is ordered so its first id is the first match.
    by_numbers: HashMap<Vec<i32>, BTreeSet<SolutionId>>
}

impl Records {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut records = Records { next_id: snapshot.next_id, ..Records::default() };
        for solution in snapshot.solutions {
            records.put(solution);
        }
        records
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot { next_id: self.next_id, solutions: self.by_id.values().cloned().collect() }
    }

    /// Ids start at 1 and are never handed out twice.
    fn allocate(&mut self) -> SolutionId {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn put(&mut self, mut solution: Solution) -> Solution {
        let id = match solution.id {
            Some(id) => {
                self.next_id = self.next_id.max(id + 1);
                id
            }
            None => self.allocate(),
        };
        solution.id = Some(id);
        self.remove(id);
        self.by_numbers.entry(solution.numbers.clone()).or_default().insert(id);
        self.by_id.insert(id, solution.clone());
        solution
    }

    fn remove(&mut self, id: SolutionId) -> Option<Solution> {
        let removed = self.by_id.remove(&id)?;
        if let Some(ids) = self.by_numbers.get_mut(&removed.numbers) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_numbers.remove(&removed.numbers);
            }
        }
        Some(removed)
    }

    fn first_with(&self, numbers: &[i32], excluding: Option<SolutionId>) -> Option<Solution> {
        let ids = self.by_numbers.get(numbers)?;
        ids.iter()
            .find(|id| Some(**id) != excluding)
            .and_then(|id| self.by_id.get(id).cloned())
    }
}

/// A `SolutionStore` held in memory, optionally mirrored to a JSON snapshot file.
pub struct MemoryStore {
    records: Mutex<Records>,
    snapshot: Option<PathBuf>
}

impl MemoryStore {
    /// An empty store that is lost when dropped.
    pub fn new() -> Self {
        MemoryStore { records: Mutex::new(Records::default()), snapshot: None }
    }

    /// A store mirrored to `path`. Existing contents of `path` are loaded.
    /// The snapshot is written once here, so an unwritable location fails now rather than on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let file = File::open(&path)?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
            log::info!("loaded {} solutions from {}", snapshot.solutions.len(), path.display());
            Records::from_snapshot(snapshot)
        } else {
            Records::default()
        };
        let store = MemoryStore { records: Mutex::new(records), snapshot: Some(path) };
        store.persist(&*store.lock()?)?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Rewrite the snapshot file, if there is one. The file is replaced atomically.
    fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else { return Ok(()) };
        let staging = staging_path(path);
        let mut writer = BufWriter::new(File::create(&staging)?);
        serde_json::to_writer(&mut writer, &records.to_snapshot())?;
        writer.flush()?;
        drop(writer);
        fs::rename(&staging, path)?;
        Ok(())
    }

    /// Apply `change` under the lock. With a snapshot, the change is made on a copy that
    /// replaces the live records only once it is on disk.
    fn write<T>(&self, change: impl FnOnce(&mut Records) -> T) -> Result<T, StoreError> {
        let mut records = self.lock()?;
        if self.snapshot.is_none() {
            return Ok(change(&mut records));
        }
        let mut staged = records.clone();
        let output = change(&mut staged);
        self.persist(&staged)?;
        *records = staged;
        Ok(output)
    }
}

/// `path` with `.tmp` appended to its full file name, so it never equals `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionStore for MemoryStore {
    fn find_all(&self) -> Result<Vec<Solution>, StoreError> {
        Ok(self.lock()?.by_id.values().cloned().collect())
    }

    fn find_by_id(&self, id: SolutionId) -> Result<Option<Solution>, StoreError> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    fn exists_by_id(&self, id: SolutionId) -> Result<bool, StoreError> {
        Ok(self.lock()?.by_id.contains_key(&id))
    }

    fn find_by_numbers(&self, numbers: &[i32]) -> Result<Option<Solution>, StoreError> {
        Ok(self.lock()?.first_with(numbers, None))
    }

    fn find_other_by_numbers(&self, numbers: &[i32], excluding: SolutionId) -> Result<Option<Solution>, StoreError> {
        Ok(self.lock()?.first_with(numbers, Some(excluding)))
    }

    fn save(&self, solution: Solution) -> Result<Solution, StoreError> {
        self.write(|records| records.put(solution))
    }

    fn save_all(&self, solutions: Vec<Solution>) -> Result<Vec<Solution>, StoreError> {
        self.write(|records| solutions.into_iter().map(|solution| records.put(solution)).collect())
    }

    fn delete_by_id(&self, id: SolutionId) -> Result<(), StoreError> {
        if !self.exists_by_id(id)? {
            return Ok(());
        }
        self.write(|records| {
            records.remove(id);
        })
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.write(|records| {
            records.by_id.clear();
            records.by_numbers.clear();
        })
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.by_id.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    /// A fresh snapshot path under the system temp dir.
    fn scratch_path() -> PathBuf {
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("puzzle87-store-{}-{}.json", std::process::id(), n))
    }

    /// A fresh, existing directory under the system temp dir.
    fn scratch_dir() -> PathBuf {
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("puzzle87-dir-{}-{}", std::process::id(), n));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn solution(numbers: [i32; 9]) -> Solution {
        Solution::from(numbers)
    }

    #[test]
    fn save_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let first = store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        let second = store.save(solution([9, 8, 7, 6, 5, 4, 3, 2, 1])).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        store.delete_all().unwrap();
        let next = store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        assert_eq!(next.id, Some(2));
    }

    #[test]
    fn save_with_id_overwrites() {
        let store = MemoryStore::new();
        let mut saved = store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        saved.set_numbers(vec![1, 2, 6, 4, 7, 8, 3, 5, 9]);
        let updated = store.save(saved).unwrap();
        assert_eq!(updated.id, Some(1));
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_id(1).unwrap().unwrap().correct);
        assert_eq!(store.find_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap(), None);
    }

    #[test]
    fn find_all_is_in_id_order() {
        let store = MemoryStore::new();
        let saved = store.save_all(vec![
            solution([3, 2, 1, 4, 5, 6, 7, 8, 9]),
            solution([1, 2, 3, 4, 5, 6, 7, 8, 9]),
        ]).unwrap();
        let all = store.find_all().unwrap();
        assert_eq!(all, saved);
        assert_eq!(all[0].numbers, vec![3, 2, 1, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn find_by_numbers_prefers_lowest_id() {
        let store = MemoryStore::new();
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        let found = store.find_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap().unwrap();
        assert_eq!(found.id, Some(1));
        let other = store.find_other_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 1).unwrap().unwrap();
        assert_eq!(other.id, Some(2));
        assert_eq!(store.find_other_by_numbers(&[9, 9, 9], 1).unwrap(), None);
    }

    #[test]
    fn index_follows_deletes() {
        let store = MemoryStore::new();
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        assert!(store.exists_by_id(1).unwrap());
        store.delete_by_id(1).unwrap();
        assert!(!store.exists_by_id(1).unwrap());
        assert_eq!(store.find_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap(), None);
        // Deleting an absent id is a no-op.
        store.delete_by_id(1).unwrap();
    }

    #[test]
    fn snapshot_round_trip() {
        let path = scratch_path();
        {
            let store = MemoryStore::open(&path).unwrap();
            store.save(solution([1, 2, 6, 4, 7, 8, 3, 5, 9])).unwrap();
            store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
            store.delete_by_id(2).unwrap();
        }
        let reopened = MemoryStore::open(&path).unwrap();
        let all = reopened.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, Some(1));
        assert!(all[0].correct);
        assert_eq!(reopened.find_by_numbers(&[1, 2, 6, 4, 7, 8, 3, 5, 9]).unwrap().unwrap().id, Some(1));
        // Id 2 was handed out before the restart.
        let next = reopened.save(solution([9, 8, 7, 6, 5, 4, 3, 2, 1])).unwrap();
        assert_eq!(next.id, Some(3));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn open_rejects_missing_directory() {
        let path = std::env::temp_dir().join("puzzle87-missing-dir").join("solutions.json");
        assert!(matches!(MemoryStore::open(&path), Err(StoreError::Io(_))));
    }

    #[test]
    fn open_creates_snapshot_file() {
        let path = scratch_path();
        MemoryStore::open(&path).unwrap();
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_snapshot_leaves_records_unchanged() {
        let dir = scratch_dir();
        let store = MemoryStore::open(dir.join("solutions.json")).unwrap();
        store.save(solution([1, 2, 6, 4, 7, 8, 3, 5, 9])).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert!(store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).is_err());
        assert!(store.save_all(vec![solution([9, 8, 7, 6, 5, 4, 3, 2, 1])]).is_err());
        assert!(store.delete_by_id(1).is_err());
        assert!(store.delete_all().is_err());

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.find_by_id(2).unwrap(), None);
        assert_eq!(store.find_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap(), None);
        assert!(store.find_by_numbers(&[1, 2, 6, 4, 7, 8, 3, 5, 9]).unwrap().is_some());
    }

    #[test]
    fn staging_file_differs_from_target() {
        assert_eq!(staging_path(Path::new("data/solutions.json")), PathBuf::from("data/solutions.json.tmp"));
        assert_eq!(staging_path(Path::new("solutions.tmp")), PathBuf::from("solutions.tmp.tmp"));

        let path = scratch_path().with_extension("tmp");
        {
            let store = MemoryStore::open(&path).unwrap();
            store.save(solution([1, 2, 6, 4, 7, 8, 3, 5, 9])).unwrap();
        }
        assert_eq!(MemoryStore::open(&path).unwrap().count().unwrap(), 1);
        assert!(!staging_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn trait_defaults_scan_find_all() {
        /// Only implements the required methods, so lookups go through the defaults.
        struct Plain(MemoryStore);

        impl SolutionStore for Plain {
            fn find_all(&self) -> Result<Vec<Solution>, StoreError> { self.0.find_all() }
            fn find_by_id(&self, id: SolutionId) -> Result<Option<Solution>, StoreError> { self.0.find_by_id(id) }
            fn save(&self, solution: Solution) -> Result<Solution, StoreError> { self.0.save(solution) }
            fn save_all(&self, solutions: Vec<Solution>) -> Result<Vec<Solution>, StoreError> { self.0.save_all(solutions) }
            fn delete_by_id(&self, id: SolutionId) -> Result<(), StoreError> { self.0.delete_by_id(id) }
            fn delete_all(&self) -> Result<(), StoreError> { self.0.delete_all() }
            fn count(&self) -> Result<u64, StoreError> { self.0.count() }
        }

        let store = Plain(MemoryStore::new());
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        store.save(solution([1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        assert!(store.exists_by_id(2).unwrap());
        assert_eq!(store.find_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap().unwrap().id, Some(1));
        assert_eq!(store.find_other_by_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 1).unwrap().unwrap().id, Some(2));
    }
}
