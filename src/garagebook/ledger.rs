//! Monthly expense books.
//!
//! Expenses are split into one collection file per calendar month under
//! `expenses/`. A month's repository is opened the first time it is touched
//! and kept for the rest of the process.

use crate::entity::EntityId;
use crate::error::Result;
use crate::model::{Expense, Money, YearMonth};
use crate::store::repository::{Committed, Repository};
use crate::store::Persistence;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

pub struct Ledger {
    dir: PathBuf,
    persistence: Rc<Persistence>,
    months: BTreeMap<YearMonth, Repository<Expense>>,
}

impl Ledger {
    pub fn open(persistence: Rc<Persistence>, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            persistence,
            months: BTreeMap::new(),
        }
    }

    pub fn path_for(&self, month: YearMonth) -> PathBuf {
        self.dir.join(format!("{}.json", month))
    }

    pub fn month(&mut self, month: YearMonth) -> &Repository<Expense> {
        self.month_mut(month)
    }

    pub fn month_mut(&mut self, month: YearMonth) -> &mut Repository<Expense> {
        let path = self.path_for(month);
        let persistence = &self.persistence;
        self.months
            .entry(month)
            .or_insert_with(|| Repository::open(Rc::clone(persistence), path))
    }

    /// Files the expense under the month of its date.
    pub fn record(&mut self, expense: Expense) -> Result<Committed<Expense>> {
        let month = YearMonth::of(expense.date);
        self.month_mut(month).register(expense)
    }

    pub fn remove(&mut self, month: YearMonth, id: &EntityId) -> Result<Option<Committed<Expense>>> {
        self.month_mut(month).delete(id)
    }

    pub fn total_for(&mut self, month: YearMonth) -> Money {
        self.month(month).values().map(|e| e.amount).sum()
    }

    /// Opens every month that has a file on disk.
    pub fn load_all(&mut self) {
        for month in self.months_on_disk() {
            self.month_mut(month);
        }
    }

    /// Rewrites every open month. Returns how many files were written.
    pub fn flush_all(&self) -> Result<usize> {
        for repository in self.months.values() {
            repository.flush()?;
        }
        Ok(self.months.len())
    }

    /// Months with an expense file on disk, oldest first.
    pub fn months_on_disk(&self) -> Vec<YearMonth> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut months: Vec<YearMonth> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".json")?.parse().ok()
            })
            .collect();
        months.sort();
        months
    }
}
