//! Table store.
//!
//! The front desk talks to its persistent state through the [`Store`] trait: one generic
//! query-all / insert-one / update-one-by-id contract shared by all five tables. A relational
//! backend can implement it directly; this crate ships [`TableStore`], which keeps every table
//! in memory and, when opened on a data directory, writes each table through to a YAML file
//! after every successful mutation.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   patients.yaml
//!   appointments.yaml
//!   beds.yaml
//!   admissions.yaml
//!   inventory.yaml
//! ```
//!
//! A missing file is an empty table.
//!
//! ## Guarantees
//!
//! - Single-row inserts and updates are atomic and return the affected row.
//! - [`Store::insert_with`] runs read-compute-insert with no other write interleaving.
//! - Nothing spans rows or tables; multi-step workflows are not transactional.

use crate::constants::{
    ADMISSIONS_TABLE_FILENAME, APPOINTMENTS_TABLE_FILENAME, BEDS_TABLE_FILENAME,
    INVENTORY_TABLE_FILENAME, PATIENTS_TABLE_FILENAME,
};
use crate::error::{StoreError, StoreResult};
use crate::id::RecordId;
use crate::models::{Admission, Appointment, Bed, InventoryItem, Patient};
use crate::CoreConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// The five persisted tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Patients,
    Appointments,
    Beds,
    Admissions,
    Inventory,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Appointments => "appointments",
            Self::Beds => "beds",
            Self::Admissions => "admissions",
            Self::Inventory => "inventory",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Patients => PATIENTS_TABLE_FILENAME,
            Self::Appointments => APPOINTMENTS_TABLE_FILENAME,
            Self::Beds => BEDS_TABLE_FILENAME,
            Self::Admissions => ADMISSIONS_TABLE_FILENAME,
            Self::Inventory => INVENTORY_TABLE_FILENAME,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory contents of every table.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    beds: Vec<Bed>,
    admissions: Vec<Admission>,
    inventory: Vec<InventoryItem>,
}

/// A row type stored in one of the [`Table`]s.
pub trait Record: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {
    const TABLE: Table;

    fn id(&self) -> RecordId;

    /// Natural ordering used by [`Store::select_all`].
    fn order(a: &Self, b: &Self) -> Ordering;

    /// Unique-constraint check against an existing row. Returns the reason on violation.
    fn conflicts_with(&self, _existing: &Self) -> Option<&'static str> {
        None
    }

    fn rows(tables: &Tables) -> &Vec<Self>;

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;
}

impl Record for Patient {
    const TABLE: Table = Table::Patients;

    fn id(&self) -> RecordId {
        self.id
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.patients
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.patients
    }
}

impl Record for Appointment {
    const TABLE: Table = Table::Appointments;

    fn id(&self) -> RecordId {
        self.id
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        a.queue_number
            .cmp(&b.queue_number)
            .then(a.created_at.cmp(&b.created_at))
    }

    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.appointments
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.appointments
    }
}

impl Record for Bed {
    const TABLE: Table = Table::Beds;

    fn id(&self) -> RecordId {
        self.id
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        a.bed_number.cmp(&b.bed_number)
    }

    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.beds
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.beds
    }
}

impl Record for Admission {
    const TABLE: Table = Table::Admissions;

    fn id(&self) -> RecordId {
        self.id
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        b.admission_date.cmp(&a.admission_date)
    }

    fn conflicts_with(&self, existing: &Self) -> Option<&'static str> {
        (self.is_admitted()
            && existing.is_admitted()
            && self.patient_id == existing.patient_id
            && self.bed_id == existing.bed_id)
            .then_some("patient is already admitted to this bed")
    }

    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.admissions
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.admissions
    }
}

impl Record for InventoryItem {
    const TABLE: Table = Table::Inventory;

    fn id(&self) -> RecordId {
        self.id
    }

    fn order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.inventory
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.inventory
    }
}

/// The persistence contract consumed by the front-desk services.
pub trait Store: Send + Sync {
    /// Returns every row of `R`'s table in its natural order.
    fn select_all<R: Record>(&self) -> StoreResult<Vec<R>>;

    /// Inserts one row and returns it as stored.
    fn insert<R: Record>(&self, row: R) -> StoreResult<R>;

    /// Applies `patch` to the row with `id` and returns the updated row.
    ///
    /// If `patch` returns an error the row is left untouched.
    fn update<R, F>(&self, id: RecordId, patch: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&mut R) -> StoreResult<()>;

    /// Builds a row from the current table contents and inserts it, with no other write able
    /// to interleave between the read and the insert.
    fn insert_with<R, F>(&self, build: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&[R]) -> StoreResult<R>;
}

/// Mutex-guarded in-memory tables with optional YAML write-through.
#[derive(Debug)]
pub struct TableStore {
    tables: Mutex<Tables>,
    data_dir: Option<PathBuf>,
}

impl TableStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            data_dir: None,
        }
    }

    /// Opens (creating if needed) a data directory and loads every table file in it.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(data_dir).map_err(StoreError::DataDirCreation)?;

        let tables = Tables {
            patients: load_table(data_dir)?,
            appointments: load_table(data_dir)?,
            beds: load_table(data_dir)?,
            admissions: load_table(data_dir)?,
            inventory: load_table(data_dir)?,
        };

        tracing::info!(
            data_dir = %data_dir.display(),
            patients = tables.patients.len(),
            appointments = tables.appointments.len(),
            beds = tables.beds.len(),
            admissions = tables.admissions.len(),
            inventory = tables.inventory.len(),
            "opened table store"
        );

        Ok(Self {
            tables: Mutex::new(tables),
            data_dir: Some(data_dir.to_path_buf()),
        })
    }

    /// Opens the store described by `cfg`: on disk if a data directory is set, else in memory.
    pub fn from_config(cfg: &CoreConfig) -> StoreResult<Self> {
        match cfg.data_dir() {
            Some(dir) => Self::open(dir),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Persists `rows` (when backed by a directory) and only then swaps them into memory, so a
    /// failed write leaves the table as it was.
    fn commit<R: Record>(&self, tables: &mut Tables, rows: Vec<R>) -> StoreResult<()> {
        if let Some(dir) = &self.data_dir {
            write_table(dir, &rows)?;
        }
        *R::rows_mut(tables) = rows;
        Ok(())
    }

    fn insert_locked<R: Record>(&self, tables: &mut Tables, row: R) -> StoreResult<R> {
        let existing = R::rows(tables);
        let id = row.id();
        if existing.iter().any(|r| r.id() == id) {
            return Err(StoreError::Conflict {
                table: R::TABLE,
                reason: format!("duplicate id {id}"),
            });
        }
        if let Some(reason) = existing.iter().find_map(|r| row.conflicts_with(r)) {
            return Err(StoreError::Conflict {
                table: R::TABLE,
                reason: reason.to_string(),
            });
        }

        let mut rows = existing.clone();
        rows.push(row.clone());
        self.commit(tables, rows)?;

        tracing::debug!(table = %R::TABLE, %id, "inserted row");
        Ok(row)
    }
}

impl Store for TableStore {
    fn select_all<R: Record>(&self) -> StoreResult<Vec<R>> {
        let tables = self.lock()?;
        let mut rows = R::rows(&tables).clone();
        rows.sort_by(R::order);
        Ok(rows)
    }

    fn insert<R: Record>(&self, row: R) -> StoreResult<R> {
        let mut tables = self.lock()?;
        self.insert_locked(&mut tables, row)
    }

    fn update<R, F>(&self, id: RecordId, patch: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&mut R) -> StoreResult<()>,
    {
        let mut tables = self.lock()?;
        let mut rows = R::rows(&tables).clone();
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(StoreError::NotFound {
                table: R::TABLE,
                id,
            })?;

        let before = row.clone();
        patch(row)?;
        let updated = row.clone();

        if updated == before {
            tracing::debug!(table = %R::TABLE, %id, "patch left row unchanged");
            return Ok(updated);
        }
        self.commit(&mut tables, rows)?;
        tracing::debug!(table = %R::TABLE, %id, "updated row");
        Ok(updated)
    }

    fn insert_with<R, F>(&self, build: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&[R]) -> StoreResult<R>,
    {
        let mut tables = self.lock()?;
        let row = build(R::rows(&tables))?;
        self.insert_locked(&mut tables, row)
    }
}

fn load_table<R: Record>(dir: &Path) -> StoreResult<Vec<R>> {
    let path = dir.join(R::TABLE.file_name());
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(&contents).map_err(|source| StoreError::Deserialization {
        table: R::TABLE,
        source,
    })
}

fn write_table<R: Record>(dir: &Path, rows: &[R]) -> StoreResult<()> {
    let yaml = serde_yaml::to_string(rows).map_err(|source| StoreError::Serialization {
        table: R::TABLE,
        source,
    })?;

    let path = dir.join(R::TABLE.file_name());
    let tmp = dir.join(format!(".{}.tmp", R::TABLE.file_name()));
    fs::write(&tmp, yaml).map_err(StoreError::FileWrite)?;
    fs::rename(&tmp, &path).map_err(StoreError::FileWrite)
}
