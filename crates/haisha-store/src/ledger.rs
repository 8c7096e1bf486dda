//! File-backed append-only ledger
//!
//! Layout of a ledger directory:
//! - `ledger.jsonl`: one [`LedgerRow`] per line, only ever appended to
//! - `ledger.sections`: one byte per row (`S` section start, `R` row); an
//!   append rewrites only its tail, a full regroup replaces it atomically
//! - `ledger.lock`: present while a writer owns the ledger

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use haisha_domain::model::LedgerRow;
use haisha_domain::repository::LedgerStore;
use haisha_domain::service::{Boundary, SectionLayout};
use haisha_types::{Error, Result};
use tracing::debug;

use crate::lock::LedgerLock;

pub const LEDGER_FILE: &str = "ledger.jsonl";
pub const LAYOUT_FILE: &str = "ledger.sections";
pub const LOCK_FILE: &str = "ledger.lock";

pub struct FileLedgerStore {
    dir: PathBuf,
    rows: Vec<LedgerRow>,
    layout: SectionLayout,
    lock: Option<LedgerLock>,
}

impl FileLedgerStore {
    /// Open a ledger for writing, taking the directory's lock.
    ///
    /// Fails with [`Error::LedgerWriteConflict`] when another writer holds it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::LedgerWriteConflict(format!("{}: {}", dir.display(), e)))?;
        let lock = LedgerLock::acquire(&dir.join(LOCK_FILE))?;
        let mut store = Self::load(dir)?;
        store.lock = Some(lock);
        Ok(store)
    }

    /// Open a ledger for reading only; appends are rejected
    pub fn open_read_only(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::load(dir.into())
    }

    fn load(dir: PathBuf) -> Result<Self> {
        let rows = read_rows(&dir.join(LEDGER_FILE))?;
        let layout = read_layout(&dir.join(LAYOUT_FILE))?;
        debug!(dir = %dir.display(), rows = rows.len(), "ledger loaded");
        Ok(Self {
            dir,
            rows,
            layout,
            lock: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn rows_path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE)
    }

    pub fn is_writable(&self) -> bool {
        self.lock.is_some()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.lock.is_none() {
            return Err(Error::LedgerWriteConflict(format!(
                "{} was opened read-only",
                self.dir.display()
            )));
        }
        Ok(())
    }
}

fn read_rows(path: &Path) -> Result<Vec<LedgerRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| {
            Error::Ledger(format!("{} line {}: {}", path.display(), idx + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_layout(path: &Path) -> Result<SectionLayout> {
    if !path.exists() {
        return Ok(SectionLayout::default());
    }
    let boundaries = fs::read(path)?
        .into_iter()
        .enumerate()
        .map(|(row, byte)| match byte {
            b'S' => Ok(Boundary::Section),
            b'R' => Ok(Boundary::Row),
            other => Err(Error::Ledger(format!(
                "{} row {}: unknown boundary byte 0x{:02x}",
                path.display(),
                row,
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SectionLayout::from_boundaries(boundaries))
}

fn encode_boundaries(boundaries: &[Boundary]) -> Vec<u8> {
    boundaries
        .iter()
        .map(|b| match b {
            Boundary::Section => b'S',
            Boundary::Row => b'R',
        })
        .collect()
}

impl LedgerStore for FileLedgerStore {
    fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    fn append_rows(&mut self, rows: Vec<LedgerRow>) -> std::result::Result<(), Error> {
        self.ensure_writable()?;

        // Serialize everything before touching the file
        let mut buf = Vec::new();
        for row in &rows {
            serde_json::to_writer(&mut buf, row)?;
            buf.push(b'\n');
        }

        let path = self.rows_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::LedgerWriteConflict(format!("{}: {}", path.display(), e)))?;
        let original_len = file.metadata()?.len();

        if let Err(e) = file.write_all(&buf).and_then(|_| file.sync_data()) {
            // Roll back to the previous end so no partial row survives
            file.set_len(original_len)?;
            return Err(Error::LedgerWriteConflict(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }

        self.rows.extend(rows);
        Ok(())
    }

    fn store_layout(&mut self, layout: SectionLayout) -> std::result::Result<(), Error> {
        self.ensure_writable()?;

        let path = self.dir.join(LAYOUT_FILE);
        let tmp = self.dir.join(format!("{}.tmp", LAYOUT_FILE));
        fs::write(&tmp, encode_boundaries(layout.boundaries()))?;
        fs::rename(&tmp, &path)?;

        self.layout = layout;
        Ok(())
    }

    fn store_layout_tail(&mut self, from: usize, tail: Vec<Boundary>) -> std::result::Result<(), Error> {
        self.ensure_writable()?;

        // A crash after the truncate leaves a short layout, which the next
        // incremental pass extends from its end
        let from = from.min(self.layout.len());
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LAYOUT_FILE))?;
        file.set_len(from as u64)?;
        file.seek(SeekFrom::Start(from as u64))?;
        file.write_all(&encode_boundaries(&tail))?;
        file.sync_data()?;

        self.layout.splice_tail(from, tail);
        Ok(())
    }
}
