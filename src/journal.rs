//! Linear undo/redo history.
//!
//! A [`Transaction`] pairs an action that has already been carried out with
//! the closure that reverses it. The journal keeps committed transactions in
//! order with a cursor on the last applied one. Committing while the cursor
//! sits behind the end throws the redo branch away; history never branches.
//!
//! All operations take the journal's lock and run the closures while holding
//! it, so a closure must not call back into the same journal.
//!
//! The applied part of the history can be dumped as lines of `label: value`
//! and read back as [`JournalEntry`] values for replay through an engine.
//! Values are written as is: one containing a line break will not load back
//! intact. Labels are checked instead: an empty label, or one containing `:`
//! or a line break, makes [`Journal::save`] fail before anything is written.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::datatype::TypedCell;
use crate::error::{CspError, Result};
use crate::guard;
use crate::scan::{self, Span};

type Step = Box<dyn FnMut() + Send>;

// ------------- Transaction -------------
pub struct Transaction {
    label: String,
    data: Option<TypedCell>,
    action: Step,
    undo: Step,
}

impl Transaction {
    pub fn new(
        label: impl Into<String>,
        action: impl FnMut() + Send + 'static,
        undo: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            data: None,
            action: Box::new(action),
            undo: Box::new(undo),
        }
    }
    /// Attaches the payload written out when the journal is saved.
    pub fn with_data(mut self, data: TypedCell) -> Self {
        self.data = Some(data);
        self
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn data(&self) -> Option<&TypedCell> {
        self.data.as_ref()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("label", &self.label)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

// ------------- JournalEntry -------------
/// One line of a journal dump.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub label: String,
    pub data: Option<TypedCell>,
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{}: {}", self.label, data),
            None => write!(f, "{}: ", self.label),
        }
    }
}

// ------------- Journal -------------
#[derive(Default)]
struct History {
    transactions: Vec<Transaction>,
    // index of the last applied transaction, None when everything is undone
    cursor: Option<usize>,
}

#[derive(Default)]
pub struct Journal {
    history: Mutex<History>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transaction whose action the caller has already run.
    /// Anything after the cursor is discarded first.
    pub fn commit(&self, transaction: Transaction) {
        let mut history = guard(&self.history);
        let keep = history.cursor.map_or(0, |cursor| cursor + 1);
        let discarded = history.transactions.len().saturating_sub(keep);
        history.transactions.truncate(keep);
        debug!(label = transaction.label(), discarded, "commit");
        history.transactions.push(transaction);
        history.cursor = Some(history.transactions.len() - 1);
    }
    /// Runs the action, then commits.
    pub fn perform(&self, mut transaction: Transaction) {
        (transaction.action)();
        self.commit(transaction);
    }
    /// Reverses the transaction under the cursor and steps back. Returns
    /// `false` if there was nothing to undo.
    pub fn undo(&self) -> bool {
        let mut history = guard(&self.history);
        let Some(cursor) = history.cursor else {
            return false;
        };
        (history.transactions[cursor].undo)();
        history.cursor = cursor.checked_sub(1);
        true
    }
    /// Steps forward and reapplies that transaction. Returns `false` if the
    /// cursor was already on the last one.
    pub fn redo(&self) -> bool {
        let mut history = guard(&self.history);
        let next = history.cursor.map_or(0, |cursor| cursor + 1);
        if next >= history.transactions.len() {
            return false;
        }
        history.cursor = Some(next);
        (history.transactions[next].action)();
        true
    }

    pub fn len(&self) -> usize {
        guard(&self.history).transactions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn cursor(&self) -> Option<usize> {
        guard(&self.history).cursor
    }
    pub fn can_undo(&self) -> bool {
        self.cursor().is_some()
    }
    pub fn can_redo(&self) -> bool {
        let history = guard(&self.history);
        history.cursor.map_or(0, |cursor| cursor + 1) < history.transactions.len()
    }
    pub fn labels(&self) -> Vec<String> {
        guard(&self.history).transactions.iter().map(|t| t.label.clone()).collect()
    }

    /// The applied transactions, oldest first, as dump entries.
    pub fn entries(&self) -> Vec<JournalEntry> {
        let history = guard(&self.history);
        let applied = history.cursor.map_or(0, |cursor| cursor + 1);
        history.transactions[..applied]
            .iter()
            .map(|t| JournalEntry {
                label: t.label.clone(),
                data: t.data.clone(),
            })
            .collect()
    }

    pub fn save(&self, mut writer: impl Write) -> Result<()> {
        let entries = self.entries();
        for (number, entry) in entries.iter().enumerate() {
            if entry.label.is_empty() || entry.label.contains([':', '\n', '\r']) {
                return Err(CspError::Journal {
                    line: number + 1,
                    message: format!("label {:?} cannot be written as `label: value`", entry.label),
                });
            }
        }
        for entry in entries {
            writeln!(writer, "{entry}")?;
        }
        writer.flush()?;
        Ok(())
    }
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        // render first so a rejected label leaves an existing dump alone
        let mut dump = Vec::new();
        self.save(&mut dump)?;
        fs::write(path, dump)?;
        debug!(path = %path.display(), "journal saved");
        Ok(())
    }

    /// Reads a dump back. Blank lines are skipped; values come back as string
    /// cells. A malformed line fails the whole load, so nothing is replayed
    /// from a half read file.
    pub fn load(reader: impl BufRead) -> Result<Vec<JournalEntry>> {
        let mut entries = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let raw = Span::new(&line);
            if scan::strip(raw).is_empty() {
                continue;
            }
            let separator = scan::scan_for_character(raw, b':');
            if separator.is_empty() {
                return Err(CspError::Journal {
                    line: number + 1,
                    message: "missing `:` separator".to_string(),
                });
            }
            let at = separator.offset_in(&raw);
            let label = scan::strip(Span::new(&line[..at])).to_string_lossy();
            if label.is_empty() {
                return Err(CspError::Journal {
                    line: number + 1,
                    message: "missing label".to_string(),
                });
            }
            let value = &line[at + 1..];
            let value = value.strip_prefix(' ').unwrap_or(value);
            entries.push(JournalEntry {
                label,
                data: (!value.is_empty()).then(|| TypedCell::new(value.to_string())),
            });
        }
        Ok(entries)
    }
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<JournalEntry>> {
        let path = path.as_ref();
        let entries = Self::load(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), entries = entries.len(), "journal loaded");
        Ok(entries)
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let history = guard(&self.history);
        f.debug_struct("Journal")
            .field("transactions", &history.transactions)
            .field("cursor", &history.cursor)
            .finish()
    }
}
