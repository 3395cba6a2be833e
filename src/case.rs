//! The session-scoped handle to a case document.
//!
//! A [`Case`] wraps exactly one [`Document`] for the lifetime of a
//! configuration session. Every model constructed over a case holds a
//! clone of the same handle and therefore sees the same document:
//! mutations are immediately visible to all holders, with no isolation
//! between them. The crate is single-threaded by design; callers
//! serialize access by routing mutation through one component at a
//! time.

use std::{
    cell::{Cell, RefCell},
    path::Path,
    rc::Rc,
};

use crate::{
    document::Document,
    storage::{self, LoadError, SaveError},
};

/// Counters of document accesses made through a [`Case`].
///
/// Used to verify access contracts, most importantly that constructing
/// a model performs no document access at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessStats {
    /// Number of shared (read-only) document accesses.
    pub reads: u64,
    /// Number of exclusive (read-write) document accesses.
    pub writes: u64,
}

#[derive(Debug, Default)]
struct CaseInner {
    document: RefCell<Document>,
    reads: Cell<u64>,
    writes: Cell<u64>,
}

/// A shared handle wrapping one [`Document`].
///
/// Cloning a `Case` clones the handle, not the document; all clones
/// refer to the same underlying tree. The document itself can never be
/// replaced through a `Case`, only mutated.
#[derive(Debug, Clone, Default)]
pub struct Case {
    inner: Rc<CaseInner>,
}

impl Case {
    /// Creates a case over a new, empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a case over an existing document.
    #[must_use]
    pub fn from_document(document: Document) -> Self {
        Self {
            inner: Rc::new(CaseInner {
                document: RefCell::new(document),
                reads: Cell::new(0),
                writes: Cell::new(0),
            }),
        }
    }

    /// Loads a case document from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or
    /// declares an unsupported format version. No case is produced on
    /// failure.
    pub fn load_path(path: &Path) -> Result<Self, LoadError> {
        Ok(Self::from_document(storage::load_path(path)?))
    }

    /// Saves the case document to a file path.
    ///
    /// Saving is a pure serialization; the document is not modified and
    /// the access counters do not count it as a document access by a
    /// model.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the destination cannot
    /// be written.
    pub fn save_path(&self, path: &Path) -> Result<(), SaveError> {
        storage::save_path(path, &self.inner.document.borrow())
    }

    /// Runs a closure with shared access to the document.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within an [`Self::edit`]
    /// closure on the same case; access is strictly serialized.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        self.inner.reads.set(self.inner.reads.get() + 1);
        f(&self.inner.document.borrow())
    }

    /// Runs a closure with exclusive access to the document.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within a [`Self::read`] or
    /// [`Self::edit`] closure on the same case.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        self.inner.writes.set(self.inner.writes.get() + 1);
        f(&mut self.inner.document.borrow_mut())
    }

    /// Returns the access counters for this case.
    #[must_use]
    pub fn stats(&self) -> AccessStats {
        AccessStats {
            reads: self.inner.reads.get(),
            writes: self.inner.writes.get(),
        }
    }

    /// Returns `true` if `other` wraps the same document instance.
    #[must_use]
    pub fn shares_document_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;

    #[test]
    fn clones_share_the_same_document() {
        let case = Case::new();
        let alias = case.clone();
        assert!(case.shares_document_with(&alias));

        alias.edit(|document| {
            let root = document.root();
            document.set_attr(root, "study", "evaporator");
        });

        // The mutation is immediately visible through the other handle.
        let study = case.read(|document| {
            document.attr(document.root(), "study").cloned()
        });
        assert_eq!(study, Some(Value::from("evaporator")));
    }

    #[test]
    fn counters_track_reads_and_writes() {
        let case = Case::new();
        assert_eq!(case.stats(), AccessStats::default());

        case.read(|_| ());
        case.read(|_| ());
        case.edit(|_| ());

        let stats = case.stats();
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("case.yml");

        let case = Case::new();
        case.edit(|document| {
            let node = document.ensure_path(&"fields".parse().unwrap());
            document.set_attr(node, "count", 2i64);
        });
        case.save_path(&file).unwrap();

        let loaded = Case::load_path(&file).unwrap();
        let count = loaded.read(|document| {
            let node = document.peek_path(&"fields".parse().unwrap()).unwrap();
            document.peek_var::<i64>(node, "count")
        });
        assert_eq!(count, Some(2));
    }
}
