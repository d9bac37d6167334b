//! Thin facade bundling one [`SledEngine`], one [`Dictionary`] and one
//! [`Index`] behind a single `open`/`close`, the way `Hdt` bundles `Dict` +
//! `TripleSect`. Adds no logic beyond what those three already define.
use crate::dict::{self, Dictionary, Term};
use crate::index::{self, Index};
use crate::kve::{self, SledEngine};
use crate::pattern::Pattern;
use std::path::Path;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `Store` operations: a union of the three subsystem
/// error types it bundles.
#[derive(Error, Debug)]
pub enum Error {
    #[error("engine error")]
    Kve(#[from] kve::Error),
    #[error("dictionary error")]
    Dict(#[from] dict::Error),
    #[error("index error")]
    Index(#[from] index::Error),
}

/// Tuning knobs for opening a store. Currently just the on-disk path;
/// mirrors `kvdb-sled`'s `DatabaseConfig` wrapping the underlying engine's
/// own config rather than inventing a new format.
pub struct StoreConfig {
    pub path: std::path::PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        StoreConfig {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// A persistent RDF triple store: dictionary encoding plus SPO/POS/OSP
/// indexing over one shared [`SledEngine`] handle.
pub struct Store {
    engine: SledEngine,
    dict: Dictionary,
    index: Index,
}

impl Store {
    pub fn open(config: StoreConfig) -> Result<Self> {
        let engine = SledEngine::open(&config.path)?;
        let dict = Dictionary::open(engine.clone())?;
        let index = Index::open(engine.clone());
        log::info!("opened store at {}", config.path.display());
        Ok(Store {
            engine,
            dict,
            index,
        })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Resolves a term to its id, allocating one if it's new.
    pub fn get_or_create_id(&self, term: &Term) -> Result<u64> {
        Ok(self.dict.get_or_create_id(term)?)
    }

    /// Inserts a triple of terms: resolves each term to an id, then inserts
    /// into the three orderings.
    pub fn insert(&self, s: &Term, p: &Term, o: &Term) -> Result<()> {
        let ids = self
            .dict
            .get_or_create_ids(&[s.clone(), p.clone(), o.clone()])?;
        self.index.insert_triple(ids[0], ids[1], ids[2])?;
        Ok(())
    }

    pub fn lookup(&self, pattern: Pattern) -> index::Lookup {
        self.index.lookup(pattern)
    }

    /// Flushes the dictionary's sequence counters and the engine to disk,
    /// then marks the handle closed. Outstanding iterators/snapshots derived
    /// from this store keep working; see [`SledEngine`]'s lifetime contract.
    pub fn close(&self) -> Result<()> {
        self.dict.checkpoint()?;
        self.engine.flush()?;
        self.engine.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Binding::{Bound, Free};

    fn open_tmp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(StoreConfig::new(dir.path())).expect("open");
        (dir, store)
    }

    #[test]
    fn insert_terms_and_look_up_by_id() {
        let (_dir, store) = open_tmp();
        let s = Term::Uri("http://example.org/a".into());
        let p = Term::Uri("http://example.org/knows".into());
        let o = Term::Uri("http://example.org/b".into());
        store.insert(&s, &p, &o).unwrap();

        let s_id = store.get_or_create_id(&s).unwrap();
        let results = store
            .lookup(Pattern::new(Bound(s_id), Free, Free))
            .collect::<index::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn close_checkpoints_counters() {
        let (_dir, store) = open_tmp();
        let s = Term::Uri("http://example.org/a".into());
        store.get_or_create_id(&s).unwrap();
        store.close().unwrap();
    }
}
