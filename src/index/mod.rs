//! The three triple orderings (SPO/POS/OSP) kept consistent under one
//! atomic write path, plus pattern-driven lookup built on [`crate::pattern`].
pub mod key;

pub use key::key_to_triple;

use crate::kve::{BatchOp, Cf, PrefixIter, SledEngine};
use crate::pattern::{self, Filter, Pattern, triple_matches_pattern};
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// The error type for index operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("index key is {len} bytes, expected 24")]
    InvalidKey { len: usize },
    #[error("engine error")]
    Kve(#[from] crate::kve::Error),
}

/// Maintains SPO/POS/OSP consistently and answers pattern-driven scans.
pub struct Index {
    engine: SledEngine,
}

impl Index {
    pub fn open(engine: SledEngine) -> Self {
        Index { engine }
    }

    /// Idempotent: re-inserting an existing triple is a no-op write, not an
    /// error.
    pub fn insert_triple(&self, s: u64, p: u64, o: u64) -> Result<()> {
        self.insert_triples(&[(s, p, o)])
    }

    /// Packs the whole list into one batch: either every triple is
    /// inserted, or none is.
    pub fn insert_triples(&self, triples: &[(u64, u64, u64)]) -> Result<()> {
        let mut ops = Vec::with_capacity(triples.len() * 3);
        for &(s, p, o) in triples {
            ops.push(BatchOp::put(
                Cf::Spo,
                key::spo_key(s, p, o).to_vec(),
                Vec::new(),
            ));
            ops.push(BatchOp::put(
                Cf::Pos,
                key::pos_key(s, p, o).to_vec(),
                Vec::new(),
            ));
            ops.push(BatchOp::put(
                Cf::Osp,
                key::osp_key(s, p, o).to_vec(),
                Vec::new(),
            ));
        }
        self.engine.write_batch(&ops)?;
        Ok(())
    }

    /// Deleting an absent triple is not an error.
    pub fn delete_triple(&self, s: u64, p: u64, o: u64) -> Result<()> {
        self.delete_triples(&[(s, p, o)])
    }

    pub fn delete_triples(&self, triples: &[(u64, u64, u64)]) -> Result<()> {
        let mut ops = Vec::with_capacity(triples.len() * 3);
        for &(s, p, o) in triples {
            ops.push(BatchOp::delete(Cf::Spo, key::spo_key(s, p, o).to_vec()));
            ops.push(BatchOp::delete(Cf::Pos, key::pos_key(s, p, o).to_vec()));
            ops.push(BatchOp::delete(Cf::Osp, key::osp_key(s, p, o).to_vec()));
        }
        self.engine.write_batch(&ops)?;
        Ok(())
    }

    /// Existence fast path against SPO.
    pub fn triple_exists(&self, s: u64, p: u64, o: u64) -> Result<bool> {
        Ok(self.engine.exists(Cf::Spo, &key::spo_key(s, p, o))?)
    }

    /// A lazy, non-restartable sequence of matching triples. Holds the
    /// underlying iterator's resources until exhausted or dropped.
    pub fn lookup(&self, pattern: Pattern) -> Lookup {
        let plan = pattern::select_index(&pattern);
        let (inner, open_error) = match self.engine.prefix_iterator(plan.index, &plan.prefix) {
            Ok(iter) => (Some(iter), None),
            Err(e) => (None, Some(Error::from(e))),
        };
        Lookup {
            inner,
            open_error,
            cf: plan.index,
            filter: plan.filter,
        }
    }

    pub fn lookup_all(&self, pattern: Pattern) -> Result<Vec<(u64, u64, u64)>> {
        self.lookup(pattern).collect()
    }

    /// Cardinality of `pattern`'s match set, without materialising tuples.
    pub fn count(&self, pattern: Pattern) -> Result<usize> {
        let mut n = 0;
        for item in self.lookup(pattern) {
            item?;
            n += 1;
        }
        Ok(n)
    }
}

/// The lazy sequence returned by [`Index::lookup`]. If the engine was already
/// closed when the scan was opened, the first (and only) item is that error.
pub struct Lookup {
    inner: Option<PrefixIter>,
    open_error: Option<Error>,
    cf: Cf,
    filter: Filter,
}

impl Iterator for Lookup {
    type Item = Result<(u64, u64, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.open_error.take() {
            return Some(Err(e));
        }
        let inner = self.inner.as_mut()?;
        loop {
            let (key, _value) = match inner.next()? {
                Ok(kv) => kv,
                Err(e) => return Some(Err(e.into())),
            };
            let triple = match key::key_to_triple(self.cf, &key) {
                Ok(t) => t,
                Err(e) => return Some(Err(e)),
            };
            match self.filter {
                Filter::None => return Some(Ok(triple)),
                Filter::Residual(pattern) => {
                    if triple_matches_pattern(triple, &pattern) {
                        return Some(Ok(triple));
                    }
                    continue;
                }
            }
        }
    }
}
