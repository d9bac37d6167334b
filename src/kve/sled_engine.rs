use super::{BatchOp, Cf, Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// `sled`-backed implementation of the key-value engine.
///
/// Each [`Cf`] maps to an independent [`sled::Tree`]; multi-key writes go
/// through `sled`'s transactional API so that I2 (no partial triple is ever
/// observable) holds regardless of which trees a batch touches.
///
/// Cloning an `Engine` is cheap: `sled::Db` and `sled::Tree` are themselves
/// `Arc`-backed, so a clone held by a live iterator or snapshot keeps the
/// underlying store alive even after [`Engine::close`] has been called on
/// the original handle.
#[derive(Clone)]
pub struct SledEngine {
    db: sled::Db,
    trees: Arc<[sled::Tree; 6]>,
    closed: Arc<AtomicBool>,
}

impl SledEngine {
    /// Opens the store at `path`, creating column families that don't exist yet.
    /// Idempotent on an existing store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        let mut trees = Vec::with_capacity(Cf::ALL.len());
        for cf in Cf::ALL {
            trees.push(db.open_tree(cf.name())?);
        }
        let trees: [sled::Tree; 6] = trees.try_into().unwrap_or_else(|_| unreachable!());
        Ok(SledEngine {
            db,
            trees: Arc::new(trees),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn tree(&self, cf: Cf) -> &sled::Tree {
        &self.trees[cf as usize]
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::AlreadyClosed)
        } else {
            Ok(())
        }
    }

    /// Marks the handle closed. Outstanding iterators/snapshots keep their own
    /// clone of the underlying trees and continue to read the live (or, for a
    /// snapshot, frozen) view; see module docs.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Flushes all pending writes to disk. Used on graceful shutdown.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    pub fn get(&self, cf: Cf, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.tree(cf).get(key)?.map(|v| v.to_vec()))
    }

    pub fn put(&self, cf: Cf, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;
        self.tree(cf).insert(key, value)?;
        Ok(())
    }

    /// Deleting an absent key is a no-op, never an error.
    pub fn delete(&self, cf: Cf, key: &[u8]) -> Result<()> {
        self.check_open()?;
        self.tree(cf).remove(key)?;
        Ok(())
    }

    pub fn exists(&self, cf: Cf, key: &[u8]) -> Result<bool> {
        self.check_open()?;
        Ok(self.tree(cf).contains_key(key)?)
    }

    /// Commits `ops` atomically across however many column families they
    /// touch: either every op becomes visible, or none does.
    pub fn write_batch(&self, ops: &[BatchOp]) -> Result<()> {
        self.check_open()?;
        if ops.is_empty() {
            return Ok(());
        }
        let touched: Vec<Cf> = {
            let mut seen = Vec::new();
            for op in ops {
                let cf = match op {
                    BatchOp::Put { cf, .. } | BatchOp::Delete { cf, .. } => *cf,
                };
                if !seen.contains(&cf) {
                    seen.push(cf);
                }
            }
            seen
        };
        let trees: Vec<&sled::Tree> = touched.iter().map(|cf| self.tree(*cf)).collect();
        let result: sled::transaction::TransactionResult<(), ()> =
            trees.as_slice().transaction(|trees_tx| {
                for op in ops {
                    let cf = match op {
                        BatchOp::Put { cf, .. } | BatchOp::Delete { cf, .. } => *cf,
                    };
                    let idx = touched
                        .iter()
                        .position(|c| *c == cf)
                        .unwrap_or_else(|| unreachable!());
                    match op {
                        BatchOp::Put { key, value, .. } => {
                            trees_tx[idx].insert(key.as_slice(), value.as_slice())?;
                        }
                        BatchOp::Delete { key, .. } => {
                            trees_tx[idx].remove(key.as_slice())?;
                        }
                    }
                }
                Ok(())
            });
        match result {
            Ok(()) => Ok(()),
            Err(sled::transaction::TransactionError::Storage(e)) => Err(Error::Engine(e)),
            Err(sled::transaction::TransactionError::Abort(())) => {
                unreachable!("the transaction closure never calls abort")
            }
        }
    }

    /// Ascending prefix scan over `cf`. The returned iterator owns a clone of
    /// the underlying tree, so it keeps functioning even if the originating
    /// `Engine` handle is closed in the meantime.
    pub fn prefix_iterator(&self, cf: Cf, prefix: &[u8]) -> Result<PrefixIter> {
        self.check_open()?;
        Ok(PrefixIter {
            inner: self.tree(cf).scan_prefix(prefix),
        })
    }

    /// Takes a consistent point-in-time view of every column family. The
    /// snapshot is immune to writes committed after this call.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.check_open()?;
        let mut frozen = std::collections::HashMap::new();
        for cf in Cf::ALL {
            let mut map = BTreeMap::new();
            for item in self.tree(cf).iter() {
                let (k, v) = item?;
                map.insert(k.to_vec(), v.to_vec());
            }
            frozen.insert(cf as u8, map);
        }
        Ok(Snapshot {
            frozen: Arc::new(frozen),
        })
    }
}

use sled::transaction::Transactional as _;

pub struct PrefixIter {
    inner: sled::Iter,
}

impl Iterator for PrefixIter {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| {
            r.map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(Error::from)
        })
    }
}

/// A frozen, point-in-time view over every column family, taken by
/// [`SledEngine::snapshot`]. Cheap to clone (`Arc`-backed); reads against it
/// never observe writes committed after the snapshot was taken.
type FrozenColumnFamilies = std::collections::HashMap<u8, BTreeMap<Vec<u8>, Vec<u8>>>;

#[derive(Clone)]
pub struct Snapshot {
    frozen: Arc<FrozenColumnFamilies>,
}

impl Snapshot {
    pub fn get(&self, cf: Cf, key: &[u8]) -> Option<Vec<u8>> {
        self.frozen
            .get(&(cf as u8))
            .and_then(|m| m.get(key).cloned())
    }

    pub fn prefix_iterator(&self, cf: Cf, prefix: &[u8]) -> SnapshotPrefixIter {
        let items: Vec<(Vec<u8>, Vec<u8>)> = self
            .frozen
            .get(&(cf as u8))
            .map(|m| {
                m.range(prefix.to_vec()..)
                    .take_while(|(k, _)| k.starts_with(prefix))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        SnapshotPrefixIter {
            items: items.into_iter(),
        }
    }
}

pub struct SnapshotPrefixIter {
    items: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for SnapshotPrefixIter {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}
