//! Pluggable ordered key-value engine façade.
//!
//! The dictionary and index layers never talk to [`sled`] directly; they go
//! through [`Engine`], [`BatchOp`] and the column family enum in this module.
//! Swapping the backing store later means writing one more file here, not
//! touching `dict` or `index`.
mod sled_engine;

pub use sled_engine::{PrefixIter, SledEngine, Snapshot, SnapshotPrefixIter};

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// The error type for KVE operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("engine error")]
    Engine(#[from] sled::Error),
    #[error("operation attempted on a closed store")]
    AlreadyClosed,
}

/// Logical key-spaces within the store. Each maps to one independent
/// ordered tree in the backing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cf {
    /// allocated id -> encoded term
    Id2Str = 0,
    /// encoded term -> allocated id
    Str2Id = 1,
    /// subject,predicate,object ordered index
    Spo = 2,
    /// predicate,object,subject ordered index
    Pos = 3,
    /// object,subject,predicate ordered index
    Osp = 4,
    /// materialised inferences, visible to the reasoner only
    Derived = 5,
}

impl Cf {
    pub const ALL: [Cf; 6] = [
        Cf::Id2Str,
        Cf::Str2Id,
        Cf::Spo,
        Cf::Pos,
        Cf::Osp,
        Cf::Derived,
    ];

    fn name(self) -> &'static str {
        match self {
            Cf::Id2Str => "id2str",
            Cf::Str2Id => "str2id",
            Cf::Spo => "spo",
            Cf::Pos => "pos",
            Cf::Osp => "osp",
            Cf::Derived => "derived",
        }
    }
}

/// One put or delete, addressed to a specific column family. A list of these
/// is what [`Engine::write_batch`] commits atomically.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put {
        cf: Cf,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: Cf,
        key: Vec<u8>,
    },
}

impl BatchOp {
    pub fn put(cf: Cf, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOp::Put {
            cf,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(cf: Cf, key: impl Into<Vec<u8>>) -> Self {
        BatchOp::Delete {
            cf,
            key: key.into(),
        }
    }
}
