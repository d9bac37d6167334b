//! Bidirectional mapping between RDF terms and 64-bit tagged ids.
//!
//! Allocated terms (URIs, blank nodes, literals) go through a single-writer
//! coordinator and two column families (`str2id`, `id2str`); small numeric
//! and temporal literals never touch storage at all, see [`inline`].
pub mod id;
pub mod inline;
mod sequence;
pub mod term;

pub use id::{Tag, decode_id, encode_id, is_allocated, is_inline, type_of};
pub use inline::{
    decode_datetime, decode_decimal, decode_integer, encode_datetime, encode_decimal,
    encode_integer,
};
pub use term::{Literal, LiteralTag, Term, TermKind, validate_term};

use crate::kve::{BatchOp, Cf, SledEngine};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use sequence::SequenceCounter;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// The error type for dictionary operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("term exceeds the maximum encoded size")]
    TermTooLarge,
    #[error("URI term contains a null byte")]
    NullByteInUri,
    #[error("term is not valid UTF-8")]
    InvalidUtf8,
    #[error("value cannot be represented by this inline codec")]
    OutOfRange,
    #[error("id does not decode as an inline integer")]
    NotAnInteger,
    #[error("id does not decode as an inline decimal")]
    NotADecimal,
    #[error("id does not decode as an inline date-time")]
    NotADatetime,
    #[error("sequence counter for {tag:?} has reached its ceiling")]
    SequenceOverflow { tag: Tag },
    #[error("id {id} is allocated-shaped but has no entry in id2str")]
    CorruptId { id: u64 },
    #[error("term or id not found")]
    NotFound,
    #[error("engine error")]
    Kve(#[from] crate::kve::Error),
}

/// Bijective mapping between RDF terms and 64-bit tagged ids.
pub struct Dictionary {
    engine: SledEngine,
    uris: SequenceCounter,
    blank_nodes: SequenceCounter,
    literals: SequenceCounter,
    /// Serialises the read-check/allocate/write sequence in `get_or_create_id`
    /// so two concurrent callers presenting the same new term converge on one
    /// allocation (P9). Readers never take this lock.
    coordinator: Mutex<()>,
}

fn tag_of_kind(kind: TermKind) -> Tag {
    match kind {
        TermKind::Uri => Tag::Uri,
        TermKind::BlankNode => Tag::BlankNode,
        TermKind::Literal => Tag::Literal,
    }
}

impl Dictionary {
    pub fn open(engine: SledEngine) -> Result<Self> {
        Ok(Dictionary {
            uris: SequenceCounter::load(&engine, Tag::Uri)?,
            blank_nodes: SequenceCounter::load(&engine, Tag::BlankNode)?,
            literals: SequenceCounter::load(&engine, Tag::Literal)?,
            engine,
            coordinator: Mutex::new(()),
        })
    }

    fn counter(&self, tag: Tag) -> &SequenceCounter {
        match tag {
            Tag::Uri => &self.uris,
            Tag::BlankNode => &self.blank_nodes,
            Tag::Literal => &self.literals,
            _ => unreachable!("only allocated-type tags have a sequence counter"),
        }
    }

    /// Flushes every sequence counter's current value. Call on graceful
    /// shutdown in addition to the periodic checkpoints taken during
    /// allocation.
    pub fn checkpoint(&self) -> Result<()> {
        self.uris.checkpoint(&self.engine)?;
        self.blank_nodes.checkpoint(&self.engine)?;
        self.literals.checkpoint(&self.engine)?;
        Ok(())
    }

    /// Number of ids allocated so far for `tag` (introspection only; not
    /// part of the persisted format).
    pub fn allocated_count(&self, tag: Tag) -> u64 {
        self.counter(tag).current()
    }

    /// Looks up an existing term's id. Bypasses the coordinator: readers go
    /// straight to the engine.
    pub fn lookup_id(&self, term: &Term) -> Result<Option<u64>> {
        term.validate()?;
        let key = term.encode();
        match self.engine.get(Cf::Str2Id, &key)? {
            Some(bytes) => Ok(Some(decode_u64(&bytes))),
            None => Ok(None),
        }
    }

    /// Resolves an id back to its term. Handles inline-encoded ids without
    /// touching the engine at all.
    pub fn lookup_term(&self, id: u64) -> Result<Option<Term>> {
        let decoded = id::decode_id(id);
        match decoded.tag {
            Tag::Integer => Ok(Some(inline_integer_literal(id)?)),
            Tag::Decimal => Ok(Some(inline_decimal_literal(id)?)),
            Tag::DateTime => Ok(Some(inline_datetime_literal(id)?)),
            Tag::Uri | Tag::BlankNode | Tag::Literal => {
                match self.engine.get(Cf::Id2Str, &id.to_be_bytes())? {
                    Some(bytes) => Ok(Some(Term::decode(&bytes)?)),
                    None => Ok(None),
                }
            }
            Tag::Unknown(raw) => {
                log::error!("id {id} carries unrecognized tag bits {raw:#x}");
                Err(Error::CorruptId { id })
            }
        }
    }

    /// Atomically returns the existing id for `term`, allocating a new one
    /// under the single-writer coordinator if it's not already present.
    pub fn get_or_create_id(&self, term: &Term) -> Result<u64> {
        term.validate()?;
        let key = term.encode();
        if let Some(bytes) = self.engine.get(Cf::Str2Id, &key)? {
            return Ok(decode_u64(&bytes));
        }
        let _guard = self.coordinator.lock();
        // re-check: another writer may have allocated it while we waited.
        if let Some(bytes) = self.engine.get(Cf::Str2Id, &key)? {
            return Ok(decode_u64(&bytes));
        }
        let tag = tag_of_kind(term.kind_for_allocation());
        let seq = self.counter(tag).next(&self.engine)?;
        let id = id::encode_id(tag, seq);
        let value = term.encode();
        self.engine.write_batch(&[
            BatchOp::put(Cf::Str2Id, key, id.to_be_bytes().to_vec()),
            BatchOp::put(Cf::Id2Str, id.to_be_bytes().to_vec(), value),
        ])?;
        Ok(id)
    }

    /// Batch form of [`Dictionary::get_or_create_id`]. Preserves input
    /// order, short-circuits on the first fatal (validation) error, and
    /// commits every newly allocated mapping in a single atomic batch.
    pub fn get_or_create_ids(&self, terms: &[Term]) -> Result<Vec<u64>> {
        for term in terms {
            term.validate()?;
        }
        let _guard = self.coordinator.lock();
        let mut ids = Vec::with_capacity(terms.len());
        let mut ops = Vec::new();
        // terms repeated within this same batch must resolve to the id
        // allocated by their first occurrence, not a fresh one each time.
        let mut pending: std::collections::HashMap<Vec<u8>, u64> = std::collections::HashMap::new();
        for term in terms {
            let key = term.encode();
            if let Some(&id) = pending.get(&key) {
                ids.push(id);
                continue;
            }
            if let Some(bytes) = self.engine.get(Cf::Str2Id, &key)? {
                let id = decode_u64(&bytes);
                pending.insert(key, id);
                ids.push(id);
                continue;
            }
            let tag = tag_of_kind(term.kind_for_allocation());
            let seq = self.counter(tag).next(&self.engine)?;
            let id = id::encode_id(tag, seq);
            let value = term.encode();
            ops.push(BatchOp::put(
                Cf::Str2Id,
                key.clone(),
                id.to_be_bytes().to_vec(),
            ));
            ops.push(BatchOp::put(Cf::Id2Str, id.to_be_bytes().to_vec(), value));
            pending.insert(key, id);
            ids.push(id);
        }
        if !ops.is_empty() {
            self.engine.write_batch(&ops)?;
        }
        Ok(ids)
    }

    /// Batch form of [`Dictionary::lookup_id`]. `Ok(None)` per item on a
    /// miss, preserving order; fails fast on the first validation error.
    pub fn lookup_ids(&self, terms: &[Term]) -> Result<Vec<Option<u64>>> {
        terms.iter().map(|t| self.lookup_id(t)).collect()
    }

    /// Batch form of [`Dictionary::lookup_term`].
    pub fn lookup_terms(&self, ids: &[u64]) -> Result<Vec<Option<Term>>> {
        ids.iter().map(|&id| self.lookup_term(id)).collect()
    }
}

impl Term {
    fn kind_for_allocation(&self) -> TermKind {
        match self {
            Term::Uri(_) => TermKind::Uri,
            Term::BlankNode(_) => TermKind::BlankNode,
            Term::Literal(_) => TermKind::Literal,
        }
    }
}

fn decode_u64(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes.try_into().unwrap_or([0; 8]))
}

const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

fn inline_integer_literal(id: u64) -> Result<Term> {
    let n = decode_integer(id)?;
    Ok(Term::Literal(Literal::typed(n.to_string(), XSD_INTEGER)))
}

fn inline_decimal_literal(id: u64) -> Result<Term> {
    let d = decode_decimal(id)?;
    Ok(Term::Literal(Literal::typed(
        format_decimal(d),
        XSD_DECIMAL,
    )))
}

fn inline_datetime_literal(id: u64) -> Result<Term> {
    let dt = decode_datetime(id)?;
    Ok(Term::Literal(Literal::typed(
        dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        XSD_DATETIME,
    )))
}

fn format_decimal(d: f64) -> String {
    if d == d.trunc() && d.is_finite() {
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}

#[allow(dead_code)]
fn epoch(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}
