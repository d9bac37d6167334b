//! Pure mapping from a triple pattern to the index, byte prefix and
//! optional residual filter that answer it. No I/O, no allocation beyond
//! the returned plan.
use crate::kve::Cf;

/// One position of a triple pattern: either bound to a specific id, or free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Bound(u64),
    Free,
}

impl Binding {
    pub fn is_bound(self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// A triple pattern: each position either bound to an id or free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub subject: Binding,
    pub predicate: Binding,
    pub object: Binding,
}

impl Pattern {
    pub fn new(subject: Binding, predicate: Binding, object: Binding) -> Self {
        Pattern {
            subject,
            predicate,
            object,
        }
    }

    fn shape(&self) -> (bool, bool, bool) {
        (
            self.subject.is_bound(),
            self.predicate.is_bound(),
            self.object.is_bound(),
        )
    }
}

/// A post-scan check applied to candidate triples. Every shape but `S?O`
/// is answered by a contiguous prefix scan that cannot produce a false
/// positive, so its filter is `None`; `S?O` carries a residual check
/// because no index orders `(s,o)` contiguously on its own — OSP's leading
/// `(o,s)` prefix already pins both bound positions exactly, so in
/// practice this re-check never drops anything, but it keeps the scan path
/// generic over "maybe filtered" the same way for every shape (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    None,
    /// re-check a decoded candidate against the full pattern.
    Residual(Pattern),
}

/// The plan a pattern resolves to: which index to scan, the byte prefix to
/// seek with, and any residual filter to apply to candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub index: Cf,
    pub prefix: Vec<u8>,
    pub filter: Filter,
}

fn be(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Maps a pattern to its scan plan, per the eight-shape table: every shape
/// but `S?O` is a contiguous prefix scan on one of SPO/POS/OSP; `S?O` scans
/// OSP on `(o,s)` and filters candidates on the bound predicate.
pub fn select_index(pattern: &Pattern) -> Plan {
    use Binding::Bound;
    match pattern.shape() {
        // bound bound bound
        (true, true, true) => {
            let (Bound(s), Bound(p), Bound(o)) =
                (pattern.subject, pattern.predicate, pattern.object)
            else {
                unreachable!()
            };
            let mut prefix = Vec::with_capacity(24);
            prefix.extend(be(s));
            prefix.extend(be(p));
            prefix.extend(be(o));
            Plan {
                index: Cf::Spo,
                prefix,
                filter: Filter::None,
            }
        }
        // bound bound free
        (true, true, false) => {
            let (Bound(s), Bound(p)) = (pattern.subject, pattern.predicate) else {
                unreachable!()
            };
            let mut prefix = Vec::with_capacity(16);
            prefix.extend(be(s));
            prefix.extend(be(p));
            Plan {
                index: Cf::Spo,
                prefix,
                filter: Filter::None,
            }
        }
        // bound free free
        (true, false, false) => {
            let Bound(s) = pattern.subject else {
                unreachable!()
            };
            Plan {
                index: Cf::Spo,
                prefix: be(s).to_vec(),
                filter: Filter::None,
            }
        }
        // free bound bound
        (false, true, true) => {
            let (Bound(p), Bound(o)) = (pattern.predicate, pattern.object) else {
                unreachable!()
            };
            let mut prefix = Vec::with_capacity(16);
            prefix.extend(be(p));
            prefix.extend(be(o));
            Plan {
                index: Cf::Pos,
                prefix,
                filter: Filter::None,
            }
        }
        // free bound free
        (false, true, false) => {
            let Bound(p) = pattern.predicate else {
                unreachable!()
            };
            Plan {
                index: Cf::Pos,
                prefix: be(p).to_vec(),
                filter: Filter::None,
            }
        }
        // free free bound
        (false, false, true) => {
            let Bound(o) = pattern.object else {
                unreachable!()
            };
            Plan {
                index: Cf::Osp,
                prefix: be(o).to_vec(),
                filter: Filter::None,
            }
        }
        // bound free bound: S?O. No index orders (s,o) contiguously, so we
        // scan OSP on (o,s) and carry a residual check over the full pattern.
        (true, false, true) => {
            let (Bound(s), Bound(o)) = (pattern.subject, pattern.object) else {
                unreachable!()
            };
            let mut prefix = Vec::with_capacity(16);
            prefix.extend(be(o));
            prefix.extend(be(s));
            Plan {
                index: Cf::Osp,
                prefix,
                filter: Filter::Residual(*pattern),
            }
        }
        // free free free: full scan.
        (false, false, false) => Plan {
            index: Cf::Spo,
            prefix: Vec::new(),
            filter: Filter::None,
        },
    }
}

/// Checks a concrete triple against a pattern; used by the residual filter
/// path and by tests.
pub fn triple_matches_pattern(triple: (u64, u64, u64), pattern: &Pattern) -> bool {
    let (s, p, o) = triple;
    matches(pattern.subject, s) && matches(pattern.predicate, p) && matches(pattern.object, o)
}

fn matches(binding: Binding, value: u64) -> bool {
    match binding {
        Binding::Bound(b) => b == value,
        Binding::Free => true,
    }
}
