//! The RDF term model, its validation rules and its binary serialisation.
//!
//! Serialisation on the `id2str`/`str2id` sides only has to be a bijection
//! between terms and byte-strings with deterministic sort; the exact layout
//! below (kind discriminator, then NFC-normalised UTF-8, with a length
//! prefix splitting datatype/language tag from lexical form) is this
//! implementation's choice, not a format other stores need to read.
use super::Error;
use unicode_normalization::UnicodeNormalization;

pub type Result<T> = core::result::Result<T, Error>;

/// Maximum size in bytes of a term's primary content (the URI, blank node
/// label, or literal lexical form) prior to NFC normalisation.
pub const MAX_TERM_BYTES: usize = 16 * 1024;

/// Which of the three term shapes a candidate binary is being validated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Uri,
    BlankNode,
    Literal,
}

/// An RDF term: an IRI, a blank node, or a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Uri(String),
    BlankNode(String),
    Literal(Literal),
}

/// A literal carries at most one of a datatype IRI or a language tag, never
/// both; this enum makes the third combination unrepresentable instead of
/// leaving it to be checked (or missed) at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralTag {
    Plain,
    Datatype(String),
    Lang(String),
}

/// A literal's lexical form plus its tag (none, a datatype IRI, or a
/// language tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub lexical: String,
    pub tag: LiteralTag,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            tag: LiteralTag::Plain,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            tag: LiteralTag::Datatype(datatype.into()),
        }
    }

    pub fn lang(lexical: impl Into<String>, lang: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            tag: LiteralTag::Lang(lang.into()),
        }
    }
}

impl Term {
    fn kind(&self) -> TermKind {
        match self {
            Term::Uri(_) => TermKind::Uri,
            Term::BlankNode(_) => TermKind::BlankNode,
            Term::Literal(_) => TermKind::Literal,
        }
    }

    /// The term's primary content, validated for size/UTF-8/null-byte rules
    /// before normalisation: the URI string, the blank node label, or the
    /// literal's lexical form.
    fn primary_content(&self) -> &str {
        match self {
            Term::Uri(s) => s,
            Term::BlankNode(s) => s,
            Term::Literal(lit) => &lit.lexical,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_term(self.primary_content().as_bytes(), self.kind())
    }

    /// Bijective binary encoding used as the `str2id` key and `id2str` value.
    /// Strings are NFC-normalised first so canonically equivalent forms map
    /// to the same id (I1).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Term::Uri(s) => {
                out.push(0);
                out.extend(nfc(s).into_bytes());
            }
            Term::BlankNode(s) => {
                out.push(1);
                out.extend(nfc(s).into_bytes());
            }
            Term::Literal(Literal {
                lexical,
                tag: LiteralTag::Plain,
            }) => {
                out.push(2);
                out.extend(nfc(lexical).into_bytes());
            }
            Term::Literal(Literal {
                lexical,
                tag: LiteralTag::Datatype(dt),
            }) => {
                out.push(3);
                write_len_prefixed(&mut out, &nfc(dt));
                out.extend(nfc(lexical).into_bytes());
            }
            Term::Literal(Literal {
                lexical,
                tag: LiteralTag::Lang(tag),
            }) => {
                out.push(4);
                write_len_prefixed(&mut out, &nfc(tag));
                out.extend(nfc(lexical).into_bytes());
            }
        }
        out
    }

    /// Inverse of [`Term::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Term> {
        let (&disc, rest) = bytes.split_first().ok_or(Error::InvalidUtf8)?;
        match disc {
            0 => Ok(Term::Uri(to_string(rest)?)),
            1 => Ok(Term::BlankNode(to_string(rest)?)),
            2 => Ok(Term::Literal(Literal::plain(to_string(rest)?))),
            3 => {
                let (tag, lexical) = read_len_prefixed(rest)?;
                Ok(Term::Literal(Literal::typed(to_string(lexical)?, tag)))
            }
            4 => {
                let (tag, lexical) = read_len_prefixed(rest)?;
                Ok(Term::Literal(Literal::lang(to_string(lexical)?, tag)))
            }
            _ => Err(Error::InvalidUtf8),
        }
    }
}

fn nfc(s: &str) -> String {
    s.nfc().collect()
}

fn to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| Error::InvalidUtf8)
}

fn write_len_prefixed(out: &mut Vec<u8>, s: &str) {
    out.extend((s.len() as u32).to_be_bytes());
    out.extend(s.as_bytes());
}

fn read_len_prefixed(bytes: &[u8]) -> Result<(String, &[u8])> {
    if bytes.len() < 4 {
        return Err(Error::InvalidUtf8);
    }
    let len =
        u32::from_be_bytes(bytes[0..4].try_into().unwrap_or_else(|_| unreachable!())) as usize;
    let rest = &bytes[4..];
    if rest.len() < len {
        return Err(Error::InvalidUtf8);
    }
    let tag = to_string(&rest[..len])?;
    Ok((tag, &rest[len..]))
}

/// Validates a candidate term binary prior to dictionary allocation:
/// size, null bytes (URIs only), and UTF-8, per spec.
pub fn validate_term(bytes: &[u8], kind: TermKind) -> Result<()> {
    if bytes.len() > MAX_TERM_BYTES {
        return Err(Error::TermTooLarge);
    }
    if kind == TermKind::Uri && bytes.contains(&0) {
        return Err(Error::NullByteInUri);
    }
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
    Ok(())
}
