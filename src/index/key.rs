//! 24-byte big-endian key encoding for the three triple orderings.
//!
//! Each key is three 8-byte big-endian ids concatenated in the index's own
//! order; decoding is the obvious inverse and always yields the canonical
//! `(s,p,o)` order regardless of which index the key came from.
use super::Error;
use crate::kve::Cf;

fn be(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn word(bytes: &[u8], at: usize) -> u64 {
    u64::from_be_bytes(
        bytes[at..at + 8]
            .try_into()
            .unwrap_or_else(|_| unreachable!()),
    )
}

pub fn spo_key(s: u64, p: u64, o: u64) -> [u8; 24] {
    let mut out = [0u8; 24];
    out[0..8].copy_from_slice(&be(s));
    out[8..16].copy_from_slice(&be(p));
    out[16..24].copy_from_slice(&be(o));
    out
}

pub fn pos_key(s: u64, p: u64, o: u64) -> [u8; 24] {
    let mut out = [0u8; 24];
    out[0..8].copy_from_slice(&be(p));
    out[8..16].copy_from_slice(&be(o));
    out[16..24].copy_from_slice(&be(s));
    out
}

pub fn osp_key(s: u64, p: u64, o: u64) -> [u8; 24] {
    let mut out = [0u8; 24];
    out[0..8].copy_from_slice(&be(o));
    out[8..16].copy_from_slice(&be(s));
    out[16..24].copy_from_slice(&be(p));
    out
}

/// Decodes a key from `cf`'s ordering into the canonical `(s,p,o)` triple.
pub fn key_to_triple(cf: Cf, key: &[u8]) -> Result<(u64, u64, u64), Error> {
    if key.len() != 24 {
        log::error!("triple index key has invalid length {}", key.len());
        return Err(Error::InvalidKey { len: key.len() });
    }
    let (a, b, c) = (word(key, 0), word(key, 8), word(key, 16));
    Ok(match cf {
        Cf::Spo => (a, b, c),
        Cf::Pos => (c, a, b),
        Cf::Osp => (b, c, a),
        _ => unreachable!("key_to_triple is only meaningful for the three triple indices"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_ordering_round_trips_through_key_to_triple() {
        let (s, p, o) = (11, 22, 33);
        assert_eq!(
            key_to_triple(Cf::Spo, &spo_key(s, p, o)).unwrap(),
            (s, p, o)
        );
        assert_eq!(
            key_to_triple(Cf::Pos, &pos_key(s, p, o)).unwrap(),
            (s, p, o)
        );
        assert_eq!(
            key_to_triple(Cf::Osp, &osp_key(s, p, o)).unwrap(),
            (s, p, o)
        );
    }

    #[test]
    fn wrong_length_key_is_rejected() {
        assert!(matches!(
            key_to_triple(Cf::Spo, &[0; 23]),
            Err(Error::InvalidKey { len: 23 })
        ));
    }

    #[test]
    fn lexicographic_order_matches_numeric_order() {
        let lower = spo_key(1, 5, 5);
        let higher = spo_key(1, 5, 6);
        assert!(lower.as_slice() < higher.as_slice());
        let lower = spo_key(1, 5, 5);
        let higher = spo_key(2, 0, 0);
        assert!(lower.as_slice() < higher.as_slice());
    }
}
