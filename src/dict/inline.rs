//! Inline codecs for small numeric and temporal literals. These pack a
//! value directly into a term id's low 60 bits so no dictionary lookup is
//! needed to resolve them; see `dict::id` for the tag/value split.
use super::Error;
use super::id::{Tag, decode_id, encode_id};
use chrono::{DateTime, TimeZone, Utc};

pub type Result<T> = core::result::Result<T, Error>;

const INT_RANGE_BITS: u32 = 59;
/// Inline integers cover `[-2^59, 2^59)`.
pub const INTEGER_MIN: i64 = -(1i64 << INT_RANGE_BITS);
pub const INTEGER_MAX_EXCLUSIVE: i64 = 1i64 << INT_RANGE_BITS;

/// Encodes `n` as tag-4 inline integer, two's complement in 60 bits.
/// Out-of-range integers fall through to dictionary allocation.
pub fn encode_integer(n: i64) -> Result<u64> {
    if !(INTEGER_MIN..INTEGER_MAX_EXCLUSIVE).contains(&n) {
        return Err(Error::OutOfRange);
    }
    // mask to 60 bits keeps the two's complement representation intact.
    let payload = (n as u64) & 0x0FFF_FFFF_FFFF_FFFF;
    Ok(encode_id(Tag::Integer, payload))
}

pub fn decode_integer(id: u64) -> Result<i64> {
    let decoded = decode_id(id);
    if decoded.tag != Tag::Integer {
        return Err(Error::NotAnInteger);
    }
    // sign-extend the 60-bit payload back to i64.
    let shifted = (decoded.value << 4) as i64;
    Ok(shifted >> 4)
}

const DECIMAL_SIGN_SHIFT: u32 = 59;
const DECIMAL_EXP_SHIFT: u32 = 48;
const DECIMAL_EXP_MASK: u64 = 0x7FF;
const DECIMAL_MANTISSA_MASK: u64 = 0xFFFF_FFFF_FFFF; // 48 bits

/// Encodes `d` as tag-5 inline decimal: `sign(1) | biased_exponent(11) |
/// mantissa(48)`, bias 1023 (the same layout IEEE-754 doubles use, truncated
/// to a 48-bit mantissa). Zero is the special all-zero payload. Values whose
/// mantissa doesn't fit exactly in 48 bits, or that are subnormal, infinite
/// or NaN, fall through to dictionary allocation.
pub fn encode_decimal(d: f64) -> Result<u64> {
    if d == 0.0 {
        return Ok(encode_id(Tag::Decimal, 0));
    }
    if !d.is_finite() {
        return Err(Error::OutOfRange);
    }
    let bits = d.to_bits();
    let sign = (bits >> 63) & 1;
    let exponent = (bits >> 52) & DECIMAL_EXP_MASK;
    let mantissa = bits & 0x000F_FFFF_FFFF_FFFF; // 52 bits
    if exponent == 0 || exponent == DECIMAL_EXP_MASK {
        // subnormal, infinity or NaN: not representable in this inline form.
        return Err(Error::OutOfRange);
    }
    if mantissa & 0xF != 0 {
        // low 4 bits would be lost: doesn't fit in 48 bits exactly.
        return Err(Error::OutOfRange);
    }
    let mantissa48 = mantissa >> 4;
    let payload = (sign << DECIMAL_SIGN_SHIFT) | (exponent << DECIMAL_EXP_SHIFT) | mantissa48;
    Ok(encode_id(Tag::Decimal, payload))
}

pub fn decode_decimal(id: u64) -> Result<f64> {
    let decoded = decode_id(id);
    if decoded.tag != Tag::Decimal {
        return Err(Error::NotADecimal);
    }
    if decoded.value == 0 {
        return Ok(0.0);
    }
    let sign = (decoded.value >> DECIMAL_SIGN_SHIFT) & 1;
    let exponent = (decoded.value >> DECIMAL_EXP_SHIFT) & DECIMAL_EXP_MASK;
    let mantissa48 = decoded.value & DECIMAL_MANTISSA_MASK;
    let bits = (sign << 63) | (exponent << 52) | (mantissa48 << 4);
    Ok(f64::from_bits(bits))
}

/// Inline date-times cover UTC milliseconds since the epoch in `[0, 2^60)`.
pub const DATETIME_MAX_EXCLUSIVE_MS: i64 = 1i64 << 60;

/// Encodes `dt`, normalising to UTC first. Dates before 1970-01-01 fall
/// through to dictionary allocation (`out_of_range`); sub-millisecond
/// precision is lost.
pub fn encode_datetime(dt: DateTime<Utc>) -> Result<u64> {
    let ms = dt.timestamp_millis();
    if !(0..DATETIME_MAX_EXCLUSIVE_MS).contains(&ms) {
        return Err(Error::OutOfRange);
    }
    Ok(encode_id(Tag::DateTime, ms as u64))
}

pub fn decode_datetime(id: u64) -> Result<DateTime<Utc>> {
    let decoded = decode_id(id);
    if decoded.tag != Tag::DateTime {
        return Err(Error::NotADatetime);
    }
    Utc.timestamp_millis_opt(decoded.value as i64)
        .single()
        .ok_or(Error::NotADatetime)
}
