//! Geohash and hash-key derivation, and partition-scoped range splitting.
//!
//! A point's geohash is the 64-bit id of its S2 leaf cell. Its hash key
//! (partition key) is the leading `K` decimal digits of that id. Because
//! partitions follow decimal digits rather than cell geometry, one cell's
//! id range can straddle several partitions and must be split before it
//! can be scanned with an equality predicate on the hash key.

use crate::types::{GeoHashRange, GeoPoint, PartitionRange};
use smallvec::SmallVec;

/// Partition-scoped pieces of one candidate range. Most cells stay in one partition.
pub type SplitRanges = SmallVec<[PartitionRange; 4]>;

/// S2 leaf cell id of the cell containing `point`.
pub fn geo_hash(point: &GeoPoint) -> u64 {
    s2::cellid::CellID::from(&point.to_latlng()).0
}

/// Number of decimal digits in `n` (`0` has one digit).
pub fn decimal_digits(n: u64) -> u32 {
    n.checked_ilog10().map_or(1, |d| d + 1)
}

/// Leading `hash_key_length` decimal digits of `geo_hash`.
///
/// Identifiers with no more than `hash_key_length` digits are their own hash key.
///
/// ```
/// use geokv::compute::ranges::hash_key;
///
/// assert_eq!(hash_key(5_221_366_598_369_370_112, 2), 52);
/// assert_eq!(hash_key(5_221_366_598_369_370_112, 4), 5221);
/// assert_eq!(hash_key(7, 2), 7);
/// ```
pub fn hash_key(geo_hash: u64, hash_key_length: u8) -> u64 {
    let digits = decimal_digits(geo_hash);
    let keep = u32::from(hash_key_length);
    if digits <= keep {
        return geo_hash;
    }
    geo_hash / pow10(digits - keep)
}

fn pow10(exp: u32) -> u64 {
    10u64.saturating_pow(exp)
}

/// Split `range` into pieces that each lie in exactly one partition.
///
/// The pieces are contiguous, ascending, and together cover `range` exactly.
pub fn split_range(range: GeoHashRange, hash_key_length: u8) -> SplitRanges {
    let mut out = SplitRanges::new();
    for piece in split_at_decades(range) {
        split_piece(piece, hash_key_length, &mut out);
    }
    out
}

/// Number of pieces [`split_range`] would produce, without building them.
pub fn split_count(range: GeoHashRange, hash_key_length: u8) -> u64 {
    split_at_decades(range)
        .into_iter()
        .map(|piece| {
            let min_hk = hash_key(piece.range_min, hash_key_length);
            let max_hk = hash_key(piece.range_max, hash_key_length);
            (max_hk - min_hk).saturating_add(1)
        })
        .fold(0u64, u64::saturating_add)
}

/// Cut a range wherever the decimal digit count of its values changes.
fn split_at_decades(range: GeoHashRange) -> SmallVec<[GeoHashRange; 2]> {
    let mut pieces = SmallVec::new();
    let mut lo = range.range_min;
    while decimal_digits(lo) < decimal_digits(range.range_max) {
        let boundary = pow10(decimal_digits(lo));
        pieces.push(GeoHashRange::new(lo, boundary - 1));
        lo = boundary;
    }
    pieces.push(GeoHashRange::new(lo, range.range_max));
    pieces
}

fn split_piece(piece: GeoHashRange, hash_key_length: u8, out: &mut SplitRanges) {
    let min_hk = hash_key(piece.range_min, hash_key_length);
    let max_hk = hash_key(piece.range_max, hash_key_length);

    if min_hk == max_hk {
        out.push(PartitionRange {
            hash_key: min_hk,
            range: piece,
        });
        return;
    }

    let stride = pow10(decimal_digits(piece.range_min) - decimal_digits(min_hk));
    for m in min_hk..=max_hk {
        let lo = if m == min_hk {
            piece.range_min
        } else {
            m.saturating_mul(stride)
        };
        let hi = if m == max_hk {
            piece.range_max
        } else {
            (m + 1).saturating_mul(stride) - 1
        };
        out.push(PartitionRange {
            hash_key: m,
            range: GeoHashRange::new(lo, hi),
        });
    }
}
