//! Pure planning computations, independent of any store.
//!
//! - `spatial`: distances and the radius bounding rectangle
//! - `validation`: coordinate checks applied before any I/O
//! - `covering`: S2 cell coverings of query rectangles
//! - `ranges`: geohash and hash-key derivation, partition splitting
//! - `geojson`: the persisted location attribute

pub mod covering;
pub mod geojson;
pub mod ranges;
pub mod spatial;
pub mod validation;
