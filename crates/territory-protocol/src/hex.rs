//! Pure hex-grid math: axial coordinates, distance, neighbors, and the
//! pixel/axial conversions used to validate that a coordinate is honestly
//! integral (see `pixel_to_hex`/`hex_to_pixel` round-trip in `EngineError`
//! callers).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Axial coordinates for a hex grid (q, r). The implicit cube coordinate is `s = -q - r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    pub const DIRECTIONS: [Hex; 6] = [
        Hex { q: 1, r: 0 },  // East
        Hex { q: 1, r: -1 }, // Northeast
        Hex { q: 0, r: -1 }, // Northwest
        Hex { q: -1, r: 0 }, // West
        Hex { q: -1, r: 1 }, // Southwest
        Hex { q: 0, r: 1 },  // Southeast
    ];

    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    pub fn neighbors(self) -> impl Iterator<Item = Hex> {
        Self::DIRECTIONS.into_iter().map(move |d| self + d)
    }

    #[inline]
    pub fn distance(self, other: Hex) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s() - other.s()).abs()) / 2
    }
}

impl std::ops::Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex {
            q: self.q + other.q,
            r: self.r + other.r,
        }
    }
}

/// Convert an axial hex to pixel space for a pointy-top layout of the given size.
///
/// `size` must be finite and strictly positive.
pub fn hex_to_pixel(hex: Hex, size: f64) -> Result<(f64, f64), EngineError> {
    validate_size(size)?;
    let x = size * 3f64.sqrt() * (hex.q as f64 + hex.r as f64 / 2.0);
    let y = size * 1.5 * hex.r as f64;
    Ok((x, y))
}

/// Invert `hex_to_pixel`, cube-rounding the fractional axial result to the
/// nearest integer hex.
pub fn pixel_to_hex(x: f64, y: f64, size: f64) -> Result<Hex, EngineError> {
    validate_size(size)?;
    let q = (3f64.sqrt() / 3.0 * x - y / 3.0) / size;
    let r = (2.0 / 3.0 * y) / size;
    Ok(cube_round(q, r))
}

fn validate_size(size: f64) -> Result<(), EngineError> {
    if !size.is_finite() || size <= 0.0 {
        return Err(EngineError::InvalidHexSize { size });
    }
    Ok(())
}

fn cube_round(q: f64, r: f64) -> Hex {
    let s = -q - r;

    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    Hex {
        q: rq as i32,
        r: rr as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_distance_matches_expected() {
        let a = Hex::new(0, 0);
        let b = Hex::new(3, -1);
        assert_eq!(a.distance(b), 3);
    }

    #[test]
    fn hex_neighbors_has_six_adjacent() {
        let center = Hex::new(0, 0);
        let neighbors: Vec<_> = center.neighbors().collect();
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.iter().all(|n| center.distance(*n) == 1));
    }

    #[test]
    fn pixel_round_trip_recovers_integer_hex() {
        for q in -20..20 {
            for r in -20..20 {
                let hex = Hex::new(q, r);
                let (x, y) = hex_to_pixel(hex, 32.0).unwrap();
                let recovered = pixel_to_hex(x, y, 32.0).unwrap();
                assert_eq!(hex, recovered);
            }
        }
    }

    #[test]
    fn invalid_size_is_rejected() {
        assert!(matches!(
            hex_to_pixel(Hex::new(0, 0), 0.0),
            Err(EngineError::InvalidHexSize { .. })
        ));
        assert!(matches!(
            hex_to_pixel(Hex::new(0, 0), f64::NAN),
            Err(EngineError::InvalidHexSize { .. })
        ));
        assert!(matches!(
            hex_to_pixel(Hex::new(0, 0), -1.0),
            Err(EngineError::InvalidHexSize { .. })
        ));
    }
}
