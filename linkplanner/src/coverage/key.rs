//! Canonical building identity.
//!
//! Buildings arrive either with a numeric footprint id (`msftid`) or only
//! with their footprint polygon. Polygons are canonicalized so the same
//! footprint always maps to the same key regardless of its starting vertex,
//! winding or a repeated closing vertex.

use serde::{Deserialize, Serialize};

/// Quantization applied to footprint vertices (1e-7 degrees, about 1 cm).
const QUANTUM_PER_DEGREE: f64 = 1e7;

/// Outer ring of a building footprint, as `[lng, lat]` vertices.
pub type Footprint = Vec<[f64; 2]>;

/// Identity of a building within a coverage set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKey {
    /// Numeric footprint id supplied by the backend.
    Id(u64),
    /// Canonical quantized ring.
    Footprint(Vec<(i64, i64)>),
}

impl BuildingKey {
    /// Keys a building by id when present, otherwise by its footprint.
    pub fn for_building(id: Option<u64>, footprint: &[[f64; 2]]) -> BuildingKey {
        match id {
            Some(id) => BuildingKey::Id(id),
            None => BuildingKey::from_footprint(footprint),
        }
    }

    /// Canonicalizes a footprint ring into a key.
    pub fn from_footprint(ring: &[[f64; 2]]) -> BuildingKey {
        let mut vertices: Vec<(i64, i64)> = Vec::with_capacity(ring.len());
        for [lng, lat] in ring {
            let v = (quantize(*lng), quantize(*lat));
            if vertices.last() != Some(&v) {
                vertices.push(v);
            }
        }
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if signed_area2(&vertices) < 0 {
            vertices.reverse();
        }

        if let Some(start) = vertices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
        {
            vertices.rotate_left(start);
        }

        BuildingKey::Footprint(vertices)
    }
}

fn quantize(degrees: f64) -> i64 {
    (degrees * QUANTUM_PER_DEGREE).round() as i64
}

/// Twice the signed shoelace area; positive for counter-clockwise rings.
fn signed_area2(vertices: &[(i64, i64)]) -> i128 {
    let n = vertices.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % n];
            x0 as i128 * y1 as i128 - x1 as i128 * y0 as i128
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Footprint {
        vec![
            [-86.5800, 36.8000],
            [-86.5790, 36.8000],
            [-86.5790, 36.8010],
            [-86.5800, 36.8010],
            [-86.5800, 36.8000],
        ]
    }

    #[test]
    fn test_id_takes_precedence() {
        assert_eq!(BuildingKey::for_building(Some(42), &square()), BuildingKey::Id(42));
    }

    #[test]
    fn test_closing_vertex_is_ignored() {
        let closed = square();
        let open = closed[..4].to_vec();
        assert_eq!(
            BuildingKey::from_footprint(&closed),
            BuildingKey::from_footprint(&open)
        );
    }

    #[test]
    fn test_rotation_is_ignored() {
        let ring = square();
        let mut rotated = ring[..4].to_vec();
        rotated.rotate_left(2);
        assert_eq!(
            BuildingKey::from_footprint(&ring),
            BuildingKey::from_footprint(&rotated)
        );
    }

    #[test]
    fn test_winding_is_ignored() {
        let ring = square();
        let mut reversed = ring[..4].to_vec();
        reversed.reverse();
        assert_eq!(
            BuildingKey::from_footprint(&ring),
            BuildingKey::from_footprint(&reversed)
        );
    }

    #[test]
    fn test_sub_centimeter_noise_is_ignored() {
        let ring = square();
        let noisy: Footprint = ring.iter().map(|[x, y]| [x + 1e-9, y - 1e-9]).collect();
        assert_eq!(
            BuildingKey::from_footprint(&ring),
            BuildingKey::from_footprint(&noisy)
        );
    }

    #[test]
    fn test_different_buildings_differ() {
        let ring = square();
        let shifted: Footprint = ring.iter().map(|[x, y]| [x + 0.001, *y]).collect();
        assert_ne!(
            BuildingKey::from_footprint(&ring),
            BuildingKey::from_footprint(&shifted)
        );
    }
}
