//! Polar points around the skill centre and the pairwise distance test.

use std::f64::consts::TAU;

use rand::Rng;

/// A monster position: squared distance from the skill centre and the angle as a
/// fraction of a full turn in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryPoint {
    pub radius_sq: f64,
    pub turn: f64,
}

impl GeometryPoint {
    /// Area-uniform draw over the annulus whose squared radii are `band.0..band.1`.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, band: (f64, f64)) -> Self {
        let (inner_sq, outer_sq) = band;
        let radius_sq = inner_sq + rng.gen::<f64>() * (outer_sq - inner_sq);
        Self {
            radius_sq,
            turn: rng.gen::<f64>(),
        }
    }

    /// Squared planar distance by the law of cosines.
    #[inline]
    pub fn distance_sq(&self, other: &GeometryPoint) -> f64 {
        let cross = (self.radius_sq * other.radius_sq).sqrt();
        self.radius_sq + other.radius_sq - 2.0 * cross * (TAU * (self.turn - other.turn)).cos()
    }

    #[inline]
    pub fn within(&self, other: &GeometryPoint, radius: f64) -> bool {
        self.distance_sq(other) < radius * radius
    }
}

/// Refill `points` with `count` fresh draws, reusing its allocation.
pub(crate) fn scatter<R: Rng + ?Sized>(
    rng: &mut R,
    points: &mut Vec<GeometryPoint>,
    count: usize,
    band: (f64, f64),
) {
    points.clear();
    points.extend((0..count).map(|_| GeometryPoint::sample(&mut *rng, band)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::SplitMix64;

    fn approx_eq(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    #[test]
    fn opposite_points_are_two_radii_apart() {
        let a = GeometryPoint { radius_sq: 25.0, turn: 0.0 };
        let b = GeometryPoint { radius_sq: 25.0, turn: 0.5 };
        approx_eq(a.distance_sq(&b).sqrt(), 10.0, 1e-9);
    }

    #[test]
    fn right_angle_matches_pythagoras() {
        let a = GeometryPoint { radius_sq: 9.0, turn: 0.0 };
        let b = GeometryPoint { radius_sq: 16.0, turn: 0.25 };
        approx_eq(a.distance_sq(&b), 25.0, 1e-9);
    }

    #[test]
    fn angle_difference_wraps_around_full_turn() {
        let a = GeometryPoint { radius_sq: 4.0, turn: 0.95 };
        let b = GeometryPoint { radius_sq: 4.0, turn: 0.05 };
        let c = GeometryPoint { radius_sq: 4.0, turn: 0.15 };
        approx_eq(a.distance_sq(&b), b.distance_sq(&c), 1e-9);
    }

    #[test]
    fn within_is_strict() {
        let a = GeometryPoint { radius_sq: 25.0, turn: 0.0 };
        let b = GeometryPoint { radius_sq: 25.0, turn: 0.5 };
        assert!(!a.within(&b, 10.0));
        assert!(a.within(&b, 10.5));
    }

    #[test]
    fn samples_stay_inside_band() {
        let mut rng = SplitMix64::new(11);
        for _ in 0..5_000 {
            let p = GeometryPoint::sample(&mut rng, (1.0, 100.0));
            assert!(p.radius_sq >= 1.0 && p.radius_sq <= 100.0);
            assert!((0.0..1.0).contains(&p.turn));
        }
    }

    #[test]
    fn squared_radius_is_uniform_so_outer_half_holds_most_points() {
        // Disk of radius 10: the annulus 5..10 covers 75% of the area.
        let mut rng = SplitMix64::new(21);
        let n = 40_000;
        let outer = (0..n)
            .map(|_| GeometryPoint::sample(&mut rng, (0.0, 100.0)))
            .filter(|p| p.radius_sq >= 25.0)
            .count();
        approx_eq(outer as f64 / n as f64, 0.75, 0.02);
    }

    #[test]
    fn scatter_reuses_buffer() {
        let mut rng = SplitMix64::new(1);
        let mut points = Vec::with_capacity(8);
        scatter(&mut rng, &mut points, 5, (1.0, 4.0));
        assert_eq!(points.len(), 5);
        scatter(&mut rng, &mut points, 2, (1.0, 4.0));
        assert_eq!(points.len(), 2);
    }
}
