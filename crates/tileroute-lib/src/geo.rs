use serde::{Deserialize, Serialize};

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Kilometres per metre.
pub const KM_PER_METER: f64 = 0.001;

/// Miles per kilometre.
pub const MILE_PER_KM: f64 = 0.621_371;

/// Metres per mile.
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    #[serde(rename = "lon")]
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance(&self, other: &Self) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let dphi = (other.lat - self.lat).to_radians();
        let dlambda = (other.lng - self.lng).to_radians();

        let a = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Initial bearing towards `other` in degrees, clockwise from north.
    pub fn heading_to(&self, other: &Self) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let dlambda = (other.lng - self.lng).to_radians();
        let y = dlambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Cartesian coordinates on a sphere of earth radius, in metres.
    ///
    /// Squared euclidean distance between these points is monotonic with the
    /// great-circle distance, which is what the KD-tree needs.
    pub fn to_cartesian(&self) -> [f64; 3] {
        let phi = self.lat.to_radians();
        let lambda = self.lng.to_radians();
        [
            EARTH_RADIUS_M * phi.cos() * lambda.cos(),
            EARTH_RADIUS_M * phi.cos() * lambda.sin(),
            EARTH_RADIUS_M * phi.sin(),
        ]
    }

    /// Closest point on the segment `a`-`b` using a local equirectangular
    /// projection. Returns the point and the fraction along the segment.
    pub fn project_onto(&self, a: &LatLng, b: &LatLng) -> (LatLng, f64) {
        let scale = self.lat.to_radians().cos();
        let ax = a.lng * scale;
        let bx = b.lng * scale;
        let px = self.lng * scale;
        let dx = bx - ax;
        let dy = b.lat - a.lat;
        let len2 = dx * dx + dy * dy;
        if len2 <= f64::EPSILON {
            return (*a, 0.0);
        }
        let t = (((px - ax) * dx + (self.lat - a.lat) * dy) / len2).clamp(0.0, 1.0);
        (
            LatLng::new(a.lat + t * (b.lat - a.lat), a.lng + t * (b.lng - a.lng)),
            t,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Smallest absolute difference between two headings, in degrees.
pub fn heading_delta(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        let d = a.distance(&b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn projection_clamps_to_segment() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(0.0, 1.0);
        let (_, t) = LatLng::new(0.001, 0.5).project_onto(&a, &b);
        assert!((t - 0.5).abs() < 1e-9);
        let (p, t) = LatLng::new(0.0, 2.0).project_onto(&a, &b);
        assert_eq!(t, 1.0);
        assert_eq!(p, b);
    }

    #[test]
    fn heading_due_east_is_ninety() {
        let h = LatLng::new(0.0, 0.0).heading_to(&LatLng::new(0.0, 1.0));
        assert!((h - 90.0).abs() < 1e-6);
        assert_eq!(heading_delta(350.0, 10.0), 20.0);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -181.0).is_valid());
        assert!(LatLng::new(-33.9, 151.2).is_valid());
    }
}
