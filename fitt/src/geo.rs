pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees per semicircle, the fixed-point angle unit used by FIT positions.
pub const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

pub fn semicircles_to_degrees(semicircles: f64) -> f64 {
    semicircles * SEMICIRCLES_TO_DEGREES
}

/// Great-circle (haversine) distance in meters between two points given in degrees.
pub fn geo_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let dist = geo_distance(0.0, 0.0, 0.0, 1.0);
        assert!(dist > 111_195.0 - 1.0 && dist < 111_320.0, "got {dist}");
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(geo_distance(46.5, 7.25, 46.5, 7.25), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = geo_distance(51.5074, -0.1278, 48.8566, 2.3522);
        let back = geo_distance(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((there - back).abs() < 1e-6);
        assert!((there - 343_500.0).abs() < 2_000.0);
    }

    #[test]
    fn test_semicircles() {
        assert_eq!(semicircles_to_degrees(1_073_741_824.0), 90.0);
        assert_eq!(semicircles_to_degrees(-2_147_483_648.0), -180.0);
        assert_eq!(semicircles_to_degrees(0.0), 0.0);
    }
}
