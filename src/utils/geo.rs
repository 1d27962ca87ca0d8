//! Geofence arithmetic.

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 coordinates (haversine).
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusCheck {
    pub distance: f64,
    pub ok: bool,
}

/// A point is inside when its distance is at most `radius + buffer`.
pub fn within_radius(
    lat: f64,
    lng: f64,
    center_lat: f64,
    center_lng: f64,
    radius_meters: f64,
    buffer_meters: f64,
) -> RadiusCheck {
    let distance = haversine_meters(lat, lng, center_lat, center_lng);
    RadiusCheck {
        distance,
        ok: distance <= radius_meters + buffer_meters,
    }
}

pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// One candidate geofence.
#[derive(Debug, Clone, Copy)]
pub struct Fence {
    pub location_id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceMatch {
    pub location_id: u64,
    pub distance: f64,
}

/// Outcome of checking one coordinate against every assigned geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceOutcome {
    /// Closest fence overall, inside or not.
    pub nearest: Option<FenceMatch>,
    /// Closest fence the point is actually inside.
    pub matched: Option<FenceMatch>,
}

pub fn evaluate_fences(lat: f64, lng: f64, fences: &[Fence], buffer_meters: f64) -> FenceOutcome {
    let mut nearest: Option<FenceMatch> = None;
    let mut matched: Option<FenceMatch> = None;

    for fence in fences {
        let check = within_radius(
            lat,
            lng,
            fence.latitude,
            fence.longitude,
            fence.radius_meters,
            buffer_meters,
        );
        let candidate = FenceMatch {
            location_id: fence.location_id,
            distance: check.distance,
        };

        if nearest.is_none_or(|n| candidate.distance < n.distance) {
            nearest = Some(candidate);
        }
        if check.ok && matched.is_none_or(|m| candidate.distance < m.distance) {
            matched = Some(candidate);
        }
    }

    FenceOutcome { nearest, matched }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF_LAT: f64 = 37.7749;
    const SF_LNG: f64 = -122.4194;

    fn fence(id: u64, lat: f64, lng: f64, radius: f64) -> Fence {
        Fence {
            location_id: id,
            latitude: lat,
            longitude: lng,
            radius_meters: radius,
        }
    }

    #[test]
    fn same_point_is_zero_distance() {
        assert!(haversine_meters(SF_LAT, SF_LNG, SF_LAT, SF_LNG).abs() < 1e-6);
    }

    #[test]
    fn known_city_distance() {
        // San Francisco to Los Angeles is roughly 559 km.
        let d = haversine_meters(SF_LAT, SF_LNG, 34.0522, -118.2437);
        assert!((d - 559_000.0).abs() < 3_000.0, "got {d}");
    }

    #[test]
    fn buffer_extends_the_radius() {
        // ~111 m north of the centre.
        let lat = SF_LAT + 0.001;
        let strict = within_radius(lat, SF_LNG, SF_LAT, SF_LNG, 100.0, 0.0);
        let buffered = within_radius(lat, SF_LNG, SF_LAT, SF_LNG, 100.0, 20.0);
        assert!(!strict.ok);
        assert!(buffered.ok);
        assert!((strict.distance - buffered.distance).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(valid_coordinates(SF_LAT, SF_LNG));
        assert!(!valid_coordinates(91.0, 0.0));
        assert!(!valid_coordinates(0.0, -181.0));
        assert!(!valid_coordinates(f64::NAN, 0.0));
    }

    #[test]
    fn picks_nearest_matching_fence() {
        let fences = [
            fence(1, SF_LAT + 0.01, SF_LNG, 50.0),
            fence(2, SF_LAT + 0.0005, SF_LNG, 500.0),
            fence(3, SF_LAT, SF_LNG + 0.002, 1_000.0),
        ];
        let outcome = evaluate_fences(SF_LAT, SF_LNG, &fences, 20.0);

        assert!(outcome.matched.is_some());
        assert_eq!(outcome.matched.unwrap().location_id, 2);
        assert_eq!(outcome.nearest.unwrap().location_id, 2);
    }

    #[test]
    fn outside_every_fence_reports_nearest_distance() {
        let fences = [
            fence(1, SF_LAT + 0.01, SF_LNG, 50.0),
            fence(2, SF_LAT + 0.02, SF_LNG, 50.0),
        ];
        let outcome = evaluate_fences(SF_LAT, SF_LNG, &fences, 20.0);

        assert!(outcome.matched.is_none());
        let nearest = outcome.nearest.unwrap();
        assert_eq!(nearest.location_id, 1);
        assert!(nearest.distance > 1_000.0);
    }

    #[test]
    fn no_fences_is_never_within() {
        let outcome = evaluate_fences(SF_LAT, SF_LNG, &[], 20.0);
        assert_eq!(outcome.nearest, None);
        assert!(outcome.matched.is_none());
    }
}
