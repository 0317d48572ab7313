//! Great-circle distance and safe-area checks.
//!
//! Uses the haversine formula on a spherical earth.

use super::model::{Coordinates, SafeArea};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance in meters between two coordinates. Never negative.
pub fn distance(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_phi = (to.lat - from.lat).to_radians();
    let delta_lambda = (to.lng - from.lng).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` slightly past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_METERS * c).max(0.0)
}

/// True when `position` lies strictly beyond the safe-area radius.
pub fn is_outside(position: Coordinates, area: &SafeArea) -> bool {
    distance(position, area.center) > area.radius_meters
}
