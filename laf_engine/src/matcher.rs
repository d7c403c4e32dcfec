//! Reconciliation matching rules.
//!
//! When an authority registers a found item, the engine searches the open lost reports for one that describes the
//! same object: the short description and category must match case-insensitively, and the two locations must be
//! effectively the same place. Coordinates are user-entered and rounded by clients, so "the same place" is a
//! haversine distance within a configurable tolerance rather than bitwise float equality.
//!
//! When several reports match, the earliest `lost_at` (then the lowest id) wins. The legacy platform left this
//! tie-break undefined; here it is deterministic so that re-running a registration against the same store closes the
//! same report.

use crate::db_types::{GeoPoint, LostReport, NewFoundItem};

/// Mean earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const DEFAULT_TOLERANCE_M: f64 = 25.0;

#[derive(Debug, Clone, Copy)]
pub struct MatchCriteria {
    /// Maximum distance, in metres, at which two coordinates count as the same place. A tolerance of zero degrades
    /// to near-exact matching.
    pub tolerance_m: f64,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self { tolerance_m: DEFAULT_TOLERANCE_M }
    }
}

impl MatchCriteria {
    pub fn with_tolerance(tolerance_m: f64) -> Self {
        Self { tolerance_m }
    }

    /// True when `report` describes the item. Callers are expected to have pre-filtered on description and category
    /// already (the SQL candidate query does), but the check is repeated here so the predicate is self-contained.
    pub fn is_match(&self, report: &LostReport, item: &NewFoundItem) -> bool {
        report.short_description.eq_ignore_ascii_case(&item.short_description)
            && report.category.eq_ignore_ascii_case(&item.category)
            && haversine_m(report.location(), item.location) <= self.tolerance_m
    }
}

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
