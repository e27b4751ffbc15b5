//! Responder selection strategies for report fan-out.

use crime_watch_database_models::{Coordinates, Responder};
use geo::{Distance, Haversine, Point};

/// Chooses which candidate responders get notified about a report.
///
/// Candidates are already filtered to active users of the right kind with
/// known coordinates. The returned order is the order rows are inserted.
pub trait ResponderSelector: Send + Sync {
    /// Returns the responders to notify for a report at `origin`.
    fn select(&self, origin: Coordinates, candidates: Vec<Responder>) -> Vec<Responder>;
}

/// Notifies every candidate regardless of distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastSelector;

impl ResponderSelector for BroadcastSelector {
    fn select(&self, _origin: Coordinates, candidates: Vec<Responder>) -> Vec<Responder> {
        candidates
    }
}

/// Notifies candidates within `radius_km` of the report, nearest first,
/// keeping at most `limit` when set.
#[derive(Debug, Clone, Copy)]
pub struct RadiusSelector {
    /// Maximum great-circle distance in kilometres.
    pub radius_km: f64,
    /// Maximum number of responders to notify.
    pub limit: Option<usize>,
}

impl RadiusSelector {
    /// Creates a selector with no cap on the number of responders.
    #[must_use]
    pub const fn new(radius_km: f64) -> Self {
        Self {
            radius_km,
            limit: None,
        }
    }

    /// Caps the number of responders notified per report.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl ResponderSelector for RadiusSelector {
    fn select(&self, origin: Coordinates, candidates: Vec<Responder>) -> Vec<Responder> {
        let mut ranked: Vec<(f64, Responder)> = candidates
            .into_iter()
            .map(|r| (distance_km(origin, r.location), r))
            .filter(|(km, _)| *km <= self.radius_km)
            .collect();

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(limit) = self.limit {
            ranked.truncate(limit);
        }

        log::debug!(
            "Radius selector kept {} responder(s) within {} km",
            ranked.len(),
            self.radius_km
        );

        ranked.into_iter().map(|(_, r)| r).collect()
    }
}

/// Great-circle distance between two points in kilometres.
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let from = Point::new(a.longitude, a.latitude);
    let to = Point::new(b.longitude, b.latitude);
    Haversine.distance(from, to) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_watch_crime_models::UserType;

    fn responder(id: &str, latitude: f64, longitude: f64) -> Responder {
        Responder {
            id: id.to_string(),
            user_type: UserType::Vigilante,
            location: Coordinates::new(latitude, longitude),
        }
    }

    fn ids(responders: &[Responder]) -> Vec<&str> {
        responders.iter().map(|r| r.id.as_str()).collect()
    }

    const LAGOS: Coordinates = Coordinates::new(6.5, 3.4);

    #[test]
    fn broadcast_keeps_everyone_in_order() {
        let candidates = vec![
            responder("far", 9.07, 7.49),
            responder("near", 6.51, 3.41),
        ];
        let selected = BroadcastSelector.select(LAGOS, candidates);
        assert_eq!(ids(&selected), vec!["far", "near"]);
    }

    #[test]
    fn radius_drops_far_and_orders_nearest_first() {
        let candidates = vec![
            responder("abuja", 9.07, 7.49),
            responder("two_km", 6.518, 3.4),
            responder("same_block", 6.5005, 3.4),
        ];
        let selected = RadiusSelector::new(5.0).select(LAGOS, candidates);
        assert_eq!(ids(&selected), vec!["same_block", "two_km"]);
    }

    #[test]
    fn radius_limit_truncates_after_sorting() {
        let candidates = vec![
            responder("b", 6.52, 3.4),
            responder("a", 6.501, 3.4),
            responder("c", 6.53, 3.4),
        ];
        let selected = RadiusSelector::new(10.0)
            .with_limit(2)
            .select(LAGOS, candidates);
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }

    #[test]
    fn distance_is_roughly_one_degree_of_latitude() {
        let km = distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((km - 111.2).abs() < 0.5, "got {km}");
    }
}
