//! # Query Engine
//!
//! Filtering, pagination, search, and lookups over the cached collection.
//!
//! Filters compile to a list of predicates combined with AND; absent fields
//! contribute no predicate. All operations are synchronous and preserve the
//! collection's original order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::geo;
use crate::models::{CanonicalBay, Stats};

#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub bay_type: Option<String>,
    pub zone_number: Option<String>,
    pub restriction_type: Option<String>,
    pub accessible_only: bool,
    pub near: Option<Radius>,
}

/// Radial containment around a query point, in meters.
#[derive(Debug, Clone, Copy)]
pub struct Radius {
    pub lat: f64,
    pub lng: f64,
    pub meters: f64,
}

enum Predicate {
    // Lowercased at build time so each bay pays one comparison, not one
    // allocation per filter field.
    BayType(String),
    Zone(String),
    RestrictionType(String),
    AccessibleOnly,
    Within(Radius),
}

impl Predicate {
    fn matches(&self, bay: &CanonicalBay) -> bool {
        match self {
            Predicate::BayType(wanted) => bay.bay_type.label().to_lowercase() == *wanted,
            Predicate::Zone(zone) => bay.zone_number == *zone,
            Predicate::RestrictionType(wanted) => {
                bay.restrictions.kind.to_lowercase().contains(wanted)
            }
            Predicate::AccessibleOnly => bay.accessible_parking,
            Predicate::Within(radius) => {
                geo::distance(radius.lat, radius.lng, bay.latitude, bay.longitude)
                    <= radius.meters
            }
        }
    }
}

impl Filters {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(bay_type) = &self.bay_type {
            predicates.push(Predicate::BayType(bay_type.to_lowercase()));
        }
        if let Some(zone) = &self.zone_number {
            predicates.push(Predicate::Zone(zone.clone()));
        }
        if let Some(kind) = &self.restriction_type {
            predicates.push(Predicate::RestrictionType(kind.to_lowercase()));
        }
        if self.accessible_only {
            predicates.push(Predicate::AccessibleOnly);
        }
        if let Some(near) = self.near {
            predicates.push(Predicate::Within(near));
        }
        predicates
    }
}

/// All bays satisfying every active predicate. Idempotent.
pub fn filter(bays: &[CanonicalBay], filters: &Filters) -> Vec<CanonicalBay> {
    let predicates = filters.predicates();
    bays.iter()
        .filter(|bay| predicates.iter().all(|predicate| predicate.matches(bay)))
        .cloned()
        .collect()
}

pub struct Page {
    pub items: Vec<CanonicalBay>,
    pub total: usize,
    pub has_more: bool,
}

/// Contiguous slice `[offset, offset + limit)` clamped to bounds; `total` is
/// the pre-pagination count.
pub fn paginate(bays: Vec<CanonicalBay>, limit: usize, offset: usize) -> Page {
    let total = bays.len();
    let has_more = offset.saturating_add(limit) < total;
    let items = bays.into_iter().skip(offset).take(limit).collect();

    Page {
        items,
        total,
        has_more,
    }
}

/// Case-insensitive substring match over name, street, area, and bay type,
/// OR across fields. Stable order, truncated to `limit`.
pub fn search(bays: &[CanonicalBay], query: &str, limit: usize) -> Vec<CanonicalBay> {
    let term = query.to_lowercase();
    bays.iter()
        .filter(|bay| {
            bay.name.to_lowercase().contains(&term)
                || bay.street_name.to_lowercase().contains(&term)
                || bay.area.to_lowercase().contains(&term)
                || bay.bay_type.label().to_lowercase().contains(&term)
        })
        .take(limit)
        .cloned()
        .collect()
}

pub fn by_zone(bays: &[CanonicalBay], zone: &str) -> Vec<CanonicalBay> {
    bays.iter()
        .filter(|bay| bay.zone_number == zone)
        .cloned()
        .collect()
}

/// Lookup by any identifier alias: primary id, external id, or bay id.
pub fn by_id<'a>(bays: &'a [CanonicalBay], id: &str) -> Option<&'a CanonicalBay> {
    bays.iter().find(|bay| {
        bay.id == id
            || bay.external_id.as_deref() == Some(id)
            || bay.bay_id.as_deref() == Some(id)
    })
}

pub fn stats(bays: &[CanonicalBay], last_updated: Option<DateTime<Utc>>) -> Stats {
    let mut by_type: HashMap<String, usize> = HashMap::new();
    let mut by_zone: HashMap<String, usize> = HashMap::new();
    for bay in bays {
        *by_type.entry(bay.bay_type.label().to_string()).or_default() += 1;
        *by_zone.entry(bay.zone_number.clone()).or_default() += 1;
    }

    Stats {
        total: bays.len(),
        by_type,
        by_zone,
        accessible_count: bays.iter().filter(|bay| bay.accessible_parking).count(),
        loading_zones: bays.iter().filter(|bay| bay.loading_zone).count(),
        motorcycle_spots: bays.iter().filter(|bay| bay.motorcycle_parking).count(),
        last_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawItem;
    use crate::transform::transform;
    use serde_json::json;

    fn bay(id: i64, street: &str, lat: f64, lng: f64) -> CanonicalBay {
        let item: RawItem = serde_json::from_value(json!({
            "kerbsideid": id,
            "roadsegmentid": id,
            "roadsegmentdescription": format!("{street} between A Street and B Street"),
            "latitude": lat,
            "longitude": lng
        }))
        .unwrap();
        transform(&item).unwrap()
    }

    fn fixture() -> Vec<CanonicalBay> {
        vec![
            // id 102 -> seed 2 -> Accessible
            bay(102, "Collins Street", -37.8154, 144.9666),
            // id 206 -> seed 6 -> Motorcycle
            bay(206, "Collins Street", -37.8160, 144.9700),
            // id 350 -> seed 50 -> Standard
            bay(350, "Lygon Street", -37.7980, 144.9670),
            // id 412 -> seed 12 -> Angle Parking
            bay(412, "Docklands Drive", -37.8150, 144.9460),
        ]
    }

    #[test]
    fn test_no_predicates_is_identity() {
        let bays = fixture();
        assert_eq!(filter(&bays, &Filters::default()).len(), bays.len());
    }

    #[test]
    fn test_bay_type_filter_is_case_insensitive() {
        let bays = fixture();
        let filters = Filters {
            bay_type: Some("angle parking".to_string()),
            ..Filters::default()
        };
        let out = filter(&bays, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "412");
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let bays = fixture();
        let filters = Filters {
            zone_number: Some("206".to_string()),
            accessible_only: true,
            ..Filters::default()
        };
        // Zone 206 exists but its bay is Motorcycle, not Accessible.
        assert!(filter(&bays, &filters).is_empty());
    }

    #[test]
    fn test_restriction_type_substring_match() {
        let bays = fixture();
        let filters = Filters {
            restriction_type: Some("hour".to_string()),
            ..Filters::default()
        };
        let out = filter(&bays, &filters);
        assert!(!out.is_empty());
        assert!(out
            .iter()
            .all(|bay| bay.restrictions.kind.to_lowercase().contains("hour")));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let bays = fixture();
        let filters = Filters {
            bay_type: Some("Standard".to_string()),
            ..Filters::default()
        };
        let once = filter(&bays, &filters);
        let twice = filter(&once, &filters);
        assert_eq!(
            once.iter().map(|b| &b.id).collect::<Vec<_>>(),
            twice.iter().map(|b| &b.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_radius_zero_keeps_exact_point_only() {
        let bays = fixture();
        let filters = Filters {
            near: Some(Radius {
                lat: -37.8154,
                lng: 144.9666,
                meters: 0.0,
            }),
            ..Filters::default()
        };
        let out = filter(&bays, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "102");
    }

    #[test]
    fn test_radius_containment() {
        let bays = fixture();
        let filters = Filters {
            near: Some(Radius {
                lat: -37.8154,
                lng: 144.9666,
                meters: 500.0,
            }),
            ..Filters::default()
        };
        let out = filter(&bays, &filters);
        // Both Collins Street bays sit within 500m; Lygon and Docklands do not.
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_paginate_clamps_and_counts() {
        let bays = fixture();

        let page = paginate(bays.clone(), 2, 0);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 4);
        assert!(page.has_more);

        let page = paginate(bays.clone(), 2, 2);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);

        let page = paginate(bays.clone(), 10, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 4);
        assert!(!page.has_more);

        let page = paginate(bays, 10, 100);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_search_matches_across_fields() {
        let bays = fixture();

        let out = search(&bays, "COLLINS", 10);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|bay| bay.street_name.contains("Collins")));

        // Bay type label is searchable too.
        let out = search(&bays, "motorcycle", 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "206");

        assert!(search(&bays, "nonexistent", 10).is_empty());
    }

    #[test]
    fn test_search_truncates_preserving_order() {
        let bays = fixture();
        let out = search(&bays, "collins", 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "102");
    }

    #[test]
    fn test_by_zone_exact_match() {
        let bays = fixture();
        assert_eq!(by_zone(&bays, "350").len(), 1);
        assert!(by_zone(&bays, "35").is_empty());
    }

    #[test]
    fn test_by_id_matches_aliases() {
        let bays = fixture();
        // kerbsideid doubles as id, external_id, and bay_id.
        assert!(by_id(&bays, "102").is_some());
        assert!(by_id(&bays, "999").is_none());

        let surrogate: CanonicalBay = transform(
            &serde_json::from_value::<RawItem>(json!({
                "latitude": -37.8, "longitude": 144.9
            }))
            .unwrap(),
        )
        .unwrap();
        let id = surrogate.id.clone();
        let collection = vec![surrogate];
        assert!(by_id(&collection, &id).is_some());
    }

    #[test]
    fn test_stats_counts() {
        let bays = fixture();
        let stats = stats(&bays, None);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_type["Accessible"], 1);
        assert_eq!(stats.by_type["Motorcycle"], 1);
        assert_eq!(stats.by_type["Standard"], 1);
        assert_eq!(stats.by_type["Angle Parking"], 1);
        assert_eq!(stats.by_zone["102"], 1);
        assert_eq!(stats.accessible_count, 1);
        assert_eq!(stats.motorcycle_spots, 1);
        assert_eq!(stats.loading_zones, 0);
        assert_eq!(stats.last_updated, None);
    }
}
