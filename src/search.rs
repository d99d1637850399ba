//! Substring search over occupied slots.
//!
//! Search is a pure read: it never touches slot state and reports matches as
//! a set of slot ids. A blank query means "search inactive" and returns the
//! empty set rather than matching everything.

use std::collections::HashSet;

use crate::model::Slot;

/// Finds occupied slots whose identifying fields contain the query.
///
/// Matched fields: slot id, occupant source reference, display label and
/// contents. Matching is case-insensitive substring containment; empty slots
/// are never part of the result.
///
/// # Parameters
/// * `query` - Search text; blank input returns the empty set
/// * `slots` - Slot array to search
pub fn search_slots(query: &str, slots: &[Slot]) -> HashSet<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return HashSet::new();
    }

    slots
        .iter()
        .filter_map(|slot| {
            let occupant = slot.occupant.as_ref()?;
            let matches = slot.id.to_lowercase().contains(&needle)
                || occupant.source_ref.to_lowercase().contains(&needle)
                || occupant.label.to_lowercase().contains(&needle)
                || occupant.contents.to_lowercase().contains(&needle);
            matches.then(|| slot.id.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Occupant, Room};
    use crate::store::SlotStore;
    use chrono::Utc;

    fn sample_slots() -> Vec<Slot> {
        let room = Room::new("Godown A", "GA", 2, 3).unwrap();
        let mut slots = SlotStore::initialize(&room);
        slots[0].occupy(Occupant {
            content_id: "itm-1".to_string(),
            label: "MSP".to_string(),
            source_ref: "GC-1042".to_string(),
            contents: "Machine spares".to_string(),
            packing: "Wooden crate".to_string(),
            allocated_at: Utc::now(),
        });
        slots[4].occupy(Occupant {
            content_id: "itm-2".to_string(),
            label: "TEX".to_string(),
            source_ref: "GC-2077".to_string(),
            contents: "Cotton bales".to_string(),
            packing: "Bale".to_string(),
            allocated_at: Utc::now(),
        });
        slots
    }

    #[test]
    fn blank_query_is_inactive() {
        let slots = sample_slots();
        assert!(search_slots("", &slots).is_empty());
        assert!(search_slots("   ", &slots).is_empty());
    }

    #[test]
    fn matches_source_reference_case_insensitively() {
        let slots = sample_slots();
        let hits = search_slots("gc-1042", &slots);
        assert_eq!(hits, HashSet::from(["GA-R01-C01".to_string()]));
    }

    #[test]
    fn matches_label_and_contents() {
        let slots = sample_slots();
        assert_eq!(search_slots("tex", &slots).len(), 1);
        assert_eq!(search_slots("cotton", &slots).len(), 1);
        assert_eq!(search_slots("spares", &slots).len(), 1);
    }

    #[test]
    fn matches_slot_id_of_occupied_slots_only() {
        let slots = sample_slots();
        // "GA-R01" is a prefix of every slot id in row 1, but only the
        // occupied slot may appear in the result.
        let hits = search_slots("ga-r01", &slots);
        assert_eq!(hits, HashSet::from(["GA-R01-C01".to_string()]));
    }

    #[test]
    fn shared_consignment_reference_matches_all_its_slots() {
        let slots = sample_slots();
        let hits = search_slots("GC-", &slots);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn packing_is_not_a_searched_field() {
        let slots = sample_slots();
        assert!(search_slots("crate", &slots).is_empty());
    }
}
