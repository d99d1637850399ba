//! Kapazitätsberatung für die Raumwahl.
//!
//! Dieses Modul beantwortet rein lesend die Frage, wo eine angeforderte
//! Menge untergebracht werden kann: zuerst im aktuellen Raum, sonst im besten
//! Ausweichraum, sonst Meldung der globalen Unterdeckung. Ein Raumwechsel
//! wird nur vorgeschlagen, niemals automatisch ausgeführt.

use serde::Serialize;
use utoipa::ToSchema;

use crate::store::{RoomRegistry, SlotStore, StoreError, count_empty, first_empty};

/// Empfehlung der Kapazitätsberatung für eine benötigte Menge.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityAdvice {
    /// Der aktuelle Raum reicht aus; Startvorschlag ist sein erster freier
    /// Stellplatz.
    CurrentRoom { start_slot_id: String, free: usize },
    /// Der aktuelle Raum reicht nicht; der genannte Ausweichraum hätte Platz.
    AlternateRoom {
        room_id: String,
        room_name: String,
        free: usize,
    },
    /// Kein Raum reicht aus; Summe der freien Plätze über alle Räume.
    Insufficient { needed: usize, total_free: usize },
}

impl CapacityAdvice {
    /// Stabiler Code für API-Antworten.
    pub fn code(&self) -> &'static str {
        match self {
            CapacityAdvice::CurrentRoom { .. } => "current_room_ok",
            CapacityAdvice::AlternateRoom { .. } => "alternate_room",
            CapacityAdvice::Insufficient { .. } => "insufficient_capacity",
        }
    }
}

/// Prüft die Kapazität des aktuellen Raums und empfiehlt ggf. einen anderen.
///
/// # Parameter
/// * `registry` - Raumkatalog
/// * `store` - Aktueller Bestand (nur lesend)
/// * `current_room_id` - Raum, in dem eingelagert werden soll
/// * `needed` - Benötigte Stellplatzmenge
///
/// # Rückgabewert
/// Empfehlung laut Stufenschema; `Err` nur bei unbekannter Raum-Id
/// (Konfigurationsfehler).
pub fn advise(
    registry: &RoomRegistry,
    store: &SlotStore,
    current_room_id: &str,
    needed: usize,
) -> Result<CapacityAdvice, StoreError> {
    registry.get(current_room_id)?;
    let current = store.get(current_room_id)?;
    let free = count_empty(&current);

    if free >= needed {
        if let Some(slot) = first_empty(&current) {
            return Ok(CapacityAdvice::CurrentRoom {
                start_slot_id: slot.id.clone(),
                free,
            });
        }
    }

    // Bester Ausweichraum: größte freie Menge, bei Gleichstand der erste in
    // Katalogreihenfolge.
    let mut best: Option<(&str, &str, usize)> = None;
    let mut total_free = free;
    for room in registry.iter().filter(|room| room.id != current_room_id) {
        let slots = store.get(&room.id)?;
        let room_free = count_empty(&slots);
        total_free += room_free;
        if best.map_or(true, |(_, _, best_free)| room_free > best_free) {
            best = Some((&room.id, &room.name, room_free));
        }
    }

    if let Some((room_id, room_name, room_free)) = best {
        if room_free >= needed {
            return Ok(CapacityAdvice::AlternateRoom {
                room_id: room_id.to_string(),
                room_name: room_name.to_string(),
                free: room_free,
            });
        }
    }

    Ok(CapacityAdvice::Insufficient { needed, total_free })
}
