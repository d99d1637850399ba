//! Zuteilungslogik für die Belegung von Lagerplätzen.
//!
//! Dieses Modul implementiert den Kern der Stellplatz-Zuteilung:
//! - Richtungsabhängige Füllreihenfolgen (horizontal/vertikal) ab einem Startplatz
//! - Vorab-Kapazitätsprüfung mit atomarem Commit (alles oder nichts)
//! - Fortschritts-Ereignisse für Live-Visualisierung
//!
//! Der Commit mutiert niemals den Bestand direkt: er liefert ein vollständig
//! neues Slot-Array zurück, das der Aufrufer per Copy-on-Write einwechselt.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{Occupant, PendingItem, Room, Slot};
use crate::store::count_empty;
use crate::types::{GridDimensioned, GridPos};

/// Richtungsstrategie für die Wahl der nächsten freien Stellplätze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Zeilenweise ab dem Startplatz, mit Umlauf an den Array-Anfang.
    Horizontal,
    /// Spaltenweise ab dem Startplatz (siehe `vertical_order` für die
    /// exakte, bewusst beibehaltene Reihenfolge).
    Vertical,
}

impl std::fmt::Display for FillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillMode::Horizontal => write!(f, "horizontal"),
            FillMode::Vertical => write!(f, "vertical"),
        }
    }
}

/// Fehler der Zuteilung. Vor jedem Commit vollständig geprüft:
/// schlägt die Prüfung fehl, bleibt der Raumbestand byte-identisch.
#[derive(Debug, Clone)]
pub enum AllocationError {
    /// Angeforderte Menge übersteigt die freien Plätze des Zielraums.
    Shortfall { needed: usize, available: usize },
    /// Der Startplatz liegt außerhalb des Raumrasters.
    StartOutsideRoom(GridPos),
}

impl AllocationError {
    /// Stabiler Code für API-Antworten.
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::Shortfall { .. } => "capacity_shortfall",
            AllocationError::StartOutsideRoom(_) => "start_outside_room",
        }
    }
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::Shortfall { needed, available } => {
                write!(
                    f,
                    "Benötigt {} Stellplätze, nur {} frei",
                    needed, available
                )
            }
            AllocationError::StartOutsideRoom(pos) => {
                write!(f, "Startplatz {} liegt außerhalb des Raumrasters", pos)
            }
        }
    }
}

impl std::error::Error for AllocationError {}

/// Ereignisse, die während der Zuteilung auftreten, um Live-Visualisierung
/// zu ermöglichen (geeignet für SSE/WebSocket).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum AllocEvent {
    /// Die Einlagerung eines Sendungspostens beginnt.
    ItemStarted {
        item_id: String,
        label: String,
        quantity: usize,
    },
    /// Eine Einheit wurde einem Stellplatz zugewiesen.
    SlotFilled {
        slot_id: String,
        item_id: String,
        unit: usize,
        of: usize,
    },
    /// Die Zuteilung wurde wegen fehlender Kapazität abgelehnt.
    Rejected {
        needed: usize,
        available: usize,
        reason_code: String,
        reason_text: String,
    },
    /// Zuteilung abgeschlossen.
    Finished { allocated: usize, free_after: usize },
}

/// Ergebnis eines erfolgreichen Commits.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AllocationReport {
    /// Anzahl zugeteilter Einheiten (Summe der Postenmengen).
    pub allocated: usize,
    /// Belegte Stellplatz-Ids in Zuteilungsreihenfolge.
    pub filled: Vec<String>,
    /// Freie Stellplätze des Raums nach dem Commit.
    pub free_after: usize,
}

/// Liefert die zeilenweise Scan-Reihenfolge ab einem Startindex.
///
/// Deterministisch: erst `[start..end)`, dann Umlauf über `[0..start)`.
fn horizontal_order(len: usize, start_index: usize) -> impl Iterator<Item = usize> {
    (start_index..len).chain(0..start_index)
}

/// Liefert die spaltenweise Scan-Reihenfolge ab einem Startplatz.
///
/// Reihenfolge: Startspalte ab Startzeile nach unten, danach die Zeilen
/// oberhalb der Startzeile in derselben Spalte, danach jede Folgespalte von
/// Zeile 1 bis zur letzten Zeile, zuletzt Umlauf über die Spalten vor der
/// Startspalte (ebenfalls ab Zeile 1).
///
/// Diese Reihenfolge ist nicht das einfachste denkbare Schema, entspricht
/// aber exakt dem gewünschten Produktverhalten und darf nicht stillschweigend
/// vereinfacht werden.
fn vertical_order(room: &Room, start: GridPos) -> Vec<usize> {
    let cols = room.cols();
    let mut order = Vec::with_capacity(room.capacity());

    for row in start.row..=room.rows() {
        order.push(GridPos::new(row, start.col).to_index(cols));
    }
    for row in 1..start.row {
        order.push(GridPos::new(row, start.col).to_index(cols));
    }
    for col in start.col + 1..=room.cols() {
        for row in 1..=room.rows() {
            order.push(GridPos::new(row, col).to_index(cols));
        }
    }
    for col in 1..start.col {
        for row in 1..=room.rows() {
            order.push(GridPos::new(row, col).to_index(cols));
        }
    }

    order
}

/// Berechnet die geordnete Kandidatenliste leerer Stellplätze.
///
/// Die Startposition muss innerhalb des Raumrasters liegen.
///
/// # Parameter
/// * `room` - Zielraum
/// * `slots` - Aktuelles Slot-Array des Raums (row-major)
/// * `start` - Startposition der Füllung
/// * `mode` - Richtungsstrategie
/// * `quantity` - Angeforderte Menge
///
/// # Rückgabewert
/// Array-Indizes der nächsten freien Plätze in Füllreihenfolge; Länge
/// `min(quantity, freie Plätze im Raum)`
pub fn plan_fill(
    room: &Room,
    slots: &[Slot],
    start: GridPos,
    mode: FillMode,
    quantity: usize,
) -> Vec<usize> {
    let order: Vec<usize> = match mode {
        FillMode::Horizontal => horizontal_order(slots.len(), start.to_index(room.cols())).collect(),
        FillMode::Vertical => vertical_order(room, start),
    };

    order
        .into_iter()
        .filter(|&index| slots[index].is_empty())
        .take(quantity)
        .collect()
}

/// Teilt Sendungsposten Stellplätzen zu (ohne Fortschritts-Callback).
///
/// Siehe `allocate_items_with_progress`.
pub fn allocate_items(
    room: &Room,
    slots: &[Slot],
    items: &[PendingItem],
    source_ref: &str,
    start: GridPos,
    mode: FillMode,
) -> Result<(Vec<Slot>, AllocationReport), AllocationError> {
    allocate_items_with_progress(room, slots, items, source_ref, start, mode, |_| {})
}

/// Teilt Sendungsposten Stellplätzen zu, mit Live-Progress Callback.
///
/// Die Kandidatenliste wird vollständig vor dem Commit berechnet. Reicht sie
/// nicht für die Gesamtmenge, findet kein Commit statt: das übergebene
/// Slot-Array bleibt unberührt und der Fehler nennt die konkreten Zahlen.
/// Bei Erfolg verbraucht der Commit die Kandidaten in Reihenfolge, eine
/// Einheit pro Posten-Menge, und liefert das neue Slot-Array zurück.
///
/// # Parameter
/// * `room` - Zielraum
/// * `slots` - Slot-Array vor der Mutation
/// * `items` - Einzulagernde Posten (je mit Menge)
/// * `source_ref` - Aktive Sendungsreferenz für die Belegungsfelder
/// * `start` - Startposition der Füllung
/// * `mode` - Richtungsstrategie
/// * `on_event` - Callback für Fortschritts-Ereignisse
pub fn allocate_items_with_progress(
    room: &Room,
    slots: &[Slot],
    items: &[PendingItem],
    source_ref: &str,
    start: GridPos,
    mode: FillMode,
    mut on_event: impl FnMut(&AllocEvent),
) -> Result<(Vec<Slot>, AllocationReport), AllocationError> {
    if !room.contains(start) {
        return Err(AllocationError::StartOutsideRoom(start));
    }

    let needed: usize = items.iter().map(|item| item.quantity).sum();
    let plan = plan_fill(room, slots, start, mode, needed);

    if plan.len() < needed {
        let available = count_empty(slots);
        let error = AllocationError::Shortfall { needed, available };
        on_event(&AllocEvent::Rejected {
            needed,
            available,
            reason_code: error.code().to_string(),
            reason_text: error.to_string(),
        });
        return Err(error);
    }

    let mut next = slots.to_vec();
    let mut filled = Vec::with_capacity(needed);
    let mut plan_iter = plan.into_iter();
    let allocated_at = Utc::now();

    for item in items {
        let label = item.display_label();
        on_event(&AllocEvent::ItemStarted {
            item_id: item.id.clone(),
            label: label.clone(),
            quantity: item.quantity,
        });

        for unit in 1..=item.quantity {
            // Vorab geprüft: die Kandidatenliste deckt die Gesamtmenge ab.
            let index = plan_iter
                .next()
                .expect("candidate list shorter than pre-checked quantity");
            next[index].occupy(Occupant {
                content_id: item.id.clone(),
                label: label.clone(),
                source_ref: source_ref.to_string(),
                contents: item.contents.clone(),
                packing: item.packing.clone(),
                allocated_at,
            });
            let slot_id = next[index].id.clone();
            on_event(&AllocEvent::SlotFilled {
                slot_id: slot_id.clone(),
                item_id: item.id.clone(),
                unit,
                of: item.quantity,
            });
            filled.push(slot_id);
        }
    }

    let free_after = count_empty(&next);
    on_event(&AllocEvent::Finished {
        allocated: needed,
        free_after,
    });

    Ok((
        next,
        AllocationReport {
            allocated: needed,
            filled,
            free_after,
        },
    ))
}
