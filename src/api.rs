//! REST API for the warehouse allocation service.
//!
//! Provides HTTP endpoints for presentation layers (web grid, CLI, scripts).
//! Uses Axum as the web framework and supports CORS. The API is one possible
//! trigger among many: every operation is a thin wrapper over the same
//! `Warehouse` calls any other presentation layer would use.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::advisor::CapacityAdvice;
use crate::allocator::{AllocationReport, FillMode};
use crate::config::ApiConfig;
use crate::model::{Occupant, PendingItem, Room, Slot, SlotStatus, ValidationError};
use crate::types::GridPos;
use crate::warehouse::{RoomOverview, UndoOutcome, Warehouse, WarehouseError};

#[derive(Clone)]
struct ApiState {
    warehouse: Arc<Mutex<Warehouse>>,
}

impl ApiState {
    /// Locks the single-operator warehouse state.
    ///
    /// A poisoned lock only means a previous request panicked mid-handler;
    /// the copy-on-write store is still consistent, so the lock is reclaimed.
    fn warehouse(&self) -> MutexGuard<'_, Warehouse> {
        self.warehouse
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stow-it-now API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Room list response with per-room capacity numbers.
#[derive(Serialize, ToSchema)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomOverview>,
}

/// One slot in a room-slots response.
///
/// # Fields
/// * `id` - Globally unique slot id
/// * `pos` - Grid position (1-based row/column)
/// * `status` - `empty` or `occupied`
/// * `occupant` - Stored-unit metadata for occupied slots
#[derive(Serialize, ToSchema)]
pub struct SlotView {
    pub id: String,
    pub pos: GridPos,
    pub status: SlotStatus,
    #[schema(nullable = true)]
    pub occupant: Option<Occupant>,
}

impl SlotView {
    fn from_slot(slot: &Slot) -> Self {
        Self {
            id: slot.id.clone(),
            pos: slot.pos,
            status: slot.status(),
            occupant: slot.occupant.clone(),
        }
    }
}

/// Full slot grid of one room.
#[derive(Serialize, ToSchema)]
pub struct RoomSlotsResponse {
    pub room: Room,
    pub slots: Vec<SlotView>,
}

/// Current pending list and its consignment reference.
#[derive(Serialize, ToSchema)]
pub struct PendingResponse {
    #[schema(nullable = true)]
    pub consignment: Option<String>,
    pub items: Vec<PendingItem>,
}

/// Request structure for the pending upload endpoint.
///
/// The items belong to one consignment reference; uploading replaces the
/// previous pending list.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "consignment": "GC-1042",
        "items": [
            {
                "id": "itm-1",
                "quantity": 5,
                "contents": "Machine spares",
                "packing": "Wooden crate",
                "prefix": "MSP",
                "weight": 48.5
            }
        ]
    })
)]
pub struct LoadPendingRequest {
    pub consignment: String,
    pub items: Vec<PendingItem>,
}

impl LoadPendingRequest {
    fn into_validated(self) -> Result<(String, Vec<PendingItem>), PendingValidationError> {
        if self.consignment.trim().is_empty() {
            return Err(PendingValidationError::MissingConsignment);
        }
        if self.items.is_empty() {
            return Err(PendingValidationError::MissingItems);
        }

        let items = self
            .items
            .into_iter()
            .map(|item| {
                PendingItem::new(
                    item.id,
                    item.quantity,
                    item.contents,
                    item.packing,
                    item.prefix,
                    item.weight,
                )
            })
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PendingValidationError::InvalidItem)?;

        Ok((self.consignment, items))
    }
}

#[derive(Debug)]
enum PendingValidationError {
    MissingConsignment,
    MissingItems,
    InvalidItem(ValidationError),
}

/// Request structure for the allocation endpoints.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "target_slot": "GA-R01-C01",
        "mode": "horizontal",
        "item_ids": ["itm-1"]
    })
)]
pub struct AllocateRequest {
    pub target_slot: String,
    pub mode: FillMode,
    #[serde(default)]
    #[schema(nullable = true)]
    pub item_ids: Option<Vec<String>>,
}

/// Request structure for the capacity-advice endpoint.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "room_id": "ga", "quantity": 5 }))]
pub struct AdviseRequest {
    pub room_id: String,
    pub quantity: usize,
}

/// Request structure for the batch-removal endpoint.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "slot_ids": ["GA-R01-C01", "GA-R01-C02"] }))]
pub struct RemoveRequest {
    pub slot_ids: Vec<String>,
}

/// Removal confirmation.
///
/// `noop` marks the informational case: nothing was occupied, nothing
/// changed, no history entry was recorded.
#[derive(Serialize, ToSchema)]
pub struct RemoveResponse {
    pub freed: usize,
    pub noop: bool,
}

/// Undo confirmation.
#[derive(Serialize, ToSchema)]
pub struct UndoResponse {
    pub undone: bool,
    #[schema(nullable = true)]
    pub room_id: Option<String>,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub message: String,
}

/// Search result: matching occupied slot ids in stable order.
#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub slot_ids: Vec<String>,
}

/// Query parameters of the search endpoint.
#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

/// Maps the warehouse error taxonomy onto HTTP statuses.
///
/// Capacity shortfalls are recoverable operator conditions (409 with the
/// concrete numbers); an unknown room id is a configuration bug and therefore
/// a server error; everything else is invalid input.
fn warehouse_error_response(err: WarehouseError) -> Response {
    let status = match &err {
        WarehouseError::Capacity { .. } => StatusCode::CONFLICT,
        WarehouseError::UnknownRoom(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.code(), err.to_string())
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_rooms,
        handle_room_slots,
        handle_get_pending,
        handle_load_pending,
        handle_allocate,
        handle_allocate_stream,
        handle_advise,
        handle_remove,
        handle_clear_room,
        handle_undo,
        handle_search
    ),
    components(
        schemas(
            RoomsResponse,
            RoomOverview,
            Room,
            RoomSlotsResponse,
            SlotView,
            SlotStatus,
            Occupant,
            GridPos,
            PendingResponse,
            LoadPendingRequest,
            PendingItem,
            AllocateRequest,
            FillMode,
            AllocationReport,
            AdviseRequest,
            CapacityAdvice,
            RemoveRequest,
            RemoveResponse,
            UndoResponse,
            SearchResponse,
            ErrorResponse
        )
    ),
    tags((name = "warehouse", description = "Endpoints for warehouse slot allocation"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from presentation layers.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, warehouse: Warehouse) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        warehouse: Arc::new(Mutex::new(warehouse)),
    };

    let app = Router::new()
        // API endpoints
        .route("/rooms", get(handle_rooms))
        .route("/rooms/{room_id}/slots", get(handle_room_slots))
        .route("/rooms/{room_id}/clear", post(handle_clear_room))
        .route("/pending", get(handle_get_pending).post(handle_load_pending))
        .route("/allocate", post(handle_allocate))
        .route("/allocate_stream", post(handle_allocate_stream))
        .route("/advise", post(handle_advise))
        .route("/remove", post(handle_remove))
        .route("/undo", post(handle_undo))
        .route("/search", get(handle_search))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("🏬 API Endpoints:");
    println!("   - GET  /rooms");
    println!("   - GET  /rooms/{{room_id}}/slots");
    println!("   - GET/POST /pending");
    println!("   - POST /allocate");
    println!("   - POST /allocate_stream");
    println!("   - POST /advise");
    println!("   - POST /remove");
    println!("   - POST /rooms/{{room_id}}/clear");
    println!("   - POST /undo");
    println!("   - GET  /search");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for GET /rooms.
///
/// Lists every configured room with its capacity, free and occupied counts.
#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "Configured rooms with capacity numbers", body = RoomsResponse)
    ),
    tag = "warehouse"
)]
async fn handle_rooms(State(state): State<ApiState>) -> impl IntoResponse {
    let warehouse = state.warehouse();
    match warehouse.room_overview() {
        Ok(rooms) => (StatusCode::OK, Json(RoomsResponse { rooms })).into_response(),
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for GET /rooms/{room_id}/slots.
///
/// Returns the room's complete slot grid in row-major order.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/slots",
    params(("room_id" = String, Path, description = "Room id, e.g. `ga`")),
    responses(
        (status = 200, description = "Slot grid of the room", body = RoomSlotsResponse),
        (status = 500, description = "Unknown room id", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_room_slots(
    State(state): State<ApiState>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    let warehouse = state.warehouse();
    let room = match warehouse.registry().get(&room_id) {
        Ok(room) => room.clone(),
        Err(err) => return warehouse_error_response(err.into()),
    };
    match warehouse.room_slots(&room_id) {
        Ok(slots) => {
            let views = slots.iter().map(SlotView::from_slot).collect();
            (
                StatusCode::OK,
                Json(RoomSlotsResponse {
                    room,
                    slots: views,
                }),
            )
                .into_response()
        }
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for GET /pending.
#[utoipa::path(
    get,
    path = "/pending",
    responses(
        (status = 200, description = "Current pending items", body = PendingResponse)
    ),
    tag = "warehouse"
)]
async fn handle_get_pending(State(state): State<ApiState>) -> impl IntoResponse {
    let warehouse = state.warehouse();
    let response = PendingResponse {
        consignment: warehouse.consignment().map(str::to_string),
        items: warehouse.pending().to_vec(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pending.
///
/// Replaces the pending list with the items of a consignment. The items are
/// fetched by an external collaborator; this endpoint only hands them to the
/// core.
#[utoipa::path(
    post,
    path = "/pending",
    request_body = LoadPendingRequest,
    responses(
        (status = 200, description = "Pending list replaced", body = PendingResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_load_pending(
    State(state): State<ApiState>,
    payload: Result<Json<LoadPendingRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (consignment, items) = match request.into_validated() {
        Ok(validated) => validated,
        Err(PendingValidationError::MissingConsignment) => {
            return validation_error("A consignment reference must be specified");
        }
        Err(PendingValidationError::MissingItems) => {
            return validation_error("At least one pending item must be specified");
        }
        Err(PendingValidationError::InvalidItem(err)) => {
            return validation_error(err.to_string());
        }
    };

    println!(
        "📥 New pending list: {} item(s) for consignment {}",
        items.len(),
        consignment
    );

    let mut warehouse = state.warehouse();
    warehouse.load_pending(consignment, items);
    let response = PendingResponse {
        consignment: warehouse.consignment().map(str::to_string),
        items: warehouse.pending().to_vec(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /allocate.
///
/// Stores pending items starting at the target slot using the requested fill
/// mode. The commit is atomic: a capacity shortfall performs zero mutation
/// and reports the concrete numbers.
#[utoipa::path(
    post,
    path = "/allocate",
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Units stored", body = AllocationReport),
        (status = CONFLICT, description = "Capacity shortfall (needed vs. available)", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_allocate(
    State(state): State<ApiState>,
    payload: Result<Json<AllocateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut warehouse = state.warehouse();
    let result = warehouse.request_allocation(
        &request.target_slot,
        request.mode,
        request.item_ids.as_deref(),
    );

    match result {
        Ok(report) => {
            println!(
                "📦 Stored {} unit(s) starting at {} ({} free afterwards)",
                report.allocated, request.target_slot, report.free_after
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for POST /allocate_stream (SSE).
///
/// Streams allocation events in real-time as Server-Sent Events
/// (text/event-stream). Presentation layers can animate the grid filling
/// slot by slot without waiting for the complete result.
#[utoipa::path(
    post,
    path = "/allocate_stream",
    request_body = AllocateRequest,
    responses(
        (
            status = 200,
            description = "Streams allocation events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_allocate_stream(
    State(state): State<ApiState>,
    payload: Result<Json<AllocateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let shared = Arc::clone(&state.warehouse);

    tokio::task::spawn_blocking(move || {
        let mut warehouse = shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = warehouse.request_allocation_with_progress(
            &request.target_slot,
            request.mode,
            request.item_ids.as_deref(),
            |event| {
                if let Ok(json) = serde_json::to_string(event) {
                    if tx.blocking_send(json).is_err() {
                        // Receiver has closed the stream; remaining events are discarded.
                    }
                }
            },
        );
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /advise.
///
/// Read-only capacity check: current room first, best alternate room second,
/// global shortfall last. Never switches rooms on its own.
#[utoipa::path(
    post,
    path = "/advise",
    request_body = AdviseRequest,
    responses(
        (status = 200, description = "Capacity advice", body = CapacityAdvice),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Unknown room id", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_advise(
    State(state): State<ApiState>,
    payload: Result<Json<AdviseRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.quantity == 0 {
        return validation_error("Quantity must be at least 1");
    }

    let warehouse = state.warehouse();
    match warehouse.advise(&request.room_id, request.quantity) {
        Ok(advice) => (StatusCode::OK, Json(advice)).into_response(),
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for POST /remove.
///
/// Frees the occupied slots among the given ids in one pass with a single
/// undo snapshot. Ids of empty slots are ignored.
#[utoipa::path(
    post,
    path = "/remove",
    request_body = RemoveRequest,
    responses(
        (status = 200, description = "Removal confirmation", body = RemoveResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_remove(
    State(state): State<ApiState>,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut warehouse = state.warehouse();
    match warehouse.remove_slots(&request.slot_ids) {
        Ok(outcome) => {
            if !outcome.is_noop() {
                println!("🗑️ Freed {} slot(s)", outcome.freed);
            }
            (
                StatusCode::OK,
                Json(RemoveResponse {
                    freed: outcome.freed,
                    noop: outcome.is_noop(),
                }),
            )
                .into_response()
        }
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for POST /rooms/{room_id}/clear.
///
/// Frees every occupied slot of the room. Clearing an already-empty room is
/// an informational no-op (count 0, no history entry).
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/clear",
    params(("room_id" = String, Path, description = "Room id, e.g. `ga`")),
    responses(
        (status = 200, description = "Removal confirmation", body = RemoveResponse),
        (status = 500, description = "Unknown room id", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_clear_room(
    State(state): State<ApiState>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    let mut warehouse = state.warehouse();
    match warehouse.clear_room(&room_id) {
        Ok(outcome) => {
            if !outcome.is_noop() {
                println!("🗑️ Cleared room {}: {} slot(s) freed", room_id, outcome.freed);
            }
            (
                StatusCode::OK,
                Json(RemoveResponse {
                    freed: outcome.freed,
                    noop: outcome.is_noop(),
                }),
            )
                .into_response()
        }
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for POST /undo.
///
/// Rolls back the most recent allocation or removal by restoring its full
/// snapshot. An empty history is informational, not an error.
#[utoipa::path(
    post,
    path = "/undo",
    responses(
        (status = 200, description = "Undo confirmation or 'nothing to undo'", body = UndoResponse)
    ),
    tag = "warehouse"
)]
async fn handle_undo(State(state): State<ApiState>) -> impl IntoResponse {
    let mut warehouse = state.warehouse();
    match warehouse.undo() {
        Ok(UndoOutcome::Undone {
            kind,
            room_id,
            description,
        }) => {
            println!("↩️ Undid {}: {}", kind, description);
            (
                StatusCode::OK,
                Json(UndoResponse {
                    undone: true,
                    room_id: Some(room_id),
                    description: Some(description),
                    message: format!("Rolled back the last {}", kind),
                }),
            )
                .into_response()
        }
        Ok(UndoOutcome::NothingToUndo) => (
            StatusCode::OK,
            Json(UndoResponse {
                undone: false,
                room_id: None,
                description: None,
                message: "Nothing to undo".to_string(),
            }),
        )
            .into_response(),
        Err(err) => warehouse_error_response(err),
    }
}

/// Handler for GET /search.
///
/// Case-insensitive substring search over occupied slots. A blank query is
/// inactive and returns no matches.
#[utoipa::path(
    get,
    path = "/search",
    params(
        ("q" = String, Query, description = "Search text"),
        ("room_id" = Option<String>, Query, description = "Restrict to one room")
    ),
    responses(
        (status = 200, description = "Matching occupied slot ids", body = SearchResponse),
        (status = 500, description = "Unknown room id", body = ErrorResponse)
    ),
    tag = "warehouse"
)]
async fn handle_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let warehouse = state.warehouse();
    match warehouse.search(&params.q, params.room_id.as_deref()) {
        Ok(hits) => {
            let slot_ids: Vec<String> = hits.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            (
                StatusCode::OK,
                Json(SearchResponse {
                    query: params.q,
                    slot_ids,
                }),
            )
                .into_response()
        }
        Err(err) => warehouse_error_response(err),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in [
            "/rooms",
            "/rooms/{room_id}/slots",
            "/rooms/{room_id}/clear",
            "/pending",
            "/allocate",
            "/allocate_stream",
            "/advise",
            "/remove",
            "/undo",
            "/search",
        ] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "AllocateRequest",
            "AllocationReport",
            "CapacityAdvice",
            "PendingItem",
            "RemoveResponse",
            "UndoResponse",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn allocate_request_parses_item_ids_when_present() {
        let json = r#"{
            "target_slot": "GA-R01-C01",
            "mode": "horizontal",
            "item_ids": ["itm-1", "itm-2"]
        }"#;
        let request: AllocateRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(request.target_slot, "GA-R01-C01");
        assert_eq!(request.mode, FillMode::Horizontal);
        assert_eq!(
            request.item_ids,
            Some(vec!["itm-1".to_string(), "itm-2".to_string()])
        );
    }

    #[test]
    fn allocate_request_parses_item_ids_when_absent() {
        let json = r#"{
            "target_slot": "GA-R01-C01",
            "mode": "vertical"
        }"#;
        let request: AllocateRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(request.mode, FillMode::Vertical);
        assert_eq!(
            request.item_ids, None,
            "item_ids should be None when the field is omitted"
        );
    }

    #[test]
    fn allocate_request_rejects_unknown_fill_modes() {
        let json = r#"{ "target_slot": "GA-R01-C01", "mode": "diagonal" }"#;
        assert!(serde_json::from_str::<AllocateRequest>(json).is_err());
    }

    #[test]
    fn load_pending_request_rejects_blank_consignment_and_empty_items() {
        let request = LoadPendingRequest {
            consignment: "   ".to_string(),
            items: vec![
                PendingItem::new("itm-1", 1, "Spares", "Crate", None, 1.0).unwrap(),
            ],
        };
        assert!(matches!(
            request.into_validated(),
            Err(PendingValidationError::MissingConsignment)
        ));

        let request = LoadPendingRequest {
            consignment: "GC-1042".to_string(),
            items: Vec::new(),
        };
        assert!(matches!(
            request.into_validated(),
            Err(PendingValidationError::MissingItems)
        ));
    }

    #[test]
    fn load_pending_request_revalidates_items() {
        let json = r#"{
            "consignment": "GC-1042",
            "items": [
                { "id": "itm-1", "quantity": 0, "contents": "Spares", "packing": "Crate", "weight": 1.0 }
            ]
        }"#;
        let request: LoadPendingRequest =
            serde_json::from_str(json).expect("Should parse valid JSON");
        assert!(matches!(
            request.into_validated(),
            Err(PendingValidationError::InvalidItem(_))
        ));
    }
}
