// src/main.rs
mod advisor;
mod allocator;
mod api;
mod config;
mod history;
mod model;
mod removal;
mod search;
mod store;
mod types;
mod warehouse;

use config::AppConfig;
use warehouse::Warehouse;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Konnte .env nicht laden: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let warehouse_config = app_config.warehouse.clone();

    println!("🏬 Warehouse Service startet...");
    // Der Bestand wird bei jedem Start neu aus der Konfiguration aufgebaut;
    // eine Persistenzschicht gibt es bewusst nicht.
    let warehouse = Warehouse::new(
        warehouse_config.registry().clone(),
        warehouse_config.history_depth(),
    );
    api::start_api_server(api_config, warehouse).await;
}
