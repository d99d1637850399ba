use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::model::Room;
use crate::store::RoomRegistry;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub warehouse: WarehouseConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            warehouse: WarehouseConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("STOW_IT_NOW_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse STOW_IT_NOW_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    Self::DEFAULT_HOST
                        .parse::<IpAddr>()
                        .expect("Default host must be valid"),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("STOW_IT_NOW_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ STOW_IT_NOW_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse STOW_IT_NOW_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the warehouse core: room catalog and undo depth.
#[derive(Clone, Debug)]
pub struct WarehouseConfig {
    registry: RoomRegistry,
    history_depth: usize,
}

impl WarehouseConfig {
    const ROOMS_VAR: &'static str = "STOW_IT_NOW_ROOMS";
    const HISTORY_DEPTH_VAR: &'static str = "STOW_IT_NOW_HISTORY_DEPTH";

    fn from_env() -> Self {
        let registry = match env_string(Self::ROOMS_VAR) {
            Some(raw) => match parse_room_catalog(&raw) {
                Ok(registry) => registry,
                Err(err) => {
                    eprintln!(
                        "⚠️ {} contains an invalid room catalog ('{}'): {}. Using the built-in rooms.",
                        Self::ROOMS_VAR,
                        raw,
                        err
                    );
                    default_registry()
                }
            },
            None => default_registry(),
        };

        let history_depth = load_usize_with_warning(
            Self::HISTORY_DEPTH_VAR,
            DEFAULT_HISTORY_DEPTH,
            |value| value >= 1,
            "must be at least 1",
            "Warning: A small undo depth discards snapshots early",
        );

        Self {
            registry,
            history_depth,
        }
    }

    /// Returns the configured room catalog.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Returns the configured undo depth.
    pub fn history_depth(&self) -> usize {
        self.history_depth
    }
}

/// Built-in room catalog used when no override is configured.
///
/// The static values are validated master data; failing to build them is a
/// programming error, not a runtime condition.
fn default_registry() -> RoomRegistry {
    let rooms = vec![
        Room::new("Godown A", "GA", 10, 10),
        Room::new("Godown B", "GB", 8, 12),
        Room::new("Cold Room", "CR", 6, 8),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .expect("Default room catalog must be valid");
    RoomRegistry::new(rooms).expect("Default room catalog must be unique")
}

/// Parses a room catalog of the form `Name:CODE:RxC[,Name:CODE:RxC...]`.
fn parse_room_catalog(raw: &str) -> Result<RoomRegistry, String> {
    let rooms = raw
        .split(',')
        .map(parse_room_entry)
        .collect::<Result<Vec<_>, String>>()?;
    RoomRegistry::new(rooms).map_err(|err| err.to_string())
}

/// Parses a single `Name:CODE:RxC` room entry.
fn parse_room_entry(entry: &str) -> Result<Room, String> {
    let parts: Vec<&str> = entry.trim().split(':').collect();
    let [name, code, dims] = parts.as_slice() else {
        return Err(format!(
            "Room entry '{}' must have the form Name:CODE:RxC",
            entry.trim()
        ));
    };

    let (rows_raw, cols_raw) = dims
        .split_once('x')
        .ok_or_else(|| format!("Room dimensions '{}' must have the form RxC", dims))?;
    let rows: usize = rows_raw
        .trim()
        .parse()
        .map_err(|_| format!("Could not parse row count '{}'", rows_raw))?;
    let cols: usize = cols_raw
        .trim()
        .parse()
        .map_err(|_| format!("Could not parse column count '{}'", cols_raw))?;

    Room::new(name.trim(), code.trim(), rows, cols).map_err(|err| err.to_string())
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_usize_with_warning(
    var_name: &str,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> usize {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    if value != default {
                        println!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridDimensioned;

    #[test]
    fn test_parse_room_entry_valid_entries() {
        let room = parse_room_entry("Godown A:GA:10x10").unwrap();
        assert_eq!(room.name, "Godown A");
        assert_eq!(room.short_code, "GA");
        assert_eq!(room.capacity(), 100);

        // Whitespace around parts is tolerated
        let room = parse_room_entry("  Cold Room : CR : 6x8 ").unwrap();
        assert_eq!(room.id, "cr");
        assert_eq!(room.rows, 6);
        assert_eq!(room.cols, 8);
    }

    #[test]
    fn test_parse_room_entry_invalid_entries() {
        assert!(parse_room_entry("Godown A:GA").is_err());
        assert!(parse_room_entry("Godown A:GA:10x10:extra").is_err());
        assert!(parse_room_entry("Godown A:GA:10by10").is_err());
        assert!(parse_room_entry("Godown A:GA:0x10").is_err());
        assert!(parse_room_entry("Godown A:GA:10xten").is_err());
        assert!(parse_room_entry(":GA:10x10").is_err());
    }

    #[test]
    fn test_parse_room_catalog_rejects_duplicates() {
        assert!(parse_room_catalog("A:GA:4x4,B:GA:5x5").is_err());

        let registry = parse_room_catalog("A:GA:4x4,B:GB:5x5").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("gb").unwrap().name, "B");
    }

    #[test]
    fn test_default_registry_is_valid() {
        let registry = default_registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("ga").unwrap().capacity(), 100);
        assert_eq!(registry.get("gb").unwrap().capacity(), 96);
        assert_eq!(registry.get("cr").unwrap().capacity(), 48);
    }
}
