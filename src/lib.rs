//! # Smart Parking
//!
//! Parking slot lifecycle, billing and session history service.
//!
//! ## Architecture
//!
//! - **domain**: slots and their state machine, billing, history records, events
//! - **application**: slot registry, history ledger, expiry policy and the
//!   `ParkingService` façade
//! - **infrastructure**: SeaORM (SQLite) and in-memory repositories
//! - **interfaces**: REST API (axum)
//! - **shared**: errors, clock, graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{create_event_bus, Event, EventBus, ParkingService, SharedEventBus};
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use interfaces::http::create_api_router;
