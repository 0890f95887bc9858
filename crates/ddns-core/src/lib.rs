// # ddns-core
//
// Core library for the polling DDNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for reading and updating the tracked A-record
// - **DdnsEngine**: Fixed-interval loop that fetches, validates, compares
//   and updates
// - **DdnsConfig**: Environment-driven configuration
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP clients
// 2. **Single Owner**: The engine owns the only mutable state and evaluates
//    one tick at a time
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: No provider write unless the address actually changed

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod validate;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord};
pub use engine::{DdnsEngine, EngineSettings, TickOutcome};
pub use config::{DdnsConfig, DuplicatePolicy, RunMode};
pub use error::{Error, Result};
pub use validate::is_valid_ip;
