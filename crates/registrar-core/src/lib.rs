// # registrar-core
//
// Reconciliation engine for domain names managed through a slow-consistent
// registrar API.
//
// ## Architecture Overview
//
// - **Registrar**: Trait for the remote registrar (status, purchase, renew, records)
// - **LifecycleOrchestrator**: Drives ensure/release operations to completion
// - **ConvergencePoller**: Polls the registrar until a write becomes visible
// - **RegistrarRegistry**: Plugin-based registry for registrar adapters
// - **policy**: Expiry and price guards that decide whether a write is needed and safe
// - **records**: Record model and per-type partitioning
// - **pagination**: Offset-paginated listing collector
//
// ## Design Principles
//
// 1. **Single owner of retries**: Adapters are single-shot; only the poller waits and retries
// 2. **Injected time**: Every time-dependent decision takes a `Clock`
// 3. **Plugin-Based**: Registrars are registered by name, no hard-coded if-else
// 4. **Library-First**: The binary is a thin layer over this crate
// 5. **No ambient state**: Contact data and policies are passed per call

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod pagination;
pub mod policy;
pub mod poller;
pub mod records;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DesiredDomain, DesiredStateManifest, OrchestratorConfig, PollConfig, RegistrarConfig};
pub use engine::{DomainRequest, LifecycleEvent, LifecycleOrchestrator};
pub use error::{Error, Result, TransportErrorKind};
pub use model::{ContactInfo, DomainName, DomainStatus, DomainStatusReport, ManagedDomain};
pub use poller::{BackoffPolicy, CancelHandle, CancelSignal, Clock, ConvergencePoller, ManualClock, PollError, SystemClock, cancellation};
pub use records::{DomainRecord, RecordType, RecordTypePolicy};
pub use registry::RegistrarRegistry;
pub use traits::{Registrar, RegistrarFactory};
