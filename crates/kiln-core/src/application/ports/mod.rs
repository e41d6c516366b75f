//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `kiln-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: staging, writes, promotion
//!   - `Formatter`: best-effort source formatting
//!   - `ContentSource` / `EventSource`: the generation stream
//!   - `FollowupResponder`: answers clarifying questions
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    ContentSource, EventSource, Filesystem, FollowupResponder, Formatter, NoopFormatter,
};
