//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Primary orchestration and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Bulletin pipeline driver and its configuration wiring.

pub mod pipeline;
pub mod wiring;

pub use pipeline::{BulletinPipeline, RunOutcome};
pub use wiring::{current_window, provider_from_config, sink_from_config, window_for};
