//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Grid operator data providers and bulletin publishing sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! External collaborators of the bulletin pipeline: where daily generation
//! figures come from and where the finished bulletin goes.

pub mod error;
pub mod provider;
pub mod sink;

pub use error::FeedError;
pub use provider::{FetchWindow, FileProvider, GenerationProvider, OnsDailyBalanceProvider};
pub use sink::{HttpSink, ReportSink, StdoutSink};
