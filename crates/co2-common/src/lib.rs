//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Shared primitives for the CO2 bulletin workspace.
//! This crate exposes configuration loading and tracing setup consumed by the
//! run pipeline and the command line entrypoint.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, ExportConfig, LoadedAppConfig, LoggingConfig, ProviderConfig, ProviderKind,
    PublisherConfig, PublisherKind, RunConfig, ZeroBaselinePolicy,
};
pub use logging::{init_tracing, LogFormat};
