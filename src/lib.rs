//! Keeps a dashboard's device widgets in step with a remote device store.
//!
//! Each widget is backed by a [`devices::Device`] adapter that renders user
//! actions immediately and is reconciled against a full snapshot of the store
//! on every poll of the [`engine::SyncEngine`].

pub mod commands;
pub mod config;
pub mod devices;
pub mod docs;
pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod remote;
pub mod utils;

pub use devices::{Device, DeviceView, PresentationSink, RenderedState};
pub use engine::{CycleReport, EngineConfig, SyncEngine};
pub use error::SyncError;
pub use models::{Command, CommandName, DeviceKind, DeviceSnapshot, Intent, Scalar};
pub use remote::{HttpRemote, RemoteSource};
