//! Live container-load dashboard for the routing server.
//!
//! The crate polls the routing server for container statistics, lays the
//! containers out on a circle and renders them as a toolkit-independent
//! [`scene::Scene`].  [`tui`] is the terminal adapter used by the binary.

pub mod actions;
pub mod activity;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod layout;
pub mod poller;
pub mod scene;
pub mod tui;
pub mod types;
pub mod view;

pub use backend::{Backend, BackendError, HttpBackend};
pub use config::Config;
pub use dashboard::Dashboard;
pub use scene::{render, ColorPolicy, LoadCategory, Scene};
pub use types::{ContainerNode, Edge, Snapshot};
