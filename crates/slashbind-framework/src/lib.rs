//! # Slashbind Framework
//!
//! Typed command handlers on top of the slashbind core engine.
//!
//! This layer provides:
//! - Handler trait for Axum-style typed parameters
//! - Command metadata with groups and permission composition
//! - A tower stack per command: access gate over argument assembly,
//!   handler call and result dispatch
//! - Registration-time checks of handlers against their declarations
//!
//! The core engine does the translation work; this crate wires its stages
//! into services a runtime can drive.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;

pub use command::{BoxCommandService, Command, CommandGroup, CommandSpec, GateLayer, GateService};
pub use dispatcher::Dispatcher;
pub use error::{CommandError, CommandResult, DispatchError, DispatchResult};
pub use handler::{Handler, InvokeService};

pub use futures::future::BoxFuture;
pub use tower::{Layer, Service, ServiceBuilder, ServiceExt};
