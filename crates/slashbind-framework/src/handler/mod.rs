//! Handler system for slashbind.
//!
//! - **Handler** ([`traits`]) – The [`Handler`] trait, implemented for async
//!   functions whose parameters are recovered from translated values
//! - **Service** ([`service`]) – [`InvokeService`], the tower service that
//!   assembles arguments, calls the handler and dispatches its result
//!
//! ```text
//! GateLayer                 ← permission and visibility checks
//!     └── InvokeService     ← translate/resolve -> handler -> result
//! ```

pub mod service;
pub mod traits;

pub use service::InvokeService;
pub use traits::Handler;
