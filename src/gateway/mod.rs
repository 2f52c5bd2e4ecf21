//! Gateway client framework
//!
//! Every remote integration is one [`GatewayClient`] plus a declarative
//! table of [`Operation`]s. The client performs exactly one HTTP request
//! per call and normalizes every outcome into a [`CallResult`]; nothing
//! past the client boundary throws.

mod client;
mod clients;
mod operation;

pub use client::{CallError, CallErrorKind, CallResult, GatewayClient};
pub use clients::ClientRegistry;
pub use operation::{BodyExpectation, Operation, OperationRegistry, ResponseKind, render_path};
