//! Transport-Gateway: Remote Record Gateway for the Transport Dashboard
//!
//! This crate provides the boundary between the dashboard core and the
//! remote transport collection endpoint. It owns the record data model and
//! translates every transport-level failure into a uniform [`ApiError`].
//!
//! ## Layer 0 - Data/Remote
//!
//! Focus: Wire compatibility and uniform failure reporting.
//!
//! ## Key Components
//!
//! - `RecordGateway`: async list/create/update/delete contract
//! - `HttpGateway`: reqwest-backed implementation of the contract
//! - `MemoryGateway`: in-memory fake with failure injection (testing)
//! - `Record` / `NewRecord` / `RecordPatch`: the transport record schema

mod error;
pub mod fakes;
pub mod gateway;
mod http;
mod record;

pub use error::{ApiError, ParseTransportTypeError};
pub use gateway::{ApiResult, RecordGateway};
pub use http::{GatewayConfig, HttpGateway, DEFAULT_API_URL};
pub use record::{NewRecord, Record, RecordId, RecordPatch, TransportType};
