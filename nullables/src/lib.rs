//! Nullable infrastructure for deterministic testing.
//!
//! The voting contract is abstracted behind [`turing_gateway::LedgerGateway`].
//! This crate provides an in-memory contract that:
//! - Returns deterministic values
//! - Can be steered programmatically (failures, rejections, delays)
//! - Records every call so tests can assert on remote traffic
//! - Never touches the network
//!
//! Usage: swap the RPC gateway for [`NullGateway`] in tests.

pub mod gateway;

pub use gateway::{GatewayCall, NullGateway};
