//! Core data models for the gateway.

mod alert;
mod wire;

pub use alert::{Action, Alert, NetDataError, Severity};
pub use wire::{InsertPayload, WireAlert};
