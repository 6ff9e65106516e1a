//! Lifecycle services for the evidence pipeline.
//!
//! The broker issues upload/download credentials, the reconciler drives the
//! confirm handshake, and the sweep retires abandoned pending records.

pub mod broker;
pub mod reconciler;
pub mod sweep;
