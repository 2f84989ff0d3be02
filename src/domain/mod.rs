//! Domain types and the ports the bridge talks through.

pub mod payment;
pub mod ports;
pub mod transaction;
