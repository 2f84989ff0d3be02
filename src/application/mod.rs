//! Application layer: the provider driver, the status resolver and the
//! polling bridge built on top of it.

pub mod driver;
pub mod polling;
pub mod resolver;
