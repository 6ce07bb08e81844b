//! Context helpers shared by the envoy crates' error modules.

pub mod error;

pub use error::FromMessage;
