//! Domain models for the pharmacy queue.

mod message;
mod prescription;
mod template;

pub use message::*;
pub use prescription::*;
pub use template::*;
