//! Data models for the attendance backend.
//!
//! Field names serialize as camelCase for the browser client.

mod session;
mod student;
mod view;

pub use session::*;
pub use student::*;
pub use view::*;
