//! Authoritative two-player Memory rooms.
//!
//! [`Room`] holds the turn and match rules, [`RoomRegistry`] owns every live room, and [`Hub`]
//! connects both to player channels and a delay [`Scheduler`]. Transport is left to the caller.

pub use config::*;
pub use error::*;
pub use hub::*;
pub use registry::*;
pub use room::*;

mod config;
mod error;
mod hub;
mod registry;
mod room;
