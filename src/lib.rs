//! Turns ray hits from a held spray can into replicated poly-line strokes.
//!
//! A [`SprayCan`] is attached to one can entity in a shared scene. Every frame it reads the can's
//! pose and grab state; while the local participant holds the trigger it casts a ray from the
//! nozzle, lays the hits down as a poly-line, and runs a particle stream.

pub(crate) mod util;

pub mod config;
pub mod engine;
pub mod geom;
pub mod host;
pub mod shared;
pub mod world;

pub use config::PaintConfig;
pub use engine::{SprayCan, TickReport};
pub use shared::{GrabKey, ParticipantId};
pub use world::MemoryWorld;
