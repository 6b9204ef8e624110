pub mod coords;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod remote;
pub mod snapshot;

pub use coords::{ChartViewport, LinearViewport};
pub use error::TdError;
pub use geometry::{Geometry, PositionOutcome};
pub use id::DrawingId;
pub use model::*;
pub use snapshot::DrawingSnapshot;

// Re-export kurbo so downstream crates share the same screen-space types
pub use kurbo;
