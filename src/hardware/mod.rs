//! Position source abstraction
//!
//! The tracker only consumes absolute 3D fixes; ranging drivers and the
//! localization that produces the fixes live behind [`PositionSource`].

pub mod source;
pub mod mock;
pub mod error;

pub use source::PositionSource;
pub use mock::MockPositionSource;
pub use error::{SourceError, SourceResult};
