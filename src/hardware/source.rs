//! Position source interface

use crate::core::PositionFix;
use crate::hardware::SourceResult;

/// Abstraction over whatever turns raw ranging into absolute 3D fixes
pub trait PositionSource {
    /// Poll for a new fix.
    /// Returns Ok(Some(fix)) if a fix is available
    /// Returns Ok(None) if no new fix arrived since the last poll (non-blocking)
    /// Returns Err(error) if the source failed
    fn poll_fix(&mut self) -> SourceResult<Option<PositionFix>>;

    /// Check if the source is connected and delivering
    fn is_connected(&self) -> bool;

    /// Source identifier for logs
    fn get_id(&self) -> u8;

    /// Reset the source connection
    fn reset(&mut self) -> SourceResult<()>;
}

impl<S: PositionSource + ?Sized> PositionSource for Box<S> {
    fn poll_fix(&mut self) -> SourceResult<Option<PositionFix>> {
        (**self).poll_fix()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn get_id(&self) -> u8 {
        (**self).get_id()
    }

    fn reset(&mut self) -> SourceResult<()> {
        (**self).reset()
    }
}
