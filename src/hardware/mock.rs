//! Mock position source for testing and simulation

use crate::core::PositionFix;
use crate::hardware::{PositionSource, SourceError, SourceResult};
use std::collections::VecDeque;

/// Queue-backed position source
pub struct MockPositionSource {
    id: u8,
    queue: VecDeque<PositionFix>,
    connected: bool,
    delivered: u32,
    resets: u32,
}

impl MockPositionSource {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            connected: true,
            delivered: 0,
            resets: 0,
        }
    }

    /// Queue a fix to be returned by a later poll
    pub fn push_fix(&mut self, fix: PositionFix) {
        self.queue.push_back(fix);
    }

    /// Simulate connection loss
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Restore connection
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    pub fn queued_fix_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of fixes handed out so far
    pub fn delivered_count(&self) -> u32 {
        self.delivered
    }

    pub fn reset_count(&self) -> u32 {
        self.resets
    }
}

impl PositionSource for MockPositionSource {
    fn poll_fix(&mut self) -> SourceResult<Option<PositionFix>> {
        if !self.connected {
            return Err(SourceError::ConnectionLost { source_id: self.id });
        }

        let fix = self.queue.pop_front();
        if let Some(fix) = fix {
            if !fix.position.iter().all(|v| v.is_finite()) {
                return Err(SourceError::InvalidFix {
                    details: format!("non-finite position {:?}", fix.position),
                });
            }
            self.delivered += 1;
        }
        Ok(fix)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn get_id(&self) -> u8 {
        self.id
    }

    fn reset(&mut self) -> SourceResult<()> {
        self.queue.clear();
        self.connected = true;
        self.resets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_queue() {
        let mut source = MockPositionSource::new(1);
        source.push_fix(PositionFix::new(1.0, 2.0, 3.0).with_timestamp(10));
        source.push_fix(PositionFix::new(4.0, 5.0, 6.0).with_timestamp(20));

        assert_eq!(source.queued_fix_count(), 2);
        let fix = source.poll_fix().unwrap().unwrap();
        assert_eq!(fix.timestamp_ms, 10);
        assert_eq!(fix.position.x, 1.0);
        assert_eq!(source.poll_fix().unwrap().unwrap().timestamp_ms, 20);
        assert!(source.poll_fix().unwrap().is_none());
        assert_eq!(source.delivered_count(), 2);
    }

    #[test]
    fn test_disconnect_and_reset() {
        let mut source = MockPositionSource::new(4);
        source.push_fix(PositionFix::new(0.0, 0.0, 0.0));
        source.disconnect();

        assert!(!source.is_connected());
        assert_eq!(source.poll_fix(), Err(SourceError::ConnectionLost { source_id: 4 }));

        source.reset().unwrap();
        assert!(source.is_connected());
        assert_eq!(source.queued_fix_count(), 0);
        assert_eq!(source.reset_count(), 1);
    }

    #[test]
    fn test_rejects_non_finite_fix() {
        let mut source = MockPositionSource::new(2);
        source.push_fix(PositionFix::new(f32::NAN, 0.0, 0.0));

        assert!(matches!(source.poll_fix(), Err(SourceError::InvalidFix { .. })));
        assert_eq!(source.delivered_count(), 0);
    }
}
