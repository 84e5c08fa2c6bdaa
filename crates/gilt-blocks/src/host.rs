//! Host platform primitives consumed by the pipeline.
//!
//! The pipeline never detects intersections, runs timers or queries media
//! features itself. An embedding host implements [`Platform`] and forwards
//! the resulting events to the decorated block.

use std::time::Duration;

use gilt_dom::NodeId;

use crate::config::RootMargin;

/// Viewport-intersection detection for a set of elements.
pub trait IntersectionDetector {
    /// Start reporting intersections for `target`.
    fn observe(&mut self, target: NodeId);

    /// Stop reporting intersections for `target`. Other targets are unaffected.
    fn unobserve(&mut self, target: NodeId);
}

/// Handle of an armed interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Periodic timers.
pub trait IntervalTimer {
    /// Arm a timer firing every `period`.
    fn arm(&mut self, period: Duration) -> TimerToken;

    /// Cancel a previously armed timer.
    fn clear(&mut self, token: TimerToken);
}

/// Everything the pipeline needs from its host.
pub trait Platform {
    /// Whether the user asked for reduced motion.
    fn prefers_reduced_motion(&self) -> bool;

    /// Create a detector with the given margin, or `None` when the host has
    /// no intersection support.
    fn intersection_detector(&self, margin: &RootMargin) -> Option<Box<dyn IntersectionDetector>>;

    /// Create an interval timer.
    fn interval_timer(&self) -> Box<dyn IntervalTimer>;
}

/// Build-time platform used when enhancing pages on disk.
///
/// There is no viewport and no clock: detectors and timers accept
/// registrations and never fire, so items stay unrevealed and carousels stay
/// on their first slide in the emitted markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticPlatform;

impl Platform for StaticPlatform {
    fn prefers_reduced_motion(&self) -> bool {
        false
    }

    fn intersection_detector(&self, _margin: &RootMargin) -> Option<Box<dyn IntersectionDetector>> {
        Some(Box::new(InertDetector))
    }

    fn interval_timer(&self) -> Box<dyn IntervalTimer> {
        Box::new(InertTimer::default())
    }
}

struct InertDetector;

impl IntersectionDetector for InertDetector {
    fn observe(&mut self, _target: NodeId) {}

    fn unobserve(&mut self, _target: NodeId) {}
}

#[derive(Default)]
struct InertTimer {
    next: u64,
}

impl IntervalTimer for InertTimer {
    fn arm(&mut self, _period: Duration) -> TimerToken {
        self.next += 1;
        TimerToken(self.next)
    }

    fn clear(&mut self, _token: TimerToken) {}
}
