//! An inspectable [`Platform`] for embedding hosts and simulations.
//!
//! Every detector and timer created by a [`RecordingPlatform`] writes into a
//! shared log, so a host (or a test) can see which elements are currently
//! observed and which timers are armed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gilt_dom::NodeId;

use crate::config::RootMargin;
use crate::host::{IntersectionDetector, IntervalTimer, Platform, TimerToken};

/// Shared state written by recording detectors and timers.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Elements currently observed, in subscription order
    pub observed: Vec<NodeId>,

    /// Elements that were unobserved, in order
    pub unobserved: Vec<NodeId>,

    /// Margins of every detector created
    pub margins: Vec<String>,

    /// Currently armed timers with their period
    pub armed: Vec<(TimerToken, Duration)>,

    /// Total number of `arm` calls
    pub arm_calls: usize,

    /// Total number of `clear` calls
    pub clear_calls: usize,

    next_token: u64,
}

/// Platform whose primitives record what the pipeline asks of them.
#[derive(Debug, Clone)]
pub struct RecordingPlatform {
    reduced_motion: bool,
    intersection: bool,
    log: Rc<RefCell<Recorded>>,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            reduced_motion: false,
            intersection: true,
            log: Rc::new(RefCell::new(Recorded::default())),
        }
    }

    /// Report a reduced-motion preference.
    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// Behave like a host without intersection support.
    pub fn without_intersection(mut self) -> Self {
        self.intersection = false;
        self
    }

    /// Elements currently observed.
    pub fn observed(&self) -> Vec<NodeId> {
        self.log.borrow().observed.clone()
    }

    pub fn unobserved(&self) -> Vec<NodeId> {
        self.log.borrow().unobserved.clone()
    }

    /// Number of detectors created so far.
    pub fn detectors_created(&self) -> usize {
        self.log.borrow().margins.len()
    }

    pub fn margins(&self) -> Vec<String> {
        self.log.borrow().margins.clone()
    }

    /// Timers currently armed.
    pub fn armed_timers(&self) -> Vec<TimerToken> {
        self.log.borrow().armed.iter().map(|(t, _)| *t).collect()
    }

    pub fn arm_calls(&self) -> usize {
        self.log.borrow().arm_calls
    }

    pub fn clear_calls(&self) -> usize {
        self.log.borrow().clear_calls
    }
}

impl Platform for RecordingPlatform {
    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn intersection_detector(&self, margin: &RootMargin) -> Option<Box<dyn IntersectionDetector>> {
        if !self.intersection {
            return None;
        }
        self.log.borrow_mut().margins.push(margin.to_string());
        Some(Box::new(RecordingDetector {
            log: Rc::clone(&self.log),
        }))
    }

    fn interval_timer(&self) -> Box<dyn IntervalTimer> {
        Box::new(RecordingTimer {
            log: Rc::clone(&self.log),
        })
    }
}

struct RecordingDetector {
    log: Rc<RefCell<Recorded>>,
}

impl IntersectionDetector for RecordingDetector {
    fn observe(&mut self, target: NodeId) {
        let mut log = self.log.borrow_mut();
        if !log.observed.contains(&target) {
            log.observed.push(target);
        }
    }

    fn unobserve(&mut self, target: NodeId) {
        let mut log = self.log.borrow_mut();
        log.observed.retain(|t| *t != target);
        log.unobserved.push(target);
    }
}

struct RecordingTimer {
    log: Rc<RefCell<Recorded>>,
}

impl IntervalTimer for RecordingTimer {
    fn arm(&mut self, period: Duration) -> TimerToken {
        let mut log = self.log.borrow_mut();
        log.next_token += 1;
        let token = TimerToken(log.next_token);
        log.armed.push((token, period));
        log.arm_calls += 1;
        token
    }

    fn clear(&mut self, token: TimerToken) {
        let mut log = self.log.borrow_mut();
        log.armed.retain(|(t, _)| *t != token);
        log.clear_calls += 1;
    }
}
