//! Carousel state machine and its DOM controls.
//!
//! [`Carousel`] is the pure state: the active slide plus whether autoplay is
//! currently running. [`CarouselView`] owns the generated controls and the
//! host timer and keeps both in sync with the state.

use std::time::Duration;

use gilt_dom::{Document, DomError, NodeId};

use crate::config::BlockOptions;
use crate::host::{IntervalTimer, Platform, TimerToken};
use crate::interact::Key;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CarouselError {
    #[error("Carousel has no slides")]
    Empty,

    #[error("Slide {index} is out of range for {len} slides")]
    OutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Active slide and autoplay state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    index: usize,
    len: usize,
    autoplay: bool,
    paused: bool,
}

impl Carousel {
    pub fn new(len: usize, autoplay: bool) -> Result<Self, CarouselError> {
        if len == 0 {
            return Err(CarouselError::Empty);
        }
        Ok(Self {
            index: 0,
            len,
            autoplay,
            paused: false,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Advance one slide, wrapping to the first.
    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    /// Go back one slide, wrapping to the last.
    pub fn prev(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }

    pub fn go_to(&mut self, index: usize) -> Result<usize, CarouselError> {
        if index >= self.len {
            return Err(CarouselError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.index = index;
        Ok(self.index)
    }

    /// Whether the autoplay timer should currently be armed.
    pub fn is_running(&self) -> bool {
        self.autoplay && !self.paused
    }

    /// Autoplay tick: advance when running.
    pub fn tick(&mut self) -> Option<usize> {
        self.is_running().then(|| self.next())
    }

    /// Pause autoplay. Returns true when the timer must be cleared.
    pub fn pause(&mut self) -> bool {
        let was_running = self.is_running();
        self.paused = true;
        was_running
    }

    /// Resume autoplay. Returns true when the timer must be re-armed.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.is_running()
    }
}

/// A decorated carousel: state, generated controls and the autoplay timer.
pub struct CarouselView {
    state: Carousel,
    slides: Vec<NodeId>,
    dots: Vec<NodeId>,
    prev: NodeId,
    next: NodeId,
    live: NodeId,
    timer: Box<dyn IntervalTimer>,
    armed: Option<TimerToken>,
    period: Duration,
    slide_active: String,
    dot_active: String,
}

impl std::fmt::Debug for CarouselView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselView")
            .field("state", &self.state)
            .field("armed", &self.armed)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

fn control_button(
    doc: &mut Document,
    class: &str,
    label: &str,
    text: &str,
) -> Result<NodeId, DomError> {
    let button = doc.create_element("button");
    doc.set_attr(button, "type", "button")?;
    doc.add_class(button, class)?;
    doc.set_attr(button, "aria-label", label)?;
    doc.set_text(button, text)?;
    Ok(button)
}

impl CarouselView {
    /// Turn `slides` into a carousel inside `block`.
    pub fn build(
        doc: &mut Document,
        block: NodeId,
        slides: Vec<NodeId>,
        options: &BlockOptions,
        platform: &dyn Platform,
    ) -> Result<Self, CarouselError> {
        let autoplay = options.autoplay_interval_ms > 0 && !platform.prefers_reduced_motion();
        let state = Carousel::new(slides.len(), autoplay)?;

        doc.add_class(block, &options.class("carousel"))?;
        doc.set_attr(block, "aria-roledescription", "carousel")?;
        for slide in &slides {
            doc.add_class(*slide, &options.class("slide"))?;
        }

        let controls = doc.create_element("div");
        doc.add_class(controls, &options.class("controls"))?;
        let prev = control_button(doc, &options.class("prev"), "Previous slide", "\u{2039}")?;
        let next = control_button(doc, &options.class("next"), "Next slide", "\u{203a}")?;
        doc.append(controls, prev)?;
        doc.append(controls, next)?;
        doc.append(block, controls)?;

        let nav = doc.create_element("div");
        doc.add_class(nav, &options.class("dots"))?;
        doc.set_attr(nav, "role", "group")?;
        doc.set_attr(nav, "aria-label", "Choose slide")?;
        let mut dots = Vec::with_capacity(slides.len());
        for i in 0..slides.len() {
            let label = format!("Go to slide {}", i + 1);
            let dot = control_button(doc, &options.class("dot"), &label, "")?;
            doc.append(nav, dot)?;
            dots.push(dot);
        }
        doc.append(block, nav)?;

        let live = doc.create_element("div");
        doc.add_class(live, &options.class("status"))?;
        doc.set_attr(live, "aria-live", "polite")?;
        doc.set_attr(live, "aria-atomic", "true")?;
        doc.append(block, live)?;

        let mut view = Self {
            state,
            slides,
            dots,
            prev,
            next,
            live,
            timer: platform.interval_timer(),
            armed: None,
            period: Duration::from_millis(options.autoplay_interval_ms),
            slide_active: options.class("slide-active"),
            dot_active: options.class("dot-active"),
        };
        view.sync(doc)?;
        if view.state.is_running() {
            view.armed = Some(view.timer.arm(view.period));
        }
        Ok(view)
    }

    pub fn index(&self) -> usize {
        self.state.index()
    }

    pub fn state(&self) -> &Carousel {
        &self.state
    }

    /// Make the DOM reflect the active slide.
    fn sync(&self, doc: &mut Document) -> Result<(), DomError> {
        let active = self.state.index();
        for (i, (slide, dot)) in self.slides.iter().zip(&self.dots).enumerate() {
            if i == active {
                doc.add_class(*slide, &self.slide_active)?;
                doc.remove_attr(*slide, "aria-hidden")?;
                doc.add_class(*dot, &self.dot_active)?;
                doc.set_attr(*dot, "aria-current", "true")?;
            } else {
                doc.remove_class(*slide, &self.slide_active)?;
                doc.set_attr(*slide, "aria-hidden", "true")?;
                doc.remove_class(*dot, &self.dot_active)?;
                doc.remove_attr(*dot, "aria-current")?;
            }
        }
        doc.set_text(
            self.live,
            &format!("Slide {} of {}", active + 1, self.state.len()),
        )
    }

    pub fn next(&mut self, doc: &mut Document) -> Result<usize, CarouselError> {
        let index = self.state.next();
        self.sync(doc)?;
        Ok(index)
    }

    pub fn prev(&mut self, doc: &mut Document) -> Result<usize, CarouselError> {
        let index = self.state.prev();
        self.sync(doc)?;
        Ok(index)
    }

    pub fn go_to(&mut self, doc: &mut Document, index: usize) -> Result<usize, CarouselError> {
        let index = self.state.go_to(index)?;
        self.sync(doc)?;
        Ok(index)
    }

    /// Pointer entered the carousel: stop autoplay.
    pub fn pointer_enter(&mut self) {
        if self.state.pause() {
            if let Some(token) = self.armed.take() {
                self.timer.clear(token);
            }
        }
    }

    /// Pointer left the carousel: re-arm autoplay at most once.
    pub fn pointer_leave(&mut self) {
        if self.state.resume() && self.armed.is_none() {
            self.armed = Some(self.timer.arm(self.period));
        }
    }

    /// A host timer fired. Stale tokens are ignored.
    pub fn timer_fired(
        &mut self,
        doc: &mut Document,
        token: TimerToken,
    ) -> Result<Option<usize>, CarouselError> {
        if self.armed != Some(token) {
            return Ok(None);
        }
        match self.state.tick() {
            Some(index) => {
                self.sync(doc)?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    /// Route a click on one of the generated controls.
    pub fn click(
        &mut self,
        doc: &mut Document,
        target: NodeId,
    ) -> Result<Option<usize>, CarouselError> {
        if doc.contains(self.prev, target) {
            return self.prev(doc).map(Some);
        }
        if doc.contains(self.next, target) {
            return self.next(doc).map(Some);
        }
        match self.dots.iter().position(|d| doc.contains(*d, target)) {
            Some(i) => self.go_to(doc, i).map(Some),
            None => Ok(None),
        }
    }

    /// Arrow keys move between slides.
    pub fn key_down(&mut self, doc: &mut Document, key: Key) -> Result<Option<usize>, CarouselError> {
        match key {
            Key::ArrowLeft => self.prev(doc).map(Some),
            Key::ArrowRight => self.next(doc).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether `target` is one of the generated controls.
    pub fn owns_control(&self, doc: &Document, target: NodeId) -> bool {
        [self.prev, self.next]
            .iter()
            .chain(&self.dots)
            .any(|c| doc.contains(*c, target))
    }
}
