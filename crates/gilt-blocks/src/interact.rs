//! One primary action per item, reachable by pointer and keyboard.
//!
//! Pointer clicks and Enter/Space both end in the same activation. A key
//! press on a native button is followed by a click the platform synthesizes;
//! that click arrives as [`ClickSource::Keyboard`] and is dropped so the
//! action runs exactly once.

use gilt_dom::{Document, DomError, NodeId};
use serde::Serialize;

/// Keys the pipeline reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            " " | "Space" | "Spacebar" => Key::Space,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => Key::Other,
        }
    }

    pub fn activates(self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

/// Where a click came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickSource {
    Pointer,
    /// Click synthesized by the platform after a key press on a button
    Keyboard,
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Cta { title: Option<String> },
    Navigate { href: String },
    Toggle { expanded: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub index: usize,
    pub action: Action,
}

#[derive(Debug)]
enum Bound {
    Cta { button: NodeId, title: Option<String> },
    Link,
    Toggle { button: NodeId, expanded: bool },
}

#[derive(Debug)]
struct Binding {
    index: usize,
    item: NodeId,
    bound: Bound,
    suppress_click: bool,
}

impl Binding {
    fn control(&self) -> Option<NodeId> {
        match self.bound {
            Bound::Cta { button, .. } | Bound::Toggle { button, .. } => Some(button),
            Bound::Link => None,
        }
    }

    fn activate(&mut self, doc: &mut Document, expanded_class: &str) -> Result<Action, DomError> {
        match &mut self.bound {
            Bound::Cta { title, .. } => Ok(Action::Cta {
                title: title.clone(),
            }),
            Bound::Link => {
                let href = doc
                    .find(self.item, |el| el.tag == "a" && el.has_attr("href"))
                    .and_then(|a| doc.attr(a, "href"))
                    .unwrap_or("#")
                    .to_string();
                Ok(Action::Navigate { href })
            }
            Bound::Toggle { button, expanded } => {
                *expanded = !*expanded;
                let value = if *expanded { "true" } else { "false" };
                doc.set_attr(*button, "aria-expanded", value)?;
                if *expanded {
                    doc.add_class(self.item, expanded_class)?;
                } else {
                    doc.remove_class(self.item, expanded_class)?;
                }
                Ok(Action::Toggle {
                    expanded: *expanded,
                })
            }
        }
    }
}

/// Item bindings of one block.
#[derive(Debug)]
pub struct InteractionBinder {
    bindings: Vec<Binding>,
    expanded_class: String,
}

impl InteractionBinder {
    pub fn new(expanded_class: String) -> Self {
        Self {
            bindings: Vec::new(),
            expanded_class,
        }
    }

    fn bind(&mut self, index: usize, item: NodeId, bound: Bound) {
        self.bindings.push(Binding {
            index,
            item,
            bound,
            suppress_click: false,
        });
    }

    /// Activate through a call-to-action button.
    pub fn bind_cta(&mut self, index: usize, item: NodeId, button: NodeId, title: Option<String>) {
        self.bind(index, item, Bound::Cta { button, title });
    }

    /// Activate anywhere on the item and follow its first link.
    pub fn bind_link(&mut self, index: usize, item: NodeId) {
        self.bind(index, item, Bound::Link);
    }

    /// Activate through a disclosure button.
    pub fn bind_toggle(&mut self, index: usize, item: NodeId, button: NodeId) {
        self.bind(
            index,
            item,
            Bound::Toggle {
                button,
                expanded: false,
            },
        );
    }

    fn binding_for(&mut self, doc: &Document, target: NodeId) -> Option<&mut Binding> {
        self.bindings
            .iter_mut()
            .find(|b| doc.contains(b.item, target))
    }

    /// Handle a click on `target`.
    pub fn click(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        source: ClickSource,
    ) -> Result<Option<Activation>, DomError> {
        let expanded_class = self.expanded_class.clone();
        let Some(binding) = self.binding_for(doc, target) else {
            return Ok(None);
        };

        if source == ClickSource::Keyboard && binding.suppress_click {
            binding.suppress_click = false;
            return Ok(None);
        }

        match binding.control() {
            Some(control) if !doc.contains(control, target) => return Ok(None),
            // Authored links inside a link-style item navigate natively.
            None if inside_link(doc, binding.item, target) => return Ok(None),
            _ => {}
        }

        let action = binding.activate(doc, &expanded_class)?;
        Ok(Some(Activation {
            index: binding.index,
            action,
        }))
    }

    /// Handle a key press while `target` has focus.
    pub fn key_down(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        key: Key,
    ) -> Result<Option<Activation>, DomError> {
        if !key.activates() {
            return Ok(None);
        }
        let expanded_class = self.expanded_class.clone();
        let Some(binding) = self.binding_for(doc, target) else {
            return Ok(None);
        };

        if key == Key::Enter && inside_link(doc, binding.item, target) {
            return Ok(None);
        }

        let on_control = binding.control().is_some_and(|c| doc.contains(c, target));
        if on_control || natively_clickable(doc, binding.item, target) {
            binding.suppress_click = true;
        }

        let action = binding.activate(doc, &expanded_class)?;
        Ok(Some(Activation {
            index: binding.index,
            action,
        }))
    }

    /// Whether the item at `index` is currently expanded.
    pub fn is_expanded(&self, index: usize) -> bool {
        self.bindings.iter().any(|b| {
            b.index == index && matches!(b.bound, Bound::Toggle { expanded: true, .. })
        })
    }
}

fn inside_link(doc: &Document, item: NodeId, target: NodeId) -> bool {
    doc.closest(target, |el| el.tag == "a" && el.has_attr("href"))
        .is_some_and(|a| doc.contains(item, a))
}

/// Whether the host follows a key press on `target` with its own click.
fn natively_clickable(doc: &Document, item: NodeId, target: NodeId) -> bool {
    doc.closest(target, |el| match el.tag.as_str() {
        "button" | "summary" => true,
        "input" => el
            .attr("type")
            .is_some_and(|t| matches!(t.to_ascii_lowercase().as_str(), "button" | "submit" | "reset")),
        _ => false,
    })
    .is_some_and(|el| doc.contains(item, el))
}
