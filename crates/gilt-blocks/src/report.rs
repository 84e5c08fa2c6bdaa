//! Event reporting and per-item enhancement outcomes.

use gilt_dom::DomError;
use serde::Serialize;
use serde_json::Value;

/// Optional analytics sink with a single capability.
///
/// Reporters are called opportunistically; an implementation must not fail
/// the enhancement it is observing.
pub trait Reporter {
    fn record(&self, event: &str, payload: &Value);
}

/// Reporter that drops every event. Used when the host supplies none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn record(&self, _event: &str, _payload: &Value) {}
}

/// Reporter that forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, event: &str, payload: &Value) {
        tracing::debug!(event, %payload, "block event");
    }
}

/// An enhancement that was skipped because its input was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Skipped {
    /// Item has no media region
    Media,
    /// Item has no content region
    Content,
    /// Media region holds no image
    Image,
    /// No title could be found for the item
    Title,
    /// Progress data attributes missing or invalid
    Progress,
    /// Primary action needs a region the item lacks
    Action,
    /// Embed requested but no source configured
    EmbedSource,
    /// Item has more than two child elements; the extras were ignored
    ExtraRegions(usize),
}

/// What happened to one successfully enhanced item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemReport {
    pub skipped: Vec<Skipped>,

    /// Number of controls that received a generated accessible name
    pub generated_names: usize,
}

/// Why an item could not be enhanced.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("Item is a <{0}> element, which cannot hold enhancements")]
    VoidElement(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Outcome of enhancing the item at `index`.
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub result: Result<ItemReport, ItemError>,
}

/// Aggregated outcomes for one block.
#[derive(Debug, Default)]
pub struct BlockReport {
    pub items: Vec<ItemOutcome>,

    /// Block-level enhancements that were skipped
    pub skipped: Vec<Skipped>,
}

impl BlockReport {
    /// Number of items enhanced without error.
    pub fn enhanced(&self) -> usize {
        self.items.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Failed items with their index.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ItemError)> {
        self.items
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_outcomes() {
        let report = BlockReport {
            items: vec![
                ItemOutcome {
                    index: 0,
                    result: Ok(ItemReport::default()),
                },
                ItemOutcome {
                    index: 1,
                    result: Err(ItemError::VoidElement("hr".to_string())),
                },
                ItemOutcome {
                    index: 2,
                    result: Ok(ItemReport {
                        skipped: vec![Skipped::Media],
                        generated_names: 0,
                    }),
                },
            ],
            skipped: Vec::new(),
        };

        assert_eq!(report.enhanced(), 2);
        let failed: Vec<usize> = report.failures().map(|(i, _)| i).collect();
        assert_eq!(failed, vec![1]);
        assert!(!report.is_clean());
    }

    #[test]
    fn skipped_reasons_serialize_snake_case() {
        let json = serde_json::to_string(&vec![Skipped::EmbedSource, Skipped::ExtraRegions(2)])
            .unwrap();
        assert_eq!(json, r#"["embed_source",{"extra_regions":2}]"#);
    }
}
