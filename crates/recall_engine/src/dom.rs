use ego_tree::NodeRef;
use recall_logging::{recall_debug, recall_trace};
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::fingerprint::short_hash;
use crate::selectors::{CompiledSelectors, LocatorChain, SelectorError, SelectorTable};

/// The last message bubble as read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub text: String,
    pub from_self: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    TextArea,
    ContentEditable,
    Other,
}

/// The compose input located through the text-input chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTarget {
    /// Source text of the locator that matched.
    pub selector: String,
    pub kind: InputKind,
    /// Stable identity of the element across reads, used for bind-once.
    pub fingerprint: String,
}

/// Read-only queries against a serialized page.
#[derive(Debug, Clone)]
pub struct DomReader {
    selectors: CompiledSelectors,
}

impl DomReader {
    pub fn new(selectors: CompiledSelectors) -> Self {
        Self { selectors }
    }

    pub fn from_table(table: &SelectorTable) -> Result<Self, SelectorError> {
        Ok(Self::new(table.compile()?))
    }

    /// Extracts the last message in document order, or `None` when nothing usable is visible.
    pub fn read_last_message(&self, html: &str) -> Option<LastMessage> {
        let doc = Html::parse_document(html);

        let Some(container) = self.locate_container(&doc) else {
            recall_debug!("No message container found with any selector");
            return None;
        };

        let Some(bubble) = last_match(container, &self.selectors.bubbles) else {
            recall_debug!("Message container holds no message bubbles");
            return None;
        };

        let text = self.message_text(bubble);
        if text.is_empty() {
            recall_debug!("No text content found in last message");
            return None;
        }

        let from_self = self
            .selectors
            .self_markers
            .iter()
            .any(|(_, marker)| bubble.select(marker).next().is_some());

        recall_trace!("Extracted text: {}", preview(&text, 200));
        Some(LastMessage { text, from_self })
    }

    pub fn find_text_input(&self, html: &str) -> Option<InputTarget> {
        let doc = Html::parse_document(html);
        let (source, element) = first_match(&doc, &self.selectors.text_inputs)?;
        recall_debug!("Found input: {}", source);
        Some(InputTarget {
            selector: source.to_string(),
            kind: input_kind(element),
            fingerprint: fingerprint(source, element),
        })
    }

    /// Returns the locator of the element a suggestion should be inserted before.
    pub fn find_compose_anchor(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        first_match(&doc, &self.selectors.compose_anchors).map(|(source, _)| source.to_string())
    }

    fn locate_container<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        if let Some((source, container)) = first_match(doc, &self.selectors.containers) {
            recall_trace!("Found container with selector: {}", source);
            return Some(container);
        }

        let probe = self.selectors.container_probe.as_ref()?;
        let first = doc.select(probe).next()?;
        recall_debug!("Using parent of first message-like element as container");
        parent_element(first)
    }

    fn message_text(&self, bubble: ElementRef<'_>) -> String {
        for (source, selector) in self.selectors.contents.iter() {
            if let Some(content) = bubble.select(selector).next() {
                let text = element_text(content);
                if !text.is_empty() {
                    recall_trace!("Found content with selector: {}", source);
                    return text;
                }
            }
        }
        element_text(bubble)
    }
}

fn first_match<'a, 'c>(doc: &'a Html, chain: &'c LocatorChain) -> Option<(&'c str, ElementRef<'a>)> {
    chain.iter().find_map(|(source, selector)| {
        let found = doc.select(selector).next();
        if found.is_none() {
            recall_trace!("{} miss: {}", chain.name(), source);
        }
        found.map(|element| (source, element))
    })
}

fn last_match<'a>(scope: ElementRef<'a>, chain: &LocatorChain) -> Option<ElementRef<'a>> {
    chain
        .iter()
        .find_map(|(_, selector)| scope.select(selector).last())
}

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let parent: NodeRef<'_, Node> = element.parent()?;
    ElementRef::wrap(parent)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn input_kind(element: ElementRef<'_>) -> InputKind {
    let value = element.value();
    if value.name().eq_ignore_ascii_case("textarea") {
        InputKind::TextArea
    } else if value
        .attr("contenteditable")
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
    {
        InputKind::ContentEditable
    } else {
        InputKind::Other
    }
}

/// Hashes the attributes that survive typing; the element's content does not.
fn fingerprint(source: &str, element: ElementRef<'_>) -> String {
    let value = element.value();
    let identity = format!(
        "{source}|{}|{}|{}|{}",
        value.name(),
        value.attr("id").unwrap_or_default(),
        value.attr("data-tid").unwrap_or_default(),
        value.attr("class").unwrap_or_default(),
    );
    short_hash(&identity)
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
