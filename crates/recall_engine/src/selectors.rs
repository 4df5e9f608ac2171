use scraper::Selector;
use serde::{Deserialize, Serialize};

/// Ordered CSS locator chains for the messaging client.
///
/// Every chain is tried front to back and the first match wins. The defaults
/// target the Teams web client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    pub message_containers: Vec<String>,
    /// Last resort when no container matches: the parent of the first hit is used.
    pub container_probe: Option<String>,
    pub message_bubbles: Vec<String>,
    pub message_contents: Vec<String>,
    pub self_markers: Vec<String>,
    pub text_inputs: Vec<String>,
    pub compose_anchors: Vec<String>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            message_containers: strings(&[
                r#"[data-tid="conversation-pane"]"#,
                r#"[data-tid="chat-pane-list"]"#,
                r#"[data-tid="virtualized-list"]"#,
                r#"[data-tid="chat-pane"]"#,
                r#"[data-tid="message-list"]"#,
                r#"[role="log"]"#,
                r#"[role="main"]"#,
                ".ui-chat__messagelist",
                ".ts-message-list",
                ".messages-container",
            ]),
            container_probe: Some(
                r#"[data-tid*="message"], [class*="message"], [role="listitem"]"#.to_string(),
            ),
            message_bubbles: strings(&[r#"[data-tid="chat-pane-message"]"#]),
            message_contents: strings(&[
                ".ui-chat__message__body",
                ".message-body",
                r#"[data-tid="message-body"]"#,
                ".ts-message-body",
                r#"[data-tid="message-content"]"#,
                ".content",
                "p",
                "div",
                "span",
            ]),
            self_markers: strings(&[r#"[data-tid="message-from-me"]"#]),
            text_inputs: strings(&[
                r#"[data-tid="ckeditor"]"#,
                ".ck-editor__editable",
                r#"[data-tid="message-compose-box"] [contenteditable="true"]"#,
                r#"div[contenteditable="true"][role="textbox"]"#,
                r#"[data-tid="meeting-chat-input"]"#,
            ]),
            compose_anchors: strings(&[
                r#"[data-tid="message-compose-box"]"#,
                ".ck-editor",
                r#"[contenteditable="true"]"#,
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("invalid selector {selector:?} in {chain}: {message}")]
    Invalid {
        chain: &'static str,
        selector: String,
        message: String,
    },
    #[error("selector chain {0} must not be empty")]
    EmptyChain(&'static str),
}

/// A compiled chain that remembers each selector's source text for diagnostics.
#[derive(Debug, Clone)]
pub struct LocatorChain {
    name: &'static str,
    entries: Vec<(String, Selector)>,
}

impl LocatorChain {
    pub fn compile(name: &'static str, sources: &[String]) -> Result<Self, SelectorError> {
        let entries = sources
            .iter()
            .map(|source| compile_one(name, source).map(|selector| (source.clone(), selector)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, entries })
    }

    fn compile_required(name: &'static str, sources: &[String]) -> Result<Self, SelectorError> {
        if sources.is_empty() {
            return Err(SelectorError::EmptyChain(name));
        }
        Self::compile(name, sources)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.entries
            .iter()
            .map(|(source, selector)| (source.as_str(), selector))
    }
}

fn compile_one(chain: &'static str, source: &str) -> Result<Selector, SelectorError> {
    Selector::parse(source).map_err(|err| SelectorError::Invalid {
        chain,
        selector: source.to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub containers: LocatorChain,
    pub container_probe: Option<Selector>,
    pub bubbles: LocatorChain,
    pub contents: LocatorChain,
    pub self_markers: LocatorChain,
    pub text_inputs: LocatorChain,
    pub compose_anchors: LocatorChain,
}

impl SelectorTable {
    pub fn compile(&self) -> Result<CompiledSelectors, SelectorError> {
        Ok(CompiledSelectors {
            containers: LocatorChain::compile_required(
                "message_containers",
                &self.message_containers,
            )?,
            container_probe: self
                .container_probe
                .as_deref()
                .map(|probe| compile_one("container_probe", probe))
                .transpose()?,
            bubbles: LocatorChain::compile_required("message_bubbles", &self.message_bubbles)?,
            contents: LocatorChain::compile("message_contents", &self.message_contents)?,
            self_markers: LocatorChain::compile("self_markers", &self.self_markers)?,
            text_inputs: LocatorChain::compile_required("text_inputs", &self.text_inputs)?,
            compose_anchors: LocatorChain::compile_required(
                "compose_anchors",
                &self.compose_anchors,
            )?,
        })
    }
}
