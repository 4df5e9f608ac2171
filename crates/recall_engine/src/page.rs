//! Host page capability.
//!
//! The retrieval loop only ever sees the page through [`Page`]: the current
//! address, the current serialized DOM, and a handful of writes (overlays and
//! the compose input). [`MemoryPage`] keeps everything in memory; [`FilePage`]
//! re-reads an HTML snapshot of the messaging client on every read.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use scraper::{Html, Selector};
use url::Url;

use crate::dom::{InputKind, InputTarget};
use crate::present::escape_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub id: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Before { anchor: String },
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub fragment: Fragment,
    pub placement: Placement,
    pub faded: bool,
}

/// What was written into the compose input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeState {
    pub selector: String,
    pub html: String,
    pub text: String,
    pub focused: bool,
    /// Caret position in characters.
    pub caret: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("failed to read page snapshot {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no element matches {0}")]
    NoMatch(String),
}

pub trait Page: Send + Sync {
    fn url(&self) -> String;
    fn html(&self) -> Result<String, PageError>;
    /// Inserts `fragment` immediately before the first element matching `anchor`.
    fn insert_before(&self, anchor: &str, fragment: Fragment) -> Result<(), PageError>;
    fn append_to_body(&self, fragment: Fragment);
    /// Removes the overlay with `id`; false when there was none.
    fn remove(&self, id: &str) -> bool;
    /// Dims the overlay with `id` ahead of removal.
    fn fade(&self, id: &str) -> bool;
    /// Replaces the compose input's content, focuses it, and puts the caret at the end.
    fn set_editable_content(&self, target: &InputTarget, text: &str) -> Result<(), PageError>;
}

#[derive(Debug, Default)]
struct PageInner {
    url: String,
    html: String,
    overlays: Vec<Overlay>,
    compose: Option<ComposeState>,
}

#[derive(Debug, Default)]
pub struct MemoryPage {
    inner: Mutex<PageInner>,
}

impl MemoryPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(PageInner {
                url: url.into(),
                html: html.into(),
                ..PageInner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    pub fn set_html(&self, html: impl Into<String>) {
        self.lock().html = html.into();
    }

    pub fn overlay(&self, id: &str) -> Option<Overlay> {
        self.lock()
            .overlays
            .iter()
            .find(|overlay| overlay.fragment.id == id)
            .cloned()
    }

    pub fn overlay_ids(&self) -> Vec<String> {
        self.lock()
            .overlays
            .iter()
            .map(|overlay| overlay.fragment.id.clone())
            .collect()
    }

    pub fn compose(&self) -> Option<ComposeState> {
        self.lock().compose.clone()
    }

    fn place(&self, fragment: Fragment, placement: Placement) {
        let mut inner = self.lock();
        inner
            .overlays
            .retain(|overlay| overlay.fragment.id != fragment.id);
        inner.overlays.push(Overlay {
            fragment,
            placement,
            faded: false,
        });
    }
}

impl Page for MemoryPage {
    fn url(&self) -> String {
        self.lock().url.clone()
    }

    fn html(&self) -> Result<String, PageError> {
        Ok(self.lock().html.clone())
    }

    fn insert_before(&self, anchor: &str, fragment: Fragment) -> Result<(), PageError> {
        let html = self.lock().html.clone();
        if !matches_any(&html, anchor) {
            return Err(PageError::NoMatch(anchor.to_string()));
        }
        self.place(
            fragment,
            Placement::Before {
                anchor: anchor.to_string(),
            },
        );
        Ok(())
    }

    fn append_to_body(&self, fragment: Fragment) {
        self.place(fragment, Placement::Body);
    }

    fn remove(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.overlays.len();
        inner.overlays.retain(|overlay| overlay.fragment.id != id);
        inner.overlays.len() != before
    }

    fn fade(&self, id: &str) -> bool {
        let mut inner = self.lock();
        match inner
            .overlays
            .iter_mut()
            .find(|overlay| overlay.fragment.id == id)
        {
            Some(overlay) => {
                overlay.faded = true;
                true
            }
            None => false,
        }
    }

    fn set_editable_content(&self, target: &InputTarget, text: &str) -> Result<(), PageError> {
        let mut inner = self.lock();
        if !matches_any(&inner.html, &target.selector) {
            return Err(PageError::NoMatch(target.selector.clone()));
        }
        let escaped = escape_html(text);
        let (html, focused) = match target.kind {
            InputKind::TextArea => (escaped, false),
            InputKind::ContentEditable => (
                format!(r#"<p data-placeholder="Type a message">{escaped}</p>"#),
                true,
            ),
            InputKind::Other => (escaped, false),
        };
        inner.compose = Some(ComposeState {
            selector: target.selector.clone(),
            html,
            text: text.to_string(),
            focused,
            caret: text.chars().count(),
        });
        Ok(())
    }
}

fn matches_any(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

/// A page backed by an HTML snapshot on disk.
///
/// The snapshot's `<link rel="canonical">` is taken as the page address; without
/// one, the file URL is used. Overlays and compose writes stay in memory.
#[derive(Debug)]
pub struct FilePage {
    path: PathBuf,
    fallback_url: String,
    page: MemoryPage,
}

impl FilePage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let fallback_url = file_url(&path);
        Self {
            page: MemoryPage::new(fallback_url.clone(), String::new()),
            path,
            fallback_url,
        }
    }

    fn refresh(&self) -> Result<String, PageError> {
        let html = fs::read_to_string(&self.path).map_err(|source| PageError::Read {
            path: self.path.clone(),
            source,
        })?;
        let url = canonical_url(&html).unwrap_or_else(|| self.fallback_url.clone());
        self.page.set_url(url);
        self.page.set_html(html.clone());
        Ok(html)
    }
}

impl Page for FilePage {
    fn url(&self) -> String {
        // A failed read keeps the last known address.
        let _ = self.refresh();
        self.page.url()
    }

    fn html(&self) -> Result<String, PageError> {
        self.refresh()
    }

    fn insert_before(&self, anchor: &str, fragment: Fragment) -> Result<(), PageError> {
        self.page.insert_before(anchor, fragment)
    }

    fn append_to_body(&self, fragment: Fragment) {
        self.page.append_to_body(fragment)
    }

    fn remove(&self, id: &str) -> bool {
        self.page.remove(id)
    }

    fn fade(&self, id: &str) -> bool {
        self.page.fade(id)
    }

    fn set_editable_content(&self, target: &InputTarget, text: &str) -> Result<(), PageError> {
        self.page.set_editable_content(target, text)
    }
}

fn canonical_url(html: &str) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn file_url(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| absolute.display().to_string())
}
