use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use recall_logging::recall_warn;

use crate::dom::DomReader;
use crate::page::{Fragment, Page};

pub const SUGGESTION_ID: &str = "recall-suggestion";
pub const DETAILS_ID: &str = "recall-details";
pub const BACKDROP_ID: &str = "recall-details-backdrop";
const NOTICE_PREFIX: &str = "recall-notice-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    fn color(self) -> &'static str {
        match self {
            NoticeLevel::Info => "#0078d4",
            NoticeLevel::Success => "#107c10",
            NoticeLevel::Warning => "#f7630c",
            NoticeLevel::Error => "#d13438",
        }
    }
}

/// What the suggestion affordance shows.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContent<'a> {
    pub preview: &'a str,
    pub source_count: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PresentError {
    #[error("could not find compose area for suggested reply")]
    NoAnchor,
    #[error("page unavailable: {0}")]
    Page(String),
}

/// Renders the suggestion, the details modal and notification banners into a page.
#[derive(Debug)]
pub struct Presenter {
    reader: Arc<DomReader>,
    notice_seq: AtomicU64,
}

impl Presenter {
    pub fn new(reader: Arc<DomReader>) -> Self {
        Self {
            reader,
            notice_seq: AtomicU64::new(0),
        }
    }

    /// Replaces any live suggestion with a new one anchored before the compose area.
    pub fn present(&self, page: &dyn Page, content: SuggestionContent<'_>) -> Result<(), PresentError> {
        page.remove(SUGGESTION_ID);

        let html = page
            .html()
            .map_err(|err| PresentError::Page(err.to_string()))?;
        let Some(anchor) = self.reader.find_compose_anchor(&html) else {
            recall_warn!("Could not find compose area for suggested reply");
            return Err(PresentError::NoAnchor);
        };

        page.insert_before(
            &anchor,
            Fragment {
                id: SUGGESTION_ID.to_string(),
                html: render_suggestion(content),
            },
        )
        .map_err(|err| {
            recall_warn!("Compose area vanished before insert: {}", err);
            PresentError::NoAnchor
        })
    }

    pub fn fade(&self, page: &dyn Page) -> bool {
        page.fade(SUGGESTION_ID)
    }

    pub fn dismiss(&self, page: &dyn Page) -> bool {
        page.remove(SUGGESTION_ID)
    }

    pub fn open_details(&self, page: &dyn Page, answer: &str, sources: &[String]) {
        page.append_to_body(Fragment {
            id: BACKDROP_ID.to_string(),
            html: format!(
                r#"<div id="{BACKDROP_ID}" style="position: fixed; inset: 0; background: rgba(0,0,0,0.5); z-index: 19999;"></div>"#
            ),
        });
        page.append_to_body(Fragment {
            id: DETAILS_ID.to_string(),
            html: render_details(answer, sources),
        });
    }

    pub fn close_details(&self, page: &dyn Page) {
        page.remove(BACKDROP_ID);
        page.remove(DETAILS_ID);
    }

    /// Shows a banner and returns its id so the caller can expire it.
    pub fn show_notice(&self, page: &dyn Page, level: NoticeLevel, text: &str) -> String {
        let id = format!(
            "{NOTICE_PREFIX}{}",
            self.notice_seq.fetch_add(1, Ordering::Relaxed) + 1
        );
        page.append_to_body(Fragment {
            id: id.clone(),
            html: render_notice(&id, level, text),
        });
        id
    }
}

fn render_suggestion(content: SuggestionContent<'_>) -> String {
    format!(
        r#"<div id="{SUGGESTION_ID}" class="recall-suggestion">
    <button class="recall-close" title="Dismiss">&times;</button>
    <div class="recall-suggestion-text">
        <strong>Recall Suggestion:</strong><br>
        {preview}
    </div>
    <div class="recall-buttons">
        <button class="recall-btn recall-btn-primary" id="use-suggestion">Use This Reply</button>
        <button class="recall-btn recall-btn-secondary" id="view-details">View Details</button>
        <span class="recall-source-count">Based on {count} relevant memories</span>
    </div>
</div>"#,
        preview = escape_html(content.preview),
        count = content.source_count,
    )
}

fn render_details(answer: &str, sources: &[String]) -> String {
    let items: String = sources
        .iter()
        .map(|source| format!("<li>{}</li>", escape_html(source)))
        .collect();
    let source_list = if items.is_empty() {
        String::new()
    } else {
        format!(r#"<ul class="recall-details-sources">{items}</ul>"#)
    };
    format!(
        r#"<div id="{DETAILS_ID}" role="dialog" style="position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%); z-index: 20000;">
    <h3>Retrieved Context Memories</h3>
    <div class="recall-details-answer" style="white-space: pre-wrap;">{answer}</div>
    {source_list}
    <button id="closeDetails">Close</button>
</div>"#,
        answer = escape_html(answer),
    )
}

fn render_notice(id: &str, level: NoticeLevel, text: &str) -> String {
    format!(
        r#"<div id="{id}" class="recall-notice" style="position: fixed; top: 20px; right: 20px; background: {color}; color: white; z-index: 10000;">[Recall] {text}</div>"#,
        color = level.color(),
        text = escape_html(text),
    )
}

/// Escapes text for inclusion in element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
