use pretty_assertions::assert_eq;
use recall_engine::{DomReader, InputKind, LastMessage, SelectorTable};

fn reader() -> DomReader {
    DomReader::from_table(&SelectorTable::default()).expect("default selectors compile")
}

fn page(body: &str) -> String {
    format!("<html><head></head><body>{body}</body></html>")
}

fn last(text: &str, from_self: bool) -> Option<LastMessage> {
    Some(LastMessage {
        text: text.to_string(),
        from_self,
    })
}

#[test]
fn reads_the_last_bubble_of_the_primary_container() {
    let html = page(
        r#"<div data-tid="conversation-pane">
            <div data-tid="chat-pane-message"><div class="message-body">Hi</div></div>
            <div data-tid="chat-pane-message"><div data-tid="message-body">  Hello there  </div></div>
        </div>"#,
    );
    assert_eq!(reader().read_last_message(&html), last("Hello there", false));
}

#[test]
fn later_container_locators_are_tried_in_order() {
    let html = page(
        r#"<div class="messages-container">
            <div data-tid="chat-pane-message"><p>from the fallback list</p></div>
        </div>"#,
    );
    assert_eq!(
        reader().read_last_message(&html),
        last("from the fallback list", false)
    );
}

#[test]
fn parent_of_first_message_like_element_is_the_last_resort() {
    let html = page(
        r#"<section>
            <div data-tid="chat-pane-message"><span>first</span></div>
            <div data-tid="chat-pane-message"><span>second</span></div>
        </section>"#,
    );
    assert_eq!(reader().read_last_message(&html), last("second", false));
}

#[test]
fn nothing_message_like_yields_none() {
    let html = page("<div><p>just a page</p></div>");
    assert_eq!(reader().read_last_message(&html), None);
}

#[test]
fn container_without_bubbles_yields_none() {
    let html = page(r#"<div data-tid="conversation-pane"><p>loading</p></div>"#);
    assert_eq!(reader().read_last_message(&html), None);
}

#[test]
fn own_messages_are_flagged() {
    let html = page(
        r#"<div data-tid="conversation-pane">
            <div data-tid="chat-pane-message">
                <span data-tid="message-from-me"></span>
                <div class="message-body">mine</div>
            </div>
        </div>"#,
    );
    assert_eq!(reader().read_last_message(&html), last("mine", true));
}

#[test]
fn empty_content_falls_through_to_the_next_locator() {
    let html = page(
        r#"<div data-tid="conversation-pane">
            <div data-tid="chat-pane-message"><div class="message-body"> </div><p>later</p></div>
        </div>"#,
    );
    assert_eq!(reader().read_last_message(&html), last("later", false));
}

#[test]
fn bubble_text_is_used_when_no_content_locator_matches() {
    let html = page(
        r#"<div data-tid="conversation-pane"><div data-tid="chat-pane-message">raw text</div></div>"#,
    );
    assert_eq!(reader().read_last_message(&html), last("raw text", false));
}

#[test]
fn whitespace_only_message_yields_none() {
    let html = page(
        r#"<div data-tid="conversation-pane"><div data-tid="chat-pane-message">   </div></div>"#,
    );
    assert_eq!(reader().read_last_message(&html), None);
}

#[test]
fn finds_the_editor_and_keeps_its_fingerprint_while_typing() {
    let reader = reader();
    let empty = page(r#"<div data-tid="ckeditor" contenteditable="true"></div>"#);
    let typed = page(r#"<div data-tid="ckeditor" contenteditable="true"><p>draft</p></div>"#);

    let first = reader.find_text_input(&empty).expect("editor found");
    let second = reader.find_text_input(&typed).expect("editor found");
    assert_eq!(first.selector, r#"[data-tid="ckeditor"]"#);
    assert_eq!(first.kind, InputKind::ContentEditable);
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn textarea_inputs_are_recognised() {
    let html = page(r#"<textarea data-tid="meeting-chat-input"></textarea>"#);
    let target = reader().find_text_input(&html).expect("input found");
    assert_eq!(target.kind, InputKind::TextArea);
    assert_eq!(reader().find_text_input(&page("<div></div>")), None);
}

#[test]
fn compose_anchor_prefers_the_compose_box() {
    let reader = reader();
    let html = page(
        r#"<div data-tid="message-compose-box"><div contenteditable="true"></div></div>"#,
    );
    assert_eq!(
        reader.find_compose_anchor(&html).as_deref(),
        Some(r#"[data-tid="message-compose-box"]"#)
    );
    let html = page(r#"<div class="ck-editor"></div>"#);
    assert_eq!(reader.find_compose_anchor(&html).as_deref(), Some(".ck-editor"));
    assert_eq!(reader.find_compose_anchor(&page("<div></div>")), None);
}
