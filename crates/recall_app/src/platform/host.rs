//! Line protocol spoken over stdin/stdout by the CLI host.
//!
//! A line starting with `{` is an extension request; its response is printed
//! as one JSON line on stdout. Other lines simulate user input on the page.

use recall_core::DetailsCloseReason;
use recall_engine::{parse_request, ChordParseError, ExtensionRequest, KeyChord};
use recall_logging::{recall_info, recall_warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::runtime::RuntimeHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Request(ExtensionRequest),
    Key(KeyChord),
    Use,
    Details,
    Close,
    Escape,
    Backdrop,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum HostParseError {
    #[error("malformed request: {0}")]
    Request(#[from] serde_json::Error),
    #[error("bad key chord: {0}")]
    Chord(#[from] ChordParseError),
    #[error("unknown command {0:?}")]
    Unknown(String),
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<HostCommand>, HostParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('{') {
        return Ok(Some(HostCommand::Request(parse_request(line)?)));
    }

    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let command = match word.to_ascii_lowercase().as_str() {
        "key" => HostCommand::Key(rest.trim().parse()?),
        "use" => HostCommand::Use,
        "details" => HostCommand::Details,
        "close" => HostCommand::Close,
        "escape" | "esc" => HostCommand::Escape,
        "backdrop" => HostCommand::Backdrop,
        "quit" | "exit" => HostCommand::Quit,
        _ => return Err(HostParseError::Unknown(line.to_string())),
    };
    Ok(Some(command))
}

/// Feeds stdin into the runtime until `quit` or end of input.
pub async fn run_stdin(handle: RuntimeHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                recall_warn!("Failed to read stdin: {}", err);
                break;
            }
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(HostCommand::Quit)) => break,
            Ok(Some(command)) => apply(&handle, command),
            Err(err) => recall_warn!("Ignoring input: {}", err),
        }
    }
    recall_info!("Input closed, shutting down");
    handle.shutdown();
}

fn apply(handle: &RuntimeHandle, command: HostCommand) {
    match command {
        HostCommand::Request(request) => {
            let reply = handle.request(request);
            if reply.is_deferred() {
                recall_info!("{:?} accepted; reply will follow", request);
            }
            tokio::spawn(async move {
                let response = reply.resolve().await;
                match serde_json::to_string(&response) {
                    Ok(json) => println!("{json}"),
                    Err(err) => recall_warn!("Failed to encode response: {}", err),
                }
            });
        }
        HostCommand::Key(chord) => handle.key(chord),
        HostCommand::Use => handle.use_suggestion(),
        HostCommand::Details => handle.view_details(),
        HostCommand::Close => handle.close(),
        HostCommand::Escape => handle.close_details(DetailsCloseReason::Escape),
        HostCommand::Backdrop => handle.close_details(DetailsCloseReason::Backdrop),
        HostCommand::Quit => handle.shutdown(),
    }
}
