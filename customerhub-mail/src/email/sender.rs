//! Single-recipient send
//!
//! [`send`] never fails: transport errors become a failed [`SendOutcome`].
//! Retrying is left to the caller.

use tracing::{error, info};

use super::{OutboundMessage, ResolvedTransport, SendOutcome, SendRequest};

/// Characters of the text body included in the simulated-send log line
const PREVIEW_CHARS: usize = 100;

/// Send one request through a resolved transport
///
/// With [`ResolvedTransport::Absent`] no I/O happens: the would-be send is
/// logged and a simulated outcome returned. Otherwise the message is
/// submitted once, addressed from `request.from_address`, falling back to
/// `default_from`.
pub async fn send(
    transport: &ResolvedTransport,
    request: &SendRequest,
    default_from: &str,
) -> SendOutcome {
    let from = request
        .from_address
        .as_deref()
        .filter(|from| !from.trim().is_empty())
        .unwrap_or(default_from);

    let transport = match transport {
        ResolvedTransport::Absent(reason) => {
            info!(
                from = %from,
                to = %request.recipient,
                subject = %request.subject,
                text = %preview(&request.text_body),
                reason = %reason,
                "[SIMULATED] Email would be sent"
            );
            return SendOutcome::simulated(&request.recipient);
        }
        ResolvedTransport::Live(transport) => transport,
    };

    if let Err(e) = request.validate() {
        error!(to = %request.recipient, error = %e, "Refusing to send invalid email");
        return SendOutcome::failed(&request.recipient, e.to_string());
    }

    let message = OutboundMessage {
        from: from.to_string(),
        to: request.recipient.clone(),
        subject: request.subject.clone(),
        text: request.text_body.clone(),
        html: request.html_body.clone(),
    };

    match transport.submit(&message).await {
        Ok(()) => {
            info!(to = %request.recipient, "Email sent successfully");
            SendOutcome::delivered(&request.recipient)
        }
        Err(e) => {
            error!(to = %request.recipient, error = %e, "Failed to send email");
            SendOutcome::failed(&request.recipient, e.to_string())
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` when cut
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
