//! Reduces a raw RFC 5322 message to sender, subject and one plain-text body.

use mail_parser::{HeaderName, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use thiserror::Error;

use crate::domain::NormalizedMessage;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("message could not be parsed")]
    Unparseable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyPolicy {
    #[default]
    PlainOnly,
    HtmlFallback,
}

pub fn normalize(raw: &[u8], policy: BodyPolicy) -> Result<NormalizedMessage, NormalizeError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or(NormalizeError::Unparseable)?;

    let sender = message
        .header_raw(HeaderName::From)
        .map(unfold)
        .unwrap_or_default();
    let subject = message.subject().map(str::to_string).unwrap_or_default();
    if sender.is_empty() || subject.is_empty() {
        tracing::debug!(
            target: "mail",
            has_sender = !sender.is_empty(),
            has_subject = !subject.is_empty(),
            "header missing; defaulting to empty"
        );
    }

    let body = extract_body(&message, policy);
    Ok(NormalizedMessage {
        sender,
        subject,
        body,
    })
}

fn extract_body(message: &Message<'_>, policy: BodyPolicy) -> String {
    let Some(root) = message.parts.first() else {
        return String::new();
    };

    if !matches!(root.body, PartType::Multipart(_)) {
        return decode_text(root).unwrap_or_default();
    }

    let parts = &message.parts[1..];
    if let Some(plain) = parts.iter().find(|part| is_content_type(part, "plain")) {
        return decode_text(plain).unwrap_or_default();
    }

    match policy {
        BodyPolicy::PlainOnly => String::new(),
        BodyPolicy::HtmlFallback => parts
            .iter()
            .find(|part| is_content_type(part, "html"))
            .and_then(decode_text)
            .map(|html| html_to_text(&html))
            .unwrap_or_default(),
    }
}

/// True for `text/<subtype>`. A part without a declared type is plain text when it carries text.
fn is_content_type(part: &MessagePart<'_>, subtype: &str) -> bool {
    match part.content_type() {
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .is_some_and(|declared| declared.eq_ignore_ascii_case(subtype))
        }
        None => subtype == "plain" && matches!(part.body, PartType::Text(_)),
    }
}

fn decode_text(part: &MessagePart<'_>) -> Option<String> {
    if part.is_encoding_problem {
        tracing::warn!(target: "mail", "body part has a transfer-encoding problem; body left empty");
        return None;
    }
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => Some(text.to_string()),
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
            match std::str::from_utf8(bytes) {
                Ok(text) => Some(text.to_string()),
                Err(err) => {
                    tracing::warn!(target: "mail", error = %err, "body part is not valid text; body left empty");
                    None
                }
            }
        }
        _ => None,
    }
}

fn html_to_text(html: &str) -> String {
    match htmd::convert(html) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            tracing::warn!(target: "mail", error = %err, "HTML conversion failed; body left empty");
            String::new()
        }
    }
}

fn unfold(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> NormalizedMessage {
        normalize(raw.as_bytes(), BodyPolicy::PlainOnly).unwrap()
    }

    #[test]
    fn single_part_message() {
        let msg = parse(
            "From: Promo <promo@deals.biz>\r\n\
             Subject: WIN FREE MONEY\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             click now",
        );
        assert_eq!(msg.sender, "Promo <promo@deals.biz>");
        assert_eq!(msg.subject, "WIN FREE MONEY");
        assert_eq!(msg.body.trim(), "click now");
    }

    #[test]
    fn folded_sender_is_unfolded() {
        let msg = parse(
            "From: A Very Long Display Name\r\n <someone@example.com>\r\n\
             Subject: hi\r\n\
             \r\n\
             body",
        );
        assert_eq!(msg.sender, "A Very Long Display Name <someone@example.com>");
    }

    #[test]
    fn missing_headers_default_to_empty() {
        let msg = parse("Content-Type: text/plain\r\n\r\nonly a body");
        assert_eq!(msg.sender, "");
        assert_eq!(msg.subject, "");
        assert_eq!(msg.body.trim(), "only a body");
    }

    #[test]
    fn quoted_printable_body_is_decoded() {
        let msg = parse(
            "From: a@b.c\r\n\
             Subject: qp\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             caf=C3=A9 tonight",
        );
        assert_eq!(msg.body.trim(), "café tonight");
    }

    const MIXED: &str = "From: news@shop.example\r\n\
        Subject: Sale\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
        \r\n\
        --b1\r\n\
        Content-Type: text/html; charset=utf-8\r\n\
        \r\n\
        <p>html version</p>\r\n\
        --b1\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        plain version\r\n\
        --b1\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        second plain\r\n\
        --b1--\r\n";

    #[test]
    fn multipart_takes_first_plain_part_regardless_of_position() {
        let msg = parse(MIXED);
        assert_eq!(msg.body.trim(), "plain version");
    }

    const HTML_ONLY: &str = "From: news@shop.example\r\n\
        Subject: Sale\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/mixed; boundary=\"b2\"\r\n\
        \r\n\
        --b2\r\n\
        Content-Type: text/html; charset=utf-8\r\n\
        \r\n\
        <p>Only <b>html</b> here</p>\r\n\
        --b2\r\n\
        Content-Type: application/pdf\r\n\
        Content-Transfer-Encoding: base64\r\n\
        \r\n\
        JVBERi0xLjQK\r\n\
        --b2--\r\n";

    #[test]
    fn multipart_without_plain_part_has_empty_body() {
        let msg = parse(HTML_ONLY);
        assert_eq!(msg.body, "");
        assert_eq!(msg.subject, "Sale");
    }

    #[test]
    fn html_fallback_converts_html_part() {
        let msg = normalize(HTML_ONLY.as_bytes(), BodyPolicy::HtmlFallback).unwrap();
        assert!(msg.body.contains("Only"));
        assert!(msg.body.contains("html"));
        assert!(!msg.body.contains("<p>"));
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let raw = "From: a@b.c\r\nSubject: s\r\n\r\nsame body";
        assert_eq!(parse(raw), parse(raw));
    }

    #[test]
    fn broken_base64_leaves_body_empty() {
        let msg = parse(
            "From: a@b.c\r\n\
             Subject: garbled\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             @@@ not base64 ###\r\n",
        );
        assert_eq!(msg.body, "");
        assert_eq!(msg.subject, "garbled");
    }

    #[test]
    fn non_utf8_binary_body_is_left_empty() {
        let msg = parse(
            "From: a@b.c\r\n\
             Subject: blob\r\n\
             Content-Type: application/octet-stream\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             //79\r\n",
        );
        assert_eq!(msg.body, "");
        assert_eq!(msg.sender, "a@b.c");
    }

    #[test]
    fn input_without_headers_is_unparseable() {
        assert!(matches!(
            normalize(b"", BodyPolicy::PlainOnly),
            Err(NormalizeError::Unparseable)
        ));
    }
}
