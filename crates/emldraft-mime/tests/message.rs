//! End-to-end tests for message assembly and serialization.
//!
//! Every message is built with a fixed clock and a seeded random source so
//! the rendered bytes are reproducible.

#![allow(clippy::unwrap_used)]

use chrono::DateTime;
use emldraft_mime::apple::AppleOverlay;
use emldraft_mime::{Boundary, Error, FixedClock, Message, MessageBuilder, Multipart, Sources};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn build(builder: MessageBuilder) -> emldraft_mime::Result<Message> {
    let clock =
        FixedClock(DateTime::parse_from_rfc2822("Mon, 02 Jan 2006 15:04:05 -0700").unwrap());
    let mut rng = StdRng::seed_from_u64(2045);
    builder.build_with(&mut Sources::new(&clock, &mut rng))
}

fn render(message: &Message) -> String {
    String::from_utf8(message.render()).unwrap()
}

fn scenario_one() -> Message {
    build(
        Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .subject("Hi")
            .text_body("Hello"),
    )
    .unwrap()
}

/// Splits rendered output into header lines (unfolded) and body.
fn split(rendered: &str) -> (Vec<String>, &str) {
    let (head, body) = rendered.split_once("\r\n\r\n").unwrap();
    let mut lines: Vec<String> = Vec::new();
    for line in head.split("\r\n") {
        if line.starts_with(' ') {
            lines.last_mut().unwrap().push_str(line);
        } else {
            lines.push(line.to_string());
        }
    }
    (lines, body)
}

fn assert_crlf_only(rendered: &str) {
    let bytes = rendered.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            assert!(i > 0 && bytes[i - 1] == b'\r', "bare LF at byte {i}");
        }
        if *b == b'\r' {
            assert_eq!(bytes.get(i + 1), Some(&b'\n'), "bare CR at byte {i}");
        }
    }
}

#[test]
fn plain_text_message() {
    let rendered = render(&scenario_one());
    assert!(rendered.contains("From: a@x.com\r\n"));
    assert!(rendered.contains("To: b@y.com\r\n"));
    assert!(rendered.contains("Subject: Hi\r\n"));
    assert!(rendered.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
    assert!(rendered.ends_with("\r\n\r\nHello"));
    assert_crlf_only(&rendered);
}

#[test]
fn alternative_message() {
    let message = build(
        Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .subject("Hi")
            .text_body("Hi")
            .html_body("<h1>Hi</h1>"),
    )
    .unwrap();
    let rendered = render(&message);

    let (headers, body) = split(&rendered);
    assert_eq!(
        headers
            .iter()
            .filter(|h| h.starts_with("Content-Type: multipart/alternative; boundary=\""))
            .count(),
        1
    );
    let content_type = headers
        .iter()
        .find(|h| h.starts_with("Content-Type: multipart/alternative"))
        .unwrap();
    let boundary = content_type
        .split("boundary=\"")
        .nth(1)
        .unwrap()
        .trim_end_matches('"');

    let text_at = body.find("\r\n\r\nHi\r\n").unwrap();
    let html_at = body.find("<h1>Hi</h1>").unwrap();
    assert!(text_at < html_at);
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    assert_eq!(body.matches(&format!("--{boundary}\r\n")).count(), 2);
    assert!(!headers.iter().any(|h| h.starts_with("Content-Transfer-Encoding")));
    assert_crlf_only(&rendered);
}

#[test]
fn apple_overlay_message() {
    let base = scenario_one();
    let apple = AppleOverlay::new("3F2504E0-4F89-11D3-9A0C-0305E82C3301")
        .unwrap()
        .apply(&base);

    let before = render(&base);
    let after = render(&apple);
    assert!(after.contains("X-Apple-Base-Url: x-msg://1/\r\n"));
    assert!(after.contains("X-Uniform-Type-Identifier: com.apple.mail-draft\r\n"));
    assert!(after.contains("Mime-Version: 1.0 (Mac OS X Mail 16.0 \\(3731.500.231\\))\r\n"));

    let (before_headers, before_body) = split(&before);
    let (after_headers, after_body) = split(&after);
    assert_eq!(before_body, after_body);

    // Every original header survives unchanged, except Mime-Version.
    for header in &before_headers {
        if header.starts_with("Mime-Version:") {
            assert!(!after_headers.contains(header));
        } else {
            assert!(after_headers.contains(header), "{header} missing");
        }
    }
    assert_eq!(
        after_headers.iter().filter(|h| h.starts_with("Mime-Version:")).count(),
        1
    );
    assert_eq!(after_headers.len(), before_headers.len() + 6);
}

#[test]
fn invalid_address_yields_no_message() {
    let err = build(Message::builder().from("a@x.com").to("not-an-address")).unwrap_err();
    assert!(matches!(err, Error::AddressSyntax { .. }));
}

#[test]
fn display_names_and_lists() {
    let message = build(
        Message::builder()
            .from("Ärger Team <team@x.com>")
            .to_list("\"Doe, Jane\" <jane@y.com>, bob@y.com")
            .cc("carol@y.com")
            .reply_to("replies@x.com")
            .subject("Status"),
    )
    .unwrap();
    let rendered = render(&message);
    assert!(rendered.contains("From: =?UTF-8?B?w4RyZ2VyIFRlYW0=?= <team@x.com>\r\n"));
    assert!(rendered.contains("To: \"Doe, Jane\" <jane@y.com>, bob@y.com\r\n"));
    assert!(rendered.contains("Cc: carol@y.com\r\n"));
    assert!(rendered.contains("Reply-To: replies@x.com\r\n"));
}

#[test]
fn same_sources_same_bytes() {
    let make = || {
        build(
            Message::builder()
                .from("a@x.com")
                .to("b@y.com")
                .text_body("t")
                .html_body("<p>h</p>"),
        )
        .unwrap()
        .render()
    };
    assert_eq!(make(), make());
}

#[test]
fn tracing_does_not_change_output() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("emldraft_mime=trace"))
        .with_test_writer()
        .finish();
    let traced = tracing::subscriber::with_default(subscriber, || render(&scenario_one()));
    assert_eq!(traced, render(&scenario_one()));
}

fn address() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z]{1,8}\\.(com|org|net)").prop_map(|(l, d)| format!("{l}@{d}"))
}

fn hidden_address() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|l| format!("{l}@hidden.invalid"))
}

proptest! {
    #[test]
    fn bcc_never_rendered(
        to in prop::collection::vec(address(), 0..3),
        bcc in prop::collection::vec(hidden_address(), 1..4),
        subject in "[ -~]{0,40}",
    ) {
        let mut builder = Message::builder().from("a@x.com").subject(subject);
        for addr in &to {
            builder = builder.to(addr.as_str());
        }
        for addr in &bcc {
            builder = builder.bcc(addr.as_str());
        }
        let message = build(builder).unwrap();
        let rendered = render(&message);
        let (headers, _) = split(&rendered);
        prop_assert!(!headers.iter().any(|h| h.to_ascii_lowercase().starts_with("bcc:")));
        prop_assert!(!rendered.contains("hidden.invalid"));
        prop_assert_eq!(message.bcc().len(), bcc.len());
    }

    #[test]
    fn header_order_is_fixed(order in Just(vec![0usize, 1, 2, 3, 4, 5]).prop_shuffle()) {
        let mut builder = Message::builder();
        for step in order {
            builder = match step {
                0 => builder.from("a@x.com"),
                1 => builder.to("b@y.com"),
                2 => builder.cc("c@y.com"),
                3 => builder.subject("Hi"),
                4 => builder.reply_to("r@x.com"),
                _ => builder.header("X-Extra", "1"),
            };
        }
        let rendered = render(&build(builder).unwrap());
        let (headers, _) = split(&rendered);
        let names: Vec<&str> = headers.iter().map(|h| h.split(':').next().unwrap()).collect();
        prop_assert_eq!(
            names,
            vec![
                "From", "To", "Cc", "Subject", "Date", "Message-ID", "Reply-To",
                "Mime-Version", "Content-Type", "Content-Transfer-Encoding", "X-Extra",
            ]
        );
    }

    #[test]
    fn every_line_ends_with_crlf(
        text in "[a-zA-Z \\n\\r]{0,200}",
        html in "[<>a-z/ \\n]{0,200}",
        subject in "[a-zA-Z ]{0,120}",
    ) {
        let message = build(
            Message::builder()
                .from("a@x.com")
                .to("b@y.com")
                .subject(subject)
                .text_body(text)
                .html_body(html),
        )
        .unwrap();
        assert_crlf_only(&render(&message));
    }

    #[test]
    fn alternative_is_text_then_html(
        text in "\\PC{1,200}",
        html in "\\PC{1,200}",
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let multipart =
            Multipart::alternative(text.as_str(), html.as_str(), Boundary::default(), &mut rng)
                .unwrap();
        let parts = multipart.parts();
        prop_assert_eq!(parts.len(), 2);
        prop_assert!(parts[0].content_type().is("text", "plain"));
        prop_assert!(parts[1].content_type().is("text", "html"));
        prop_assert_eq!(parts[0].content_type().charset(), Some("UTF-8"));
        prop_assert_eq!(parts[1].content_type().charset(), Some("UTF-8"));
        prop_assert_eq!(parts[0].raw_content(), text.as_bytes());
        prop_assert_eq!(parts[1].raw_content(), html.as_bytes());
    }

    #[test]
    fn overlay_twice_is_overlay_once(id in "[A-F0-9]{8}-[A-F0-9]{4}") {
        let overlay = AppleOverlay::new(id).unwrap();
        let once = overlay.apply(&scenario_one());
        let twice = overlay.apply(&once);
        prop_assert_eq!(once.render(), twice.render());
    }
}
