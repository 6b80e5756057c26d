use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue};
use axum::response::Response;

use finwise_core::text::truncate_chars;
use finwise_core::DeviceClass;

/// Suffix appended when a mobile reply is cut at its length cap.
pub const TRUNCATION_NOTICE: &str = "... [reply shortened]";

/// Apply the device reply cap for whole delivery. Replies at or under
/// the cap pass through untouched; longer ones are cut at the cap with
/// the truncation notice appended.
pub fn shape_whole_reply(text: String, device: DeviceClass) -> String {
    let Some(limit) = device.reply_char_limit() else {
        return text;
    };
    if text.chars().count() <= limit {
        return text;
    }
    let mut shaped = truncate_chars(&text, limit).to_string();
    shaped.push_str(TRUNCATION_NOTICE);
    shaped
}

/// Split `text` into ordered chunks of at most `chunk_size` characters.
/// No delimiters are added: concatenating the chunks reproduces `text`
/// exactly. Empty text yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Build the streaming response: chunks emitted strictly in order as
/// plain text, with headers that keep intermediaries from buffering.
pub fn stream_response(chunks: Vec<String>) -> Response {
    let stream = futures::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk))),
    );

    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_reconstruct_text_exactly() {
        let text: String = ('a'..='z').cycle().take(173).collect();
        let chunks = chunk_text(&text, 50);

        assert_eq!(chunks.len(), 4); // ceil(173 / 50)
        assert!(chunks[..3].iter().all(|c| c.chars().count() == 50));
        assert_eq!(chunks[3].chars().count(), 23);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let text = "x".repeat(100);
        let chunks = chunk_text(&text, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 50).is_empty());
    }

    #[test]
    fn test_chunking_counts_chars_not_bytes() {
        let text = "₹".repeat(60);
        let chunks = chunk_text(&text, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 50);
        assert_eq!(chunks[1].chars().count(), 10);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_mobile_long_reply_truncated_with_notice() {
        let text = "a".repeat(1500);
        let shaped = shape_whole_reply(text, DeviceClass::Mobile);

        assert!(shaped.ends_with(TRUNCATION_NOTICE));
        assert_eq!(
            shaped.chars().count(),
            1000 + TRUNCATION_NOTICE.chars().count()
        );
        assert!(shaped.chars().count() <= 1021);
    }

    #[test]
    fn test_mobile_reply_at_cap_untouched() {
        let text = "a".repeat(1000);
        let shaped = shape_whole_reply(text.clone(), DeviceClass::Mobile);
        assert_eq!(shaped, text);
    }

    #[test]
    fn test_desktop_reply_never_truncated() {
        let text = "a".repeat(5000);
        let shaped = shape_whole_reply(text.clone(), DeviceClass::Desktop);
        assert_eq!(shaped, text);
    }

    #[test]
    fn test_stream_response_disables_buffering() {
        let response = stream_response(vec!["chunk".to_string()]);
        let headers = response.headers();

        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate, max-age=0"
        );
        assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
