//! Streaming HTML tag recognition.
//!
//! Pages arrive as raw ASCII in the Rx queue. When the sender meets a `<`
//! it pulls the rest of the tag straight out of the queue with
//! [`read_tag`] and classifies it with [`Tag::classify`]; everything else
//! in the page is plain text.

use crate::rx_queue::RxQueue;

/// Longest tag body captured, in bytes. Longer tags are cut short and the
/// remainder renders as text.
pub const MAX_TAG_LEN: usize = 299;

/// Tag marking the end of the page, injected on disconnect.
pub const END_OF_PAGE_TAG: &str = "eoftag";

/// Recognized tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `br`, `p`, `/p`
    Break,
    /// `b`
    BoldOn,
    /// `/b`
    BoldOff,
    /// `li`
    ListItem,
    /// `a href=...` with its target
    AnchorStart(String),
    /// `/a`
    AnchorEnd,
    /// `html`: start of a new page
    Html,
    /// End-of-page sentinel
    EndOfPage,
    Unknown,
}

impl Tag {
    /// Classify a tag body (the text between `<` and `>`).
    ///
    /// ```rust
    /// use swiftlink::browser::html::Tag;
    ///
    /// assert_eq!(Tag::classify("br"), Tag::Break);
    /// assert_eq!(
    ///     Tag::classify("a href=\"/next.html\" class=x"),
    ///     Tag::AnchorStart("/next.html".to_string())
    /// );
    /// assert_eq!(Tag::classify("div"), Tag::Unknown);
    /// ```
    pub fn classify(body: &str) -> Tag {
        match body {
            "br" | "p" | "/p" => Tag::Break,
            "b" => Tag::BoldOn,
            "/b" => Tag::BoldOff,
            "li" => Tag::ListItem,
            "/a" => Tag::AnchorEnd,
            "html" => Tag::Html,
            END_OF_PAGE_TAG => Tag::EndOfPage,
            _ => match body.strip_prefix("a href=") {
                Some(attrs) => Tag::AnchorStart(anchor_target(attrs).to_string()),
                None => Tag::Unknown,
            },
        }
    }
}

/// Extract the link target from the text after `a href=`: an optional
/// opening quote is skipped, and the target ends at the first space,
/// quote or `#`.
pub fn anchor_target(attrs: &str) -> &str {
    let attrs = attrs
        .strip_prefix('"')
        .or_else(|| attrs.strip_prefix('\''))
        .unwrap_or(attrs);
    let end = attrs
        .find([' ', '\'', '"', '#'])
        .unwrap_or(attrs.len());
    &attrs[..end]
}

/// Pull a tag body out of the queue, the opening `<` already consumed.
///
/// Stops at `>` (dropped), at [`MAX_TAG_LEN`] bytes, or when the queue runs
/// dry. The body is decoded as UTF-8 once it is complete.
pub fn read_tag(queue: &mut RxQueue) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_TAG_LEN {
        match queue.pop() {
            Some(b'>') | None => break,
            Some(b) => body.push(b),
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_fixed_tags() {
        assert_eq!(Tag::classify("p"), Tag::Break);
        assert_eq!(Tag::classify("/p"), Tag::Break);
        assert_eq!(Tag::classify("b"), Tag::BoldOn);
        assert_eq!(Tag::classify("/b"), Tag::BoldOff);
        assert_eq!(Tag::classify("li"), Tag::ListItem);
        assert_eq!(Tag::classify("/a"), Tag::AnchorEnd);
        assert_eq!(Tag::classify("html"), Tag::Html);
        assert_eq!(Tag::classify("eoftag"), Tag::EndOfPage);
    }

    #[test]
    fn test_classify_is_exact() {
        assert_eq!(Tag::classify("body"), Tag::Unknown);
        assert_eq!(Tag::classify("br/"), Tag::Unknown);
        assert_eq!(Tag::classify("a name=top"), Tag::Unknown);
        assert_eq!(Tag::classify("BR"), Tag::Unknown);
    }

    #[test]
    fn test_anchor_target_terminators() {
        assert_eq!(anchor_target("\"/a b\""), "/a");
        assert_eq!(anchor_target("'/single'"), "/single");
        assert_eq!(anchor_target("\"page.html#frag\""), "page.html");
        assert_eq!(anchor_target("bare.html"), "bare.html");
        assert_eq!(anchor_target("\"\""), "");
    }

    #[test]
    fn test_read_tag_consumes_through_close() {
        let mut q = RxQueue::new(64);
        q.push_slice(b"br>text");
        assert_eq!(read_tag(&mut q), "br");
        assert_eq!(q.pop(), Some(b't'));
    }

    #[test]
    fn test_read_tag_stops_when_empty() {
        let mut q = RxQueue::new(64);
        q.push_slice(b"li");
        assert_eq!(read_tag(&mut q), "li");
        assert!(q.is_empty());
    }

    #[test]
    fn test_read_tag_length_limit() {
        let mut q = RxQueue::new(1024);
        q.push_slice(&[b'x'; 400]);
        q.push(b'>');
        let body = read_tag(&mut q);
        assert_eq!(body.len(), MAX_TAG_LEN);
        assert_eq!(q.used(), 400 - MAX_TAG_LEN + 1);
    }

    #[test]
    fn test_read_tag_keeps_utf8_href() {
        let mut q = RxQueue::new(64);
        q.push_slice(b"a href=\"/caf\xC3\xA9.html\">x");
        let body = read_tag(&mut q);
        assert_eq!(body, "a href=\"/caf\u{e9}.html\"");
        assert_eq!(Tag::classify(&body), Tag::AnchorStart("/caf\u{e9}.html".to_string()));
        assert_eq!(q.pop(), Some(b'x'));
    }

    #[test]
    fn test_read_tag_limit_counts_source_bytes() {
        let mut q = RxQueue::new(1024);
        for _ in 0..200 {
            q.push_slice("\u{e9}".as_bytes());
        }
        let body = read_tag(&mut q);
        assert_eq!(body.chars().count(), MAX_TAG_LEN / 2 + 1);
        assert_eq!(q.used(), 400 - MAX_TAG_LEN);
    }
}
