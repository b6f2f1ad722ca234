//! Page browser building blocks: link table, history ring, user commands.
//!
//! The stateful engine that ties these to the network lives in
//! [`crate::modem`]; everything here is plain data with no I/O.

pub mod html;

use crate::url::Url;
use tracing::debug;

/// Links remembered per page.
pub const MAX_LINKS: usize = 99;

/// Pages remembered for "back".
pub const HISTORY_LEN: usize = 8;

/// Link targets captured while a page renders, numbered from 1 in display
/// order.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Vec<String>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self {
            links: Vec::with_capacity(MAX_LINKS),
        }
    }

    /// Store a target. Returns its 1-based number, or `None` once the table
    /// is full.
    pub fn push(&mut self, target: &str) -> Option<usize> {
        if self.links.len() >= MAX_LINKS {
            return None;
        }
        self.links.push(target.to_string());
        let number = self.links.len();
        debug!(number, target, "link");
        Some(number)
    }

    /// Look up a link by its displayed number. 0 and numbers past the end
    /// yield `None`.
    pub fn get(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.links.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}

/// Ring of recently visited pages.
///
/// Every visit is recorded *before* connecting, so the newest slot holds
/// the page being shown. Going back therefore steps two slots: past the
/// current page to the one before it, which the reconnect then records
/// again.
///
/// ```rust
/// use swiftlink::{HistoryRing, Url};
///
/// let home = Url::new("home.net", 80, "/");
/// let mut history = HistoryRing::new(home.clone());
/// let a = Url::new("a.com", 80, "/");
/// let b = Url::new("b.com", 80, "/");
///
/// history.push(a.clone());
/// history.push(b);
/// let prev = history.back();
/// assert_eq!(prev, a);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: [Url; HISTORY_LEN],
    next: usize,
}

impl HistoryRing {
    /// Create a ring with every slot pointing at `home`.
    pub fn new(home: Url) -> Self {
        Self {
            entries: std::array::from_fn(|_| home.clone()),
            next: 0,
        }
    }

    /// Record a visit, overwriting the oldest slot.
    pub fn push(&mut self, url: Url) {
        self.entries[self.next] = url;
        self.next = (self.next + 1) % HISTORY_LEN;
    }

    /// Step back to the page before the current one. The returned URL is
    /// expected to be visited (and so pushed) straight away.
    pub fn back(&mut self) -> Url {
        self.next = (self.next + HISTORY_LEN - 2) % HISTORY_LEN;
        debug!(slot = self.next, "history back");
        self.entries[self.next].clone()
    }

    /// Most recently recorded visit.
    pub fn current(&self) -> &Url {
        &self.entries[(self.next + HISTORY_LEN - 1) % HISTORY_LEN]
    }
}

/// A line typed while browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand<'a> {
    /// `x`: leave browser mode.
    Exit,
    /// `b`: previous page.
    Back,
    /// `<n>` or `<n>d`: follow (or download) link number `n`.
    Link { number: usize, download: bool },
    /// `u<url>`
    Goto(&'a str),
    /// `s<term>`
    Search(&'a str),
    /// Bare return.
    Continue,
    Unknown,
}

impl<'a> BrowserCommand<'a> {
    /// Parse a folded command line.
    ///
    /// ```rust
    /// use swiftlink::BrowserCommand;
    ///
    /// assert_eq!(BrowserCommand::parse("x"), BrowserCommand::Exit);
    /// assert_eq!(
    ///     BrowserCommand::parse("12d"),
    ///     BrowserCommand::Link { number: 12, download: true }
    /// );
    /// assert_eq!(BrowserCommand::parse("s  rust"), BrowserCommand::Search("rust"));
    /// ```
    pub fn parse(line: &'a str) -> Self {
        match line {
            "" => return BrowserCommand::Continue,
            "x" => return BrowserCommand::Exit,
            "b" => return BrowserCommand::Back,
            _ => {}
        }

        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            // Absurdly long numbers select nothing
            let number = line[..digits].parse().unwrap_or(0);
            let download = line[digits..].starts_with('d');
            return BrowserCommand::Link { number, download };
        }

        if let Some(rest) = line.strip_prefix('u') {
            BrowserCommand::Goto(rest.trim_start_matches(' '))
        } else if let Some(rest) = line.strip_prefix('s') {
            BrowserCommand::Search(rest.trim_start_matches(' '))
        } else {
            BrowserCommand::Unknown
        }
    }
}

/// Percent-encode a search term. Letters, digits and `.` pass through.
///
/// ```rust
/// use swiftlink::browser::encode_search_term;
///
/// assert_eq!(encode_search_term("c64 news"), "c64%20news");
/// ```
pub fn encode_search_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len() * 3);
    for b in term.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
