//! Minimal URL decomposition for the page browser.
//!
//! Handles `scheme://host[:port][/path]` and bare relative paths, nothing
//! more. Userinfo (`user@host`), queries and fragments get no special
//! treatment: they simply stay part of the host or path text.

use std::fmt;

/// Longest host name kept, in bytes.
pub const MAX_HOST_LEN: usize = 99;

/// Longest path kept, in bytes.
pub const MAX_PATH_LEN: usize = 199;

pub const DEFAULT_HTTP_PORT: u16 = 80;

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// A parsed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    pub fn new(host: &str, port: u16, path: &str) -> Self {
        Self {
            host: bounded(host, MAX_HOST_LEN),
            port,
            path: bounded(path, MAX_PATH_LEN),
        }
    }

    /// Parse `text`, treating anything without an `http://` or `https://`
    /// prefix as a relative path with no host.
    ///
    /// ```rust
    /// use swiftlink::Url;
    ///
    /// let url = Url::parse("http://h:8080/p");
    /// assert_eq!((url.host.as_str(), url.port, url.path.as_str()), ("h", 8080, "/p"));
    ///
    /// let rel = Url::parse("x");
    /// assert_eq!((rel.host.as_str(), rel.path.as_str()), ("", "x"));
    /// ```
    pub fn parse(text: &str) -> Self {
        let Some(rest) = SCHEMES.iter().find_map(|s| text.strip_prefix(s)) else {
            return Url::new("", DEFAULT_HTTP_PORT, text);
        };

        let slash = rest.find('/');
        let colon = rest.find(':').filter(|&c| slash.map_or(true, |s| c < s));

        let mut port = DEFAULT_HTTP_PORT;
        let host = match (colon, slash) {
            (Some(c), _) => {
                let after = &rest[c + 1..slash.unwrap_or(rest.len())];
                let end = after.bytes().take_while(u8::is_ascii_digit).count();
                // Port is the leading digits; none keeps the default
                if let Ok(p) = after[..end].parse::<u16>() {
                    port = p;
                }
                &rest[..c]
            }
            (None, Some(s)) => &rest[..s],
            (None, None) => rest,
        };
        let path = slash.map_or("/", |s| &rest[s..]);

        Url::new(host, port, path)
    }

    /// Parse a user-typed address, assuming `http://` when no scheme is
    /// given.
    ///
    /// ```rust
    /// use swiftlink::Url;
    ///
    /// let url = Url::parse_absolute("example.com:81");
    /// assert_eq!((url.host.as_str(), url.port, url.path.as_str()), ("example.com", 81, "/"));
    /// ```
    pub fn parse_absolute(text: &str) -> Self {
        if SCHEMES.iter().any(|s| text.starts_with(s)) {
            Url::parse(text)
        } else {
            Url::parse(&format!("http://{text}"))
        }
    }

    /// True when this is a path with no host of its own.
    pub fn is_relative(&self) -> bool {
        self.host.is_empty()
    }

    /// Fill in host and port from `base` when this URL has none. A path
    /// that is not rooted is appended to the base path as-is.
    pub fn resolve(mut self, base: &Url) -> Url {
        if !self.is_relative() {
            return self;
        }
        if !self.path.starts_with('/') {
            self.path = bounded(&format!("{}{}", base.path, self.path), MAX_PATH_LEN);
        }
        self.host = base.host.clone();
        self.port = base.port;
        self
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path)
    }
}

fn bounded(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
