//! Browser engine: page fetch, tag rendering, user commands, downloads.

use super::{Mode, Modem};
use crate::browser::html::Tag;
use crate::browser::{encode_search_term, BrowserCommand};
use crate::petscii::{
    CLEAR_SCREEN, CURSOR_UP, DARK_GREY, LIGHT_BLUE, LIGHT_GREEN, PINK, PURPLE, RETURN, RVS_OFF,
    RVS_ON, WHITE, YELLOW,
};
use crate::timing::Retry;
use crate::url::Url;
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Longest HTTP header line accepted, terminator included.
pub const MAX_HEADER_LINE: usize = 200;

/// Screen width used to round line breaks for pagination.
const COLUMNS: u32 = 40;

impl Modem {
    pub(super) fn process_browser(&mut self, line: &str) {
        match BrowserCommand::parse(line) {
            BrowserCommand::Exit => {
                self.services.transport.stop();
                self.session.mode = Mode::Offline;
                self.rx_queue.clear();
                self.queue_ascii_ln("\rBrowser mode exit");
                info!("browser exit");
            }
            BrowserCommand::Back => {
                let url = self.history.back();
                self.web_connect(url);
            }
            BrowserCommand::Link { number, download } => {
                if let Some(target) = self.links.get(number).map(str::to_string) {
                    let url = Url::parse(&target).resolve(self.history.current());
                    self.web_connect(url);
                    if download {
                        self.download_file();
                        // Never render a partial binary as text
                        self.services.transport.stop();
                    }
                } else {
                    debug!(number, "no such link");
                }
            }
            BrowserCommand::Goto(text) => {
                let url = Url::parse_absolute(text);
                self.web_connect(url);
            }
            BrowserCommand::Search(term) => self.do_search(term),
            BrowserCommand::Unknown => {
                self.send_char_immediate(PINK);
                self.send_ascii_immediate("Unknown Command\r");
            }
            BrowserCommand::Continue => {
                if self.session.page_paused {
                    // Overwrite the prompt
                    self.send_char_immediate(CURSOR_UP);
                }
            }
        }

        self.send_char_immediate(WHITE);
        self.session.page_chars = 0;
        self.session.page_paused = false;
        self.links.clear();
    }

    /// Record `url` in history, fetch it and consume the response header.
    ///
    /// On success the body is left in the transport for the poll loop to
    /// stream into the Rx queue.
    pub(super) fn web_connect(&mut self, url: Url) -> bool {
        self.history.push(url.clone());
        self.services.transport.stop();
        self.rx_queue.clear();
        info!(host = %url.host, port = url.port, path = %url.path, "web connect");

        self.send_ascii_immediate("\rConnecting to: ");
        self.send_ascii_immediate(&url.host);
        self.send_ascii_immediate(&url.path);
        self.send_char_immediate(RETURN);

        if self.services.transport.connect(&url.host, url.port) {
            let request = format!(
                "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
                url.path, url.host
            );
            self.services.transport.write(request.as_bytes());

            while let Some(line) = self.read_client_line(MAX_HEADER_LINE) {
                debug!(header = line.trim_end(), "response header");
                if line == "\r\n" {
                    self.send_ascii_immediate("Connected\r");
                    return true;
                }
            }
            self.services.transport.stop();
            warn!(host = %url.host, "bad response header");
            self.send_ascii_immediate("Bad Header\r");
        }

        self.send_ascii_immediate("Connect Failed\r");
        false
    }

    /// Read one `\n`-terminated line. `None` when the connection closes,
    /// the line reaches `max` bytes, or no data arrives within the network
    /// wait budget.
    fn read_client_line(&mut self, max: usize) -> Option<String> {
        let clock = Rc::clone(&self.services.clock);
        let mut retry = Retry::new(clock.as_ref(), self.config.wait.network_budget());
        let mut line = Vec::new();

        while self.services.transport.connected() {
            while let Some(b) = self.services.transport.read() {
                line.push(b);
                if line.len() == max {
                    return None;
                }
                if b == b'\n' {
                    return Some(String::from_utf8_lossy(&line).into_owned());
                }
                retry.restart();
            }
            if !retry.spin() {
                warn!("timed out waiting for response header");
                return None;
            }
        }
        None
    }

    pub(super) fn do_search(&mut self, term: &str) {
        let browser = &self.config.browser;
        let path = format!("{}{}", browser.search_path, encode_search_term(term));
        let url = Url::new(&browser.search_host, 80, &path);
        self.web_connect(url);
    }

    /// Save the rest of the current response to storage.
    pub(super) fn download_file(&mut self) {
        let name = self.config.browser.download_file.clone();

        if !self.services.transport.connected() {
            self.send_char_immediate(PINK);
            self.send_ascii_immediate("No data\r");
            return;
        }

        let mut file = match self.services.storage.create(&name) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, file = %name, "download not started");
                self.send_char_immediate(PINK);
                self.send_ascii_immediate(e.terminal_message());
                self.send_ascii_immediate("\r");
                return;
            }
        };

        self.send_ascii_immediate("Downloading: ");
        self.send_ascii_immediate(&name);
        self.send_char_immediate(RETURN);

        let clock = Rc::clone(&self.services.clock);
        let mut retry = Retry::new(clock.as_ref(), self.config.wait.network_budget());
        let mut bytes: u64 = 0;
        'transfer: while self.services.transport.connected() {
            let mut progressed = false;
            while let Some(b) = self.services.transport.read() {
                if let Err(e) = file.write_all(&[b]) {
                    warn!(error = %e, "download write failed");
                    break 'transfer;
                }
                bytes += 1;
                progressed = true;
            }
            if progressed {
                retry.restart();
            } else if !retry.spin() {
                warn!(bytes, "download stalled");
                break;
            }
        }
        if let Err(e) = file.flush() {
            warn!(error = %e, "download flush failed");
        }

        info!(bytes, file = %name, "download finished");
        self.send_ascii_immediate(&format!("\rFinished: {bytes} bytes"));
    }

    /// Print the browser command summary and restart the page count.
    pub(super) fn browser_help(&mut self) {
        self.session.page_chars = 0;
        self.session.page_paused = false;

        self.send_char_immediate(RETURN);
        self.send_char_immediate(PURPLE);
        self.send_char_immediate(RVS_ON);
        self.send_ascii_immediate("Browser Commands:\r");
        self.send_ascii_immediate("S[Term]: Search    [Link#]: Go to link\r");
        self.send_ascii_immediate(" U[URL]: Go to URL       X: Exit\r");
        self.send_ascii_immediate(" Return: Continue        B: Back\r");
        self.send_char_immediate(LIGHT_GREEN);
    }

    pub(super) fn render_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Break => {
                self.send_char_immediate(RETURN);
                self.advance_to_next_line(0);
            }
            Tag::BoldOn => {
                if !self.session.printing_hyperlink {
                    self.send_char_immediate(YELLOW);
                }
            }
            Tag::BoldOff => {
                if !self.session.printing_hyperlink {
                    self.send_char_immediate(WHITE);
                }
            }
            Tag::ListItem => {
                self.send_char_immediate(DARK_GREY);
                self.send_ascii_immediate("\r * ");
                self.send_char_immediate(WHITE);
                self.advance_to_next_line(3);
            }
            Tag::AnchorStart(target) => {
                self.send_char_immediate(PURPLE);
                self.send_char_immediate(RVS_ON);
                match self.links.push(&target) {
                    Some(number) => {
                        let number = number as u8;
                        if number > 9 {
                            self.send_char_immediate(b'0' + number / 10);
                        }
                        self.send_char_immediate(b'0' + number % 10);
                    }
                    None => self.send_char_immediate(b'*'),
                }
                self.send_char_immediate(LIGHT_BLUE);
                self.send_char_immediate(RVS_OFF);
                self.session.page_chars += 1;
                self.session.printing_hyperlink = true;
            }
            Tag::AnchorEnd => {
                self.send_char_immediate(WHITE);
                self.session.printing_hyperlink = false;
            }
            Tag::Html => {
                self.send_char_immediate(CLEAR_SCREEN);
                self.links.clear();
                self.session.page_chars = 0;
                self.session.page_paused = false;
            }
            Tag::EndOfPage => self.browser_help(),
            Tag::Unknown => {}
        }
    }

    fn advance_to_next_line(&mut self, extra: u32) {
        let chars = self.session.page_chars;
        self.session.page_chars = chars + COLUMNS - chars % COLUMNS + extra;
    }
}
