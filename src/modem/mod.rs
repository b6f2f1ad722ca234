//! The polling-context engine.
//!
//! [`Modem`] owns the ACIA, the Rx queue, the line buffer, the browser
//! state and the collaborators. The C64 side drives it through three entry
//! points, matching the three contexts the cartridge runs in:
//!
//! | Context | Entry point                          | May block |
//! |---------|--------------------------------------|-----------|
//! | Bus     | [`Device::read`] / [`Device::write`] | never     |
//! | Cycle   | [`Modem::cycle`]                     | never     |
//! | Polling | [`Modem::poll`]                      | bounded   |
//!
//! Anything that has to wait for the host (immediate sends, flushing the
//! queue before slow work) waits inside `poll` with a [`Retry`] budget and
//! hands the ACIA to the bus-yield hook on every spin, so an emulated host
//! can keep reading the data register meanwhile.

mod at;
mod browser;

use crate::browser::html::{self, Tag};
use crate::browser::{HistoryRing, LinkTable};
use crate::config::ModemConfig;
use crate::devices::{Acia, Device, InterruptDevice};
use crate::escape::EscapeDetector;
use crate::petscii::{self, to_petscii};
use crate::rx_queue::RxQueue;
use crate::services::{LinkState, Services};
use crate::timing::{Retry, WaitOutcome};
use crate::tx_line::TxLine;
use crate::url::Url;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Text sent down the content stream when a page's connection closes.
const END_OF_PAGE: &[u8] = b"<br>*End of Page*<eoftag>";

/// Command-processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// AT commands, or online data relay while connected.
    #[default]
    Offline,
    /// Page browser.
    Browser,
}

/// Protocol state shared by the connection manager and the browser.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub mode: Mode,
    /// Last transport state seen, for edge detection.
    pub connected: bool,
    pub page_paused: bool,
    pub printing_hyperlink: bool,
    /// Characters shown since the last page reset.
    pub page_chars: u32,
}

impl Session {
    /// Connected and relaying raw data.
    pub fn online(&self) -> bool {
        self.connected && self.mode == Mode::Offline
    }
}

/// Hook called with the ACIA on every spin of a host wait.
pub type BusYield = Box<dyn FnMut(&Acia)>;

/// SwiftLink cartridge core.
pub struct Modem {
    acia: Acia,
    rx_queue: RxQueue,
    tx_line: TxLine,
    session: Session,
    links: LinkTable,
    history: HistoryRing,
    escape: EscapeDetector,
    services: Services,
    config: ModemConfig,
    bus_yield: Option<BusYield>,
}

impl Modem {
    /// Build the core and bring up the network interface from stored
    /// settings.
    pub fn new(config: ModemConfig, services: Services) -> Self {
        let acia = Acia::new(config.acia.cycles_between_rx, config.acia.nmi_timeout_us);
        let home = Url::parse_absolute(&config.browser.home);
        let escape = EscapeDetector::new(config.dial.escape_guard_ms, services.clock.millis());

        let mut modem = Self {
            acia,
            rx_queue: RxQueue::new(config.queue.rx_capacity),
            tx_line: TxLine::new(),
            session: Session::default(),
            links: LinkTable::new(),
            history: HistoryRing::new(home),
            escape,
            services,
            config,
            bus_yield: None,
        };
        modem.ethernet_init();
        modem
    }

    /// Install the hook run while the engine waits on the host.
    pub fn set_bus_yield(&mut self, hook: impl FnMut(&Acia) + 'static) {
        self.bus_yield = Some(Box::new(hook));
    }

    pub fn acia(&self) -> &Acia {
        &self.acia
    }

    /// Cycle context: one host clock tick.
    #[inline]
    pub fn cycle(&self) {
        self.acia.cycle();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rx_queue(&self) -> &RxQueue {
        &self.rx_queue
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Polling context: one pass of the main loop.
    pub fn poll(&mut self) {
        self.track_connection();

        while self.services.transport.available() > 0 {
            match self.services.transport.read() {
                Some(b) => {
                    self.rx_queue.push(b);
                }
                None => break,
            }
        }

        if let Some(byte) = self.acia.pending_tx() {
            self.process_tx(byte);
        }

        if self.escape.triggered(self.services.clock.millis()) {
            info!("escape sequence, hanging up");
            self.services.transport.stop();
            self.queue_ascii_ln("\r*click*");
        }

        if self.session.page_chars < self.config.browser.page_char_limit
            || self.session.printing_hyperlink
        {
            self.check_send_rx_queue();
        } else if !self.session.page_paused {
            self.session.page_paused = true;
            self.send_char_immediate(petscii::RVS_ON);
            self.send_char_immediate(petscii::PURPLE);
            self.send_ascii_immediate("\rPause (#,S[],U[],X,B,Ret)");
            self.send_char_immediate(petscii::RVS_OFF);
            self.send_char_immediate(petscii::LIGHT_GREEN);
        }
    }

    /// Bring up the network interface from stored settings.
    pub fn ethernet_init(&mut self) -> bool {
        let settings = self.services.settings.load();
        let started = self.services.clock.millis();
        let network = &mut self.services.network;

        let ok = if settings.dhcp_enabled {
            info!("Ethernet init via DHCP");
            let ok = network.begin_dhcp(
                settings.mac,
                settings.dhcp_timeout_ms,
                settings.dhcp_response_timeout_ms,
            );
            if !ok {
                match network.link_state() {
                    LinkState::NoHardware => warn!("Ethernet HW was not found"),
                    LinkState::LinkOff => warn!("Ethernet cable is not connected"),
                    LinkState::Up => warn!("DHCP failed"),
                }
            }
            ok
        } else {
            info!("Ethernet init using static addresses");
            network.begin_static(settings.mac, &settings.static_addresses());
            true
        };

        info!(
            took_ms = self.services.clock.millis().saturating_sub(started),
            ip = %network.local_ip(),
            ok,
            "Ethernet init done"
        );
        ok
    }

    fn track_connection(&mut self) {
        let connected = self.services.transport.connected();
        if connected == self.session.connected {
            return;
        }
        self.session.connected = connected;
        debug!(connected, "connection state changed");

        match self.session.mode {
            Mode::Browser => {
                if !connected {
                    self.rx_queue.push_slice(END_OF_PAGE);
                }
            }
            Mode::Offline => {
                self.queue_ascii("\r\r\r*** ");
                self.queue_ascii_ln(if connected {
                    "connected to host"
                } else {
                    "not connected"
                });
            }
        }
    }

    fn process_tx(&mut self, byte: u8) {
        let now = self.services.clock.millis();

        if self.session.online() {
            self.services.transport.write(&[byte]);
            self.escape.on_tx(byte, now);
            self.acia.tx_done();
            return;
        }

        // Echo: immediately while browsing (the queue may be paused or
        // filling with a page), else behind whatever is queued
        if self.session.mode == Mode::Browser {
            self.send_char_immediate(byte);
        } else {
            self.rx_queue.push(byte);
        }
        self.escape.on_traffic(now);
        self.acia.tx_done();

        if let Some(line) = self.tx_line.push(byte) {
            debug!(line, "command line");
            match self.session.mode {
                Mode::Browser => self.process_browser(&line),
                Mode::Offline => {
                    self.process_at(&line);
                    if self.session.mode != Mode::Browser {
                        self.queue_ascii_ln("ok\r");
                    }
                }
            }
        }
    }

    // ---- Rx queue producers ----

    fn queue_ascii(&mut self, text: &str) {
        for b in text.bytes() {
            self.rx_queue.push(to_petscii(b));
        }
    }

    fn queue_ascii_ln(&mut self, text: &str) {
        self.queue_ascii(text);
        self.queue_ascii("\r");
    }

    // ---- Delivery to the host ----

    /// Spin until the host can take a byte.
    fn wait_host_ready(&mut self) -> WaitOutcome {
        let clock = Rc::clone(&self.services.clock);
        let mut retry = Retry::new(clock.as_ref(), self.config.wait.host_budget());
        loop {
            if self.acia.ready_to_send() {
                return WaitOutcome::Ready;
            }
            if !self.acia.check_nmi_timeout(clock.micros()) {
                return WaitOutcome::NmiTimeout;
            }
            if !retry.spin() {
                warn!(spins = retry.spins(), "host not ready, giving up");
                return WaitOutcome::Expired;
            }
            if let Some(hook) = self.bus_yield.as_mut() {
                hook(&self.acia);
            }
        }
    }

    /// Deliver one byte ahead of the queue. Dropped if the host never
    /// becomes ready.
    fn send_char_immediate(&mut self, byte: u8) {
        if self.wait_host_ready() != WaitOutcome::Ready {
            return;
        }
        if self.session.mode == Mode::Browser {
            self.session.page_chars += 1;
        }
        self.acia.deliver(byte, self.services.clock.micros());
    }

    fn send_ascii_immediate(&mut self, text: &str) {
        for b in text.bytes() {
            self.send_char_immediate(to_petscii(b));
        }
    }

    /// Move at most one queued byte to the host.
    fn check_send_rx_queue(&mut self) {
        if self.acia.ready_to_send() {
            if let Some(mut byte) = self.rx_queue.pop() {
                if self.session.mode == Mode::Browser {
                    // Pages are queued as ASCII so tags survive
                    byte = match byte {
                        b'<' => {
                            let body = html::read_tag(&mut self.rx_queue);
                            self.render_tag(Tag::classify(&body));
                            0
                        }
                        b'\r' => 0,
                        _ => {
                            let c = to_petscii(byte);
                            if c != 0 {
                                self.session.page_chars += 1;
                            }
                            c
                        }
                    };
                }
                self.acia.deliver(byte, self.services.clock.micros());
            }
        }
        self.acia.check_nmi_timeout(self.services.clock.micros());
    }

    /// Drain the whole queue to the host.
    fn flush_rx_queue(&mut self) {
        while !self.rx_queue.is_empty() {
            match self.wait_host_ready() {
                WaitOutcome::Ready => self.check_send_rx_queue(),
                WaitOutcome::NmiTimeout => continue,
                WaitOutcome::Expired => {
                    warn!(left = self.rx_queue.used(), "Rx flush abandoned");
                    break;
                }
            }
        }
    }
}

impl Device for Modem {
    fn read(&self, offset: u16) -> u8 {
        self.acia.read(offset)
    }

    fn write(&mut self, offset: u16, value: u8) {
        self.acia.write(offset, value);
    }

    fn size(&self) -> u16 {
        self.acia.size()
    }
}

impl InterruptDevice for Modem {
    fn has_interrupt(&self) -> bool {
        self.acia.has_interrupt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::services::{FileSink, MemorySettings, NetworkInterface, StaticAddresses, Transport};
    use crate::timing::ManualClock;
    use std::io::Write;
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Line {
        open: bool,
    }

    impl Transport for Line {
        fn connect(&mut self, _host: &str, _port: u16) -> bool {
            self.open = true;
            true
        }
        fn connected(&mut self) -> bool {
            self.open
        }
        fn available(&mut self) -> usize {
            0
        }
        fn read(&mut self) -> Option<u8> {
            None
        }
        fn write(&mut self, _bytes: &[u8]) {}
        fn stop(&mut self) {
            self.open = false;
        }
    }

    struct NoCard;

    impl NetworkInterface for NoCard {
        fn begin_dhcp(&mut self, _mac: [u8; 6], _timeout_ms: u16, _response_ms: u16) -> bool {
            false
        }
        fn begin_static(&mut self, _mac: [u8; 6], _addresses: &StaticAddresses) {}
        fn mac_address(&self) -> [u8; 6] {
            [0; 6]
        }
        fn local_ip(&self) -> Ipv4Addr {
            Ipv4Addr::UNSPECIFIED
        }
        fn subnet_mask(&self) -> Ipv4Addr {
            Ipv4Addr::UNSPECIFIED
        }
        fn gateway_ip(&self) -> Ipv4Addr {
            Ipv4Addr::UNSPECIFIED
        }
        fn link_state(&self) -> LinkState {
            LinkState::NoHardware
        }
    }

    struct NoMedia;

    impl FileSink for NoMedia {
        fn create(&mut self, _name: &str) -> Result<Box<dyn Write>, StorageError> {
            Err(StorageError::NoMedia)
        }
    }

    fn modem(clock: Rc<ManualClock>) -> Modem {
        let mut config = ModemConfig::default();
        config.acia.cycles_between_rx = 0;
        config.wait.host_max_spins = 50;
        let services = Services {
            transport: Box::new(Line::default()),
            network: Box::new(NoCard),
            settings: Box::new(MemorySettings::default()),
            storage: Box::new(NoMedia),
            clock,
        };
        Modem::new(config, services)
    }

    fn type_line(modem: &mut Modem, text: &str) {
        for b in text.bytes().chain(std::iter::once(b'\r')) {
            modem.write(0, to_petscii(b));
            modem.poll();
        }
    }

    #[traced_test]
    #[test]
    fn test_missing_hardware_is_logged() {
        let _modem = modem(Rc::new(ManualClock::new()));
        assert!(logs_contain("Ethernet HW was not found"));
    }

    #[traced_test]
    #[test]
    fn test_flush_gives_up_on_silent_host() {
        let mut modem = modem(Rc::new(ManualClock::new()));
        // Receive interrupts off: the host never takes a byte
        modem.write(2, 0xE2);
        type_line(&mut modem, "atdthost:23");

        assert!(logs_contain("Rx flush abandoned"));
        // Dialing still goes ahead
        assert!(modem.services.transport.connected());
    }

    #[traced_test]
    #[test]
    fn test_escape_is_logged() {
        let clock = Rc::new(ManualClock::new());
        let mut modem = modem(Rc::clone(&clock));
        modem.set_bus_yield(|acia| {
            if acia.has_interrupt() {
                acia.read(0);
            }
        });
        type_line(&mut modem, "atdthost");
        modem.poll();
        assert!(modem.session().online());

        clock.advance_ms(1500);
        for _ in 0..3 {
            modem.write(0, b'+');
            modem.poll();
        }
        clock.advance_ms(1500);
        modem.poll();

        assert!(logs_contain("escape sequence, hanging up"));
        assert!(!modem.services.transport.connected());
    }
}
