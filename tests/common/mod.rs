//! Shared mocks and a host-side harness for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;
use swiftlink::petscii::{from_petscii, to_petscii};
use swiftlink::{
    Acia, Device, DirectorySink, InterruptDevice, LinkState, ManualClock, MemorySettings, Modem,
    ModemConfig, NetworkInterface, Services, StaticAddresses, Transport,
};

/// Cycles the emulated host lets pass after each register read.
pub const HOST_CYCLES: u32 = 4;

/// Scripted TCP peer.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub open: bool,
    pub inbox: VecDeque<u8>,
    pub sent: Vec<u8>,
    pub connects: Vec<(String, u16)>,
    pub refuse: bool,
    /// Peer stays connected after its scripted response (raw sessions).
    pub keep_open: bool,
    responses: VecDeque<Vec<u8>>,
}

impl MockTransport {
    /// Queue the bytes the next connection receives.
    pub fn serve(&mut self, response: &[u8]) {
        self.responses.push_back(response.to_vec());
    }

    /// Data arriving on the current connection.
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes);
    }

    pub fn hang_up(&mut self) {
        self.open = false;
    }

    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        self.stop();
        self.connects.push((host.to_string(), port));
        if self.refuse {
            return false;
        }
        self.open = self.keep_open;
        if let Some(response) = self.responses.pop_front() {
            self.inbox.extend(response);
        } else {
            self.open = true;
        }
        true
    }

    fn connected(&mut self) -> bool {
        self.open || !self.inbox.is_empty()
    }

    fn available(&mut self) -> usize {
        self.inbox.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.inbox.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.connected() {
            self.sent.extend_from_slice(bytes);
        }
    }

    fn stop(&mut self) {
        self.open = false;
        self.inbox.clear();
    }
}

/// Network interface with a canned outcome.
#[derive(Debug)]
pub struct MockNetwork {
    pub dhcp_ok: bool,
    pub state: LinkState,
    pub dhcp_calls: u32,
    pub static_calls: u32,
    mac: [u8; 6],
    ip: Ipv4Addr,
    mask: Ipv4Addr,
    gateway: Ipv4Addr,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            dhcp_ok: true,
            state: LinkState::Up,
            dhcp_calls: 0,
            static_calls: 0,
            mac: [0; 6],
            ip: Ipv4Addr::UNSPECIFIED,
            mask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl NetworkInterface for MockNetwork {
    fn begin_dhcp(&mut self, mac: [u8; 6], _timeout_ms: u16, _response_timeout_ms: u16) -> bool {
        self.dhcp_calls += 1;
        self.mac = mac;
        if self.dhcp_ok {
            self.ip = Ipv4Addr::new(10, 0, 0, 99);
            self.mask = Ipv4Addr::new(255, 255, 255, 0);
            self.gateway = Ipv4Addr::new(10, 0, 0, 1);
        }
        self.dhcp_ok
    }

    fn begin_static(&mut self, mac: [u8; 6], addresses: &StaticAddresses) {
        self.static_calls += 1;
        self.mac = mac;
        self.ip = addresses.ip;
        self.mask = addresses.mask;
        self.gateway = addresses.gateway;
    }

    fn mac_address(&self) -> [u8; 6] {
        self.mac
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.ip
    }

    fn subnet_mask(&self) -> Ipv4Addr {
        self.mask
    }

    fn gateway_ip(&self) -> Ipv4Addr {
        self.gateway
    }

    fn link_state(&self) -> LinkState {
        self.state
    }
}

pub fn test_config() -> ModemConfig {
    let mut config = ModemConfig::default();
    config.acia.cycles_between_rx = HOST_CYCLES;
    config.queue.rx_capacity = 64 * 1024;
    config.wait.host_max_spins = 10_000;
    config.wait.network_max_spins = 1_000;
    config
}

/// The emulated C64: read the data register on NMI, then let a few
/// cycles pass.
fn host_step(acia: &Acia, screen: &RefCell<Vec<u8>>) {
    if acia.has_interrupt() {
        screen.borrow_mut().push(acia.read(0));
    }
    for _ in 0..HOST_CYCLES {
        acia.cycle();
    }
}

pub struct Harness {
    pub modem: Modem,
    pub transport: Rc<RefCell<MockTransport>>,
    pub network: Rc<RefCell<MockNetwork>>,
    pub settings: Rc<RefCell<MemorySettings>>,
    pub clock: Rc<ManualClock>,
    pub screen: Rc<RefCell<Vec<u8>>>,
    pub download_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ModemConfig) -> Self {
        Self::build(config, MockNetwork::default())
    }

    pub fn build(config: ModemConfig, network: MockNetwork) -> Self {
        let transport = Rc::new(RefCell::new(MockTransport::default()));
        let network = Rc::new(RefCell::new(network));
        let settings = Rc::new(RefCell::new(MemorySettings::new(config.network.clone())));
        let clock = Rc::new(ManualClock::new());
        let screen = Rc::new(RefCell::new(Vec::new()));
        let download_dir = tempfile::tempdir().unwrap();

        let services = Services {
            transport: Box::new(Rc::clone(&transport)),
            network: Box::new(Rc::clone(&network)),
            settings: Box::new(Rc::clone(&settings)),
            storage: Box::new(DirectorySink::new(download_dir.path())),
            clock: clock.clone(),
        };
        let mut modem = Modem::new(config, services);

        let host_screen = Rc::clone(&screen);
        modem.set_bus_yield(move |acia| host_step(acia, &host_screen));

        Self {
            modem,
            transport,
            network,
            settings,
            clock,
            screen,
            download_dir,
        }
    }

    /// One main-loop pass followed by the host servicing the ACIA.
    pub fn step(&mut self) {
        self.modem.poll();
        host_step(self.modem.acia(), &self.screen);
    }

    /// Step until nothing is left to deliver (or output is paused).
    pub fn run_idle(&mut self) {
        for _ in 0..20_000 {
            self.step();
            if self.modem.rx_queue().is_empty()
                && !self.modem.has_interrupt()
                && self.modem.acia().pending_tx().is_none()
            {
                break;
            }
        }
        self.step();
    }

    /// Type ASCII text the way the C64 keyboard would send it.
    pub fn type_text(&mut self, text: &str) {
        for b in text.bytes() {
            self.modem.write(0, to_petscii(b));
            self.step();
        }
    }

    /// Write raw PETSCII bytes to the data register.
    pub fn type_petscii(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.modem.write(0, b);
            self.step();
        }
    }

    pub fn type_line(&mut self, text: &str) {
        self.type_text(text);
        self.type_text("\r");
        self.run_idle();
    }

    /// Everything the host has received, as ASCII. Control codes are
    /// dropped.
    pub fn screen_text(&self) -> String {
        self.screen
            .borrow()
            .iter()
            .map(|&b| from_petscii(b))
            .filter(|&b| b != 0)
            .map(|b| b as char)
            .collect()
    }

    pub fn clear_screen(&self) {
        self.screen.borrow_mut().clear();
    }

    pub fn screen_bytes(&self) -> Vec<u8> {
        self.screen.borrow().clone()
    }
}

/// A minimal HTTP response with `body`.
pub fn http_response(body: &str) -> Vec<u8> {
    format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{body}").into_bytes()
}
