//! Std-backed collaborators for running the core on a desktop host.

use crate::error::StorageError;
use crate::services::{FileSink, LinkState, NetworkInterface, StaticAddresses, Transport};
use crate::timing::{Retry, RetryBudget, SystemClock};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Read, Write};
use std::net::{Ipv4Addr, Shutdown, TcpStream, ToSocketAddrs, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 1024;

/// TCP client over a non-blocking `TcpStream`.
///
/// Received data is drained into an internal buffer on every query, so
/// [`Transport::connected`] keeps reporting true until the peer has closed
/// *and* everything it sent has been read.
///
/// A write that cannot make progress within the write budget (by default
/// the connect timeout) drops the connection.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    inbox: VecDeque<u8>,
    connect_timeout: Duration,
    write_budget: RetryBudget,
    clock: SystemClock,
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            stream: None,
            inbox: VecDeque::new(),
            connect_timeout,
            write_budget: RetryBudget {
                max_spins: u32::MAX,
                max_micros: connect_timeout.as_micros() as u64,
            },
            clock: SystemClock::new(),
        }
    }

    /// Limit how long a write may stall on a full send buffer.
    pub fn with_write_budget(mut self, budget: RetryBudget) -> Self {
        self.write_budget = budget;
        self
    }

    fn open(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no address");
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nonblocking(true)?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn drain_socket(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    debug!("peer closed connection");
                    self.stream = None;
                    return;
                }
                Ok(n) => self.inbox.extend(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "socket read failed");
                    self.stream = None;
                    return;
                }
            }
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        self.stop();
        match self.open(host, port) {
            Ok(stream) => {
                info!(host, port, "connected");
                self.stream = Some(stream);
                true
            }
            Err(e) => {
                warn!(host, port, error = %e, "connect failed");
                false
            }
        }
    }

    fn connected(&mut self) -> bool {
        self.drain_socket();
        self.stream.is_some() || !self.inbox.is_empty()
    }

    fn available(&mut self) -> usize {
        self.drain_socket();
        self.inbox.len()
    }

    fn read(&mut self) -> Option<u8> {
        if self.inbox.is_empty() {
            self.drain_socket();
        }
        self.inbox.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let mut retry = Retry::new(&self.clock, self.write_budget);
        let mut sent = 0;
        while sent < bytes.len() {
            match stream.write(&bytes[sent..]) {
                Ok(0) => break,
                Ok(n) => {
                    sent += n;
                    retry.restart();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !retry.spin() {
                        warn!(sent, len = bytes.len(), "socket write stalled, dropping connection");
                        self.stream = None;
                        return;
                    }
                    std::thread::yield_now();
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "socket write failed");
                    self.stream = None;
                    return;
                }
            }
        }
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("connection stopped");
        }
        self.inbox.clear();
    }
}

/// Network interface of the machine the core runs on.
///
/// There is no real bring-up: a DHCP request reports whichever local
/// address the OS would route outbound traffic from, and a static request
/// simply records the given addresses.
#[derive(Debug, Clone)]
pub struct HostNetwork {
    mac: [u8; 6],
    ip: Ipv4Addr,
    mask: Ipv4Addr,
    gateway: Ipv4Addr,
    state: LinkState,
}

impl HostNetwork {
    pub fn new() -> Self {
        Self {
            mac: [0; 6],
            ip: Ipv4Addr::UNSPECIFIED,
            mask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            state: LinkState::LinkOff,
        }
    }

    fn outbound_ip() -> io::Result<Ipv4Addr> {
        // Connecting a UDP socket sends nothing, it only picks a route
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("192.0.2.1:9")?;
        match socket.local_addr()?.ip() {
            std::net::IpAddr::V4(ip) => Ok(ip),
            std::net::IpAddr::V6(_) => Err(io::Error::new(io::ErrorKind::Unsupported, "IPv6")),
        }
    }
}

impl Default for HostNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkInterface for HostNetwork {
    fn begin_dhcp(&mut self, mac: [u8; 6], timeout_ms: u16, response_timeout_ms: u16) -> bool {
        debug!(timeout_ms, response_timeout_ms, "dhcp");
        self.mac = mac;
        match Self::outbound_ip() {
            Ok(ip) => {
                self.ip = ip;
                self.state = LinkState::Up;
                true
            }
            Err(e) => {
                warn!(error = %e, "no usable host address");
                self.ip = Ipv4Addr::UNSPECIFIED;
                self.state = LinkState::LinkOff;
                false
            }
        }
    }

    fn begin_static(&mut self, mac: [u8; 6], addresses: &StaticAddresses) {
        self.mac = mac;
        self.ip = addresses.ip;
        self.mask = addresses.mask;
        self.gateway = addresses.gateway;
        self.state = LinkState::Up;
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

/// Saves downloads into a directory. A missing directory plays the part
/// of a missing SD card.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileSink for DirectorySink {
    fn create(&mut self, name: &str) -> Result<Box<dyn Write>, StorageError> {
        if !self.dir.is_dir() {
            return Err(StorageError::NoMedia);
        }
        let path = self.dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(name.to_string()),
                _ => StorageError::Io(e),
            })?;
        info!(path = %path.display(), "download file created");
        Ok(Box::new(BufWriter::new(file)))
    }
}
