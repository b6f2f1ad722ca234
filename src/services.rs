//! Collaborators the modem core drives but does not implement.
//!
//! The TCP client, settings storage, network interface bring-up and the
//! download sink are all reached through the traits below. [`crate::net`]
//! provides std-backed implementations; tests plug in mocks.
//!
//! Every trait is also implemented for `Rc<RefCell<T>>`, so a caller can
//! keep a handle on a collaborator after handing it to the
//! [`crate::Modem`], the same way a device is shared with a front end.

use crate::error::StorageError;
use crate::timing::Clock;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::Write;
use std::net::Ipv4Addr;
use std::rc::Rc;

/// Byte-stream client connection.
pub trait Transport {
    /// Open a connection, dropping any current one. Returns success.
    fn connect(&mut self, host: &str, port: u16) -> bool;

    /// True while the connection is open or unread data remains.
    fn connected(&mut self) -> bool;

    /// Bytes ready to read without waiting.
    fn available(&mut self) -> usize;

    /// Next received byte, if one is ready.
    fn read(&mut self) -> Option<u8>;

    fn write(&mut self, bytes: &[u8]);

    /// Close the connection and discard unread data.
    fn stop(&mut self);
}

/// Stored addresses selected by the `+MYIP`, `+DNSIP`, `+GTWYIP` and
/// `+MASKIP` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    MyIp,
    Dns,
    Gateway,
    Mask,
}

/// Persisted network settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetSettings {
    pub dhcp_enabled: bool,
    pub mac: [u8; 6],
    pub my_ip: Ipv4Addr,
    pub dns_ip: Ipv4Addr,
    pub gateway_ip: Ipv4Addr,
    pub mask_ip: Ipv4Addr,
    pub dhcp_timeout_ms: u16,
    pub dhcp_response_timeout_ms: u16,
}

impl Default for NetSettings {
    /// Factory defaults.
    fn default() -> Self {
        Self {
            dhcp_enabled: true,
            mac: [0xBE, 0x0C, 0x64, 0xC0, 0xFF, 0xEE],
            my_ip: Ipv4Addr::new(192, 168, 1, 10),
            dns_ip: Ipv4Addr::new(192, 168, 1, 1),
            gateway_ip: Ipv4Addr::new(192, 168, 1, 1),
            mask_ip: Ipv4Addr::new(255, 255, 255, 0),
            dhcp_timeout_ms: 9000,
            dhcp_response_timeout_ms: 4000,
        }
    }
}

impl NetSettings {
    pub fn address(&self, field: AddressField) -> Ipv4Addr {
        match field {
            AddressField::MyIp => self.my_ip,
            AddressField::Dns => self.dns_ip,
            AddressField::Gateway => self.gateway_ip,
            AddressField::Mask => self.mask_ip,
        }
    }

    pub fn set_address(&mut self, field: AddressField, ip: Ipv4Addr) {
        match field {
            AddressField::MyIp => self.my_ip = ip,
            AddressField::Dns => self.dns_ip = ip,
            AddressField::Gateway => self.gateway_ip = ip,
            AddressField::Mask => self.mask_ip = ip,
        }
    }

    pub fn static_addresses(&self) -> StaticAddresses {
        StaticAddresses {
            ip: self.my_ip,
            dns: self.dns_ip,
            gateway: self.gateway_ip,
            mask: self.mask_ip,
        }
    }
}

/// Non-volatile settings storage, one fixed-size field at a time.
pub trait SettingsStore {
    fn load(&self) -> NetSettings;

    fn store(&mut self, settings: &NetSettings);

    fn mac(&self) -> [u8; 6] {
        self.load().mac
    }

    fn set_mac(&mut self, mac: [u8; 6]) {
        let mut s = self.load();
        s.mac = mac;
        self.store(&s);
    }

    fn dhcp_enabled(&self) -> bool {
        self.load().dhcp_enabled
    }

    fn set_dhcp_enabled(&mut self, enabled: bool) {
        let mut s = self.load();
        s.dhcp_enabled = enabled;
        self.store(&s);
    }

    fn dhcp_timeout_ms(&self) -> u16 {
        self.load().dhcp_timeout_ms
    }

    fn set_dhcp_timeout_ms(&mut self, ms: u16) {
        let mut s = self.load();
        s.dhcp_timeout_ms = ms;
        self.store(&s);
    }

    fn dhcp_response_timeout_ms(&self) -> u16 {
        self.load().dhcp_response_timeout_ms
    }

    fn set_dhcp_response_timeout_ms(&mut self, ms: u16) {
        let mut s = self.load();
        s.dhcp_response_timeout_ms = ms;
        self.store(&s);
    }

    fn address(&self, field: AddressField) -> Ipv4Addr {
        self.load().address(field)
    }

    fn set_address(&mut self, field: AddressField, ip: Ipv4Addr) {
        let mut s = self.load();
        s.set_address(field, ip);
        self.store(&s);
    }

    /// Write the factory defaults.
    fn restore_defaults(&mut self) {
        self.store(&NetSettings::default());
    }
}

/// Settings held in RAM only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    settings: NetSettings,
}

impl MemorySettings {
    pub fn new(settings: NetSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> NetSettings {
        self.settings.clone()
    }

    fn store(&mut self, settings: &NetSettings) {
        self.settings = settings.clone();
    }
}

/// Addresses for a static bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAddresses {
    pub ip: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub mask: Ipv4Addr,
}

/// Physical link state after a failed bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    NoHardware,
    LinkOff,
    Up,
}

/// Network interface bring-up and status.
pub trait NetworkInterface {
    /// Configure via DHCP. Returns false when no lease was obtained.
    fn begin_dhcp(&mut self, mac: [u8; 6], timeout_ms: u16, response_timeout_ms: u16) -> bool;

    fn begin_static(&mut self, mac: [u8; 6], addresses: &StaticAddresses);

    fn mac_address(&self) -> [u8; 6];
    fn local_ip(&self) -> Ipv4Addr;
    fn subnet_mask(&self) -> Ipv4Addr;
    fn gateway_ip(&self) -> Ipv4Addr;
    fn link_state(&self) -> LinkState;
}

/// Destination for downloaded files.
pub trait FileSink {
    /// Create `name` for writing. Existing files are never overwritten.
    fn create(&mut self, name: &str) -> Result<Box<dyn Write>, StorageError>;
}

impl<T: Transport + ?Sized> Transport for Rc<RefCell<T>> {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        self.borrow_mut().connect(host, port)
    }

    fn connected(&mut self) -> bool {
        self.borrow_mut().connected()
    }

    fn available(&mut self) -> usize {
        self.borrow_mut().available()
    }

    fn read(&mut self) -> Option<u8> {
        self.borrow_mut().read()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.borrow_mut().write(bytes)
    }

    fn stop(&mut self) {
        self.borrow_mut().stop()
    }
}

impl<T: SettingsStore + ?Sized> SettingsStore for Rc<RefCell<T>> {
    fn load(&self) -> NetSettings {
        self.borrow().load()
    }

    fn store(&mut self, settings: &NetSettings) {
        self.borrow_mut().store(settings)
    }
}

impl<T: NetworkInterface + ?Sized> NetworkInterface for Rc<RefCell<T>> {
    fn begin_dhcp(&mut self, mac: [u8; 6], timeout_ms: u16, response_timeout_ms: u16) -> bool {
        self.borrow_mut()
            .begin_dhcp(mac, timeout_ms, response_timeout_ms)
    }

    fn begin_static(&mut self, mac: [u8; 6], addresses: &StaticAddresses) {
        self.borrow_mut().begin_static(mac, addresses)
    }

    fn mac_address(&self) -> [u8; 6] {
        self.borrow().mac_address()
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.borrow().local_ip()
    }

    fn subnet_mask(&self) -> Ipv4Addr {
        self.borrow().subnet_mask()
    }

    fn gateway_ip(&self) -> Ipv4Addr {
        self.borrow().gateway_ip()
    }

    fn link_state(&self) -> LinkState {
        self.borrow().link_state()
    }
}

impl<T: FileSink + ?Sized> FileSink for Rc<RefCell<T>> {
    fn create(&mut self, name: &str) -> Result<Box<dyn Write>, StorageError> {
        self.borrow_mut().create(name)
    }
}

/// Everything the polling context talks to.
pub struct Services {
    pub transport: Box<dyn Transport>,
    pub network: Box<dyn NetworkInterface>,
    pub settings: Box<dyn SettingsStore>,
    pub storage: Box<dyn FileSink>,
    pub clock: Rc<dyn Clock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let s = NetSettings::default();
        assert!(s.dhcp_enabled);
        assert_eq!(s.mac, [0xBE, 0x0C, 0x64, 0xC0, 0xFF, 0xEE]);
        assert_eq!(s.my_ip, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(s.mask_ip, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(s.dhcp_timeout_ms, 9000);
        assert_eq!(s.dhcp_response_timeout_ms, 4000);
    }

    #[test]
    fn test_memory_settings_fields() {
        let mut store = MemorySettings::default();
        store.set_address(AddressField::Gateway, Ipv4Addr::new(10, 0, 0, 1));
        store.set_dhcp_enabled(false);
        store.set_dhcp_timeout_ms(1234);
        assert_eq!(store.address(AddressField::Gateway), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(store.address(AddressField::MyIp), Ipv4Addr::new(192, 168, 1, 10));
        assert!(!store.dhcp_enabled());
        assert_eq!(store.dhcp_timeout_ms(), 1234);

        store.restore_defaults();
        assert_eq!(store.load(), NetSettings::default());
    }

    #[test]
    fn test_shared_handle_sees_updates() {
        let shared = Rc::new(RefCell::new(MemorySettings::default()));
        let mut handle = Rc::clone(&shared);
        handle.set_mac([2, 0, 0, 0, 0, 1]);
        assert_eq!(shared.borrow().mac(), [2, 0, 0, 0, 0, 1]);
    }
}
