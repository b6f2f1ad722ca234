//! AT command handlers.
//!
//! Every handler answers through the Rx queue. Handlers that do slow
//! network work flush the queue first so the user sees what is going on.

use super::{Mode, Modem};
use crate::at_command::{
    format_mac, parse_dhcp_switch, parse_dial_target, parse_ipv4, parse_mac, parse_timeout,
    AtCommand, AtLine,
};
use crate::services::{AddressField, LinkState};
use std::net::Ipv4Addr;
use tracing::{debug, info};

const HELP: &[&str] = &[
    "General AT Commands:",
    " AT?   This help menu",
    " AT    Ping",
    " ATC   Connect Ethernet, display info",
    " ATDT<HostName>:<Port>  Connect to host",
    "Modify saved parameters:",
    " AT+S  Display stored Ethernet settings",
    " AT+DEFAULTS  Set defaults for all ",
    " AT+RNDMAC  MAC address to random value",
    " AT+MAC=<XX:XX:XX:XX:XX:XX>  Set MAC",
    " AT+DHCP=<0:1>  DHCP On(1)/Off(0)",
    "DHCP mode only: ",
    " AT+DHCPTIME=<D>  DHCP Timeout in mS",
    " AT+DHCPRESP=<D>  DHCP Response Timeout",
    "Static mode only: ",
    " AT+MYIP=<D.D.D.D>   Local IP address",
    " AT+DNSIP=<D.D.D.D>  DNS IP address",
    " AT+GTWYIP=<D.D.D.D> Gateway IP address",
    " AT+MASKIP=<D.D.D.D> Subnet Mask",
    "When in connected/on-line mode:",
    " +++   Disconnect from host",
];

impl Modem {
    pub(super) fn process_at(&mut self, line: &str) {
        match AtLine::parse(line) {
            AtLine::MissingPrefix => self.queue_ascii_ln("AT not found"),
            AtLine::Ping => {}
            AtLine::Unknown => {
                debug!(line, "unknown AT command");
                self.queue_ascii("unknown command: ");
                self.queue_ascii_ln(line);
            }
            AtLine::Command(cmd, arg) => {
                debug!(?cmd, arg, "AT command");
                match cmd {
                    AtCommand::Dial => self.at_dial(arg),
                    AtCommand::Connect => self.at_connect(),
                    AtCommand::ShowSettings => self.at_show_settings(),
                    AtCommand::RandomMac => self.at_random_mac(),
                    AtCommand::SetMac => self.at_set_mac(arg),
                    AtCommand::SetDhcp => self.at_set_dhcp(arg),
                    AtCommand::DhcpTimeout => self.at_dhcp_timeout(arg),
                    AtCommand::DhcpResponseTimeout => self.at_dhcp_response_timeout(arg),
                    AtCommand::MyIp => self.at_set_address("My", AddressField::MyIp, arg),
                    AtCommand::DnsIp => self.at_set_address("DNS", AddressField::Dns, arg),
                    AtCommand::GatewayIp => {
                        self.at_set_address("Gateway", AddressField::Gateway, arg)
                    }
                    AtCommand::MaskIp => {
                        self.at_set_address("Subnet Mask", AddressField::Mask, arg)
                    }
                    AtCommand::Defaults => self.at_defaults(),
                    AtCommand::Help => self.at_help(),
                    AtCommand::Browse => self.at_browse(),
                }
            }
        }
    }

    fn at_browse(&mut self) {
        // Echo and earlier replies are PETSCII already; get them out before
        // the queue starts carrying page text
        self.flush_rx_queue();
        self.browser_help();
        self.links.clear();
        self.session.mode = Mode::Browser;
        info!("browser mode");
    }

    fn at_dial(&mut self, arg: &str) {
        let (host, port) = match parse_dial_target(arg, self.config.dial.default_port) {
            Ok(target) => target,
            Err(e) => {
                debug!(error = %e, "ATDT");
                self.queue_invalid_format();
                return;
            }
        };

        self.queue_ascii_ln(&format!("Trying {host}\r\non port {port}..."));
        self.flush_rx_queue();

        if self.services.transport.connect(host, port) {
            info!(host, port, "dialed");
            self.queue_ascii_ln("Done");
        } else {
            self.queue_ascii_ln("Failed!");
        }
    }

    fn at_connect(&mut self) {
        self.queue_ascii("Connect Ethernet ");
        if self.services.settings.dhcp_enabled() {
            self.queue_ascii("via DHCP...");
        } else {
            self.queue_ascii("using Static...");
        }
        self.flush_rx_queue();

        if self.ethernet_init() {
            self.queue_ascii_ln("Done");
            let network = &self.services.network;
            let (mac, ip, mask, gateway) = (
                network.mac_address(),
                network.local_ip(),
                network.subnet_mask(),
                network.gateway_ip(),
            );
            self.queue_mac_ln(&mac);
            self.queue_ascii(" Local IP: ");
            self.queue_ip_ln(ip);
            self.queue_ascii(" Subnet Mask: ");
            self.queue_ip_ln(mask);
            self.queue_ascii(" Gateway IP: ");
            self.queue_ip_ln(gateway);
        } else {
            self.queue_ascii_ln("Failed!");
            match self.services.network.link_state() {
                LinkState::NoHardware => self.queue_ascii_ln(" HW was not found"),
                LinkState::LinkOff => self.queue_ascii_ln(" Cable is not connected"),
                LinkState::Up => {}
            }
        }
    }

    fn at_show_settings(&mut self) {
        let settings = self.services.settings.load();

        self.queue_ascii_ln("General Settings:");
        self.queue_mac_ln(&settings.mac);
        self.queue_dhcp_ln(settings.dhcp_enabled);

        self.queue_ascii_ln("DHCP only:");
        self.queue_dhcp_timeout_ln(settings.dhcp_timeout_ms);
        self.queue_dhcp_response_ln(settings.dhcp_response_timeout_ms);

        self.queue_ascii_ln("Static only:");
        self.queue_ascii(" My IP: ");
        self.queue_ip_ln(settings.my_ip);
        self.queue_ascii(" DNS IP: ");
        self.queue_ip_ln(settings.dns_ip);
        self.queue_ascii(" Gateway IP: ");
        self.queue_ip_ln(settings.gateway_ip);
        self.queue_ascii(" Subnet Mask: ");
        self.queue_ip_ln(settings.mask_ip);
    }

    fn at_random_mac(&mut self) {
        self.queue_ascii_ln("Random MAC Addr");
        let mut mac: [u8; 6] = rand::random();
        mac[0] &= 0xFE; // unicast
        mac[0] |= 0x02; // locally administered
        self.services.settings.set_mac(mac);
        self.queue_updated_ln();
        self.queue_mac_ln(&mac);
    }

    fn at_set_mac(&mut self, arg: &str) {
        self.queue_ascii_ln("MAC Addr");
        match parse_mac(arg) {
            Ok(mac) => {
                self.services.settings.set_mac(mac);
                self.queue_updated_ln();
                self.queue_mac_ln(&mac);
            }
            Err(_) => self.queue_invalid_format(),
        }
    }

    fn at_set_dhcp(&mut self, arg: &str) {
        match parse_dhcp_switch(arg) {
            Ok(enabled) => {
                self.services.settings.set_dhcp_enabled(enabled);
                self.queue_updated_ln();
                self.queue_dhcp_ln(enabled);
            }
            Err(_) => self.queue_invalid_format(),
        }
    }

    fn at_dhcp_timeout(&mut self, arg: &str) {
        match parse_timeout(arg) {
            Ok(ms) => {
                self.services.settings.set_dhcp_timeout_ms(ms);
                self.queue_updated_ln();
                self.queue_dhcp_timeout_ln(ms);
            }
            Err(_) => self.queue_invalid_format(),
        }
    }

    fn at_dhcp_response_timeout(&mut self, arg: &str) {
        match parse_timeout(arg) {
            Ok(ms) => {
                self.services.settings.set_dhcp_response_timeout_ms(ms);
                self.queue_updated_ln();
                self.queue_dhcp_response_ln(ms);
            }
            Err(_) => self.queue_invalid_format(),
        }
    }

    fn at_set_address(&mut self, label: &str, field: AddressField, arg: &str) {
        self.queue_ascii(label);
        self.queue_ascii_ln(" IP Addr");
        match parse_ipv4(arg) {
            Ok(ip) => {
                self.services.settings.set_address(field, ip);
                self.queue_updated_ln();
                self.queue_ascii("to ");
                self.queue_ip_ln(ip);
            }
            Err(_) => self.queue_invalid_format(),
        }
    }

    fn at_defaults(&mut self) {
        self.queue_updated_ln();
        self.services.settings.restore_defaults();
        self.at_show_settings();
    }

    fn at_help(&mut self) {
        for line in HELP {
            self.queue_ascii_ln(line);
        }
    }

    fn queue_updated_ln(&mut self) {
        self.queue_ascii_ln("Updated");
    }

    fn queue_invalid_format(&mut self) {
        self.queue_ascii_ln("Invalid Format");
    }

    fn queue_mac_ln(&mut self, mac: &[u8; 6]) {
        self.queue_ascii_ln(&format!(" MAC Address: {}", format_mac(mac)));
    }

    fn queue_ip_ln(&mut self, ip: Ipv4Addr) {
        self.queue_ascii_ln(&ip.to_string());
    }

    fn queue_dhcp_ln(&mut self, enabled: bool) {
        self.queue_ascii(" DHCP: ");
        self.queue_ascii_ln(if enabled { "Enabled" } else { "Disabled" });
    }

    fn queue_dhcp_timeout_ln(&mut self, ms: u16) {
        self.queue_ascii_ln(&format!(" DHCP Timeout: {ms}mS"));
    }

    fn queue_dhcp_response_ln(&mut self, ms: u16) {
        self.queue_ascii_ln(&format!(" DHCP Response Timeout: {ms}mS"));
    }
}
