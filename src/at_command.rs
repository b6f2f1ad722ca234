//! AT command line recognition and argument parsing.
//!
//! Lines arrive already folded to lowercase. Matching is by prefix against
//! an ordered table and the first match wins: `c` claims every line that
//! starts with it, and `+s` shadows any longer `+s...` spelling.

use crate::error::ModemError;
use std::net::Ipv4Addr;

/// Commands the processor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCommand {
    /// `ATDT<host>[:<port>]`
    Dial,
    /// `ATC`
    Connect,
    /// `AT+S`
    ShowSettings,
    /// `AT+RNDMAC`
    RandomMac,
    /// `AT+MAC=`
    SetMac,
    /// `AT+DHCP=`
    SetDhcp,
    /// `AT+DHCPTIME=`
    DhcpTimeout,
    /// `AT+DHCPRESP=`
    DhcpResponseTimeout,
    /// `AT+MYIP=`
    MyIp,
    /// `AT+DNSIP=`
    DnsIp,
    /// `AT+GTWYIP=`
    GatewayIp,
    /// `AT+MASKIP=`
    MaskIp,
    /// `AT+DEFAULTS`
    Defaults,
    /// `AT?`
    Help,
    /// `ATBROWSE`
    Browse,
}

/// Prefix table in match order.
pub const AT_COMMANDS: [(&str, AtCommand); 15] = [
    ("dt", AtCommand::Dial),
    ("c", AtCommand::Connect),
    ("+s", AtCommand::ShowSettings),
    ("+rndmac", AtCommand::RandomMac),
    ("+mac=", AtCommand::SetMac),
    ("+dhcp=", AtCommand::SetDhcp),
    ("+dhcptime=", AtCommand::DhcpTimeout),
    ("+dhcpresp=", AtCommand::DhcpResponseTimeout),
    ("+myip=", AtCommand::MyIp),
    ("+dnsip=", AtCommand::DnsIp),
    ("+gtwyip=", AtCommand::GatewayIp),
    ("+maskip=", AtCommand::MaskIp),
    ("+defaults", AtCommand::Defaults),
    ("?", AtCommand::Help),
    ("browse", AtCommand::Browse),
];

/// Outcome of matching one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtLine<'a> {
    /// Line does not start with `at`.
    MissingPrefix,
    /// Bare `at`.
    Ping,
    /// Matched command and its argument, leading spaces removed.
    Command(AtCommand, &'a str),
    /// Starts with `at` but matches nothing.
    Unknown,
}

impl<'a> AtLine<'a> {
    /// Match a command line against [`AT_COMMANDS`].
    ///
    /// ```rust
    /// use swiftlink::{AtCommand, AtLine};
    ///
    /// assert_eq!(AtLine::parse("at"), AtLine::Ping);
    /// assert_eq!(
    ///     AtLine::parse("atdt  bbs.example.net:23"),
    ///     AtLine::Command(AtCommand::Dial, "bbs.example.net:23")
    /// );
    /// assert_eq!(AtLine::parse("hello"), AtLine::MissingPrefix);
    /// ```
    pub fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix("at") else {
            return AtLine::MissingPrefix;
        };
        if rest.is_empty() {
            return AtLine::Ping;
        }
        AT_COMMANDS
            .iter()
            .find_map(|&(prefix, cmd)| {
                rest.strip_prefix(prefix)
                    .map(|arg| AtLine::Command(cmd, arg.trim_start_matches(' ')))
            })
            .unwrap_or(AtLine::Unknown)
    }
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse `d.d.d.d`.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, ModemError> {
    let err = || ModemError::InvalidIp(text.to_string());
    let mut octets = [0u8; 4];
    let mut parts = text.trim().split('.');
    for octet in octets.iter_mut() {
        *octet = parts
            .next()
            .filter(|p| is_decimal(p))
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
    }
    if parts.next().is_some() {
        return Err(err());
    }
    Ok(Ipv4Addr::from(octets))
}

/// Parse `xx:xx:xx:xx:xx:xx` (hex, either case).
pub fn parse_mac(text: &str) -> Result<[u8; 6], ModemError> {
    let err = || ModemError::InvalidMac(text.to_string());
    let mut mac = [0u8; 6];
    let mut parts = text.trim().split(':');
    for octet in mac.iter_mut() {
        let part = parts.next().ok_or_else(err)?;
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        *octet = u8::from_str_radix(part, 16).map_err(|_| err())?;
    }
    if parts.next().is_some() {
        return Err(err());
    }
    Ok(mac)
}

/// Parse the DHCP switch: exactly `0` or `1`.
pub fn parse_dhcp_switch(text: &str) -> Result<bool, ModemError> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ModemError::InvalidSwitch(text.to_string())),
    }
}

/// Parse a timeout in milliseconds: a non-zero 16-bit decimal.
pub fn parse_timeout(text: &str) -> Result<u16, ModemError> {
    let text = text.trim();
    match text.parse::<u16>() {
        Ok(ms) if ms != 0 && is_decimal(text) => Ok(ms),
        _ => Err(ModemError::InvalidTimeout(text.to_string())),
    }
}

/// Split an `ATDT` argument into host and port.
pub fn parse_dial_target(arg: &str, default_port: u16) -> Result<(&str, u16), ModemError> {
    match arg.split_once(':') {
        Some((host, port)) => Some(port.trim())
            .filter(|p| is_decimal(p))
            .and_then(|p| p.parse().ok())
            .map(|p| (host, p))
            .ok_or_else(|| ModemError::InvalidPort(port.to_string())),
        None => Ok((arg, default_port)),
    }
}

/// Format a MAC the way the settings report shows it.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry_reachable() {
        for (prefix, cmd) in AT_COMMANDS {
            let line = format!("at{prefix}");
            assert_eq!(AtLine::parse(&line), AtLine::Command(cmd, ""), "{line}");
        }
    }

    #[test]
    fn test_first_match_wins() {
        // "+s" is listed before anything else starting with "+s"
        assert_eq!(
            AtLine::parse("at+status"),
            AtLine::Command(AtCommand::ShowSettings, "tatus")
        );
        // "c" claims anything starting with c
        assert_eq!(
            AtLine::parse("atconnect"),
            AtLine::Command(AtCommand::Connect, "onnect")
        );
        assert_eq!(
            AtLine::parse("at+dhcptime=500"),
            AtLine::Command(AtCommand::DhcpTimeout, "500")
        );
    }

    #[test]
    fn test_unknown_and_missing_prefix() {
        assert_eq!(AtLine::parse("atzz"), AtLine::Unknown);
        assert_eq!(AtLine::parse("a"), AtLine::MissingPrefix);
        assert_eq!(AtLine::parse(""), AtLine::MissingPrefix);
        assert_eq!(AtLine::parse(" at"), AtLine::MissingPrefix);
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("10.0.0.5").ok(), Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(parse_ipv4("bad").is_err());
        assert!(parse_ipv4("1.2.3").is_err());
        assert!(parse_ipv4("1.2.3.4.5").is_err());
        assert!(parse_ipv4("1.2.3.256").is_err());
        assert!(parse_ipv4("").is_err());
    }

    #[test]
    fn test_signed_numbers_rejected() {
        assert!(parse_ipv4("+1.2.3.4").is_err());
        assert!(parse_ipv4("1.2.+3.4").is_err());
        assert!(parse_mac("+1:0c:64:c0:ff:ee").is_err());
        assert!(parse_mac("be:0c:64:c0:ff:+e").is_err());
        assert!(parse_timeout("+500").is_err());
        assert!(parse_dial_target("bbs.net:+23", 6400).is_err());
        assert_eq!(parse_timeout(" 500 ").ok(), Some(500));
    }

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("be:0c:64:c0:ff:ee").ok(),
            Some([0xBE, 0x0C, 0x64, 0xC0, 0xFF, 0xEE])
        );
        assert!(parse_mac("be:0c:64:c0:ff").is_err());
        assert!(parse_mac("be:0c:64:c0:ff:ee:01").is_err());
        assert!(parse_mac("zz:0c:64:c0:ff:ee").is_err());
        assert!(parse_mac("100:0c:64:c0:ff:ee").is_err());
    }

    #[test]
    fn test_parse_dhcp_switch_and_timeout() {
        assert_eq!(parse_dhcp_switch("1").ok(), Some(true));
        assert_eq!(parse_dhcp_switch("0").ok(), Some(false));
        assert!(parse_dhcp_switch("2").is_err());
        assert!(parse_dhcp_switch("10").is_err());

        assert_eq!(parse_timeout("9000").ok(), Some(9000));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("70000").is_err());
        assert!(parse_timeout("abc").is_err());
    }

    #[test]
    fn test_parse_dial_target() {
        assert_eq!(parse_dial_target("bbs.net", 6400).ok(), Some(("bbs.net", 6400)));
        assert_eq!(parse_dial_target("bbs.net:23", 6400).ok(), Some(("bbs.net", 23)));
        assert!(parse_dial_target("bbs.net:telnet", 6400).is_err());
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0xBE, 0x0C, 0x64, 0xC0, 0xFF, 0xEE]), "BE:0C:64:C0:FF:EE");
    }
}
