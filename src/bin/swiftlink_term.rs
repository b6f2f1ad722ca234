//! Desktop terminal for the SwiftLink core.
//!
//! Stands in for the C64: keystrokes from stdin are written to the ACIA data
//! register, received bytes are read back on every NMI and printed as ASCII.

use clap::Parser;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;
use swiftlink::petscii::{from_petscii, to_petscii};
use swiftlink::{
    Acia, Device, DirectorySink, HostNetwork, InterruptDevice, MemorySettings, Modem, ModemConfig,
    Services, SystemClock, TcpTransport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "swiftlink-term", about = "SwiftLink modem core on a text terminal")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory link downloads are saved to
    #[arg(long = "download-dir", default_value = ".")]
    download_dir: PathBuf,

    /// TCP connect timeout in seconds
    #[arg(long = "connect-timeout", default_value_t = 10)]
    connect_timeout: u64,
}

/// Act as the host: take a pending byte off the data register and let the
/// inter-character countdown run out.
fn service_host(acia: &Acia, cycles: u32) {
    if acia.has_interrupt() {
        let c = from_petscii(acia.read(0));
        if c != 0 {
            let bytes: &[u8] = if c == b'\r' { b"\n" } else { std::slice::from_ref(&c) };
            let mut out = io::stdout().lock();
            let _ = out.write_all(bytes);
            let _ = out.flush();
        }
    }
    for _ in 0..cycles {
        acia.cycle();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swiftlink=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ModemConfig::from_toml_file(path)?,
        None => ModemConfig::default(),
    };
    let cycles = config.acia.cycles_between_rx;

    let services = Services {
        transport: Box::new(TcpTransport::new(Duration::from_secs(args.connect_timeout))),
        network: Box::new(HostNetwork::new()),
        settings: Box::new(MemorySettings::new(config.network.clone())),
        storage: Box::new(DirectorySink::new(&args.download_dir)),
        clock: Rc::new(SystemClock::new()),
    };
    let mut modem = Modem::new(config, services);
    modem.set_bus_yield(move |acia| service_host(acia, cycles));

    let (tx, rx) = mpsc::channel::<u8>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for b in line.bytes().chain(std::iter::once(b'\r')) {
                if tx.send(b).is_err() {
                    return;
                }
            }
        }
    });

    info!("ready, type AT? for help");
    let mut typed: VecDeque<u8> = VecDeque::new();
    loop {
        typed.extend(rx.try_iter());
        if modem.acia().pending_tx().is_none() {
            if let Some(b) = typed.pop_front() {
                modem.write(0, to_petscii(b));
            }
        }

        modem.poll();
        service_host(modem.acia(), cycles);

        if typed.is_empty() && modem.rx_queue().is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
