mod cli;
mod node;
mod sim;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tmp100::{RawReading, Tmp100, Tmp100Manager, DEFAULT_ADDRESS, RENDERED_MAX};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands};
use crate::sim::{SimBus, SimRegistry, Step};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read { node, count, interval_ms } => {
            for i in 0..count {
                if i > 0 {
                    thread::sleep(Duration::from_millis(interval_ms));
                }
                let reading = node::read_node(&node)?;
                println!("{reading}");
            }
        }
        Commands::Decode { raw } => {
            let raw = RawReading(raw);
            debug!(
                "integer byte {:#04x}, fraction nibble {:#x}",
                raw.integer_byte(),
                raw.fraction_nibble()
            );
            print!("{}", raw.decode().render());
        }
        Commands::Simulate { raw, fail_at, absent, reads } => {
            simulate(raw, fail_at, absent, reads)?;
        }
    }

    Ok(())
}

fn simulate(
    raw: u16,
    fail_at: Option<Step>,
    absent: bool,
    reads: u32,
) -> Result<()> {
    let mgr: Tmp100Manager<CriticalSectionRawMutex, _, _> =
        tmp100::manager(SimRegistry::new(fail_at));
    let bus = SimBus::new(DEFAULT_ADDRESS, raw, !absent);
    let sensor = Tmp100::with_default_address(bus);

    match mgr.attach(sensor) {
        Ok(dev) => info!("attached as {dev}"),
        Err((err, _sensor)) => {
            warn!("attach failed: {err}");
            report(&mgr);
            return Ok(());
        }
    }
    report(&mgr);

    for _ in 0..reads {
        let mut buf = [0u8; RENDERED_MAX];
        let mut offset = 0;
        let len = mgr.read(&mut buf, &mut offset).map_err(|e| {
            let errno = tmp100::read_errno(&e);
            anyhow::anyhow!("read failed: {e} (errno {errno})")
        })?;
        let text = std::str::from_utf8(&buf[..len])
            .context("Reading is not UTF-8")?;
        print!("{text}");
    }

    if mgr.detach().is_some() {
        info!("detached");
    }
    report(&mgr);

    Ok(())
}

fn report(mgr: &Tmp100Manager<CriticalSectionRawMutex, SimRegistry, SimBus>) {
    let live = mgr.registry().live();
    info!("{:?}, {} live resource(s)", mgr.lifecycle(), live.len());
    for resource in live {
        info!("  {resource}");
    }
}
