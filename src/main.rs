#[macro_use]
extern crate log;

mod logging;

use crate::logging::setup_logging;
use anyhow::Context;
use prime_switch::{
    checks::{Systemd, UnitStatus},
    misc::format_error,
    status::Status,
    Host,
};
use std::process::exit;

fn main() {
    if let Err(why) = main_() {
        eprintln!("prime-switch: {}", format_error(&*why));
        exit(1);
    }
}

fn main_() -> anyhow::Result<()> {
    setup_logging(::log::LevelFilter::Info).context("failed to initialize logging")?;

    let systemd = match Systemd::connect() {
        Ok(systemd) => Some(systemd),
        Err(why) => {
            warn!("unable to connect to the system bus: {}", why);
            None
        }
    };

    let host = Host::new();
    let bus = systemd.as_ref().map(|systemd| systemd as &dyn UnitStatus);
    let status = Status::gather(&host, bus);

    if status.bus_ids.is_err() {
        warn!("this system does not appear to have an Intel/Nvidia hybrid GPU pair");
    }

    println!("{}", status);
    Ok(())
}
