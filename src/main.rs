//! rprobe - Debug probe flash programming tool
//!
//! Attaches to a microcontroller through a probe adapter, identifies it
//! via the driver probe chain, and programs its on-chip flash.
//!
//! # Architecture
//!
//! The CLI only deals in three abstractions from `rprobe-core`:
//! - **MemoryAccess** - a probe adapter moving register reads/writes to
//!   the device (the `dummy` emulator ships by default; real transports
//!   slot into the same registry)
//! - **Target** - the session a matching driver installs the memory map
//!   and monitor commands into
//! - **Driver** - one per supported device family, tried in order

mod cli;
mod commands;
mod probes;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let erase_delay = cli.erase_delay;

    match cli.command {
        Commands::Probe { probe } => {
            let target = commands::attach(&probe, erase_delay)?;
            println!(
                "Found: {} (idcode 0x{:08X})",
                target.driver().unwrap_or("unknown"),
                target.idcode()
            );
            Ok(())
        }
        Commands::Info { probe } => {
            let target = commands::attach(&probe, erase_delay)?;
            commands::run_info(&target);
            Ok(())
        }
        Commands::Erase { probe, addr, len } => {
            let mut target = commands::attach(&probe, erase_delay)?;
            commands::run_erase(&mut target, addr, len)
        }
        Commands::Write {
            probe,
            input,
            addr,
            verify,
            no_erase,
        } => {
            let mut target = commands::attach(&probe, erase_delay)?;
            commands::run_write(&mut target, addr, &input, verify, no_erase)
        }
        Commands::Read {
            probe,
            addr,
            len,
            output,
        } => {
            let mut target = commands::attach(&probe, erase_delay)?;
            commands::run_read(&mut target, addr, len, &output)
        }
        Commands::Verify { probe, input, addr } => {
            let mut target = commands::attach(&probe, erase_delay)?;
            commands::run_verify(&mut target, addr, &input)
        }
        Commands::Monitor { probe, name, args } => {
            let mut target = commands::attach(&probe, erase_delay)?;
            commands::run_monitor(&mut target, name.as_deref(), &args)
        }
        Commands::ListProbes => {
            commands::list_probes();
            Ok(())
        }
    }
}
