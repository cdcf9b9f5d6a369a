//! CLI command implementations
//!
//! Every command starts from [`attach`]: open the requested probe
//! adapter, wrap it in a `Target`, and run the driver probe chain. The
//! flash commands then only use the target's generic entry points, so
//! they work identically for every driver the chain knows about.

mod flash;
mod monitor;

use crate::probes;
use rprobe_core::{probe_chain, Driver, MemoryAccess, Target};
use rprobe_synwit::SynwitDriver;

pub use flash::{run_erase, run_read, run_verify, run_write};
pub use monitor::run_monitor;

/// A target session over a type-erased probe adapter
pub type BoxedTarget = Target<Box<dyn MemoryAccess>>;

/// Open a probe adapter and identify the attached device
pub fn attach(
    probe: &str,
    erase_delay: Option<u32>,
) -> Result<BoxedTarget, Box<dyn std::error::Error>> {
    let access = probes::open_probe(probe)?;
    let mut target = Target::new(access);

    let synwit = match erase_delay {
        Some(ms) => SynwitDriver::with_erase_delay(ms),
        None => SynwitDriver::new(),
    };
    let drivers: [&dyn Driver<Box<dyn MemoryAccess>>; 1] = [&synwit];

    if !probe_chain(&mut target, &drivers)? {
        return Err("no known target detected".into());
    }
    Ok(target)
}

/// Print the attached target's memory map and monitor commands
pub fn run_info(target: &BoxedTarget) {
    println!("Target Information");
    println!("==================");
    println!();
    println!("Driver:          {}", target.driver().unwrap_or("unknown"));
    println!("Idcode:          0x{:08X}", target.idcode());
    println!();

    println!("RAM regions:");
    for ram in target.ram_regions() {
        println!(
            "  0x{:08X} - 0x{:08X} ({} bytes)",
            ram.start,
            ram.start + ram.length,
            ram.length
        );
    }

    println!("Flash regions:");
    for region in target.flash_regions() {
        let desc = region.desc();
        println!(
            "  0x{:08X} - 0x{:08X} ({} bytes, {}-byte blocks)",
            desc.start,
            desc.end(),
            desc.length,
            desc.erase_block
        );
    }

    println!();
    println!("Monitor commands:");
    for (tag, cmd) in target.commands() {
        println!("  {:12} {} [{}]", cmd.name, cmd.help, tag);
    }
}

/// Print the compiled-in probe adapters
pub fn list_probes() {
    println!("Available probe adapters:");
    for info in probes::available_probes() {
        print!("  {:12} {}", info.name, info.description);
        if !info.aliases.is_empty() {
            print!(" (aliases: {})", info.aliases.join(", "));
        }
        println!();
    }
}
