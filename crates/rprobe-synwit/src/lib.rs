//! rprobe-synwit - Synwit SWM050 target flash driver
//!
//! Identification, flash erase/program sequencing, and monitor commands
//! for the Synwit SWM050 (Cortex-M0, 8 KiB flash in 512-byte pages,
//! 1 KiB SRAM).
//!
//! The SWM050 flash controller is driven entirely through three
//! memory-mapped registers and a key constant: a command register
//! selects the operation, writes into the array address range carry it
//! out, and a fixed wall-clock delay stands in for the completion
//! signal the hardware does not provide. Erase timing is only valid at
//! the conservative 18 MHz clock, so every sequence starts by pinning
//! the clock configuration.

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod registers;

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;
use core::fmt::Write as _;

use rprobe_core::error::Result;
use rprobe_core::flash::{FlashDesc, FlashOps, FlashRegion};
use rprobe_core::monitor::{Command, CommandTable};
use rprobe_core::{Driver, MemoryAccess, Target};

use registers::*;

/// Default wait after each erase key write, in milliseconds
///
/// The controller has no status register to poll; the only completion
/// signal is time. 1 ms is comfortably above the documented page-erase
/// latency at the 18 MHz clock the preamble establishes, but it is an
/// empirical constant - use [`SynwitDriver::with_erase_delay`] to widen
/// it for marginal parts.
pub const DEFAULT_ERASE_DELAY_MS: u32 = 1;

/// Driver for the Synwit SWM050 family
pub struct SynwitDriver {
    erase_delay_ms: u32,
}

impl SynwitDriver {
    /// Create a driver with the default erase delay
    pub fn new() -> Self {
        Self {
            erase_delay_ms: DEFAULT_ERASE_DELAY_MS,
        }
    }

    /// Create a driver with a custom per-block erase delay
    pub fn with_erase_delay(erase_delay_ms: u32) -> Self {
        Self { erase_delay_ms }
    }
}

impl Default for SynwitDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: MemoryAccess> Driver<A> for SynwitDriver {
    fn name(&self) -> &'static str {
        "synwit"
    }

    fn probe(&self, target: &mut Target<A>) -> Result<bool> {
        let idcode = target.access_mut().read32(CPUID)?;

        match idcode {
            IDCODE => {
                target.set_idcode(idcode);
                target.set_driver("Synwit SWM050");
                target.add_ram_region(SRAM_BASE, SRAM_SIZE);
                target.add_flash_region(FlashRegion::new(
                    FlashDesc {
                        start: FLASH_BASE,
                        length: FLASH_SIZE,
                        erase_block: FLASH_PAGE,
                        write_buf: FLASH_PAGE,
                    },
                    Box::new(Swm050Flash {
                        erase_delay_ms: self.erase_delay_ms,
                    }),
                ));
                target.add_commands(command_table());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Pin the core clock at 18 MHz with doubling off
///
/// The controller's erase and program timing is only specified at this
/// frequency; every sequence starts here.
fn configure_clock<A: MemoryAccess>(access: &mut A) -> Result<()> {
    access.write32(SYS_CFG_0, SYS_CFG_0_18MHZ)?;
    access.write32(SYS_DBLF, SYS_DBLF_OFF)
}

/// Flash controller sequencer bound to the SWM050 flash region
struct Swm050Flash {
    erase_delay_ms: u32,
}

impl<A: MemoryAccess> FlashOps<A> for Swm050Flash {
    fn erase(&self, access: &mut A, desc: &FlashDesc, addr: u32, len: u32) -> Result<()> {
        configure_clock(access)?;
        access.write32(FLASH_CMD, FlashMode::PageErase as u32)?;

        // One key write per page, strictly in order. The delay is
        // mandatory: the next key must not be issued before the
        // controller finishes the previous erase.
        let mut addr = addr;
        let mut remaining = len;
        while remaining != 0 {
            log::trace!("erase page 0x{:08X}", addr);
            access.write32(addr, FLASH_KEY)?;
            access.delay_ms(self.erase_delay_ms);
            addr += desc.erase_block;
            remaining -= desc.erase_block;
        }

        access.write32(FLASH_CMD, FlashMode::Idle as u32)
    }

    fn write(&self, access: &mut A, _desc: &FlashDesc, dest: u32, data: &[u8]) -> Result<()> {
        configure_clock(access)?;
        access.write32(FLASH_CMD, FlashMode::Write as u32)?;
        access.write_bytes(dest, data)?;
        access.write32(FLASH_CMD, FlashMode::Idle as u32)
    }
}

// ---------------------------------------------------------------------
// Monitor commands
// ---------------------------------------------------------------------

fn command_table<A: MemoryAccess>() -> CommandTable<A> {
    CommandTable {
        tag: "synwit",
        commands: vec![
            Command {
                name: "erase_mass",
                help: "Erase entire flash memory",
                handler: cmd_erase_mass::<A>,
            },
            Command {
                name: "test1",
                help: "Write an incrementing word pattern (diagnostic)",
                handler: cmd_write_test::<A>,
            },
            Command {
                name: "test2",
                help: "Erase the first flash page (diagnostic)",
                handler: cmd_erase_test::<A>,
            },
        ],
    }
}

fn cmd_erase_mass<A: MemoryAccess>(
    target: &mut Target<A>,
    _args: &[&str],
    out: &mut dyn fmt::Write,
) -> Result<()> {
    let access = target.access_mut();

    configure_clock(access)?;
    access.write32(FLASH_CMD, FlashMode::ChipErase as u32)?;
    access.write32(FLASH_CFG, FLASH_CFG_CHIP_ERASE)?;
    access.write32(0x0, FLASH_KEY)?;
    access.delay_ms(DEFAULT_ERASE_DELAY_MS);
    access.write32(FLASH_CMD, FlashMode::Idle as u32)?;

    // No read-back: the controller gives nothing to verify against
    writeln!(out, "Device is erased")?;
    Ok(())
}

fn cmd_write_test<A: MemoryAccess>(
    target: &mut Target<A>,
    _args: &[&str],
    out: &mut dyn fmt::Write,
) -> Result<()> {
    let access = target.access_mut();

    configure_clock(access)?;
    access.write32(FLASH_CMD, FlashMode::Write as u32)?;
    for i in 0..FLASH_SIZE / 4 {
        access.write32(FLASH_BASE + 4 * i, i)?;
    }
    access.write32(FLASH_CMD, FlashMode::Idle as u32)?;

    writeln!(out, "Wrote incrementing word pattern")?;
    Ok(())
}

fn cmd_erase_test<A: MemoryAccess>(
    target: &mut Target<A>,
    _args: &[&str],
    out: &mut dyn fmt::Write,
) -> Result<()> {
    let access = target.access_mut();

    configure_clock(access)?;
    access.write32(FLASH_CMD, FlashMode::PageErase as u32)?;
    access.write32(FLASH_BASE, FLASH_KEY)?;
    access.delay_ms(DEFAULT_ERASE_DELAY_MS);
    access.write32(FLASH_CMD, FlashMode::Idle as u32)?;

    writeln!(out, "Erased first flash page")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;
    use rprobe_core::error::Error;
    use rprobe_core::{probe_chain, RamRegion};
    use rprobe_dummy::{DummyConfig, DummyTarget, Op};

    fn probed_target() -> Target<DummyTarget> {
        let mut target = Target::new(DummyTarget::new_default());
        assert!(SynwitDriver::new().probe(&mut target).unwrap());
        target.access_mut().clear_journal();
        target
    }

    #[test]
    fn probe_installs_memory_map_and_commands() {
        let mut target = Target::new(DummyTarget::new_default());
        let matched = probe_chain(&mut target, &[&SynwitDriver::new()]).unwrap();

        assert!(matched);
        assert_eq!(target.idcode(), 0x410C_C200);
        assert_eq!(target.driver(), Some("Synwit SWM050"));
        assert_eq!(
            target.ram_regions(),
            [RamRegion { start: 0x2000_0000, length: 0x400 }]
        );

        let desc = *target.flash_regions()[0].desc();
        assert_eq!(
            desc,
            FlashDesc { start: 0x0, length: 0x2000, erase_block: 0x200, write_buf: 0x200 }
        );

        let names: Vec<_> = target.commands().map(|(_, c)| c.name).collect();
        assert_eq!(names, ["erase_mass", "test1", "test2"]);
    }

    #[test]
    fn probe_mismatch_leaves_session_untouched() {
        let dummy = DummyTarget::new(DummyConfig {
            idcode: 0x410C_C601, // some other Cortex-M0
            ..DummyConfig::default()
        });
        let mut target = Target::new(dummy);

        assert!(!SynwitDriver::new().probe(&mut target).unwrap());
        assert_eq!(target.idcode(), 0);
        assert_eq!(target.driver(), None);
        assert!(target.ram_regions().is_empty());
        assert!(target.flash_regions().is_empty());
        assert_eq!(target.commands().count(), 0);
    }

    #[test]
    fn erase_issues_one_key_write_per_page_in_order() {
        let mut target = probed_target();
        target.flash_erase(0x400, 0x400).unwrap();

        assert_eq!(
            target.access_mut().journal(),
            &[
                Op::Write32 { addr: SYS_CFG_0, value: 1 },
                Op::Write32 { addr: SYS_DBLF, value: 0 },
                Op::Write32 { addr: FLASH_CMD, value: 4 },
                Op::Write32 { addr: 0x400, value: FLASH_KEY },
                Op::Delay { ms: 1 },
                Op::Write32 { addr: 0x600, value: FLASH_KEY },
                Op::Delay { ms: 1 },
                Op::Write32 { addr: FLASH_CMD, value: 0 },
            ]
        );
    }

    #[test]
    fn single_page_erase_is_one_key_and_one_delay() {
        let mut target = probed_target();
        target.flash_erase(0x1E00, 0x200).unwrap();

        let journal = target.access_mut().journal();
        let keys = journal
            .iter()
            .filter(|op| matches!(op, Op::Write32 { value, .. } if *value == FLASH_KEY))
            .count();
        let delays = journal.iter().filter(|op| matches!(op, Op::Delay { .. })).count();
        assert_eq!((keys, delays), (1, 1));
    }

    #[test]
    fn erase_actually_blanks_the_pages() {
        let mut target = probed_target();
        target.access_mut().flash_mut().fill(0);

        target.flash_erase(0x200, 0x400).unwrap();

        let flash = target.access_mut().flash();
        assert!(flash[..0x200].iter().all(|b| *b == 0x00));
        assert!(flash[0x200..0x600].iter().all(|b| *b == 0xFF));
        assert!(flash[0x600..].iter().all(|b| *b == 0x00));
    }

    #[test]
    fn misaligned_erase_is_rejected_before_any_traffic() {
        let mut target = probed_target();

        assert_eq!(
            target.flash_erase(0x0, 0x201),
            Err(Error::InvalidRange { addr: 0x0, len: 0x201 })
        );
        assert!(target.access_mut().journal().is_empty());
    }

    #[test]
    fn out_of_range_erase_is_rejected() {
        let mut target = probed_target();

        assert_eq!(
            target.flash_erase(0x2000, 0x200),
            Err(Error::NoFlashRegion { addr: 0x2000 })
        );
        assert_eq!(
            target.flash_erase(0x1E00, 0x400),
            Err(Error::InvalidRange { addr: 0x1E00, len: 0x400 })
        );
    }

    #[test]
    fn write_is_one_bulk_transfer_bracketed_by_mode_writes() {
        let mut target = probed_target();
        let data: Vec<u8> = (0..0x200u32).map(|i| i as u8).collect();

        target.flash_write(0x800, &data).unwrap();

        assert_eq!(
            target.access_mut().journal(),
            &[
                Op::Write32 { addr: SYS_CFG_0, value: 1 },
                Op::Write32 { addr: SYS_DBLF, value: 0 },
                Op::Write32 { addr: FLASH_CMD, value: 1 },
                Op::WriteBytes { addr: 0x800, data: data.clone() },
                Op::Write32 { addr: FLASH_CMD, value: 0 },
            ]
        );
        assert_eq!(&target.access_mut().flash()[0x800..0xA00], &data[..]);
    }

    #[test]
    fn oversized_write_is_chunked_to_the_buffer_size() {
        let mut target = probed_target();
        let data = alloc::vec![0x5A; 0x300];

        // Starts mid-buffer: 0x180 bytes up to the 0x200 boundary, then
        // the remaining 0x180.
        target.flash_write(0x80, &data).unwrap();

        let chunks: Vec<_> = target
            .access_mut()
            .journal()
            .iter()
            .filter_map(|op| match op {
                Op::WriteBytes { addr, data } => Some((*addr, data.len())),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, [(0x80, 0x180), (0x200, 0x180)]);
        assert!(target.access_mut().flash()[0x80..0x380].iter().all(|b| *b == 0x5A));
    }

    #[test]
    fn mass_erase_sequence_and_message() {
        let mut target = probed_target();
        target.access_mut().flash_mut().fill(0);

        let mut out = String::new();
        target.command("erase_mass", &[], &mut out).unwrap();

        assert_eq!(out, "Device is erased\n");
        assert!(target.access_mut().flash().iter().all(|b| *b == 0xFF));
        assert_eq!(
            target.access_mut().journal(),
            &[
                Op::Write32 { addr: SYS_CFG_0, value: 1 },
                Op::Write32 { addr: SYS_DBLF, value: 0 },
                Op::Write32 { addr: FLASH_CMD, value: 6 },
                Op::Write32 { addr: FLASH_CFG, value: 1 },
                Op::Write32 { addr: 0x0, value: FLASH_KEY },
                Op::Delay { ms: 1 },
                Op::Write32 { addr: FLASH_CMD, value: 0 },
            ]
        );
    }

    #[test]
    fn mass_erase_is_idempotent_at_the_register_level() {
        let mut target = probed_target();
        let mut out = String::new();

        target.command("erase_mass", &[], &mut out).unwrap();
        let first: Vec<Op> = target.access_mut().journal().to_vec();

        target.access_mut().clear_journal();
        target.command("erase_mass", &[], &mut out).unwrap();

        assert_eq!(target.access_mut().journal(), &first[..]);
    }

    #[test]
    fn write_test_command_programs_the_pattern() {
        let mut target = probed_target();
        let mut out = String::new();

        target.command("test1", &[], &mut out).unwrap();

        let flash = target.access_mut().flash();
        for i in [0u32, 1, 2, 0x7FE, 0x7FF] {
            let offset = (4 * i) as usize;
            let mut word = [0u8; 4];
            word.copy_from_slice(&flash[offset..offset + 4]);
            assert_eq!(u32::from_le_bytes(word), i);
        }
    }

    #[test]
    fn erase_test_command_blanks_only_the_first_page() {
        let mut target = probed_target();
        target.access_mut().flash_mut().fill(0);

        let mut out = String::new();
        target.command("test2", &[], &mut out).unwrap();

        let flash = target.access_mut().flash();
        assert!(flash[..0x200].iter().all(|b| *b == 0xFF));
        assert!(flash[0x200..].iter().all(|b| *b == 0x00));
    }

    #[test]
    fn transport_failure_aborts_the_sequence() {
        let mut target = probed_target();
        target.access_mut().fail_after(1);

        assert_eq!(target.flash_erase(0x0, 0x200), Err(Error::Transport));
        // Only the access that succeeded before the fault reached the
        // device; nothing was issued past the failure point.
        assert_eq!(
            target.access_mut().journal(),
            &[Op::Write32 { addr: SYS_CFG_0, value: 1 }]
        );
    }

    #[test]
    fn custom_erase_delay_is_used_between_pages() {
        let mut target = Target::new(DummyTarget::new_default());
        assert!(SynwitDriver::with_erase_delay(5).probe(&mut target).unwrap());
        target.access_mut().clear_journal();

        target.flash_erase(0x0, 0x200).unwrap();
        assert!(target
            .access_mut()
            .journal()
            .iter()
            .any(|op| *op == Op::Delay { ms: 5 }));
    }
}
