//! rprobe-dummy - In-memory emulated target for testing
//!
//! This crate provides a dummy probe adapter that emulates a Synwit
//! SWM050 in memory: the CPUID register answers with a configurable
//! identification code and the flash controller command state machine is
//! modeled against a byte array. Every access is journaled, so tests can
//! assert on the exact register sequence a driver issued instead of
//! needing real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use rprobe_core::error::{Error, Result};
use rprobe_core::MemoryAccess;

// Emulated register map. These mirror the hardware addresses; the
// emulator deliberately does not import them from the driver crate so
// that driver and "hardware" cannot drift in lockstep unnoticed.
const CPUID: u32 = 0xE000_ED00;
const FLASH_CMD: u32 = 0x1F00_0000;
const FLASH_CFG: u32 = 0x1F00_0038;
const FLASH_KEY: u32 = 0xAAAA_AAAA;
const SYS_CFG_0: u32 = 0x400F_0000;
const SYS_DBLF: u32 = 0x400F_0008;

const MODE_IDLE: u32 = 0;
const MODE_WRITE: u32 = 1;
const MODE_PAGE_ERASE: u32 = 4;
const MODE_CHIP_ERASE: u32 = 6;

/// The erased state of a flash byte (all bits set)
const ERASED: u8 = 0xFF;

/// One journaled transport access
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// 32-bit register read
    Read32 {
        /// Accessed address
        addr: u32,
    },
    /// 32-bit register write
    Write32 {
        /// Accessed address
        addr: u32,
        /// Written value
        value: u32,
    },
    /// Bulk read
    ReadBytes {
        /// Start address
        addr: u32,
        /// Number of bytes read
        len: usize,
    },
    /// Bulk write
    WriteBytes {
        /// Start address
        addr: u32,
        /// The written bytes
        data: Vec<u8>,
    },
    /// Wall-clock delay
    Delay {
        /// Milliseconds waited
        ms: u32,
    },
}

/// Configuration for the emulated target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Value returned by CPUID reads
    pub idcode: u32,
    /// Flash size in bytes
    pub flash_size: usize,
    /// Erase page size in bytes
    pub page_size: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            idcode: 0x410C_C200, // SWM050
            flash_size: 0x2000,
            page_size: 0x200,
        }
    }
}

/// Emulated SWM050 target
///
/// Implements [`MemoryAccess`] against an in-memory flash array and
/// journals every call for sequence-level assertions.
pub struct DummyTarget {
    config: DummyConfig,
    flash: Vec<u8>,
    mode: u32,
    chip_erase_armed: bool,
    journal: Vec<Op>,
    fail_after: Option<usize>,
    fallible_calls: usize,
}

impl DummyTarget {
    /// Create an emulated target with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![ERASED; config.flash_size];
        Self {
            config,
            flash,
            mode: MODE_IDLE,
            chip_erase_armed: false,
            journal: Vec::new(),
            fail_after: None,
            fallible_calls: 0,
        }
    }

    /// Create an emulated target with default configuration (SWM050)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create an emulated target with pre-programmed flash contents
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut target = Self::new(config);
        let len = initial_data.len().min(target.flash.len());
        target.flash[..len].copy_from_slice(&initial_data[..len]);
        target
    }

    /// Emulated flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Mutable emulated flash contents
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    /// The configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// All accesses journaled so far
    pub fn journal(&self) -> &[Op] {
        &self.journal
    }

    /// Forget the journal, e.g. after a probe whose traffic is not
    /// under test
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Make every fallible access after the first `n` fail with a
    /// transport error
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
        self.fallible_calls = 0;
    }

    fn check_transport(&mut self) -> Result<()> {
        if let Some(limit) = self.fail_after {
            if self.fallible_calls >= limit {
                return Err(Error::Transport);
            }
        }
        self.fallible_calls += 1;
        Ok(())
    }

    fn flash_range(&self, addr: u32, len: usize) -> Option<core::ops::Range<usize>> {
        let start = addr as usize;
        let end = start.checked_add(len)?;
        (end <= self.flash.len()).then(|| start..end)
    }

    fn erase_page(&mut self, addr: u32) {
        let page = addr as usize / self.config.page_size * self.config.page_size;
        if let Some(range) = self.flash_range(page as u32, self.config.page_size) {
            log::trace!("dummy: page erase at 0x{:08X}", page);
            self.flash[range].fill(ERASED);
        }
    }

    fn program(&mut self, addr: u32, data: &[u8]) {
        if let Some(range) = self.flash_range(addr, data.len()) {
            // Flash programming can only clear bits
            for (cell, byte) in self.flash[range].iter_mut().zip(data) {
                *cell &= byte;
            }
        }
    }
}

impl MemoryAccess for DummyTarget {
    fn read32(&mut self, addr: u32) -> Result<u32> {
        self.check_transport()?;
        self.journal.push(Op::Read32 { addr });

        let value = match addr {
            CPUID => self.config.idcode,
            FLASH_CMD => self.mode,
            FLASH_CFG => self.chip_erase_armed as u32,
            SYS_CFG_0 | SYS_DBLF => 0,
            _ => match self.flash_range(addr, 4) {
                Some(range) => {
                    let mut word = [0u8; 4];
                    word.copy_from_slice(&self.flash[range]);
                    u32::from_le_bytes(word)
                }
                None => 0,
            },
        };
        Ok(value)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.check_transport()?;
        self.journal.push(Op::Write32 { addr, value });

        match addr {
            FLASH_CMD => {
                log::trace!("dummy: flash controller mode {} -> {}", self.mode, value);
                self.mode = value;
            }
            FLASH_CFG => self.chip_erase_armed = value == 1,
            SYS_CFG_0 | SYS_DBLF => {}
            _ => match self.mode {
                MODE_PAGE_ERASE if value == FLASH_KEY => self.erase_page(addr),
                MODE_CHIP_ERASE if value == FLASH_KEY && self.chip_erase_armed && addr == 0 => {
                    log::trace!("dummy: chip erase");
                    self.flash.fill(ERASED);
                }
                MODE_WRITE => self.program(addr, &value.to_le_bytes()),
                // Writes to an idle controller land nowhere
                _ => {}
            },
        }
        Ok(())
    }

    fn read_bytes(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_transport()?;
        self.journal.push(Op::ReadBytes { addr, len: buf.len() });

        match self.flash_range(addr, buf.len()) {
            Some(range) => buf.copy_from_slice(&self.flash[range]),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_transport()?;
        self.journal.push(Op::WriteBytes { addr, data: data.to_vec() });

        if self.mode == MODE_WRITE {
            self.program(addr, data);
        }
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.journal.push(Op::Delay { ms });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpuid_reads_configured_idcode() {
        let mut dummy = DummyTarget::new(DummyConfig {
            idcode: 0x1234_5678,
            ..DummyConfig::default()
        });
        assert_eq!(dummy.read32(CPUID).unwrap(), 0x1234_5678);
    }

    #[test]
    fn page_erase_requires_erase_mode_and_key() {
        let mut dummy = DummyTarget::new_default();
        dummy.flash_mut()[..4].copy_from_slice(&[0, 0, 0, 0]);

        // Key write while idle does nothing
        dummy.write32(0x0, FLASH_KEY).unwrap();
        assert_eq!(&dummy.flash()[..4], &[0, 0, 0, 0]);

        dummy.write32(FLASH_CMD, MODE_PAGE_ERASE).unwrap();
        dummy.write32(0x10, FLASH_KEY).unwrap();
        assert_eq!(&dummy.flash()[..4], &[ERASED; 4]);
    }

    #[test]
    fn chip_erase_requires_confirmation() {
        let mut dummy = DummyTarget::new_default();
        dummy.flash_mut().fill(0);

        dummy.write32(FLASH_CMD, MODE_CHIP_ERASE).unwrap();
        dummy.write32(0x0, FLASH_KEY).unwrap();
        assert!(dummy.flash().iter().all(|b| *b == 0));

        dummy.write32(FLASH_CFG, 1).unwrap();
        dummy.write32(0x0, FLASH_KEY).unwrap();
        assert!(dummy.flash().iter().all(|b| *b == ERASED));
    }

    #[test]
    fn bulk_write_programs_only_in_write_mode() {
        let mut dummy = DummyTarget::new_default();

        dummy.write_bytes(0x100, &[0x12, 0x34]).unwrap();
        assert_eq!(&dummy.flash()[0x100..0x102], &[ERASED; 2]);

        dummy.write32(FLASH_CMD, MODE_WRITE).unwrap();
        dummy.write_bytes(0x100, &[0x12, 0x34]).unwrap();
        assert_eq!(&dummy.flash()[0x100..0x102], &[0x12, 0x34]);
    }

    #[test]
    fn programming_clears_bits_only() {
        let mut dummy = DummyTarget::new_default();
        dummy.write32(FLASH_CMD, MODE_WRITE).unwrap();
        dummy.write_bytes(0x0, &[0x0F]).unwrap();
        dummy.write_bytes(0x0, &[0xF1]).unwrap();
        assert_eq!(dummy.flash()[0], 0x01);
    }

    #[test]
    fn fault_injection_counts_fallible_accesses() {
        let mut dummy = DummyTarget::new_default();
        dummy.fail_after(2);

        assert!(dummy.write32(SYS_CFG_0, 1).is_ok());
        assert!(dummy.read32(CPUID).is_ok());
        assert_eq!(dummy.write32(SYS_DBLF, 0), Err(Error::Transport));
        // Delays are not transport traffic and never fail
        dummy.delay_ms(1);
        assert_eq!(dummy.journal().len(), 3);
    }
}
