//! Target session object
//!
//! A [`Target`] represents one attached device: the debug transport it
//! was reached through, the memory map a driver installed for it, and
//! the driver's monitor commands. Drivers mutate the session once, at
//! probe time; afterwards the generic flash entry points only read it.

use alloc::vec::Vec;
use core::fmt;

use crate::access::MemoryAccess;
use crate::error::{Error, Result};
use crate::flash::FlashRegion;
use crate::monitor::CommandTable;

/// One contiguous RAM window of an attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamRegion {
    /// Base address
    pub start: u32,
    /// Byte length
    pub length: u32,
}

/// Session state for one attached device
///
/// Owns the transport adapter exclusively; regions and command tables
/// are torn down with the session.
pub struct Target<A: MemoryAccess> {
    access: A,
    idcode: u32,
    driver: Option<&'static str>,
    ram: Vec<RamRegion>,
    flash: Vec<FlashRegion<A>>,
    commands: Vec<CommandTable<A>>,
}

impl<A: MemoryAccess> Target<A> {
    /// Create an unidentified session over the given transport adapter
    pub fn new(access: A) -> Self {
        Self {
            access,
            idcode: 0,
            driver: None,
            ram: Vec::new(),
            flash: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Raw transport access, for drivers sequencing controller registers
    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    /// Identification code read by the matching driver, 0 before a match
    pub fn idcode(&self) -> u32 {
        self.idcode
    }

    /// Human-readable name of the matched driver, if any
    pub fn driver(&self) -> Option<&'static str> {
        self.driver
    }

    /// Installed RAM regions
    pub fn ram_regions(&self) -> &[RamRegion] {
        &self.ram
    }

    /// Installed flash regions
    pub fn flash_regions(&self) -> &[FlashRegion<A>] {
        &self.flash
    }

    // -------------------------------------------------------------------
    // Installation interface, used by drivers during probe
    // -------------------------------------------------------------------

    /// Record the identification code that matched
    pub fn set_idcode(&mut self, idcode: u32) {
        self.idcode = idcode;
    }

    /// Record the matched driver's display name
    pub fn set_driver(&mut self, name: &'static str) {
        self.driver = Some(name);
    }

    /// Install a RAM region
    pub fn add_ram_region(&mut self, start: u32, length: u32) {
        self.ram.push(RamRegion { start, length });
    }

    /// Install a flash region
    ///
    /// Regions describe physically distinct banks and must not overlap.
    pub fn add_flash_region(&mut self, region: FlashRegion<A>) {
        debug_assert!(self
            .flash
            .iter()
            .all(|r| r.desc().end() <= region.desc().start || region.desc().end() <= r.desc().start));
        self.flash.push(region);
    }

    /// Register a table of named monitor commands
    pub fn add_commands(&mut self, table: CommandTable<A>) {
        self.commands.push(table);
    }

    // -------------------------------------------------------------------
    // Generic flash entry points
    // -------------------------------------------------------------------

    /// Erase the flash range `[addr, addr+len)`
    ///
    /// The range must lie within a single installed region and both
    /// `addr` and `len` must be multiples of that region's erase block
    /// size; violations fail fast with [`Error::InvalidRange`] before
    /// any register traffic is issued.
    pub fn flash_erase(&mut self, addr: u32, len: u32) -> Result<()> {
        if len == 0 {
            return Ok(());
        }

        let idx = self.region_index(addr)?;
        let Self { access, flash, .. } = self;
        let region = &flash[idx];
        let desc = *region.desc();

        if !desc.contains(addr, len) || addr % desc.erase_block != 0 || len % desc.erase_block != 0
        {
            return Err(Error::InvalidRange { addr, len });
        }

        log::debug!(
            "erasing 0x{:X} bytes at 0x{:08X} ({} blocks)",
            len,
            addr,
            len / desc.erase_block
        );
        region.ops().erase(access, &desc, addr, len)
    }

    /// Program `data` into flash starting at `dest`
    ///
    /// The destination range must lie within a single installed region.
    /// The source is split into chunks of at most the region's write
    /// buffer size, aligned so no chunk crosses a buffer boundary, and
    /// each chunk is issued as one buffered write.
    pub fn flash_write(&mut self, dest: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let idx = self.region_index(dest)?;
        let Self { access, flash, .. } = self;
        let region = &flash[idx];
        let desc = *region.desc();

        if !desc.contains(dest, data.len() as u32) {
            return Err(Error::InvalidRange {
                addr: dest,
                len: data.len() as u32,
            });
        }

        log::debug!("writing 0x{:X} bytes at 0x{:08X}", data.len(), dest);

        let mut dest = dest;
        let mut remaining = data;
        while !remaining.is_empty() {
            let space = desc.write_buf - dest % desc.write_buf;
            let take = remaining.len().min(space as usize);
            let (chunk, rest) = remaining.split_at(take);
            region.ops().write(access, &desc, dest, chunk)?;
            dest += take as u32;
            remaining = rest;
        }
        Ok(())
    }

    /// Bulk read from target memory
    pub fn read_mem(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.access.read_bytes(addr, buf)
    }

    fn region_index(&self, addr: u32) -> Result<usize> {
        self.flash
            .iter()
            .position(|r| r.desc().contains_addr(addr))
            .ok_or(Error::NoFlashRegion { addr })
    }

    // -------------------------------------------------------------------
    // Monitor commands
    // -------------------------------------------------------------------

    /// Run the named monitor command, writing its output to `out`
    pub fn command(&mut self, name: &str, args: &[&str], out: &mut dyn fmt::Write) -> Result<()> {
        let handler = self
            .commands
            .iter()
            .flat_map(|t| t.commands.iter())
            .find(|c| c.name == name)
            .map(|c| c.handler)
            .ok_or(Error::UnknownCommand)?;
        handler(self, args, out)
    }

    /// Iterate over all installed commands as `(table tag, command)`
    pub fn commands(
        &self,
    ) -> impl Iterator<Item = (&'static str, &crate::monitor::Command<A>)> + '_ {
        self.commands
            .iter()
            .flat_map(|t| t.commands.iter().map(move |c| (t.tag, c)))
    }
}
