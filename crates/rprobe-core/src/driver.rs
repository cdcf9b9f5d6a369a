//! Device driver trait and probe chain
//!
//! Each supported device family provides a [`Driver`] whose `probe`
//! reads the family's identification register and, on a match, installs
//! the memory map and monitor commands into the session. Candidate
//! drivers are tried in a fixed priority order by [`probe_chain`].

use crate::access::MemoryAccess;
use crate::error::Result;
use crate::target::Target;

/// A device family driver
pub trait Driver<A: MemoryAccess> {
    /// Short family name, used for logging and command namespaces
    fn name(&self) -> &'static str;

    /// Try to identify the attached device
    ///
    /// Returns `Ok(true)` and installs the session state on a match.
    /// `Ok(false)` means "not this family" and must leave the session
    /// untouched so the next candidate can try. Transport errors abort
    /// identification entirely.
    fn probe(&self, target: &mut Target<A>) -> Result<bool>;
}

/// Try each candidate driver in order until one matches
///
/// Returns `Ok(true)` as soon as a driver claims the device, `Ok(false)`
/// if none do.
pub fn probe_chain<A: MemoryAccess>(
    target: &mut Target<A>,
    drivers: &[&dyn Driver<A>],
) -> Result<bool> {
    for driver in drivers {
        log::debug!("probing for {}", driver.name());
        if driver.probe(target)? {
            log::info!(
                "matched {} (idcode 0x{:08X})",
                target.driver().unwrap_or(driver.name()),
                target.idcode()
            );
            return Ok(true);
        }
    }
    log::debug!("no driver matched");
    Ok(false)
}
