//! Probe adapter registration and dispatch
//!
//! This module provides a centralized registry for all probe adapters,
//! with support for feature-gated inclusion and dynamic help text
//! generation. An adapter is anything that can move register reads and
//! writes to an attached device; the core and the drivers only ever see
//! it as a `MemoryAccess` trait object.

use rprobe_core::MemoryAccess;
use thiserror::Error;

/// Information about a probe adapter
pub struct ProbeInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors opening a probe adapter
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The requested adapter name matched nothing in the registry
    #[error("unknown probe adapter '{name}' [available: {available}]")]
    Unknown {
        /// The requested name
        name: String,
        /// Comma-separated available adapter names
        available: String,
    },
}

/// Get information about all probe adapters enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_probes() -> Vec<ProbeInfo> {
    let mut probes = Vec::new();

    #[cfg(feature = "dummy")]
    probes.push(ProbeInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory emulated SWM050 target for testing",
    });

    probes
}

/// Comma-separated adapter names for help text
pub fn probe_names_short() -> String {
    available_probes()
        .iter()
        .map(|p| p.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Open a probe adapter by name or alias
pub fn open_probe(name: &str) -> Result<Box<dyn MemoryAccess>, ProbeError> {
    let wanted = |info: &ProbeInfo| info.name == name || info.aliases.contains(&name);

    match available_probes().iter().find(|p| wanted(p)).map(|p| p.name) {
        #[cfg(feature = "dummy")]
        Some("dummy") => {
            log::debug!("opening emulated target");
            Ok(Box::new(rprobe_dummy::DummyTarget::new_default()))
        }
        _ => Err(ProbeError::Unknown {
            name: name.to_string(),
            available: probe_names_short(),
        }),
    }
}
