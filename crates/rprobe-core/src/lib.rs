//! rprobe-core - Core library for debug-probe target flash programming
//!
//! This crate provides the target session object, the flash region
//! abstraction, and the driver probe chain used to program on-chip flash
//! through a debug transport. It is designed to be `no_std` compatible
//! (with `alloc`) for use in embedded probe firmware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CLI / probe firmware                    │
//! │  - Opens a MemoryAccess adapter (USB probe, emulator)   │
//! │  - Runs the driver probe chain against a Target          │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 rprobe-core (this crate)                 │
//! │  - Target: session with RAM/flash map + commands         │
//! │  - FlashRegion + FlashOps: bound erase/write operations  │
//! │  - Driver trait + probe_chain                            │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Device driver crates                     │
//! │  - e.g. rprobe-synwit: sequences the SWM050 flash        │
//! │    controller registers through MemoryAccess             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rprobe_core::{probe_chain, Driver, MemoryAccess, Target};
//!
//! fn attach<A: MemoryAccess>(access: A, drivers: &[&dyn Driver<A>]) {
//!     let mut target = Target::new(access);
//!     match probe_chain(&mut target, drivers) {
//!         Ok(true) => println!("Found: {}", target.driver().unwrap()),
//!         Ok(false) => println!("No known device detected"),
//!         Err(e) => println!("Probe failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod access;
pub mod driver;
pub mod error;
pub mod flash;
pub mod monitor;
pub mod target;

pub use access::MemoryAccess;
pub use driver::{probe_chain, Driver};
pub use error::{Error, Result};
pub use flash::{FlashDesc, FlashOps, FlashRegion};
pub use monitor::{Command, CommandTable};
pub use target::{RamRegion, Target};
