//! Named monitor commands
//!
//! Drivers can expose device-specific maintenance operations (mass
//! erase, diagnostics) as named commands. Tables are registered on the
//! [`Target`](crate::target::Target) at probe time and dispatched by
//! name from an interactive console or CLI; output goes to a
//! caller-supplied sink so it can be captured as easily as printed.

use alloc::vec::Vec;
use core::fmt;

use crate::access::MemoryAccess;
use crate::error::Result;
use crate::target::Target;

/// Handler signature for a monitor command
///
/// Handlers get the full session so they can sequence controller
/// registers through the transport, plus any arguments after the
/// command name and a sink for human-readable output.
pub type CommandHandler<A> = fn(&mut Target<A>, &[&str], &mut dyn fmt::Write) -> Result<()>;

/// One named monitor command
pub struct Command<A: MemoryAccess> {
    /// Name the command is dispatched by
    pub name: &'static str,
    /// One-line description shown in command listings
    pub help: &'static str,
    /// Implementation
    pub handler: CommandHandler<A>,
}

/// A driver's set of monitor commands, registered under a namespace tag
pub struct CommandTable<A: MemoryAccess> {
    /// Namespace tag, usually the driver family name
    pub tag: &'static str,
    /// The commands themselves
    pub commands: Vec<Command<A>>,
}

impl<A: MemoryAccess> fmt::Debug for Command<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

impl<A: MemoryAccess> fmt::Debug for CommandTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("tag", &self.tag)
            .field("commands", &self.commands)
            .finish()
    }
}
