//! Driver monitor command dispatch

use super::BoxedTarget;
use rprobe_core::Error;

/// Run the named monitor command, or list them when no name is given
pub fn run_monitor(
    target: &mut BoxedTarget,
    name: Option<&str>,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(name) = name else {
        list_commands(target);
        return Ok(());
    };

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut out = String::new();

    match target.command(name, &args, &mut out) {
        Ok(()) => {
            print!("{}", out);
            Ok(())
        }
        Err(Error::UnknownCommand) => {
            eprintln!("Unknown monitor command '{}'", name);
            list_commands(target);
            Err(Box::new(Error::UnknownCommand))
        }
        Err(e) => Err(Box::new(e)),
    }
}

fn list_commands(target: &BoxedTarget) {
    println!("Available monitor commands:");
    for (tag, cmd) in target.commands() {
        println!("  {:12} {} [{}]", cmd.name, cmd.help, tag);
    }
}
