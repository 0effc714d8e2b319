mod cli;

use cli::{Command, CommandKind, InspectCommand};
use colored::Colorize;
use implicits::interface::{ImplicitModuleInterface, InterfaceSymbol};
use implicits::serialize::from_bytes;
use itertools::Itertools;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Ok(command) = Command::parse_env_args() else {
        return ExitCode::FAILURE;
    };

    match command.kind {
        CommandKind::Inspect(inspect) => run_inspect(inspect),
    }
}

fn run_inspect(command: InspectCommand) -> ExitCode {
    let bytes = match fs::read(&command.filename) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("{}{}: {}", "error: ".bright_red(), command.filename, error);
            return ExitCode::FAILURE;
        }
    };

    let interface: ImplicitModuleInterface = match from_bytes(&bytes) {
        Ok(interface) => interface,
        Err(error) => {
            eprintln!("{}{}: {}", "error: ".bright_red(), command.filename, error);
            return ExitCode::FAILURE;
        }
    };

    println!("module {}", interface.module.bold());

    for symbol in &interface.symbols {
        print_symbol(symbol);
    }

    if command.options.show_testable {
        for symbol in &interface.testable_symbols {
            print_symbol(symbol);
        }
    }

    for key in &interface.defined_keypath_keys {
        println!("  key \\.{}: {}", key.name, key.ty);
    }

    for module in &interface.reexported_modules {
        println!("  reexports {}", module);
    }

    ExitCode::SUCCESS
}

fn print_symbol(symbol: &InterfaceSymbol) {
    match &symbol.requirements {
        Some(requirements) if !requirements.is_empty() => {
            println!(
                "  {} requires {}",
                symbol.info.signature,
                requirements.iter().map(ToString::to_string).join(", ")
            );
        }
        Some(_) => println!("  {} requires nothing", symbol.info.signature),
        None => println!("  {}", symbol.info.signature),
    }
}
