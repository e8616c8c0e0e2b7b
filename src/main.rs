//! wowlua - Command-line tool for building World of Warcraft add-ons

use std::process::ExitCode;

use wowlua::cli;

fn main() -> ExitCode {
    cli::run()
}
