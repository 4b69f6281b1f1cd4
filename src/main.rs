//! exitcd CLI - change the calling shell's directory on exit
//!
//! All CLI logic lives in the `cli` module. This file is just the entry point.

mod cli;

fn main() -> anyhow::Result<()> {
    cli::run()
}
