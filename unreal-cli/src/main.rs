//! ## unreal-clock
//! **Terminal front end of the unreal-time clock**
//!
//! Draws a simulated time above the real one, scaled to fill the terminal.
//! Space starts a held clock, `p` pauses, `+`/`-` or the mouse wheel change
//! the speed, Esc or `q` quits. An optional HTTP control channel accepts the
//! same commands remotely.

use clap::Parser;

mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(commands::with_demo_defaults(std::env::args_os()));
    commands::run(cli)
}
