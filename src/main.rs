#![warn(clippy::all)]

use std::io::{self, Write as _};

use structopt::StructOpt;

use aidea::console::Console;
use aidea::{Opt, Result};

fn main() -> Result<()> {
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let mut cnsl = Console::term(opt.console_config());
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    opt.run(&mut stdout, &mut cnsl).map_err(|err| {
        stdout.flush().unwrap_or(());
        eprintln!();
        err
    })
}
