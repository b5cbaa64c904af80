use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode};
use structopt::StructOpt;
use voxel_bench::{config::Opt, workflow::run, Error};

fn main() -> Result<(), Error> {
    let opt = Opt::from_args();
    let level = if opt.debug { LevelFilter::Debug } else { LevelFilter::Info };
    // only fails when a logger is already installed
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr);
    run(&opt)?;
    Ok(())
}
