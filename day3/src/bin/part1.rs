use day3::{PowerReading, Report};

use anyhow::Result;
use clap::Parser;
use util::{init_logger, InputArgs};

fn main() -> Result<()> {
    init_logger();
    let args = InputArgs::parse();

    let report = Report::from_args(&args)?;
    let res = PowerReading::from_report(&report)?.power_consumption();

    println!("{res}");

    Ok(())
}
