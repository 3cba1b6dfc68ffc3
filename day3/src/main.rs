use anyhow::{Context, Result};
use clap::Parser;
use day3::{LifeSupport, PowerReading, Report};
use util::{init_logger, InputArgs};

fn main() -> Result<()> {
    init_logger();
    let args = InputArgs::parse();

    let report = Report::from_args(&args)?;

    let power = PowerReading::from_report(&report).context("Solve error")?;
    println!("Solution (1): {}", power.power_consumption());

    let life_support = LifeSupport::from_report(&report).context("Solve error")?;
    println!("Solution (2): {}", life_support.life_support_rating());

    Ok(())
}
