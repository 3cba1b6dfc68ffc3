use day3::{LifeSupport, Report};

use anyhow::Result;
use clap::Parser;
use util::{init_logger, InputArgs};

fn main() -> Result<()> {
    init_logger();
    let args = InputArgs::parse();

    let report = Report::from_args(&args)?;
    let res = LifeSupport::from_report(&report)?.life_support_rating();

    println!("{res}");

    Ok(())
}
