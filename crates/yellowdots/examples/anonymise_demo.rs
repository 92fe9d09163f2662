//! Render a tile, scramble it, scan it and print the JSON summary.
//!
//! ```text
//! cargo run -p yellowdots --example anonymise_demo -- [seed]
//! ```
//!
//! Set `YELLOWDOTS_LOG=debug` to see the search.

use std::env;

use yellowdots::core::{init_from_env, Transform};
use yellowdots::patterns::PatternId;
use yellowdots::{MaskParams, ScanConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_from_env()?;
    let seed = env::args()
        .nth(1)
        .map(|s| s.parse::<u64>())
        .transpose()?
        .unwrap_or(2024);

    let tile = PatternId::Pattern2.spec().render(&[
        ("manufacturer", "Epson"),
        ("serial", "GH0815"),
        ("unknown1", "512"),
        ("year", "2014"),
        ("month", "03"),
        ("day", "30"),
        ("hour", "21"),
        ("minute", "08"),
        ("unknown2", "23"),
    ])?;
    let scanned = Transform::new(2, false, 5, 11).apply(&tile);
    println!("scanned tile:\n{scanned}");

    let mut config = ScanConfig::new(scanned);
    config.mask = Some(MaskParams {
        spoof_manufacturer: true,
        ..MaskParams::strategic(seed)
    });
    let summary = config.run()?;
    println!("{}", summary.to_json()?);
    Ok(())
}
