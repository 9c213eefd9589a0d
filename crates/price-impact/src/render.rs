//! Terminal and JSON output of calculation results.

use {
    crate::calculator::PriceImpactResult,
    std::fmt::{self, Write as _},
};

/// Output format of the results.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    Table,
    Json,
}

/// Severity band of a price impact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::EnumIter)]
pub enum Band {
    Favorable,
    Negligible,
    Minor,
    Major,
    Severe,
}

impl Band {
    pub fn classify(impact: f64) -> Self {
        if impact < 0. {
            Self::Favorable
        } else if impact < 0.1 {
            Self::Negligible
        } else if impact < 1. {
            Self::Minor
        } else if impact < 3. {
            Self::Major
        } else {
            Self::Severe
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Favorable => "negative means a favorable price",
            Self::Negligible => "very small impact, suitable for trading",
            Self::Minor => "slight impact, acceptable",
            Self::Major => "large impact, trade with care",
            Self::Severe => "significant impact, not recommended",
        }
    }

    fn range(&self) -> &'static str {
        match self {
            Self::Favorable => "< 0%",
            Self::Negligible => "0% - 0.1%",
            Self::Minor => "0.1% - 1%",
            Self::Major => "1% - 3%",
            Self::Severe => ">= 3%",
        }
    }

    fn ansi(&self) -> &'static str {
        match self {
            Self::Favorable => "\x1b[1;32m",
            Self::Negligible => "\x1b[32m",
            Self::Minor => "\x1b[33m",
            Self::Major => "\x1b[38;5;208m",
            Self::Severe => "\x1b[31m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// `+1.23%` for positive impacts, `-0.20%` and `0.00%` otherwise.
pub fn format_impact(impact: f64) -> String {
    if impact > 0. {
        format!("+{impact:.2}%")
    } else {
        format!("{impact:.2}%")
    }
}

pub fn json(results: &[PriceImpactResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

/// Renders the ranked results followed by a legend of the impact bands.
pub fn table(results: &[PriceImpactResult], amount: f64, color: bool) -> String {
    let mut out = String::new();
    write_table(&mut out, results, amount, color).expect("writing to a String never fails");
    out
}

fn write_table(
    out: &mut String,
    results: &[PriceImpactResult],
    amount: f64,
    color: bool,
) -> fmt::Result {
    let paint = |band: Band, text: &str| {
        if color {
            format!("{}{text}{RESET}", band.ansi())
        } else {
            text.to_owned()
        }
    };

    writeln!(out, "Price impact for a notional amount of {amount}")?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<4} {:<14} {:>12} {:>20} {:>12}  {}",
        "#", "Pair", "Impact", "Price", "Est. Gas", "Band"
    )?;
    for (rank, result) in results.iter().enumerate() {
        let band = Band::classify(result.price_impact);
        // Pad before painting so escape codes don't break the alignment.
        let impact = format!("{:>12}", format_impact(result.price_impact));
        writeln!(
            out,
            "{:<4} {:<14} {} {:>20.8} {:>12}  {}",
            format!("#{}", rank + 1),
            result.pair.to_string(),
            paint(band, &impact),
            result.price,
            result.estimated_gas.as_deref().unwrap_or("N/A"),
            paint(band, &band.to_string()),
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Legend:")?;
    for band in <Band as strum::IntoEnumIterator>::iter() {
        writeln!(
            out,
            "  {} {:<10} {}",
            paint(band, &format!("{:<12}", band.range())),
            band.to_string(),
            band.description(),
        )?;
    }
    Ok(())
}
