//! CLI subcommand implementations.

pub mod account;
pub mod history;
pub mod opportunities;
pub mod parties;
pub mod tasks;

use anyhow::{bail, Result};
use chrono::NaiveDate;

/// Parses a `YYYY-MM-DD` command-line date.
pub(crate) fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => bail!("invalid date '{}': expected YYYY-MM-DD", value),
    }
}
