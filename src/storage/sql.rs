//! Column codecs and store-error translation shared by the repositories.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::application::AppError;

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC text so string comparison in SQL matches time order.
pub(crate) fn encode_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

pub(crate) fn decode_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(decode_ts).transpose()
}

pub(crate) fn decode_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid decimal: {}", s))
}

/// Translate `sqlx` failures into the application taxonomy: unique-constraint
/// violations become [`AppError::Duplicate`], everything else is a database
/// error carrying `message` as context.
pub(crate) trait StoreContext<T> {
    fn store_context(self, message: &'static str) -> Result<T, AppError>;
}

impl<T> StoreContext<T> for std::result::Result<T, sqlx::Error> {
    fn store_context(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|err| {
            let duplicate = err
                .as_database_error()
                .filter(|db| db.is_unique_violation())
                .map(|db| db.message().to_string());

            match duplicate {
                Some(detail) => AppError::Duplicate(detail),
                None => AppError::Database(anyhow::Error::new(err).context(message)),
            }
        })
    }
}
