use chrono::{Months, NaiveDate};
use plate_core::{ErrorInfo, PlateError};

/// Format of the `date_created` association, e.g. `10162026`.
pub const DATE_FORMAT: &str = "%m%d%Y";

/// Parses a `date_created` value.
pub fn parse_created(value: &str) -> Result<NaiveDate, PlateError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        PlateError::Serde(
            ErrorInfo::new("cal.date_created", err.to_string())
                .with_context("value", value)
                .with_hint("dates are written as MMDDYYYY"),
        )
    })
}

/// First day a plate created on `created` is no longer usable.
///
/// One calendar month later; month-end dates clamp to the end of the next
/// month.
pub fn expiry_date(created: NaiveDate) -> NaiveDate {
    created
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// Whether a plate created on `created` must be replaced by `today`.
pub fn is_expired(created: NaiveDate, today: NaiveDate) -> bool {
    today >= expiry_date(created)
}
