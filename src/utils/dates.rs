//! Publication date filters.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Error for a date string none of the accepted layouts match
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized date '{0}'")]
pub struct DateParseError(pub String);

/// Parse a user supplied date.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM` and `YYYY`. Values without an
/// offset are taken as UTC; date-only values mean midnight.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            } else {
                None
            }
        })
        .ok_or_else(|| DateParseError(s.to_string()))?;

    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DateParseError(s.to_string()))
}

/// Inclusive publication date range; open ends match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a range from optional bounds
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, DateParseError> {
        Ok(Self {
            from: from.map(parse_date).transpose()?,
            to: to.map(parse_date).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a publication date lies in the range. An unknown date only
    /// matches an unbounded range.
    pub fn contains(&self, date: Option<DateTime<Utc>>) -> bool {
        let Some(date) = date else {
            return self.is_unbounded();
        };
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}
