//! Recurrence rules and the wire-rule classifier.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PimError, PimResult};
use crate::value::Equatable;

/// Wire format of a rule's end date.
const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// The frequencies the application can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    /// Weekly with an interval of two.
    Biweekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The `FREQ`/`INTERVAL` parts of an RRULE for this frequency.
    pub fn to_ical(&self) -> &'static str {
        match self {
            Frequency::Daily => "FREQ=DAILY",
            Frequency::Weekly => "FREQ=WEEKLY",
            Frequency::Biweekly => "FREQ=WEEKLY;INTERVAL=2",
            Frequency::Monthly => "FREQ=MONTHLY",
            Frequency::Yearly => "FREQ=YEARLY",
        }
    }

    fn from_parts(freq: &str, interval: u32) -> Option<Self> {
        let frequency = match (freq.to_ascii_uppercase().as_str(), interval) {
            ("DAILY", 1) => Frequency::Daily,
            ("WEEKLY", 1) => Frequency::Weekly,
            ("WEEKLY", 2) => Frequency::Biweekly,
            ("MONTHLY", 1) => Frequency::Monthly,
            ("YEARLY", 1) => Frequency::Yearly,
            _ => return None,
        };
        Some(frequency)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RuleKind {
    Supported {
        frequency: Frequency,
        end_date: Option<DateTime<Utc>>,
    },
    /// Kept verbatim so it re-serializes exactly as received.
    Unsupported(String),
}

/// An immutable recurrence rule.
///
/// Cloning shares the same rule; rules are never edited in place, see
/// [`RecurrenceRule::with_end_date`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RecurrenceRule(Arc<RuleKind>);

impl RecurrenceRule {
    pub fn supported(frequency: Frequency, end_date: Option<DateTime<Utc>>) -> Self {
        RecurrenceRule(Arc::new(RuleKind::Supported {
            frequency,
            end_date,
        }))
    }

    pub fn unsupported(payload: impl Into<String>) -> Self {
        RecurrenceRule(Arc::new(RuleKind::Unsupported(payload.into())))
    }

    /// Classify a wire RRULE.
    ///
    /// Only `FREQ`, `INTERVAL` and `UNTIL` are understood, and only for the
    /// five editable frequencies. Anything else (`COUNT`, `BY*` parts, other
    /// intervals, sub-daily frequencies, unknown keys) yields an unsupported
    /// rule holding `payload` unchanged.
    pub fn classify(payload: &str) -> Self {
        match parse_supported(payload) {
            Some((frequency, end_date)) => RecurrenceRule::supported(frequency, end_date),
            None => {
                debug!(rule = %payload, "preserving unsupported recurrence rule");
                RecurrenceRule::unsupported(payload)
            }
        }
    }

    /// Like [`RecurrenceRule::classify`], but a blank payload means no rule.
    pub fn from_ical(payload: &str) -> Option<Self> {
        if payload.trim().is_empty() {
            None
        } else {
            Some(RecurrenceRule::classify(payload))
        }
    }

    pub fn frequency(&self) -> Option<Frequency> {
        match &*self.0 {
            RuleKind::Supported { frequency, .. } => Some(*frequency),
            RuleKind::Unsupported(_) => None,
        }
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        match &*self.0 {
            RuleKind::Supported { end_date, .. } => *end_date,
            RuleKind::Unsupported(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(&*self.0, RuleKind::Supported { .. })
    }

    /// The preserved payload of an unsupported rule.
    pub fn unsupported_rule(&self) -> Option<&str> {
        match &*self.0 {
            RuleKind::Supported { .. } => None,
            RuleKind::Unsupported(payload) => Some(payload),
        }
    }

    /// Wire form. Supported rules are emitted canonically, unsupported ones
    /// exactly as they were classified.
    pub fn to_ical(&self) -> String {
        match &*self.0 {
            RuleKind::Supported {
                frequency,
                end_date,
            } => match end_date {
                Some(end) => format!("{};UNTIL={}", frequency.to_ical(), end.format(UNTIL_FORMAT)),
                None => frequency.to_ical().to_string(),
            },
            RuleKind::Unsupported(payload) => payload.clone(),
        }
    }

    /// RRULE body suitable for an iCalendar `RRULE:` line.
    pub(crate) fn rrule_body(&self) -> String {
        let ical = self.to_ical();
        let trimmed = ical.trim();
        trimmed
            .strip_prefix("RRULE:")
            .unwrap_or(trimmed)
            .to_string()
    }

    /// A copy of this rule ending at `end_date`.
    ///
    /// Unsupported rules cannot be rewritten without losing parts we do not
    /// understand, so they are rejected.
    pub fn with_end_date(&self, end_date: Option<DateTime<Utc>>) -> PimResult<Self> {
        match &*self.0 {
            RuleKind::Supported { frequency, .. } => {
                Ok(RecurrenceRule::supported(*frequency, end_date))
            }
            RuleKind::Unsupported(payload) => Err(PimError::InvalidOperation(format!(
                "cannot change the end of unsupported rule '{payload}'"
            ))),
        }
    }

    /// Whether both handles refer to the same rule instance.
    pub fn same_rule(&self, other: &RecurrenceRule) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Equatable for RecurrenceRule {
    fn equals(&self, other: &Self) -> bool {
        self.same_rule(other) || self.0 == other.0
    }
}

impl PartialEq for RecurrenceRule {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for RecurrenceRule {}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ical())
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_ical()
    }
}

impl From<String> for RecurrenceRule {
    fn from(payload: String) -> Self {
        RecurrenceRule::classify(&payload)
    }
}

fn parse_supported(payload: &str) -> Option<(Frequency, Option<DateTime<Utc>>)> {
    let body = payload.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);

    let mut freq = None;
    let mut interval = None;
    let mut until = None;

    for part in body.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=')?;
        let slot = match key.to_ascii_uppercase().as_str() {
            "FREQ" => &mut freq,
            "INTERVAL" => &mut interval,
            "UNTIL" => &mut until,
            _ => return None,
        };
        if slot.replace(value).is_some() {
            return None;
        }
    }

    let interval = match interval {
        Some(i) => i.parse::<u32>().ok()?,
        None => 1,
    };
    let frequency = Frequency::from_parts(freq?, interval)?;
    let end_date = match until {
        Some(u) => Some(parse_until(u)?),
        None => None,
    };

    Some((frequency, end_date))
}

/// `UNTIL` as UTC. Floating values are read as UTC, bare dates as the last
/// second of that day.
fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, UNTIL_FORMAT) {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()?
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_supported_frequencies() {
        let cases = [
            ("FREQ=DAILY", Frequency::Daily),
            ("FREQ=WEEKLY", Frequency::Weekly),
            ("FREQ=WEEKLY;INTERVAL=2", Frequency::Biweekly),
            ("FREQ=MONTHLY;INTERVAL=1", Frequency::Monthly),
            ("RRULE:FREQ=YEARLY", Frequency::Yearly),
        ];

        for (payload, expected) in cases {
            let rule = RecurrenceRule::classify(payload);
            assert!(rule.is_supported(), "{payload} should be supported");
            assert_eq!(rule.frequency(), Some(expected));
        }
    }

    #[test]
    fn test_classify_parses_until() {
        let rule = RecurrenceRule::classify("FREQ=WEEKLY;UNTIL=20240401T000000Z");

        assert_eq!(
            rule.end_date(),
            Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(rule.to_ical(), "FREQ=WEEKLY;UNTIL=20240401T000000Z");
    }

    #[test]
    fn test_unsupported_payloads_are_preserved_verbatim() {
        let payloads = [
            "FREQ=WEEKLY;BYDAY=MO,WE,FR",
            "FREQ=DAILY;COUNT=10",
            "FREQ=HOURLY",
            "FREQ=MINUTELY;INTERVAL=15",
            "FREQ=MONTHLY;INTERVAL=3",
            "FREQ=DAILY;INTERVAL=2",
            "FREQ=WEEKLY;WKST=SU",
            "FREQ=WEEKLY;FREQ=DAILY",
            "INTERVAL=1",
            "FREQ=DAILY;UNTIL=someday",
            "RRULE:FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29",
        ];

        for payload in payloads {
            let rule = RecurrenceRule::classify(payload);
            assert!(!rule.is_supported(), "{payload} should be unsupported");
            assert_eq!(rule.unsupported_rule(), Some(payload));
            assert_eq!(rule.to_ical(), payload);
            assert!(rule.frequency().is_none());
        }
    }

    #[test]
    fn test_supported_rules_reclassify_as_supported() {
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        for frequency in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Biweekly,
            Frequency::Monthly,
            Frequency::Yearly,
        ] {
            for end_date in [None, Some(end)] {
                let rule = RecurrenceRule::supported(frequency, end_date);
                let again = RecurrenceRule::classify(&rule.to_ical());

                assert!(again.is_supported());
                assert_eq!(again, rule);
            }
        }
    }

    #[test]
    fn test_date_only_until_covers_the_whole_day() {
        let rule = RecurrenceRule::classify("FREQ=DAILY;UNTIL=20240301");
        assert_eq!(
            rule.end_date(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn test_clone_is_identity() {
        let rule = RecurrenceRule::supported(Frequency::Daily, None);
        let copy = rule.clone();
        let rebuilt = RecurrenceRule::supported(Frequency::Daily, None);

        assert!(rule.same_rule(&copy));
        assert!(!rule.same_rule(&rebuilt));
        assert_eq!(rule, rebuilt);
    }

    #[test]
    fn test_with_end_date_rejects_unsupported() {
        let rule = RecurrenceRule::classify("FREQ=DAILY;COUNT=3");
        assert!(matches!(
            rule.with_end_date(None),
            Err(PimError::InvalidOperation(_))
        ));

        let weekly = RecurrenceRule::supported(Frequency::Weekly, None);
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(weekly.with_end_date(Some(end)).unwrap().end_date(), Some(end));
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let rule = RecurrenceRule::classify("FREQ=DAILY;BYHOUR=9");
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, "\"FREQ=DAILY;BYHOUR=9\"");

        let back: RecurrenceRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.unsupported_rule(), Some("FREQ=DAILY;BYHOUR=9"));
    }

    #[test]
    fn test_blank_payload_is_no_rule() {
        assert!(RecurrenceRule::from_ical("  ").is_none());
        assert!(RecurrenceRule::from_ical("FREQ=DAILY").is_some());
    }
}
