use serde::{Deserialize, Serialize};

pub const MARK_MIN: i64 = 0;
pub const MARK_MAX: i64 = 100;
pub const PASS_MARK: i64 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "Pass",
            Status::Fail => "Fail",
        }
    }

    /// Row styling hook for the results table.
    pub fn css_class(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remark {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Fail,
}

/// Lower bounds (inclusive), checked top-down. Anything below the last tier is `Fail`.
const REMARK_TIERS: [(f64, Remark); 4] = [
    (85.0, Remark::Excellent),
    (70.0, Remark::VeryGood),
    (50.0, Remark::Good),
    (35.0, Remark::NeedsImprovement),
];

impl Remark {
    /// NaN never satisfies a tier and falls through to `Fail`.
    pub fn from_percentage(percentage: f64) -> Self {
        for (min, remark) in REMARK_TIERS {
            if percentage >= min {
                return remark;
            }
        }
        Remark::Fail
    }

    pub fn label(self) -> &'static str {
        match self {
            Remark::Excellent => "Excellent",
            Remark::VeryGood => "Very Good",
            Remark::Good => "Good",
            Remark::NeedsImprovement => "Needs Improvement",
            Remark::Fail => "Fail",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Remark::Excellent => "🎉",
            Remark::VeryGood => "✅",
            Remark::Good => "👍",
            Remark::NeedsImprovement => "⚠️",
            Remark::Fail => "❌",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub total: i64,
    pub percentage: f64,
    pub status: Status,
    pub remark: Remark,
}

pub fn total(marks: &[i64]) -> i64 {
    marks.iter().sum()
}

/// `total / (count * 100) * 100`. Zero subjects yields NaN; callers guard that case.
pub fn percentage(total: i64, count: usize) -> f64 {
    (total as f64 / (count as f64 * 100.0)) * 100.0
}

pub fn status(marks: &[i64]) -> Status {
    if marks.iter().all(|m| *m >= PASS_MARK) {
        Status::Pass
    } else {
        Status::Fail
    }
}

pub fn derive(marks: &[i64]) -> Derived {
    let total = total(marks);
    let percentage = percentage(total, marks.len());
    Derived {
        total,
        percentage,
        status: status(marks),
        remark: Remark::from_percentage(percentage),
    }
}

pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

/// Integer-prefix parse used by the marks form: leading whitespace is skipped,
/// an optional sign is honoured, and the leading run of decimal digits is taken.
/// `"85.5"` reads as 85, `"7kg"` as 7; an empty or non-numeric prefix is `None`.
pub fn parse_mark(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    // Overlong digit runs are out of range either way.
    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

pub fn in_range(mark: i64) -> bool {
    (MARK_MIN..=MARK_MAX).contains(&mark)
}

/// Parses every raw field. Either all are valid marks, or the indices of the
/// failing fields are returned.
pub fn validate_marks(raw: &[String]) -> Result<Vec<i64>, Vec<usize>> {
    let mut marks = Vec::with_capacity(raw.len());
    let mut invalid = Vec::new();
    for (i, field) in raw.iter().enumerate() {
        match parse_mark(field) {
            Some(v) if in_range(v) => marks.push(v),
            _ => invalid.push(i),
        }
    }
    if invalid.is_empty() {
        Ok(marks)
    } else {
        Err(invalid)
    }
}
