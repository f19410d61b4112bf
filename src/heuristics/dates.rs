use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MONTH_PATTERN: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("Invalid regex"));

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("Invalid regex"));

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH_PATTERN}\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH_PATTERN}\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(today|tonight|tomorrow|end\s+of\s+(?:the\s+)?day|eod|end\s+of\s+(?:the\s+|this\s+)?week|this\s+week|eow|next\s+week|end\s+of\s+(?:the\s+|this\s+)?month|next\s+month)\b",
    )
    .expect("Invalid regex")
});

static IN_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bin\s+(\d{1,3}|an?|one|two|three|four|five|six|seven|eight|nine|ten)\s+(days?|weeks?)\b",
    )
    .expect("Invalid regex")
});

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(next|this|on|by|until|before)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("Invalid regex")
});

/// A recognised date phrase, not yet anchored to a calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateExpression {
    /// Explicit month and day, optionally with a year
    Calendar { year: Option<i32>, month: u32, day: u32 },
    Today,
    Tomorrow,
    /// The upcoming Friday (the reference day itself if it is a Friday)
    EndOfWeek,
    NextWeek,
    EndOfMonth,
    NextMonth,
    InDays(u64),
    /// A weekday name; `allow_today` is set for "this <weekday>"
    Weekday { weekday: Weekday, allow_today: bool },
}

impl DateExpression {
    pub fn is_absolute(&self) -> bool {
        matches!(self, DateExpression::Calendar { .. })
    }

    /// Anchor the expression to a calendar date.
    ///
    /// Missing years are taken from the reference date. Returns `None` for
    /// impossible dates such as February 30th.
    pub fn resolve(&self, reference: NaiveDate) -> Option<NaiveDate> {
        match *self {
            DateExpression::Calendar { year, month, day } => {
                NaiveDate::from_ymd_opt(year.unwrap_or(reference.year()), month, day)
            }
            DateExpression::Today => Some(reference),
            DateExpression::Tomorrow => reference.checked_add_days(Days::new(1)),
            DateExpression::EndOfWeek => {
                let ahead = days_until(reference.weekday(), Weekday::Fri);
                reference.checked_add_days(Days::new(ahead))
            }
            DateExpression::NextWeek => reference.checked_add_days(Days::new(7)),
            DateExpression::EndOfMonth => {
                NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1)?
                    .checked_add_months(Months::new(1))?
                    .pred_opt()
            }
            DateExpression::NextMonth => reference.checked_add_months(Months::new(1)),
            DateExpression::InDays(days) => reference.checked_add_days(Days::new(days)),
            DateExpression::Weekday {
                weekday,
                allow_today,
            } => {
                let mut ahead = days_until(reference.weekday(), weekday);
                if ahead == 0 && !allow_today {
                    ahead = 7;
                }
                reference.checked_add_days(Days::new(ahead))
            }
        }
    }
}

/// A date phrase located in a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    /// Byte offset of the phrase start
    pub start: usize,
    /// Byte offset one past the phrase end
    pub end: usize,
    pub expression: DateExpression,
}

/// Find every recognised date phrase, ordered by position (longest first on ties)
pub fn find_date_expressions(text: &str) -> Vec<DateMatch> {
    let mut matches = Vec::new();

    collect(&mut matches, &ISO_RE, text, |c| {
        Some(DateExpression::Calendar {
            year: Some(c[1].parse().ok()?),
            month: c[2].parse().ok()?,
            day: c[3].parse().ok()?,
        })
    });
    collect(&mut matches, &NUMERIC_RE, text, |c| {
        Some(DateExpression::Calendar {
            year: Some(c[3].parse().ok()?),
            month: c[1].parse().ok()?,
            day: c[2].parse().ok()?,
        })
    });
    collect(&mut matches, &MONTH_DAY_RE, text, |c| {
        Some(DateExpression::Calendar {
            year: c.get(3).and_then(|y| y.as_str().parse().ok()),
            month: month_number(&c[1])?,
            day: c[2].parse().ok()?,
        })
    });
    collect(&mut matches, &DAY_MONTH_RE, text, |c| {
        Some(DateExpression::Calendar {
            year: c.get(3).and_then(|y| y.as_str().parse().ok()),
            month: month_number(&c[2])?,
            day: c[1].parse().ok()?,
        })
    });
    collect(&mut matches, &RELATIVE_RE, text, |c| relative_expression(&c[1]));
    collect(&mut matches, &IN_PERIOD_RE, text, |c| {
        let count = count_value(&c[1])?;
        let unit = if c[2].to_ascii_lowercase().starts_with("week") { 7 } else { 1 };
        Some(DateExpression::InDays(count * unit))
    });
    collect(&mut matches, &WEEKDAY_RE, text, |c| {
        let allow_today = c
            .get(1)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("this"));
        Some(DateExpression::Weekday {
            weekday: weekday_from_name(&c[2])?,
            allow_today,
        })
    });

    matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    matches
}

/// The first date phrase in the text.
///
/// A weekday immediately followed by an explicit date ("Friday, Nov 3")
/// defers to the explicit date.
pub fn first_date_expression(text: &str) -> Option<DateMatch> {
    let matches = find_date_expressions(text);
    let first = matches.first()?.clone();

    if matches!(first.expression, DateExpression::Weekday { .. }) {
        let absorbed = matches.iter().find(|m| {
            m.expression.is_absolute() && m.start >= first.end && m.start <= first.end + 3
        });
        if let Some(calendar) = absorbed {
            return Some(calendar.clone());
        }
    }

    Some(first)
}

/// Resolve the first date phrase of a sentence against a reference date
pub fn resolve_deadline(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    first_date_expression(text)?.expression.resolve(reference)
}

/// Find the first explicit, fully-qualified calendar date (year required)
pub fn find_explicit_date(text: &str) -> Option<NaiveDate> {
    find_date_expressions(text)
        .into_iter()
        .filter_map(|m| match m.expression {
            DateExpression::Calendar {
                year: Some(year),
                month,
                day,
            } => NaiveDate::from_ymd_opt(year, month, day),
            _ => None,
        })
        .next()
}

fn collect<F>(matches: &mut Vec<DateMatch>, re: &Regex, text: &str, build: F)
where
    F: Fn(&Captures<'_>) -> Option<DateExpression>,
{
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(expression) = build(&caps) {
            matches.push(DateMatch {
                start: whole.start(),
                end: whole.end(),
                expression,
            });
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name.to_ascii_lowercase().as_str() {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn relative_expression(phrase: &str) -> Option<DateExpression> {
    let phrase = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let expression = match phrase.as_str() {
        "today" | "tonight" | "eod" => DateExpression::Today,
        "tomorrow" => DateExpression::Tomorrow,
        "next week" => DateExpression::NextWeek,
        "next month" => DateExpression::NextMonth,
        "this week" | "eow" => DateExpression::EndOfWeek,
        p if p.starts_with("end of") && p.ends_with("day") => DateExpression::Today,
        p if p.starts_with("end of") && p.ends_with("week") => DateExpression::EndOfWeek,
        p if p.starts_with("end of") && p.ends_with("month") => DateExpression::EndOfMonth,
        _ => return None,
    };
    Some(expression)
}

fn count_value(word: &str) -> Option<u64> {
    let value = match word.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => digits.parse().ok()?,
    };
    Some(value)
}

fn days_until(from: Weekday, to: Weekday) -> u64 {
    let from = from.num_days_from_monday() as i64;
    let to = to.num_days_from_monday() as i64;
    (to - from).rem_euclid(7) as u64
}
