//! strptime-style format matching.
//!
//! Supported directives: `%d %m %Y %y %H %I %M %S %f %p %B %b %A %a %x %X
//! %%`. A space in the format matches one or more whitespace characters and
//! literals compare case-insensitively. Numeric directives read one or two
//! digits and the matcher backtracks over the width, so `%d%m` accepts
//! "0102" as well as "1.2" style input once the dots are literals. The whole
//! input must be consumed.

use chrono::{NaiveDate, NaiveTime};

use crate::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Literal(char),
    Space,
    Directive(char),
}

/// Value slots a directive writes to.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Year,
    ShortYear,
    Month,
    Day,
    Hour,
    Hour12,
    Minute,
    Second,
    Fraction,
}

/// Values read so far. A slot that is already filled keeps its first value.
#[derive(Debug, Clone, Copy, Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    hour12: Option<u32>,
    pm: Option<bool>,
    minute: Option<u32>,
    second: Option<u32>,
    micro: Option<u32>,
}

impl Fields {
    #[allow(clippy::cast_possible_wrap)]
    fn set(mut self, slot: Slot, value: u32, width: usize) -> Self {
        fn keep_first<T>(field: &mut Option<T>, value: T) {
            if field.is_none() {
                *field = Some(value);
            }
        }

        match slot {
            Slot::Year => keep_first(&mut self.year, value as i32),
            Slot::ShortYear => {
                let century = if value >= 69 { 1900 } else { 2000 };
                keep_first(&mut self.year, century + value as i32);
            }
            Slot::Month => keep_first(&mut self.month, value),
            Slot::Day => keep_first(&mut self.day, value),
            Slot::Hour => keep_first(&mut self.hour, value),
            Slot::Hour12 => keep_first(&mut self.hour12, value),
            Slot::Minute => keep_first(&mut self.minute, value),
            Slot::Second => keep_first(&mut self.second, value),
            Slot::Fraction => {
                // "5" means 500000 microseconds.
                let scale = 10u32.pow(u32::try_from(6 - width.min(6)).unwrap_or(0));
                keep_first(&mut self.micro, value * scale);
            }
        }
        self
    }

    /// Defaults missing values to 1900-01-01 00:00:00.
    fn finish(self) -> Option<(NaiveDate, NaiveTime)> {
        let date = NaiveDate::from_ymd_opt(
            self.year.unwrap_or(1900),
            self.month.unwrap_or(1),
            self.day.unwrap_or(1),
        )?;

        let hour = match (self.hour, self.hour12) {
            (Some(hour), _) => hour,
            (None, Some(hour)) => hour % 12 + if self.pm == Some(true) { 12 } else { 0 },
            (None, None) => 0,
        };
        let time = NaiveTime::from_hms_micro_opt(
            hour,
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            self.micro.unwrap_or(0),
        )?;

        Some((date, time))
    }
}

/// Split a format into pieces, expanding `%x` and `%X` through the locale.
///
/// Returns `None` for a dangling `%` or a directive outside the supported set.
fn compile(format: &str, locale: &Locale) -> Option<Vec<Piece>> {
    let mut pieces = Vec::new();
    compile_into(format, locale, true, &mut pieces)?;
    Some(pieces)
}

fn compile_into(format: &str, locale: &Locale, expand: bool, pieces: &mut Vec<Piece>) -> Option<()> {
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch == '%' {
            match chars.next()? {
                '%' => pieces.push(Piece::Literal('%')),
                'x' if expand => compile_into(&locale.date_format, locale, false, pieces)?,
                'X' if expand => compile_into(&locale.time_format, locale, false, pieces)?,
                d @ ('d' | 'm' | 'Y' | 'y' | 'H' | 'I' | 'M' | 'S' | 'f' | 'p' | 'B' | 'b' | 'A' | 'a') => {
                    pieces.push(Piece::Directive(d));
                }
                _ => return None,
            }
        } else if ch.is_whitespace() {
            if pieces.last() != Some(&Piece::Space) {
                pieces.push(Piece::Space);
            }
        } else {
            pieces.push(Piece::Literal(ch));
        }
    }
    Some(())
}

fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

struct Matcher<'a> {
    pieces: &'a [Piece],
    input: &'a [char],
    locale: &'a Locale,
}

impl Matcher<'_> {
    fn run(&self, piece: usize, pos: usize, fields: Fields) -> Option<Fields> {
        let Some(&current) = self.pieces.get(piece) else {
            return (pos == self.input.len()).then_some(fields);
        };

        match current {
            Piece::Space => {
                let run = self.input[pos..].iter().take_while(|c| c.is_whitespace()).count();
                if run == 0 {
                    None
                } else {
                    self.run(piece + 1, pos + run, fields)
                }
            }
            Piece::Literal(expected) => {
                let &found = self.input.get(pos)?;
                if same_letter(found, expected) {
                    self.run(piece + 1, pos + 1, fields)
                } else {
                    None
                }
            }
            Piece::Directive(directive) => self.directive(directive, piece, pos, fields),
        }
    }

    fn directive(&self, directive: char, piece: usize, pos: usize, fields: Fields) -> Option<Fields> {
        let locale = self.locale;
        match directive {
            'd' => self.number(piece, pos, fields, Slot::Day, (1, 2), (1, 31)),
            'm' => self.number(piece, pos, fields, Slot::Month, (1, 2), (1, 12)),
            'Y' => self.number(piece, pos, fields, Slot::Year, (4, 4), (1, 9999)),
            'y' => self.number(piece, pos, fields, Slot::ShortYear, (2, 2), (0, 99)),
            'H' => self.number(piece, pos, fields, Slot::Hour, (1, 2), (0, 23)),
            'I' => self.number(piece, pos, fields, Slot::Hour12, (1, 2), (1, 12)),
            'M' => self.number(piece, pos, fields, Slot::Minute, (1, 2), (0, 59)),
            'S' => self.number(piece, pos, fields, Slot::Second, (1, 2), (0, 59)),
            'f' => self.number(piece, pos, fields, Slot::Fraction, (1, 6), (0, 999_999)),
            'B' => self.name(piece, pos, fields, &locale.months, |f, i| f.set(Slot::Month, i + 1, 0)),
            'b' => self.name(piece, pos, fields, &locale.months_abbr, |f, i| f.set(Slot::Month, i + 1, 0)),
            'A' => self.name(piece, pos, fields, &locale.weekdays, |f, _| f),
            'a' => self.name(piece, pos, fields, &locale.weekdays_abbr, |f, _| f),
            'p' => self.name(piece, pos, fields, &locale.meridiem, |mut f, i| {
                if f.pm.is_none() {
                    f.pm = Some(i == 1);
                }
                f
            }),
            _ => None,
        }
    }

    /// Read `min..=max` digits, widest first, and continue with each width
    /// whose value lies in `range`.
    fn number(
        &self,
        piece: usize,
        pos: usize,
        fields: Fields,
        slot: Slot,
        (min, max): (usize, usize),
        (low, high): (u32, u32),
    ) -> Option<Fields> {
        let digits = self.input[pos..].iter().take(max).take_while(|c| c.is_ascii_digit()).count();

        for width in (min..=digits).rev() {
            let value = self.input[pos..pos + width]
                .iter()
                .fold(0u32, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0));
            if (low..=high).contains(&value) {
                if let Some(done) = self.run(piece + 1, pos + width, fields.set(slot, value, width)) {
                    return Some(done);
                }
            }
        }
        None
    }

    fn name(
        &self,
        piece: usize,
        pos: usize,
        fields: Fields,
        names: &[String],
        apply: impl Fn(Fields, u32) -> Fields,
    ) -> Option<Fields> {
        let rest = &self.input[pos..];
        for (index, name) in (0u32..).zip(names) {
            let len = name.chars().count();
            if len == 0 || len > rest.len() {
                continue;
            }
            if name.chars().zip(rest).all(|(expected, &found)| same_letter(found, expected)) {
                if let Some(done) = self.run(piece + 1, pos + len, apply(fields, index)) {
                    return Some(done);
                }
            }
        }
        None
    }
}

/// Parse `input` against `format`.
///
/// Every field the format does not mention takes its 1900-01-01 00:00:00
/// default; callers decide from the format which half of the result is
/// meaningful.
#[must_use]
pub fn parse(input: &str, format: &str, locale: &Locale) -> Option<(NaiveDate, NaiveTime)> {
    let pieces = compile(format, locale)?;
    let input: Vec<char> = input.chars().collect();
    let matcher = Matcher {
        pieces: &pieces,
        input: &input,
        locale,
    };
    matcher.run(0, 0, Fields::default())?.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn czech(input: &str, format: &str) -> Option<(NaiveDate, NaiveTime)> {
        parse(input, format, &Locale::czech())
    }

    #[test]
    fn test_numeric_date_and_time() {
        assert_eq!(czech("01.02.2023 18:30", "%d.%m.%Y %H:%M"), Some((date(2023, 2, 1), time(18, 30, 0))));
        assert_eq!(czech("1.2.2023", "%d.%m.%Y"), Some((date(2023, 2, 1), time(0, 0, 0))));
    }

    #[test]
    fn test_missing_fields_default_to_1900() {
        assert_eq!(czech("18:30", "%H:%M"), Some((date(1900, 1, 1), time(18, 30, 0))));
    }

    #[test]
    fn test_backtracks_over_digit_width() {
        assert_eq!(czech("0102", "%d%m").map(|(d, _)| d), Some(date(1900, 2, 1)));
        // "93" is no hour, so %H falls back to one digit.
        assert_eq!(czech("930", "%H%M").map(|(_, t)| t), Some(time(9, 30, 0)));
    }

    #[test]
    fn test_month_names_case_insensitive() {
        assert_eq!(czech("1. ledna 2023", "%d. %B %Y").map(|(d, _)| d), Some(date(2023, 1, 1)));
        assert_eq!(czech("24. Prosince 2023", "%d. %B %Y").map(|(d, _)| d), Some(date(2023, 12, 24)));
        assert_eq!(czech("3. čvc 2024", "%d. %b %Y").map(|(d, _)| d), Some(date(2024, 7, 3)));
    }

    #[test]
    fn test_weekday_is_read_and_ignored() {
        assert_eq!(
            czech("sobota 4.3.2023", "%A %d.%m.%Y").map(|(d, _)| d),
            Some(date(2023, 3, 4))
        );
        assert_eq!(czech("út 7.3.2023", "%a %d.%m.%Y").map(|(d, _)| d), Some(date(2023, 3, 7)));
    }

    #[test]
    fn test_space_matches_whitespace_run() {
        assert_eq!(czech("1.2.2023   9:05", "%d.%m.%Y %H:%M"), Some((date(2023, 2, 1), time(9, 5, 0))));
        assert_eq!(czech("1.2.20239:05", "%d.%m.%Y %H:%M"), None);
    }

    #[test]
    fn test_twelve_hour_clock() {
        let english = Locale::english();
        assert_eq!(parse("7:15 PM", "%I:%M %p", &english).map(|(_, t)| t), Some(time(19, 15, 0)));
        assert_eq!(parse("12:00 am", "%I:%M %p", &english).map(|(_, t)| t), Some(time(0, 0, 0)));
        assert_eq!(parse("12:00 PM", "%I:%M %p", &english).map(|(_, t)| t), Some(time(12, 0, 0)));
    }

    #[test]
    fn test_short_year_pivot() {
        assert_eq!(czech("1.2.23", "%d.%m.%y").map(|(d, _)| d), Some(date(2023, 2, 1)));
        assert_eq!(czech("1.2.99", "%d.%m.%y").map(|(d, _)| d), Some(date(1999, 2, 1)));
    }

    #[test]
    fn test_locale_shortcuts() {
        assert_eq!(czech("05.06.2023", "%x").map(|(d, _)| d), Some(date(2023, 6, 5)));
        assert_eq!(czech("20:15:30", "%X").map(|(_, t)| t), Some(time(20, 15, 30)));
    }

    #[test]
    fn test_fraction_and_percent() {
        let parsed = czech("10:00:00.5 100%", "%H:%M:%S.%f 100%%").map(|(_, t)| t);
        assert_eq!(parsed, NaiveTime::from_hms_micro_opt(10, 0, 0, 500_000));
    }

    #[test]
    fn test_repeated_directive_keeps_first_value() {
        assert_eq!(czech("18:00-20:00", "%H:%M-%H:%M").map(|(_, t)| t), Some(time(18, 0, 0)));
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(czech("31.02.2023", "%d.%m.%Y"), None);
        assert_eq!(czech("1.13.2023", "%d.%m.%Y"), None);
        assert_eq!(czech("25:00", "%H:%M"), None);
        assert_eq!(czech("1.2.2023 extra", "%d.%m.%Y"), None);
        assert_eq!(czech("1.2.2023", "%d.%m.%Y %H:%M"), None);
    }

    #[test]
    fn test_unsupported_directive_never_matches() {
        assert_eq!(czech("anything", "%c"), None);
        assert_eq!(czech("1.2.2023", "%d.%m.%Y %"), None);
    }
}
