//! Time formatting into the clock's fixed character alphabet.

use std::fmt::{self, Write};

use chrono::{NaiveDateTime, Timelike};

/// Characters that can appear in a [`FormattedTime`].
pub const ALPHABET: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', '.', ' '];

/// Largest supported number of fractional-second digits.
pub const MAX_SUBSECONDS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatOptions {
    /// 12-hour clock (01-12) instead of 24-hour (00-23).
    pub halfday: bool,
    /// Number of fractional-second digits, `0..=6`.
    pub subseconds: u8,
    /// Keep a leading zero in the hour instead of blanking it.
    pub zero_padded: bool,
}

impl FormatOptions {
    /// Number of character cells a formatted time occupies.
    pub fn cell_count(&self) -> usize {
        let fraction = match self.subseconds.min(MAX_SUBSECONDS) {
            0 => 0,
            n => 1 + n as usize,
        };
        8 + fraction
    }
}

/// A freshly formatted time; only ever contains characters from [`ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedTime(String);

impl FormattedTime {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn chars(&self) -> std::str::Chars<'_> {
        self.0.chars()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FormattedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats `time` as `HH:MM:SS[.f…]`.
///
/// Fractional digits are truncated, never rounded. Without zero padding a
/// leading `0` is replaced by a blank so the cell count stays the same.
pub fn format_time(time: &NaiveDateTime, options: &FormatOptions) -> FormattedTime {
    let hour = if options.halfday {
        time.hour12().1
    } else {
        time.hour()
    };

    let mut text = String::with_capacity(options.cell_count());
    // Writing into a String cannot fail.
    let _ = write!(text, "{:02}:{:02}:{:02}", hour, time.minute(), time.second());

    let subseconds = options.subseconds.min(MAX_SUBSECONDS) as usize;
    if subseconds > 0 {
        // Leap seconds report nanoseconds >= 1e9; keep the field at nine digits.
        let nanos = time.nanosecond().min(999_999_999);
        let digits = format!("{nanos:09}");
        text.push('.');
        text.push_str(&digits[..subseconds]);
    }

    if !options.zero_padded && text.starts_with('0') {
        text.replace_range(0..1, " ");
    }

    FormattedTime(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn time(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn truncates_fraction() {
        let options = FormatOptions {
            halfday: false,
            subseconds: 2,
            zero_padded: true,
        };
        let text = format_time(&time(9, 5, 3, 123_456), &options);
        assert_eq!(text.as_str(), "09:05:03.12");

        let nines = format_time(&time(9, 5, 3, 999_999), &options);
        assert_eq!(nines.as_str(), "09:05:03.99");
    }

    #[test]
    fn blanks_leading_zero_without_padding() {
        let options = FormatOptions {
            halfday: false,
            subseconds: 0,
            zero_padded: false,
        };
        let text = format_time(&time(9, 0, 0, 0), &options);
        assert_eq!(text.as_str(), " 9:00:00");
        assert_eq!(text.len(), options.cell_count());

        let afternoon = format_time(&time(19, 0, 0, 0), &options);
        assert_eq!(afternoon.as_str(), "19:00:00");
    }

    #[test]
    fn halfday_uses_twelve_hour_clock() {
        let options = FormatOptions {
            halfday: true,
            subseconds: 0,
            zero_padded: true,
        };
        assert_eq!(format_time(&time(0, 15, 0, 0), &options).as_str(), "12:15:00");
        assert_eq!(format_time(&time(12, 59, 57, 0), &options).as_str(), "12:59:57");
        assert_eq!(format_time(&time(13, 0, 0, 0), &options).as_str(), "01:00:00");
    }

    #[test]
    fn six_subsecond_digits() {
        let options = FormatOptions {
            halfday: false,
            subseconds: 6,
            zero_padded: true,
        };
        assert_eq!(
            format_time(&time(23, 59, 59, 654_321), &options).as_str(),
            "23:59:59.654321"
        );
    }

    proptest! {
        #[test]
        fn output_stays_in_alphabet(
            secs in 0u32..86_400,
            nanos in 0u32..1_000_000_000,
            subseconds in 0u8..=6,
            halfday in any::<bool>(),
            zero_padded in any::<bool>(),
        ) {
            let t = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_nano_opt(secs / 3600, (secs / 60) % 60, secs % 60, nanos)
                .unwrap();
            let options = FormatOptions { halfday, subseconds, zero_padded };
            let text = format_time(&t, &options);
            prop_assert_eq!(text.len(), options.cell_count());
            prop_assert!(text.chars().all(|c| ALPHABET.contains(&c)));
        }
    }
}
