// src/parse.rs

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Literal the device prints when a reading is not available.
pub const UNAVAILABLE: &str = "NA";

/// Which measurement a raw cell holds; decides the unit and the conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// `MHz` → integer hertz.
    Frequency,
    /// `dB`, may be unavailable.
    Snr,
    /// `dBmV`, may be unavailable.
    PowerLevel,
    /// Bare 64-bit integer, no unit.
    Count,
}

impl FieldKind {
    pub fn unit(self) -> Option<&'static str> {
        match self {
            FieldKind::Frequency => Some("MHz"),
            FieldKind::Snr => Some("dB"),
            FieldKind::PowerLevel => Some("dBmV"),
            FieldKind::Count => None,
        }
    }

    fn may_be_unavailable(self) -> bool {
        matches!(self, FieldKind::Snr | FieldKind::PowerLevel)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Outcome of a successful parse. `Unavailable` is a reading the device
/// reported as "NA", not a failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measurement {
    Value(Number),
    Unavailable,
}

/// Parse one raw cell as a measurement of the given kind.
pub fn parse_measurement(raw: &str, kind: FieldKind) -> Result<Measurement, ParseError> {
    let raw = raw.trim();
    if kind.may_be_unavailable() && raw == UNAVAILABLE {
        return Ok(Measurement::Unavailable);
    }

    let tokens: Vec<&str> = WHITESPACE.split(raw).collect();
    let number = match tokens.as_slice() {
        [value] => parse_bare(value, kind)?,
        [value, unit] => {
            if kind.unit() != Some(*unit) {
                return Err(ParseError::UnrecognizedUnit {
                    unit: unit.to_string(),
                    expected: kind.unit(),
                });
            }
            parse_with_unit(value, kind)?
        }
        _ => {
            return Err(ParseError::TokenCount {
                tokens: tokens.iter().map(|t| t.to_string()).collect(),
            })
        }
    };

    Ok(Measurement::Value(number))
}

fn parse_bare(token: &str, kind: FieldKind) -> Result<Number, ParseError> {
    match kind {
        FieldKind::Frequency | FieldKind::Count => parse_int(token).map(Number::Int),
        FieldKind::Snr | FieldKind::PowerLevel => parse_float(token).map(Number::Float),
    }
}

fn parse_with_unit(token: &str, kind: FieldKind) -> Result<Number, ParseError> {
    match kind {
        FieldKind::Frequency => mhz_to_hz(token).map(Number::Int),
        _ => parse_bare(token, kind),
    }
}

fn invalid(raw: &str) -> ParseError {
    ParseError::InvalidNumber {
        raw: raw.to_string(),
    }
}

fn parse_int(token: &str) -> Result<i64, ParseError> {
    token.parse().map_err(|_| invalid(token))
}

fn parse_float(token: &str) -> Result<f64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(token))
}

/// Decimal megahertz → hertz, truncating anything below one hertz.
/// Done on the digits so `578.3` never turns into `578299999`.
fn mhz_to_hz(token: &str) -> Result<i64, ParseError> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(invalid(token));
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid(token))?
    };
    let micro: i64 = format!("{:0<6}", &frac[..frac.len().min(6)])
        .parse()
        .map_err(|_| invalid(token))?;

    let hz = whole
        .checked_mul(1_000_000)
        .and_then(|hz| hz.checked_add(micro))
        .ok_or_else(|| invalid(token))?;
    Ok(if negative { -hz } else { hz })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(raw: &str, kind: FieldKind) -> Number {
        match parse_measurement(raw, kind) {
            Ok(Measurement::Value(n)) => n,
            other => panic!("{:?} as {:?} gave {:?}", raw, kind, other),
        }
    }

    #[test]
    fn bare_tokens_are_returned_unchanged() {
        assert_eq!(value("603000000", FieldKind::Frequency), Number::Int(603000000));
        assert_eq!(value("38.5", FieldKind::Snr), Number::Float(38.5));
        assert_eq!(value("-3.1", FieldKind::PowerLevel), Number::Float(-3.1));
        assert_eq!(value("5120", FieldKind::Count), Number::Int(5120));
    }

    #[test]
    fn units_are_converted() {
        assert_eq!(value("750 MHz", FieldKind::Frequency), Number::Int(750_000_000));
        assert_eq!(value("38.5 dB", FieldKind::Snr), Number::Float(38.5));
        assert_eq!(value("1.2 dBmV", FieldKind::PowerLevel), Number::Float(1.2));
    }

    #[test]
    fn fractional_megahertz_truncates_to_hertz() {
        assert_eq!(value("578.3 MHz", FieldKind::Frequency), Number::Int(578_300_000));
        assert_eq!(value("36.5 MHz", FieldKind::Frequency), Number::Int(36_500_000));
        assert_eq!(
            value("1.23456789 MHz", FieldKind::Frequency),
            Number::Int(1_234_567)
        );
    }

    #[test]
    fn extra_whitespace_between_tokens_is_one_separator() {
        assert_eq!(value("  603   MHz ", FieldKind::Frequency), Number::Int(603_000_000));
        assert_eq!(value("40.9\tdB", FieldKind::Snr), Number::Float(40.9));
    }

    #[test]
    fn na_is_unavailable_only_for_snr_and_power() {
        assert_eq!(
            parse_measurement("NA", FieldKind::Snr),
            Ok(Measurement::Unavailable)
        );
        assert_eq!(
            parse_measurement("NA", FieldKind::PowerLevel),
            Ok(Measurement::Unavailable)
        );
        assert_eq!(
            parse_measurement("NA", FieldKind::Frequency),
            Err(ParseError::InvalidNumber { raw: "NA".into() })
        );
        assert!(parse_measurement("NA", FieldKind::Count).is_err());
    }

    #[test]
    fn unknown_unit_is_named() {
        let err = parse_measurement("5 Hz", FieldKind::Frequency).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnrecognizedUnit {
                unit: "Hz".into(),
                expected: Some("MHz"),
            }
        );
        assert!(err.to_string().contains("Hz"));

        // counts carry no unit at all
        assert!(matches!(
            parse_measurement("12 words", FieldKind::Count),
            Err(ParseError::UnrecognizedUnit { expected: None, .. })
        ));
    }

    #[test]
    fn three_tokens_is_a_token_count_error() {
        assert_eq!(
            parse_measurement("1.2 dBmV extra", FieldKind::PowerLevel),
            Err(ParseError::TokenCount {
                tokens: vec!["1.2".into(), "dBmV".into(), "extra".into()],
            })
        );
    }

    #[test]
    fn malformed_numbers_are_hard_errors() {
        assert!(parse_measurement("", FieldKind::Count).is_err());
        assert!(parse_measurement("abc dB", FieldKind::Snr).is_err());
        assert!(parse_measurement("NaN dB", FieldKind::Snr).is_err());
        assert!(parse_measurement("1.5", FieldKind::Count).is_err());
        assert!(parse_measurement("6.0.3 MHz", FieldKind::Frequency).is_err());
        assert!(parse_measurement("na", FieldKind::Snr).is_err());
        assert!(parse_measurement("99999999999999 MHz", FieldKind::Frequency).is_err());
    }
}
