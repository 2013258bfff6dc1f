use chrono::{DateTime, Duration, NaiveDate, Utc};

const OUT_OF_RANGE: &str = "Computed expiry is out of range";

/// 过期时间解析器
pub struct TimeParser;

impl TimeParser {
    /// 解析 valid_until，支持多种格式：
    /// - RFC3339 格式：2024-01-01T00:00:00Z
    /// - 日期：2024-01-01（当天结束前有效，即次日 00:00 UTC 过期）
    /// - 相对时间：1d, 2w, 1y, 1h30m, 2d12h（相对于 `now`）
    pub fn parse_valid_until(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return date
                .succ_opt()
                .and_then(|next| next.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
                .ok_or_else(|| format!("Date out of range: '{}'", input));
        }

        Self::parse_relative_time(input, now)
    }

    fn parse_relative_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let mut total_duration = Duration::zero();
        let mut remaining = input;

        while !remaining.is_empty() {
            let digits = remaining
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(remaining.len());
            if digits == 0 {
                return Err(format!("Invalid time format: '{}'", input));
            }

            let num: i64 = remaining[..digits]
                .parse()
                .map_err(|_| format!("Invalid number: '{}'", &remaining[..digits]))?;
            remaining = &remaining[digits..];

            let unit_len = remaining
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(remaining.len());
            if unit_len == 0 {
                return Err(format!("Missing time unit after '{}'", num));
            }
            let unit = &remaining[..unit_len];

            let duration = match unit {
                "M" | "mo" | "month" | "months" => num.checked_mul(30).and_then(Duration::try_days),
                _ => match unit.to_lowercase().as_str() {
                    "s" | "sec" | "second" | "seconds" => Duration::try_seconds(num),
                    "m" | "min" | "minute" | "minutes" => Duration::try_minutes(num),
                    "h" | "hour" | "hours" => Duration::try_hours(num),
                    "d" | "day" | "days" => Duration::try_days(num),
                    "w" | "week" | "weeks" => Duration::try_weeks(num),
                    "y" | "year" | "years" => num.checked_mul(365).and_then(Duration::try_days),
                    _ => return Err(format!("Unsupported time unit: '{}'", unit)),
                },
            }
            .ok_or_else(|| OUT_OF_RANGE.to_string())?;

            total_duration = total_duration
                .checked_add(&duration)
                .ok_or_else(|| OUT_OF_RANGE.to_string())?;
            remaining = &remaining[unit_len..];
        }

        if total_duration == Duration::zero() {
            return Err("Time interval cannot be zero".to_string());
        }

        now.checked_add_signed(total_duration)
            .ok_or_else(|| OUT_OF_RANGE.to_string())
    }

    /// 格式化持续时间为人类可读的字符串
    pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let duration = to.signed_duration_since(from);

        if duration.num_seconds() < 0 {
            return "expired".to_string();
        }

        let days = duration.num_days();
        let hours = (duration.num_seconds() % 86400) / 3600;
        let minutes = (duration.num_seconds() % 3600) / 60;

        if days > 0 {
            if hours > 0 {
                format!("{}d {}h", days, hours)
            } else {
                format!("{}d", days)
            }
        } else if hours > 0 {
            if minutes > 0 {
                format!("{}h {}m", hours, minutes)
            } else {
                format!("{}h", hours)
            }
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", duration.num_seconds())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_relative_time() {
        let now = fixed_now();

        let result = TimeParser::parse_valid_until("1d", now).unwrap();
        assert_eq!(result - now, Duration::days(1));

        let result = TimeParser::parse_valid_until("2w", now).unwrap();
        assert_eq!(result - now, Duration::days(14));

        let result = TimeParser::parse_valid_until("3M", now).unwrap();
        assert_eq!(result - now, Duration::days(90));

        let result = TimeParser::parse_valid_until("1d2h30m", now).unwrap();
        assert_eq!(
            result - now,
            Duration::days(1) + Duration::hours(2) + Duration::minutes(30)
        );
    }

    #[test]
    fn test_parse_rfc3339() {
        let result = TimeParser::parse_valid_until("2024-01-01T00:00:00Z", fixed_now()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_with_offset_normalizes_to_utc() {
        let result =
            TimeParser::parse_valid_until("2024-01-01T03:00:00+03:00", fixed_now()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_means_end_of_day() {
        let result = TimeParser::parse_valid_until("2024-12-24", fixed_now()).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_format() {
        let now = fixed_now();
        assert!(TimeParser::parse_valid_until("invalid", now).is_err());
        assert!(TimeParser::parse_valid_until("1x", now).is_err());
        assert!(TimeParser::parse_valid_until("10", now).is_err());
        assert!(TimeParser::parse_valid_until("0d", now).is_err());
    }

    #[test]
    fn test_out_of_range_input_is_rejected() {
        let now = fixed_now();
        for input in [
            "99999999999999d",
            "999999999999999999M",
            "999999999999999999y",
            "9223372036854775807s",
            "9223372036854775807w",
            "100000000d100000000d",
            "+262143-12-31",
            "262142-12-31",
        ] {
            assert!(
                TimeParser::parse_valid_until(input, now).is_err(),
                "{} should be rejected",
                input
            );
        }

        let err = TimeParser::parse_valid_until("99999999999999d", now).unwrap_err();
        assert_eq!(err, OUT_OF_RANGE);
    }

    #[test]
    fn test_format_duration_human() {
        let from = fixed_now();
        assert_eq!(
            TimeParser::format_duration_human(from, from + Duration::hours(26)),
            "1d 2h"
        );
        assert_eq!(
            TimeParser::format_duration_human(from, from + Duration::minutes(90)),
            "1h 30m"
        );
        assert_eq!(
            TimeParser::format_duration_human(from, from + Duration::seconds(42)),
            "42s"
        );
        assert_eq!(
            TimeParser::format_duration_human(from, from - Duration::seconds(1)),
            "expired"
        );
    }
}
