use std::time::Duration;

/// 解析时长字符串，支持：
/// - 纯数字（秒）：`0`, `90`
/// - 带单位：`30s`, `5m`, `12h`, `7d`, `2w`, `100ms`
/// - 组合格式：`1h30m`, `2d12h`
///
/// `0` is accepted and means "no duration"; callers decide what that implies.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut remaining = input;

    while !remaining.is_empty() {
        let digits = remaining
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(remaining.len());
        if digits == 0 {
            return Err(format!("invalid duration: '{}'", input));
        }
        let num: u64 = remaining[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration: '{}'", input))?;
        remaining = &remaining[digits..];

        let unit_len = remaining
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(remaining.len());
        if unit_len == 0 {
            return Err(format!("missing unit after '{}' in '{}'", num, input));
        }
        let unit = &remaining[..unit_len];
        remaining = &remaining[unit_len..];

        let part = match unit.to_ascii_lowercase().as_str() {
            "ms" => Some(Duration::from_millis(num)),
            "s" | "sec" | "secs" => Some(Duration::from_secs(num)),
            "m" | "min" | "mins" => num.checked_mul(60).map(Duration::from_secs),
            "h" | "hour" | "hours" => num.checked_mul(3600).map(Duration::from_secs),
            "d" | "day" | "days" => num.checked_mul(86_400).map(Duration::from_secs),
            "w" | "week" | "weeks" => num.checked_mul(604_800).map(Duration::from_secs),
            _ => {
                return Err(format!(
                    "unsupported duration unit '{}' in '{}'",
                    unit, input
                ));
            }
        };

        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration out of range: '{}'", input))?;
    }

    Ok(total)
}
