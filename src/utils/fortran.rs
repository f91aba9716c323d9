//! # Fortran 风格数值格式
//!
//! INPORB 与 fchk 都是 Fortran 程序写出的定宽格式：
//! - `E22.14`: `0.12345678901234E+00` (尾数以 `0.` 开头)
//! - `ES16.8`: `1.23456789E+00` (尾数首位非零)
//!
//! 1.1 版 INPORB 使用 `4E18.12`，负数会与前一个数粘连，因此读取时需要按列宽切分。
//!
//! ## 依赖关系
//! - 被 `parsers/inporb.rs`, `parsers/fchk.rs` 使用
//! - 无外部模块依赖

use std::io::Write;

/// 拆分 Rust `{:e}` 输出为 (尾数, 指数)
fn split_exponent(formatted: &str) -> (&str, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn exponent_suffix(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("E{}{:02}", sign, exp.abs())
}

/// Fortran `Ew.d` 格式，如 `0.12345678901234E+00`
pub fn format_e(value: f64, width: usize, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:>width$}", value, width = width);
    }

    let body = if value == 0.0 {
        format!("0.{}{}", "0".repeat(decimals), exponent_suffix(0))
    } else {
        let formatted = format!("{:.*e}", decimals.saturating_sub(1), value.abs());
        let (mantissa, exp) = split_exponent(&formatted);
        let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
        let sign = if value < 0.0 { "-" } else { "" };
        let body = format!("{}0.{}{}", sign, digits, exponent_suffix(exp + 1));
        // 宽度不足时省略前导零 (Fortran 的做法)
        if body.len() > width {
            format!("{}.{}{}", sign, digits, exponent_suffix(exp + 1))
        } else {
            body
        }
    };

    format!("{:>width$}", body, width = width)
}

/// Fortran `ESw.d` 格式，如 `1.23456789E+00`
pub fn format_es(value: f64, width: usize, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:>width$}", value, width = width);
    }

    let formatted = format!("{:.*e}", decimals, value);
    let (mantissa, exp) = split_exponent(&formatted);
    let body = format!("{}{}", mantissa, exponent_suffix(exp));
    format!("{:>width$}", body, width = width)
}

/// 按每行 `per_line` 个写出数值，最后一行不足时同样换行
pub fn write_columns<W, T, F>(w: &mut W, values: &[T], per_line: usize, fmt: F) -> std::io::Result<()>
where
    W: Write,
    F: Fn(&T) -> String,
{
    for chunk in values.chunks(per_line.max(1)) {
        let line: String = chunk.iter().map(&fmt).collect();
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

fn parse_real(token: &str) -> Option<f64> {
    let token = token.trim();
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "E").parse().ok())
}

/// 解析一行实数
///
/// 先按空白分隔；失败时按 `width` 定宽切分 (处理粘连的负数)。
pub fn parse_reals(line: &str, width: usize) -> Option<Vec<f64>> {
    let by_whitespace: Option<Vec<f64>> = line.split_whitespace().map(parse_real).collect();
    if by_whitespace.is_some() {
        return by_whitespace;
    }

    if width == 0 || !line.is_ascii() {
        return None;
    }

    line.as_bytes()
        .chunks(width)
        .filter_map(|chunk| {
            // is_ascii 已检查
            let field = std::str::from_utf8(chunk).unwrap_or("").trim();
            if field.is_empty() {
                None
            } else {
                Some(parse_real(field))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_e() {
        assert_eq!(format_e(0.5, 22, 14), "  0.50000000000000E+00");
        assert_eq!(format_e(-1.25e-3, 22, 14), " -0.12500000000000E-02");
        assert_eq!(format_e(0.0, 12, 4), "  0.0000E+00");
        assert_eq!(format_e(123.456, 12, 4), "  0.1235E+03");
        assert_eq!(format_e(0.25, 18, 12), "0.250000000000E+00");
    }

    #[test]
    fn test_format_es() {
        assert_eq!(format_es(1.5, 16, 8), "  1.50000000E+00");
        assert_eq!(format_es(-2.0e-10, 16, 8), " -2.00000000E-10");
    }

    #[test]
    fn test_parse_whitespace_separated() {
        let values = parse_reals("  0.50000000000000E+00 -0.12500000000000E-02", 22).unwrap();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 0.5).abs() < 1e-14);
        assert!((values[1] + 1.25e-3).abs() < 1e-14);
    }

    #[test]
    fn test_parse_jammed_fixed_width() {
        let line = format!("{}{}", format_e(-0.25, 18, 12), format_e(-0.75, 18, 12));
        assert_eq!(line, "-.250000000000E+00-.750000000000E+00");
        let values = parse_reals(&line, 18).unwrap();
        assert_eq!(values.len(), 2);
        assert!((values[0] + 0.25).abs() < 1e-12);
        assert!((values[1] + 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_parse_fortran_d_exponent() {
        let values = parse_reals("0.1D+01 0.2d-01", 0).unwrap();
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!((values[1] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_reals("hello world", 22).is_none());
    }
}
