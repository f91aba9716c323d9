//! # 报告模块
//!
//! 把波函数的内容以文本形式写入任意 `Write` sink (通常是 stdout)：
//! - `orbitals`: 轨道系数列表
//! - `species`: 对称类型与 SUPSYM 分组
//! - `mulliken`: Mulliken 电荷表
//!
//! 报告与日志分开：日志走 `utils::output` (stderr)，报告写入 sink。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `regex`, `tabled`
//! - 子模块: orbitals, species, mulliken

pub mod mulliken;
pub mod orbitals;
pub mod species;

pub use mulliken::print_mulliken;
pub use orbitals::print_orbitals;
pub use species::{print_supsym, print_symmetry_species};

use crate::error::{Result, WfnError};
use crate::models::OrbitalType;

use regex::Regex;
use std::io::Write;

/// 报告格式与过滤选项
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// 系数列表的换行宽度
    pub linewidth: usize,

    /// 基函数标签 / 对称类型标签的过滤正则
    pub pattern: Option<Regex>,

    /// 要列出的轨道类型字符，如 `i2s`
    pub typeids: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            linewidth: 80,
            pattern: None,
            typeids: None,
        }
    }
}

impl ReportOptions {
    pub fn new(linewidth: usize, pattern: Option<&str>, typeids: Option<&str>) -> Result<Self> {
        let pattern = pattern
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    WfnError::InvalidArgument(format!("--match pattern '{}': {}", p, e))
                })
            })
            .transpose()?;

        Ok(ReportOptions {
            linewidth,
            pattern,
            typeids: typeids.map(|t| t.to_ascii_lowercase()),
        })
    }

    /// 轨道类型是否在 `--typeids` 中
    pub fn accepts_type(&self, kind: OrbitalType) -> bool {
        self.typeids
            .as_ref()
            .map_or(true, |ids| ids.contains(kind.to_char()))
    }

    /// 标签是否匹配 `--match`
    pub fn matches(&self, label: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(label))
    }
}

/// 按宽度换行写出条目，每行以 `indent` 开头，至少放一个条目
fn write_wrapped<W: Write>(
    w: &mut W,
    entries: &[String],
    linewidth: usize,
    indent: &str,
) -> std::io::Result<()> {
    let mut line = String::from(indent);
    for entry in entries {
        let occupied = line.len() > indent.len();
        if occupied && line.len() + 1 + entry.len() > linewidth {
            writeln!(w, "{}", line)?;
            line = String::from(indent);
        }
        if line.len() > indent.len() {
            line.push(' ');
        }
        line.push_str(entry);
    }
    if line.len() > indent.len() {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping() {
        let entries: Vec<String> = (1..=10).map(|i| format!("{:>3}", i)).collect();
        let mut buf = Vec::new();
        write_wrapped(&mut buf, &entries, 20, "  ").unwrap();
        let text = String::from_utf8(buf).unwrap();
        for line in text.lines() {
            assert!(line.len() <= 20);
        }
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_wrapping_overlong_entry() {
        let entries = vec!["a-very-long-entry".to_string()];
        let mut buf = Vec::new();
        write_wrapped(&mut buf, &entries, 5, "").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a-very-long-entry\n");
    }

    #[test]
    fn test_filters() {
        let opts = ReportOptions::new(80, Some("^O1:"), Some("I2")).unwrap();
        assert!(opts.accepts_type(OrbitalType::Inactive));
        assert!(opts.accepts_type(OrbitalType::Ras2));
        assert!(!opts.accepts_type(OrbitalType::Secondary));
        assert!(opts.matches("O1:2p+1"));
        assert!(!opts.matches("H1:1s"));
    }

    #[test]
    fn test_bad_pattern() {
        assert!(matches!(
            ReportOptions::new(80, Some("("), None),
            Err(WfnError::InvalidArgument(_))
        ));
    }
}
