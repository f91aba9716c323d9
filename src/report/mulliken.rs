//! # Mulliken 电荷表
//!
//! ## 依赖关系
//! - 被 `report/mod.rs` 导出
//! - 使用 `tabled` crate

use crate::error::{Result, WfnError};

use std::io::Write;
use tabled::{Table, Tabled};

/// 电荷表的一行
#[derive(Debug, Clone, Tabled)]
struct ChargeRow {
    #[tabled(rename = "Center")]
    center: String,
    #[tabled(rename = "Charge")]
    charge: String,
}

/// 写出 Mulliken 电荷表
///
/// `labels` 与 `charges` 一一对应，长度不等时报错。
pub fn print_mulliken<W: Write>(labels: &[String], charges: &[f64], w: &mut W) -> Result<()> {
    if labels.len() != charges.len() {
        return Err(WfnError::MullikenLengthMismatch {
            labels: labels.len(),
            charges: charges.len(),
        });
    }

    let rows: Vec<ChargeRow> = labels
        .iter()
        .zip(charges)
        .map(|(label, charge)| ChargeRow {
            center: label.clone(),
            charge: format!("{:.6}", charge),
        })
        .collect();

    writeln!(w, "Mulliken charges")?;
    writeln!(w, "{}", Table::new(&rows))?;
    writeln!(w, "Total charge: {:.6}", charges.iter().sum::<f64>())?;
    Ok(())
}
