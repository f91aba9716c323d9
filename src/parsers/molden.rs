//! # Molden 文件写出
//!
//! 只支持写出。Molden 需要完整的基组 (中心、壳层、原始高斯函数)，
//! 且不认识对称块，因此输入必须是去对称化后的单块波函数。
//!
//! ```text
//! [Molden Format]
//! [Title]
//! [Atoms] AU
//! O1     1    8      0.0000000000      0.0000000000      0.0000000000
//! [GTO]
//!   1 0
//!  s    3 1.00
//! [5D7F]
//! [9G]
//! [MO]
//!  Sym= a1
//!  Ene= -20.5500
//!  Spin= Alpha
//!  Occup= 2.000000
//!     1     0.9940000000
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `parsers/mod.rs`

use crate::error::{Result, WfnError};
use crate::models::basis::{angular_letter, Shell};
use crate::models::{BasisSet, OrbitalKind, OrbitalSet, Wavefunction};
use crate::parsers::export_basis;

use std::io::Write;
use std::rc::Rc;

const FORMAT: &str = "Molden";

/// Molden 支持的最高角动量 (h)
const MAX_L: i32 = 5;

fn molden_basis(wfn: &Wavefunction) -> Result<(Rc<BasisSet>, Vec<Shell>)> {
    let (basis, shells) = export_basis(wfn, FORMAT)?;
    if let Some(shell) = shells.iter().find(|s| s.l > MAX_L) {
        return Err(WfnError::DataNotAvailable(format!(
            "{} output supports angular momenta up to h, found {}",
            FORMAT,
            angular_letter(shell.l)
        )));
    }
    Ok((basis, shells))
}

/// 检查波函数能否写成 Molden
pub fn check_requirements(wfn: &Wavefunction) -> Result<()> {
    molden_basis(wfn).map(|_| ())
}

/// 写出 Molden 文件
pub fn write_molden<W: Write>(wfn: &Wavefunction, w: &mut W) -> Result<()> {
    let (basis, shells) = molden_basis(wfn)?;
    let order = basis.shell_order();

    writeln!(w, "[Molden Format]")?;
    writeln!(w, "[Title]")?;
    writeln!(w, " {}", wfn.title)?;

    writeln!(w, "[Atoms] AU")?;
    for (i, center) in basis.centers.iter().enumerate() {
        let [x, y, z] = center.coordinates;
        writeln!(
            w,
            "{:<6}{:>5}{:>5}{:>18.10}{:>18.10}{:>18.10}",
            center.label,
            i + 1,
            center.charge.round() as i64,
            x,
            y,
            z
        )?;
    }

    writeln!(w, "[GTO]")?;
    for (i, _) in basis.centers.iter().enumerate() {
        writeln!(w, "{:>3} 0", i + 1)?;
        for shell in shells.iter().filter(|s| s.center == i) {
            writeln!(
                w,
                " {}{:>5} 1.00",
                angular_letter(shell.l),
                shell.primitives.len()
            )?;
            for (exponent, coefficient) in &shell.primitives {
                writeln!(w, "{:>20.10}{:>20.10}", exponent, coefficient)?;
            }
        }
        writeln!(w)?;
    }

    let max_l = shells.iter().map(|s| s.l).max().unwrap_or(0);
    if max_l >= 2 {
        writeln!(w, "[5D7F]")?;
    }
    if max_l >= 4 {
        writeln!(w, "[9G]")?;
    }

    writeln!(w, "[MO]")?;
    for (kind, set) in &wfn.mo {
        let spin = match kind {
            OrbitalKind::Beta => "Beta",
            _ => "Alpha",
        };
        write_orbitals(wfn, set, spin, &order, w)?;
    }

    Ok(())
}

fn write_orbitals<W: Write>(
    wfn: &Wavefunction,
    set: &OrbitalSet,
    spin: &str,
    order: &[usize],
    w: &mut W,
) -> Result<()> {
    // 单块: coefficients[0] 的列即全部轨道
    let Some(block) = set.coefficients.first() else {
        return Ok(());
    };

    for (j, column) in block.column_iter().enumerate() {
        writeln!(w, " Sym= {}", wfn.irrep_label(set.irreps[j]))?;
        writeln!(w, " Ene= {:.6}", set.energies[j])?;
        writeln!(w, " Spin= {}", spin)?;
        writeln!(w, " Occup= {:.6}", set.occupations[j])?;
        for (k, &ao) in order.iter().enumerate() {
            writeln!(w, "{:>5} {:>20.10}", k + 1, column[ao])?;
        }
    }
    Ok(())
}
