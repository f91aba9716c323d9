//! # Gaussian formatted checkpoint 写出
//!
//! 只支持写出。与 Molden 一样需要单块波函数和完整基组。
//!
//! ## fchk 格式说明
//! ```text
//! H2 STO-3G                                        (A72)
//! SP        RHF                           Gen      (A10,A30,A30)
//! Number of atoms                            I                2
//! Shell types                                I   N=           2
//!            0           0                         (6I12)
//! Alpha Orbital Energies                     R   N=           2
//!  -5.78200000E-01  6.70300000E-01                 (5ES16.8)
//! ```
//! 球谐壳层的类型为 `-l` (d 及以上)，s 为 0，p 为 1。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `parsers/mod.rs`, `utils/fortran.rs`

use crate::error::Result;
use crate::models::{OrbitalKind, OrbitalSet, Wavefunction};
use crate::parsers::export_basis;
use crate::utils::fortran::{format_es, write_columns};

use std::io::Write;

const FORMAT: &str = "fchk";

/// 检查波函数能否写成 fchk
pub fn check_requirements(wfn: &Wavefunction) -> Result<()> {
    export_basis(wfn, FORMAT).map(|_| ())
}

fn scalar_int<W: Write>(w: &mut W, name: &str, value: i64) -> std::io::Result<()> {
    writeln!(w, "{:<40}   I     {:>12}", name, value)
}

fn int_array<W: Write>(w: &mut W, name: &str, values: &[i64]) -> std::io::Result<()> {
    writeln!(w, "{:<40}   I   N={:>12}", name, values.len())?;
    write_columns(w, values, 6, |v| format!("{:>12}", v))
}

fn real_array<W: Write>(w: &mut W, name: &str, values: &[f64]) -> std::io::Result<()> {
    writeln!(w, "{:<40}   R   N={:>12}", name, values.len())?;
    write_columns(w, values, 5, |v| format_es(*v, 16, 8))
}

/// fchk 壳层类型
fn shell_type(l: i32) -> i64 {
    match l {
        0 => 0,
        1 => 1,
        l => -(l as i64),
    }
}

/// (alpha 电子数, beta 电子数)
fn electron_counts(wfn: &Wavefunction) -> (i64, i64) {
    let count = |kind: OrbitalKind| {
        wfn.mo
            .get(&kind)
            .map_or(0, |set| set.n_electrons().round() as i64)
    };

    if wfn.is_unrestricted() {
        (count(OrbitalKind::Alpha), count(OrbitalKind::Beta))
    } else {
        let total = count(OrbitalKind::Restricted);
        ((total + 1) / 2, total / 2)
    }
}

/// 按 Gaussian 基函数次序展开轨道系数，轨道优先
fn ordered_coefficients(set: &OrbitalSet, order: &[usize]) -> Vec<f64> {
    set.coefficients
        .first()
        .map(|block| {
            block
                .column_iter()
                .flat_map(|column| order.iter().map(move |&ao| column[ao]))
                .collect()
        })
        .unwrap_or_default()
}

/// 写出 fchk 文件
pub fn write_fchk<W: Write>(wfn: &Wavefunction, w: &mut W) -> Result<()> {
    let (basis, shells) = export_basis(wfn, FORMAT)?;
    let order = basis.shell_order();

    let (n_alpha, n_beta) = electron_counts(wfn);
    let nuclear_charge: f64 = basis.centers.iter().map(|c| c.charge).sum();
    let charge = nuclear_charge.round() as i64 - n_alpha - n_beta;
    let method = if wfn.is_unrestricted() { "UHF" } else { "RHF" };

    let title: String = wfn.title.chars().take(72).collect();
    writeln!(w, "{}", title)?;
    writeln!(w, "{:<10}{:<30}{:<30}", "SP", method, "Gen")?;

    let n_orbitals = wfn
        .mo
        .values()
        .next()
        .map_or(0, |set| set.n_orbitals());

    scalar_int(w, "Number of atoms", basis.centers.len() as i64)?;
    scalar_int(w, "Charge", charge)?;
    scalar_int(w, "Multiplicity", n_alpha - n_beta + 1)?;
    scalar_int(w, "Number of electrons", n_alpha + n_beta)?;
    scalar_int(w, "Number of alpha electrons", n_alpha)?;
    scalar_int(w, "Number of beta electrons", n_beta)?;
    scalar_int(w, "Number of basis functions", basis.n_functions() as i64)?;
    scalar_int(w, "Number of independent functions", n_orbitals as i64)?;

    let atomic_numbers: Vec<i64> = basis
        .centers
        .iter()
        .map(|c| c.charge.round() as i64)
        .collect();
    let nuclear_charges: Vec<f64> = basis.centers.iter().map(|c| c.charge).collect();
    let coordinates: Vec<f64> = basis
        .centers
        .iter()
        .flat_map(|c| c.coordinates)
        .collect();
    int_array(w, "Atomic numbers", &atomic_numbers)?;
    real_array(w, "Nuclear charges", &nuclear_charges)?;
    real_array(w, "Current cartesian coordinates", &coordinates)?;

    let n_primitives: usize = shells.iter().map(|s| s.primitives.len()).sum();
    let max_l = shells.iter().map(|s| s.l).max().unwrap_or(0);
    let max_contraction = shells.iter().map(|s| s.primitives.len()).max().unwrap_or(0);
    scalar_int(w, "Number of contracted shells", shells.len() as i64)?;
    scalar_int(w, "Number of primitive shells", n_primitives as i64)?;
    scalar_int(w, "Pure/Cartesian d shells", 0)?;
    scalar_int(w, "Pure/Cartesian f shells", 0)?;
    scalar_int(w, "Highest angular momentum", max_l as i64)?;
    scalar_int(w, "Largest degree of contraction", max_contraction as i64)?;

    let types: Vec<i64> = shells.iter().map(|s| shell_type(s.l)).collect();
    let per_shell: Vec<i64> = shells.iter().map(|s| s.primitives.len() as i64).collect();
    let shell_atoms: Vec<i64> = shells.iter().map(|s| s.center as i64 + 1).collect();
    let exponents: Vec<f64> = shells
        .iter()
        .flat_map(|s| s.primitives.iter().map(|p| p.0))
        .collect();
    let contractions: Vec<f64> = shells
        .iter()
        .flat_map(|s| s.primitives.iter().map(|p| p.1))
        .collect();
    let shell_coordinates: Vec<f64> = shells
        .iter()
        .flat_map(|s| {
            basis
                .centers
                .get(s.center)
                .map_or([0.0; 3], |c| c.coordinates)
        })
        .collect();
    int_array(w, "Shell types", &types)?;
    int_array(w, "Number of primitives per shell", &per_shell)?;
    int_array(w, "Shell to atom map", &shell_atoms)?;
    real_array(w, "Primitive exponents", &exponents)?;
    real_array(w, "Contraction coefficients", &contractions)?;
    real_array(w, "Coordinates of each shell", &shell_coordinates)?;

    for (kind, set) in &wfn.mo {
        let spin = match kind {
            OrbitalKind::Beta => "Beta",
            _ => "Alpha",
        };
        real_array(w, &format!("{} Orbital Energies", spin), &set.energies)?;
        real_array(
            w,
            &format!("{} MO coefficients", spin),
            &ordered_coefficients(set, &order),
        )?;
    }

    Ok(())
}
