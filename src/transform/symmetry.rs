//! # 对称化与去对称化
//!
//! 去对称化矩阵 D (AO x SO) 满足 C_ao = D * C_so，SO 按对称块连续排列。
//! - `desymmetrize`: 各块轨道变换到 AO 基后合并为一个块
//! - `symmetrize`: 逆变换，按每个轨道的主导块重新分组
//!
//! 重叠矩阵与核哈密顿量随之变换: M_ao = D^-T M_so D^-1，M_so = D^T M_ao D。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `transform/mod.rs`

use super::{
    block_diagonal, block_weights, diagonal_blocks, dominant_block, inverse_desym, symmetry_data,
};
use crate::error::Result;
use crate::models::wavefunction::block_offsets;
use crate::models::{OrbitalSet, OrbitalType, Wavefunction};
use crate::utils::output;

use nalgebra::{DMatrix, DVector};
use std::rc::Rc;

/// 一个轨道的全部信息，用于跨块重排
struct Orbital {
    coefficients: DVector<f64>,
    energy: f64,
    occupation: f64,
    irrep: usize,
    kind: OrbitalType,
}

fn collect_orbitals(
    set: &OrbitalSet,
    transform: impl Fn(usize, DVector<f64>) -> DVector<f64>,
) -> Vec<Orbital> {
    let mut orbitals = Vec::with_capacity(set.n_orbitals());
    let mut index = 0;
    for (sym, block) in set.coefficients.iter().enumerate() {
        for column in block.column_iter() {
            orbitals.push(Orbital {
                coefficients: transform(sym, column.into_owned()),
                energy: set.energies[index],
                occupation: set.occupations[index],
                irrep: set.irreps[index],
                kind: set.types[index],
            });
            index += 1;
        }
    }
    orbitals
}

fn assemble(orbitals: &[Orbital], n_rows: usize) -> DMatrix<f64> {
    let columns: Vec<DVector<f64>> = orbitals.iter().map(|o| o.coefficients.clone()).collect();
    if columns.is_empty() {
        DMatrix::zeros(n_rows, 0)
    } else {
        DMatrix::from_columns(&columns)
    }
}

/// 对称块表示 -> 单块 AO 表示
///
/// 单块输入原样返回。轨道按 (类型, 能量) 稳定排序，irrep 记为来源块序号。
pub fn desymmetrize(wfn: Wavefunction) -> Result<Wavefunction> {
    if wfn.n_sym == 1 {
        output::print_debug("Wavefunction has a single symmetry block, nothing to desymmetrize");
        return Ok(wfn);
    }

    let symmetry = symmetry_data(&wfn, "Desymmetrization")?;
    let d = &symmetry.desym_matrix;
    let n_ao = d.nrows();
    let offsets = block_offsets(&wfn.n_bas);

    let mut result = wfn.clone();
    for (kind, set) in &wfn.mo {
        let mut orbitals = collect_orbitals(set, |sym, so| {
            d.columns(offsets[sym], so.len()) * so
        });
        // irrep 记为来源块
        let mut index = 0;
        for (sym, block) in set.coefficients.iter().enumerate() {
            for orbital in &mut orbitals[index..index + block.ncols()] {
                orbital.irrep = sym;
            }
            index += block.ncols();
        }
        orbitals.sort_by(|a, b| {
            a.kind
                .rank()
                .cmp(&b.kind.rank())
                .then(a.energy.total_cmp(&b.energy))
        });

        let new_set = OrbitalSet {
            basis_set: Rc::clone(&symmetry.desymmetrized_basis),
            coefficients: vec![assemble(&orbitals, n_ao)],
            energies: orbitals.iter().map(|o| o.energy).collect(),
            occupations: orbitals.iter().map(|o| o.occupation).collect(),
            irreps: orbitals.iter().map(|o| o.irrep).collect(),
            types: orbitals.iter().map(|o| o.kind).collect(),
        };
        result.mo.insert(*kind, new_set);
    }

    let d_inv = d.clone().try_inverse();
    if d_inv.is_none() && (wfn.overlap.is_some() || wfn.one_electron.is_some()) {
        output::print_warning(
            "Desymmetrization matrix is singular, dropping overlap and one-electron matrices",
        );
    }
    let to_ao = |blocks: &Option<Vec<DMatrix<f64>>>| -> Option<Vec<DMatrix<f64>>> {
        let d_inv = d_inv.as_ref()?;
        let full = block_diagonal(blocks.as_ref()?);
        Some(vec![d_inv.transpose() * full * d_inv])
    };
    result.overlap = to_ao(&wfn.overlap);
    result.one_electron = to_ao(&wfn.one_electron);

    result.n_sym = 1;
    result.n_bas = vec![n_ao];
    result.basis_set = Rc::clone(&symmetry.desymmetrized_basis);

    output::print_info(&format!(
        "Desymmetrized {} blocks into {} basis functions",
        wfn.n_sym, n_ao
    ));
    Ok(result)
}

/// 单块 AO 表示 -> 对称块表示
///
/// 已分块的输入原样返回。每个轨道归入 SO 系数权重最大的块，块内保持原有次序。
pub fn symmetrize(wfn: Wavefunction) -> Result<Wavefunction> {
    if wfn.n_sym > 1 {
        output::print_debug("Wavefunction is already symmetry blocked");
        return Ok(wfn);
    }

    let symmetry = symmetry_data(&wfn, "Symmetrization")?;
    let d_inv = inverse_desym(&symmetry, "Symmetrization")?;
    let sizes = &symmetry.n_bas;
    let offsets = block_offsets(sizes);

    let mut result = wfn.clone();
    for (kind, set) in &wfn.mo {
        let orbitals = collect_orbitals(set, |_, ao| &d_inv * ao);

        let mut grouped: Vec<Vec<&Orbital>> = vec![Vec::new(); sizes.len()];
        for orbital in &orbitals {
            let sym = dominant_block(&block_weights(&orbital.coefficients, sizes));
            grouped[sym].push(orbital);
        }

        let mut new_set = OrbitalSet {
            basis_set: Rc::clone(&symmetry.symmetric_basis),
            coefficients: Vec::with_capacity(sizes.len()),
            energies: Vec::new(),
            occupations: Vec::new(),
            irreps: Vec::new(),
            types: Vec::new(),
        };
        for (sym, members) in grouped.iter().enumerate() {
            let mut block = DMatrix::zeros(sizes[sym], members.len());
            for (j, orbital) in members.iter().enumerate() {
                block
                    .column_mut(j)
                    .copy_from(&orbital.coefficients.rows(offsets[sym], sizes[sym]));
                new_set.energies.push(orbital.energy);
                new_set.occupations.push(orbital.occupation);
                new_set.irreps.push(sym);
                new_set.types.push(orbital.kind);
            }
            new_set.coefficients.push(block);
        }
        result.mo.insert(*kind, new_set);
    }

    let to_so = |blocks: &Option<Vec<DMatrix<f64>>>| -> Option<Vec<DMatrix<f64>>> {
        let full = blocks.as_ref()?.first()?;
        let d = &symmetry.desym_matrix;
        Some(diagonal_blocks(&(d.transpose() * full * d), sizes))
    };
    result.overlap = to_so(&wfn.overlap);
    result.one_electron = to_so(&wfn.one_electron);

    result.n_sym = sizes.len();
    result.n_bas = sizes.clone();
    result.basis_set = Rc::clone(&symmetry.symmetric_basis);

    output::print_info(&format!("Symmetrized orbitals into {} blocks", result.n_sym));
    Ok(result)
}
