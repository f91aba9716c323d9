//! # Mulliken 布居分析
//!
//! 每个对称块上 P = sum_j n_j c_j c_j^T，基函数 mu 的总布居为 (P S)_mu,mu，
//! 按基函数所属中心累加后得到 q_A = Z_A - N_A。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs`, `report/mulliken.rs` 使用
//! - 使用 `models/`

use crate::error::{Result, WfnError};
use crate::models::Wavefunction;

use nalgebra::{DMatrix, DVector};

/// 各中心的 Mulliken 电荷，次序与轨道基组的中心一致
pub fn mulliken_charges(wfn: &Wavefunction) -> Result<Vec<f64>> {
    let overlap = wfn.overlap.as_ref().ok_or_else(|| {
        WfnError::DataNotAvailable("Mulliken analysis needs the overlap matrix".to_string())
    })?;
    let basis = wfn
        .mo
        .values()
        .next()
        .map(|set| &set.basis_set)
        .ok_or_else(|| WfnError::DataNotAvailable("Mulliken analysis needs orbitals".to_string()))?;
    if !basis.is_fully_labelled() {
        return Err(WfnError::DataNotAvailable(
            "Mulliken analysis needs basis function centers".to_string(),
        ));
    }

    let mut populations = vec![0.0; basis.centers.len()];
    let offsets = wfn.bas_offsets();

    for set in wfn.mo.values() {
        let mut index = 0;
        for (sym, (block, s)) in set.coefficients.iter().zip(overlap).enumerate() {
            let n_orb = block.ncols();
            let occ = DMatrix::from_diagonal(&DVector::from_column_slice(
                &set.occupations[index..index + n_orb],
            ));
            let density = block * occ * block.transpose();
            let gross = density * s;

            for mu in 0..block.nrows() {
                let function = basis.functions.get(offsets[sym] + mu);
                if let Some(center) = function.and_then(|f| f.center) {
                    populations[center] += gross[(mu, mu)];
                }
            }
            index += n_orb;
        }
    }

    Ok(basis
        .centers
        .iter()
        .zip(&populations)
        .map(|(center, population)| center.charge - population)
        .collect())
}
