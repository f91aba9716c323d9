//! # SALC 轨道投影
//!
//! 把单块 AO 轨道投影到对称匹配线性组合 (SALC) 上：
//! C_so = D^-1 C，保留权重最大的不可约表示分量，其余置零，
//! 变换回 AO 基并重新归一化 (有重叠矩阵时按 S 度量，否则按欧氏范数)。
//!
//! 已分块的输入本身就是对称匹配的，只需把 irrep 重置为块序号。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `transform/mod.rs`

use super::{block_weights, dominant_block, inverse_desym, symmetry_data};
use crate::error::Result;
use crate::models::wavefunction::block_offsets;
use crate::models::Wavefunction;
use crate::utils::output;

use nalgebra::{DMatrix, DVector};

const NORM_THRESHOLD: f64 = 1e-12;

fn normalize(c: &mut DVector<f64>, overlap: Option<&DMatrix<f64>>) {
    let norm2 = match overlap {
        Some(s) => c.dot(&(s * &*c)),
        None => c.norm_squared(),
    };
    if norm2 > NORM_THRESHOLD {
        *c /= norm2.sqrt();
    }
}

/// 把轨道投影到主导不可约表示上
///
/// 总是返回新的波函数；单块输入需要对称信息。
pub fn salcorb(wfn: &Wavefunction) -> Result<Wavefunction> {
    let mut result = wfn.clone();

    if wfn.n_sym > 1 {
        for set in result.mo.values_mut() {
            set.irreps = set
                .coefficients
                .iter()
                .enumerate()
                .flat_map(|(sym, block)| std::iter::repeat(sym).take(block.ncols()))
                .collect();
        }
        output::print_info("Orbitals are already symmetry adapted, irreps reset to block indices");
        return Ok(result);
    }

    let symmetry = symmetry_data(wfn, "SALC projection")?;
    let d = &symmetry.desym_matrix;
    let d_inv = inverse_desym(&symmetry, "SALC projection")?;
    let sizes = &symmetry.n_bas;
    let offsets = block_offsets(sizes);
    let overlap = wfn.overlap.as_ref().and_then(|blocks| blocks.first());

    let mut mixed = 0usize;
    for set in result.mo.values_mut() {
        let mut irreps = Vec::with_capacity(set.n_orbitals());
        for block in set.coefficients.iter_mut() {
            for j in 0..block.ncols() {
                let mut so: DVector<f64> = &d_inv * block.column(j);
                let weights = block_weights(&so, sizes);
                let sym = dominant_block(&weights);

                let total: f64 = weights.iter().sum();
                if total > NORM_THRESHOLD && weights[sym] / total < 1.0 - 1e-6 {
                    mixed += 1;
                }

                for (other, (&offset, &size)) in offsets.iter().zip(sizes).enumerate() {
                    if other != sym {
                        so.rows_mut(offset, size).fill(0.0);
                    }
                }
                let mut ao = d * so;
                normalize(&mut ao, overlap);
                block.set_column(j, &ao);
                irreps.push(sym);
            }
        }
        set.irreps = irreps;
    }

    if mixed > 0 {
        output::print_warning(&format!(
            "{} orbitals had components in more than one irrep and were projected",
            mixed
        ));
    }
    output::print_info("Projected orbitals onto symmetry adapted linear combinations");
    Ok(result)
}
