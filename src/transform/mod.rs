//! # 波函数变换模块
//!
//! 转换流水线上的纯函数阶段，每个阶段接收一个 `Wavefunction` 并返回新的值：
//! - `desymmetrize`: 对称块 -> 单块 AO 表示
//! - `salcorb`: 把轨道投影到主导的不可约表示 (SALC)
//! - `guessorb`: 由重叠矩阵与核哈密顿量构造初猜轨道
//! - `symmetrize`: 单块 AO 表示 -> 对称块
//! - `mulliken_charges`: Mulliken 布居分析
//!
//! 缺少所需数据时返回 `WfnError::DataNotAvailable`。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs`, `report/` 使用
//! - 使用 `models/`, `nalgebra`
//! - 子模块: symmetry, salc, guess, mulliken

pub mod guess;
pub mod mulliken;
pub mod salc;
pub mod symmetry;

pub use guess::guessorb;
pub use mulliken::mulliken_charges;
pub use salc::salcorb;
pub use symmetry::{desymmetrize, symmetrize};

use crate::error::{Result, WfnError};
use crate::models::{SymmetryData, Wavefunction};

use nalgebra::{DMatrix, DVector};
use std::rc::Rc;

/// 取出对称信息，没有时报告哪个操作需要它
///
/// D 必须是方阵，且维数与波函数的基函数总数一致。
fn symmetry_data(wfn: &Wavefunction, operation: &str) -> Result<Rc<SymmetryData>> {
    let symmetry = wfn.symmetry.as_ref().map(Rc::clone).ok_or_else(|| {
        WfnError::DataNotAvailable(format!(
            "{} needs symmetry information (desymmetrization matrix), which the input does not carry",
            operation
        ))
    })?;

    let d = &symmetry.desym_matrix;
    let n = wfn.n_bas_total();
    if d.nrows() != n || d.ncols() != n || symmetry.n_bas.iter().sum::<usize>() != n {
        return Err(WfnError::InconsistentWavefunction(format!(
            "desymmetrization matrix is {}x{} for {} basis functions",
            d.nrows(),
            d.ncols(),
            n
        )));
    }
    Ok(symmetry)
}

/// D^-1，D 奇异时报错
fn inverse_desym(symmetry: &SymmetryData, operation: &str) -> Result<DMatrix<f64>> {
    symmetry.desym_matrix.clone().try_inverse().ok_or_else(|| {
        WfnError::DataNotAvailable(format!(
            "{} needs an invertible desymmetrization matrix",
            operation
        ))
    })
}

/// 由对角块组装块对角矩阵
fn block_diagonal(blocks: &[DMatrix<f64>]) -> DMatrix<f64> {
    let n: usize = blocks.iter().map(|b| b.nrows()).sum();
    let mut full = DMatrix::zeros(n, n);
    let mut offset = 0;
    for block in blocks {
        let size = block.nrows();
        full.view_mut((offset, offset), (size, size)).copy_from(block);
        offset += size;
    }
    full
}

/// 取出对角块
fn diagonal_blocks(full: &DMatrix<f64>, sizes: &[usize]) -> Vec<DMatrix<f64>> {
    let mut offset = 0;
    sizes
        .iter()
        .map(|&size| {
            let block = full.view((offset, offset), (size, size)).into_owned();
            offset += size;
            block
        })
        .collect()
}

/// 每个对称块上的权重 (系数平方和)
fn block_weights(so: &DVector<f64>, sizes: &[usize]) -> Vec<f64> {
    let mut offset = 0;
    sizes
        .iter()
        .map(|&size| {
            let weight = so.rows(offset, size).norm_squared();
            offset += size;
            weight
        })
        .collect()
}

/// 权重最大的块；并列时取序号小的
fn dominant_block(weights: &[f64]) -> usize {
    weights
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &w)| {
            if w > best.1 {
                (i, w)
            } else {
                best
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_diagonal_roundtrip() {
        let blocks = vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]),
            DMatrix::from_element(1, 1, 3.0),
        ];
        let full = block_diagonal(&blocks);
        assert_eq!(full.nrows(), 3);
        assert_eq!(full[(2, 2)], 3.0);
        assert_eq!(full[(0, 2)], 0.0);
        assert_eq!(diagonal_blocks(&full, &[2, 1]), blocks);
    }

    #[test]
    fn test_dominant_block() {
        let so = DVector::from_vec(vec![0.1, 0.1, 0.9]);
        let weights = block_weights(&so, &[2, 1]);
        assert_eq!(dominant_block(&weights), 1);
        assert_eq!(dominant_block(&[0.5, 0.5]), 0);
    }
}
