//! # 初猜轨道
//!
//! 由核哈密顿量构造初猜轨道：每个对称块上求解广义本征问题 H C = S C e。
//!
//! 1. S = U λ U^T，丢弃 λ <= 1e-8 的近线性相关方向
//! 2. X = U λ^-1/2 (正则正交化)
//! 3. H' = X^T H X 对角化，C = X V
//!
//! 占据数按能量从低到高 (跨所有块) 依次填充 (aufbau)。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `nalgebra::SymmetricEigen`

use crate::error::{Result, WfnError};
use crate::models::{OrbitalKind, OrbitalSet, OrbitalType, Wavefunction};
use crate::utils::output;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use std::collections::BTreeMap;
use std::rc::Rc;

/// 重叠矩阵本征值下限
const LINEAR_DEPENDENCE_THRESHOLD: f64 = 1e-8;

/// 单个对称块的解: 升序能量与对应的系数列
struct BlockSolution {
    energies: Vec<f64>,
    coefficients: DMatrix<f64>,
}

fn solve_block(s: &DMatrix<f64>, h: &DMatrix<f64>) -> BlockSolution {
    let n = s.nrows();
    if n == 0 {
        return BlockSolution {
            energies: Vec::new(),
            coefficients: DMatrix::zeros(0, 0),
        };
    }

    let s_eigen = SymmetricEigen::new(s.clone());
    let kept: Vec<DVector<f64>> = s_eigen
        .eigenvalues
        .iter()
        .enumerate()
        .filter(|&(_, &lambda)| lambda > LINEAR_DEPENDENCE_THRESHOLD)
        .map(|(i, &lambda)| s_eigen.eigenvectors.column(i) / lambda.sqrt())
        .collect();

    if kept.is_empty() {
        return BlockSolution {
            energies: Vec::new(),
            coefficients: DMatrix::zeros(n, 0),
        };
    }
    let dropped = n - kept.len();
    if dropped > 0 {
        output::print_warning(&format!(
            "Removed {} linearly dependent basis combinations",
            dropped
        ));
    }

    let x = DMatrix::from_columns(&kept);
    let h_prime = x.transpose() * h * &x;
    let h_eigen = SymmetricEigen::new(h_prime);

    let mut order: Vec<usize> = (0..h_eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| h_eigen.eigenvalues[a].total_cmp(&h_eigen.eigenvalues[b]));

    let columns: Vec<DVector<f64>> = order
        .iter()
        .map(|&i| &x * h_eigen.eigenvectors.column(i))
        .collect();

    BlockSolution {
        energies: order.iter().map(|&i| h_eigen.eigenvalues[i]).collect(),
        coefficients: DMatrix::from_columns(&columns),
    }
}

/// 每个轨道最多容纳的电子数
fn capacity(kind: OrbitalKind) -> f64 {
    match kind {
        OrbitalKind::Restricted => 2.0,
        OrbitalKind::Alpha | OrbitalKind::Beta => 1.0,
    }
}

/// 该种类轨道应容纳的电子数
fn electron_count(wfn: &Wavefunction, kind: OrbitalKind) -> f64 {
    let current = wfn
        .mo
        .get(&kind)
        .map_or(0.0, |set| set.n_electrons().round());
    if current > 0.0 {
        return current;
    }

    let nuclear: f64 = wfn.basis_set.centers.iter().map(|c| c.charge).sum::<f64>().round();
    output::print_warning(&format!(
        "No {} occupations in the input, counting electrons from nuclear charges ({})",
        kind, nuclear
    ));
    match kind {
        OrbitalKind::Restricted => nuclear,
        OrbitalKind::Alpha => (nuclear / 2.0).ceil(),
        OrbitalKind::Beta => (nuclear / 2.0).floor(),
    }
}

/// 由 S 与 H 构造初猜轨道
///
/// 返回替换 `wfn.mo` 用的新轨道；每个种类沿用当前轨道的基组引用。
pub fn guessorb(wfn: &Wavefunction) -> Result<BTreeMap<OrbitalKind, OrbitalSet>> {
    let overlap = wfn.overlap.as_ref().ok_or_else(|| {
        WfnError::DataNotAvailable("Initial orbital guess needs the overlap matrix".to_string())
    })?;
    let hamiltonian = wfn.one_electron.as_ref().ok_or_else(|| {
        WfnError::DataNotAvailable(
            "Initial orbital guess needs the one-electron Hamiltonian".to_string(),
        )
    })?;

    let solutions: Vec<BlockSolution> = overlap
        .iter()
        .zip(hamiltonian)
        .map(|(s, h)| solve_block(s, h))
        .collect();

    // (能量, 块, 块内下标)，按能量升序
    let mut levels: Vec<(f64, usize, usize)> = solutions
        .iter()
        .enumerate()
        .flat_map(|(sym, sol)| {
            sol.energies
                .iter()
                .enumerate()
                .map(move |(i, &e)| (e, sym, i))
        })
        .collect();
    levels.sort_by(|a, b| a.0.total_cmp(&b.0));

    let kinds: Vec<OrbitalKind> = if wfn.mo.is_empty() {
        vec![OrbitalKind::Restricted]
    } else {
        wfn.mo.keys().copied().collect()
    };

    let mut result = BTreeMap::new();
    for kind in kinds {
        let mut occupations: Vec<Vec<f64>> = solutions
            .iter()
            .map(|sol| vec![0.0; sol.energies.len()])
            .collect();
        let mut remaining = electron_count(wfn, kind);
        for &(_, sym, i) in &levels {
            if remaining <= 0.0 {
                break;
            }
            let occ = remaining.min(capacity(kind));
            occupations[sym][i] = occ;
            remaining -= occ;
        }
        if remaining > 0.0 {
            output::print_warning(&format!(
                "{} {} electrons could not be placed in the guess orbitals",
                remaining, kind
            ));
        }

        let basis = wfn
            .mo
            .get(&kind)
            .map_or_else(|| Rc::clone(&wfn.basis_set), |set| Rc::clone(&set.basis_set));
        let mut set = OrbitalSet::from_blocks(
            basis,
            solutions.iter().map(|sol| sol.coefficients.clone()).collect(),
        );
        set.energies = solutions.iter().flat_map(|sol| sol.energies.clone()).collect();
        set.occupations = occupations.into_iter().flatten().collect();
        set.types = set
            .occupations
            .iter()
            .map(|&occ| {
                if occ > 0.0 {
                    OrbitalType::Inactive
                } else {
                    OrbitalType::Secondary
                }
            })
            .collect();
        result.insert(kind, set);
    }

    output::print_info(&format!(
        "Built guess orbitals from the one-electron Hamiltonian ({} levels)",
        levels.len()
    ));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{h2_symmetric, h2_wavefunction, H2_H_DIAG, H2_H_OFF, H2_OVERLAP};

    #[test]
    fn test_guess_h2_energies() {
        let wfn = h2_wavefunction();
        let guess = guessorb(&wfn).unwrap();
        let set = &guess[&OrbitalKind::Restricted];

        let e_g = (H2_H_DIAG + H2_H_OFF) / (1.0 + H2_OVERLAP);
        let e_u = (H2_H_DIAG - H2_H_OFF) / (1.0 - H2_OVERLAP);
        assert!((set.energies[0] - e_g).abs() < 1e-8);
        assert!((set.energies[1] - e_u).abs() < 1e-8);
        assert_eq!(set.occupations, vec![2.0, 0.0]);
        assert_eq!(set.types, vec![OrbitalType::Inactive, OrbitalType::Secondary]);

        // C^T S C = 1
        let c = &set.coefficients[0];
        let s = &wfn.overlap.as_ref().unwrap()[0];
        let metric = c.transpose() * s * c;
        assert!((metric - DMatrix::<f64>::identity(2, 2)).abs().max() < 1e-8);
    }

    #[test]
    fn test_guess_keeps_basis_reference() {
        let wfn = h2_wavefunction();
        let guess = guessorb(&wfn).unwrap();
        assert!(Rc::ptr_eq(
            &guess[&OrbitalKind::Restricted].basis_set,
            &wfn.mo[&OrbitalKind::Restricted].basis_set
        ));
    }

    #[test]
    fn test_guess_per_block_aufbau() {
        let wfn = h2_symmetric();
        let guess = guessorb(&wfn).unwrap();
        let set = &guess[&OrbitalKind::Restricted];
        assert_eq!(set.n_orb(), vec![1, 1]);
        assert_eq!(set.occupations, vec![2.0, 0.0]);
        assert_eq!(set.irreps, vec![0, 1]);
    }

    #[test]
    fn test_guess_unrestricted_capacity() {
        let mut wfn = h2_wavefunction();
        let mut alpha = wfn.mo.remove(&OrbitalKind::Restricted).unwrap();
        alpha.occupations = vec![1.0, 0.0];
        let mut beta = alpha.clone();
        beta.occupations = vec![1.0, 0.0];
        wfn.mo.insert(OrbitalKind::Alpha, alpha);
        wfn.mo.insert(OrbitalKind::Beta, beta);

        let guess = guessorb(&wfn).unwrap();
        assert_eq!(guess.len(), 2);
        assert_eq!(guess[&OrbitalKind::Alpha].occupations, vec![1.0, 0.0]);
        assert_eq!(guess[&OrbitalKind::Beta].occupations, vec![1.0, 0.0]);
    }

    #[test]
    fn test_guess_needs_hamiltonian() {
        let mut wfn = h2_wavefunction();
        wfn.one_electron = None;
        assert!(matches!(
            guessorb(&wfn),
            Err(WfnError::DataNotAvailable(_))
        ));
    }
}
