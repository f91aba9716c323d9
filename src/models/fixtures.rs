//! 测试共用的小体系: H2 最小基组
use crate::models::{
    BasisFunction, BasisSet, Center, OrbitalKind, OrbitalSet, OrbitalType, Primitive,
    SymmetryData, Wavefunction,
};
use nalgebra::DMatrix;
use std::rc::Rc;

pub fn h2_basis() -> BasisSet {
    let mut basis = BasisSet::new(
        vec![
            Center::new("H1", 1.0, [0.0, 0.0, -0.7]),
            Center::new("H2", 1.0, [0.0, 0.0, 0.7]),
        ],
        vec![BasisFunction::new(0, 1, 0, 0), BasisFunction::new(1, 1, 0, 0)],
    );
    basis.primitives = Some(vec![
        Primitive { center: 0, l: 0, shell: 1, exponent: 3.42525091, coefficient: 0.15432897 },
        Primitive { center: 0, l: 0, shell: 1, exponent: 0.62391373, coefficient: 0.53532814 },
        Primitive { center: 1, l: 0, shell: 1, exponent: 3.42525091, coefficient: 0.15432897 },
        Primitive { center: 1, l: 0, shell: 1, exponent: 0.62391373, coefficient: 0.53532814 },
    ]);
    basis
}

/// 重叠矩阵 S = [[1, s], [s, 1]]，核哈密顿量 H = [[a, b], [b, a]]
pub const H2_OVERLAP: f64 = 0.6593;
pub const H2_H_DIAG: f64 = -1.1204;
pub const H2_H_OFF: f64 = -0.9584;

pub fn h2_wavefunction() -> Wavefunction {
    let basis = Rc::new(h2_basis());
    let mut wfn = Wavefunction::new("H2 STO-3G", vec![2], Rc::clone(&basis));

    let ng = 1.0 / (2.0 * (1.0 + H2_OVERLAP)).sqrt();
    let nu = 1.0 / (2.0 * (1.0 - H2_OVERLAP)).sqrt();
    let c = DMatrix::from_column_slice(2, 2, &[ng, ng, nu, -nu]);
    let mut set = OrbitalSet::from_blocks(basis, vec![c]);
    set.energies = vec![-0.5782, 0.6703];
    set.occupations = vec![2.0, 0.0];
    set.types = vec![OrbitalType::Inactive, OrbitalType::Secondary];
    wfn.mo.insert(OrbitalKind::Restricted, set);

    wfn.overlap = Some(vec![DMatrix::from_row_slice(
        2,
        2,
        &[1.0, H2_OVERLAP, H2_OVERLAP, 1.0],
    )]);
    wfn.one_electron = Some(vec![DMatrix::from_row_slice(
        2,
        2,
        &[H2_H_DIAG, H2_H_OFF, H2_H_OFF, H2_H_DIAG],
    )]);
    wfn
}

/// 同一体系的对称块表示: g = (h1 + h2)/sqrt2, u = (h1 - h2)/sqrt2
pub fn h2_symmetric() -> Wavefunction {
    let s = H2_OVERLAP;
    let so_basis = Rc::new(BasisSet::new(
        vec![Center::new("H1", 1.0, [0.0, 0.0, -0.7])],
        vec![BasisFunction::new(0, 1, 0, 0), BasisFunction::new(0, 2, 0, 0)],
    ));
    let ao_basis = Rc::new(h2_basis());

    let r = std::f64::consts::FRAC_1_SQRT_2;
    let symmetry = SymmetryData {
        desym_matrix: DMatrix::from_row_slice(2, 2, &[r, r, r, -r]),
        n_bas: vec![1, 1],
        symmetric_basis: Rc::clone(&so_basis),
        desymmetrized_basis: ao_basis,
        irrep_labels: vec!["ag".to_string(), "b1u".to_string()],
    };

    let mut wfn = Wavefunction::new("H2 STO-3G", vec![1, 1], Rc::clone(&so_basis));
    let mut set = OrbitalSet::from_blocks(
        so_basis,
        vec![
            DMatrix::from_element(1, 1, 1.0 / (1.0 + s).sqrt()),
            DMatrix::from_element(1, 1, 1.0 / (1.0 - s).sqrt()),
        ],
    );
    set.energies = vec![-0.5782, 0.6703];
    set.occupations = vec![2.0, 0.0];
    set.types = vec![OrbitalType::Inactive, OrbitalType::Secondary];
    wfn.mo.insert(OrbitalKind::Restricted, set);

    wfn.overlap = Some(vec![
        DMatrix::from_element(1, 1, 1.0 + s),
        DMatrix::from_element(1, 1, 1.0 - s),
    ]);
    wfn.one_electron = Some(vec![
        DMatrix::from_element(1, 1, H2_H_DIAG + H2_H_OFF),
        DMatrix::from_element(1, 1, H2_H_DIAG - H2_H_OFF),
    ]);
    wfn.symmetry = Some(Rc::new(symmetry));
    wfn
}
