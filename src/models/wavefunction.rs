//! # 波函数数据模型
//!
//! `Wavefunction` 是整条转换流水线上传递的唯一值：
//! - `mo`: 轨道种类 -> `OrbitalSet`
//! - `n_sym` / `n_bas`: 对称块个数与每块基函数数 (`n_bas.len() == n_sym`)
//! - `basis_set`: 共享的基组描述
//!
//! 每个 `OrbitalSet` 自己持有一份 `Rc<BasisSet>`，可以独立于
//! `Wavefunction::basis_set` 重新指向 (见 `commands/merge.rs`)。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `transform/`, `commands/`, `report/` 使用
//! - 使用 `models/basis.rs`

use crate::error::{Result, WfnError};
use crate::models::basis::BasisSet;

use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::rc::Rc;

/// 轨道种类 (自旋通道)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrbitalKind {
    Restricted,
    Alpha,
    Beta,
}

impl std::fmt::Display for OrbitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbitalKind::Restricted => write!(f, "restricted"),
            OrbitalKind::Alpha => write!(f, "alpha"),
            OrbitalKind::Beta => write!(f, "beta"),
        }
    }
}

/// 轨道类型，对应 INPORB `#INDEX` 中的字符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrbitalType {
    Frozen,
    Inactive,
    Ras1,
    Ras2,
    Ras3,
    Secondary,
    Deleted,
    Unknown,
}

impl OrbitalType {
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'f' => OrbitalType::Frozen,
            'i' => OrbitalType::Inactive,
            '1' => OrbitalType::Ras1,
            '2' => OrbitalType::Ras2,
            '3' => OrbitalType::Ras3,
            's' => OrbitalType::Secondary,
            'd' => OrbitalType::Deleted,
            _ => OrbitalType::Unknown,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            OrbitalType::Frozen => 'f',
            OrbitalType::Inactive => 'i',
            OrbitalType::Ras1 => '1',
            OrbitalType::Ras2 => '2',
            OrbitalType::Ras3 => '3',
            OrbitalType::Secondary => 's',
            OrbitalType::Deleted => 'd',
            OrbitalType::Unknown => '?',
        }
    }

    /// 块内的自然次序 f < i < 1 < 2 < 3 < s < d
    pub fn rank(self) -> u8 {
        match self {
            OrbitalType::Frozen => 0,
            OrbitalType::Inactive => 1,
            OrbitalType::Ras1 => 2,
            OrbitalType::Ras2 => 3,
            OrbitalType::Ras3 => 4,
            OrbitalType::Secondary => 5,
            OrbitalType::Deleted => 6,
            OrbitalType::Unknown => 7,
        }
    }
}

/// 单个自旋通道的轨道
#[derive(Debug, Clone)]
pub struct OrbitalSet {
    /// 轨道系数所基于的基组
    pub basis_set: Rc<BasisSet>,

    /// 每个对称块一个矩阵，形状 n_bas[i] x n_orb[i]，每列一个轨道
    pub coefficients: Vec<DMatrix<f64>>,

    /// 以下向量均按块顺序展平，每个轨道一项
    pub energies: Vec<f64>,
    pub occupations: Vec<f64>,
    pub irreps: Vec<usize>,
    pub types: Vec<OrbitalType>,
}

impl OrbitalSet {
    /// 由系数块构造，其余信息填默认值 (能量 0、占据 0、irrep 为块序号、类型未知)
    pub fn from_blocks(basis_set: Rc<BasisSet>, coefficients: Vec<DMatrix<f64>>) -> Self {
        let irreps: Vec<usize> = coefficients
            .iter()
            .enumerate()
            .flat_map(|(sym, block)| std::iter::repeat(sym).take(block.ncols()))
            .collect();
        let n = irreps.len();
        OrbitalSet {
            basis_set,
            coefficients,
            energies: vec![0.0; n],
            occupations: vec![0.0; n],
            irreps,
            types: vec![OrbitalType::Unknown; n],
        }
    }

    pub fn n_orbitals(&self) -> usize {
        self.coefficients.iter().map(|c| c.ncols()).sum()
    }

    /// 每个对称块的轨道数
    pub fn n_orb(&self) -> Vec<usize> {
        self.coefficients.iter().map(|c| c.ncols()).collect()
    }

    /// 展平下标 -> (对称块, 块内下标)
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (sym, block) in self.coefficients.iter().enumerate() {
            if index < offset + block.ncols() {
                return Some((sym, index - offset));
            }
            offset += block.ncols();
        }
        None
    }

    pub fn n_electrons(&self) -> f64 {
        self.occupations.iter().sum()
    }

    fn validate(&self, kind: OrbitalKind, n_bas: &[usize]) -> Result<()> {
        if self.coefficients.len() != n_bas.len() {
            return Err(WfnError::InconsistentWavefunction(format!(
                "{} orbitals have {} symmetry blocks, expected {}",
                kind,
                self.coefficients.len(),
                n_bas.len()
            )));
        }
        for (sym, (block, &nb)) in self.coefficients.iter().zip(n_bas).enumerate() {
            if block.nrows() != nb {
                return Err(WfnError::InconsistentWavefunction(format!(
                    "{} orbitals in symmetry {} have {} basis functions, expected {}",
                    kind,
                    sym + 1,
                    block.nrows(),
                    nb
                )));
            }
        }

        let n = self.n_orbitals();
        let lengths = [
            ("energies", self.energies.len()),
            ("occupations", self.occupations.len()),
            ("irreps", self.irreps.len()),
            ("type indices", self.types.len()),
        ];
        for (what, len) in lengths {
            if len != n {
                return Err(WfnError::InconsistentWavefunction(format!(
                    "{} orbitals: {} {} for {} orbitals",
                    kind, len, what, n
                )));
            }
        }

        let total: usize = n_bas.iter().sum();
        if self.basis_set.n_functions() != total {
            return Err(WfnError::InconsistentWavefunction(format!(
                "{} orbitals refer to a basis of {} functions, expected {}",
                kind,
                self.basis_set.n_functions(),
                total
            )));
        }
        Ok(())
    }
}

/// 对称化/去对称化所需的信息
#[derive(Debug, Clone)]
pub struct SymmetryData {
    /// 去对称化矩阵 D (AO x SO)，SO 按对称块排列: C_ao = D * C_so
    pub desym_matrix: DMatrix<f64>,

    /// 对称表示下每块基函数数
    pub n_bas: Vec<usize>,

    /// SO 基组 (对称表示)
    pub symmetric_basis: Rc<BasisSet>,

    /// AO 基组 (去对称化表示)
    pub desymmetrized_basis: Rc<BasisSet>,

    /// 不可约表示标签，如 `a1`, `b2`
    pub irrep_labels: Vec<String>,
}

/// 波函数
#[derive(Debug, Clone)]
pub struct Wavefunction {
    pub title: String,

    /// 生成该波函数的程序模块 (如 SCF, RASSCF)
    pub module: Option<String>,

    pub n_sym: usize,
    pub n_bas: Vec<usize>,
    pub basis_set: Rc<BasisSet>,
    pub mo: BTreeMap<OrbitalKind, OrbitalSet>,

    /// 每块重叠矩阵
    pub overlap: Option<Vec<DMatrix<f64>>>,

    /// 每块单电子 (核) 哈密顿量
    pub one_electron: Option<Vec<DMatrix<f64>>>,

    pub symmetry: Option<Rc<SymmetryData>>,

    /// 来源文件格式
    pub source_format: Option<String>,
}

impl Wavefunction {
    pub fn new(title: impl Into<String>, n_bas: Vec<usize>, basis_set: Rc<BasisSet>) -> Self {
        Wavefunction {
            title: title.into(),
            module: None,
            n_sym: n_bas.len(),
            n_bas,
            basis_set,
            mo: BTreeMap::new(),
            overlap: None,
            one_electron: None,
            symmetry: None,
            source_format: None,
        }
    }

    pub fn n_bas_total(&self) -> usize {
        self.n_bas.iter().sum()
    }

    /// 每个对称块在展平基函数中的起始位置
    pub fn bas_offsets(&self) -> Vec<usize> {
        block_offsets(&self.n_bas)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.mo.contains_key(&OrbitalKind::Alpha) || self.mo.contains_key(&OrbitalKind::Beta)
    }

    /// 不可约表示标签，没有对称信息时用 1 起始的编号
    pub fn irrep_label(&self, irrep: usize) -> String {
        self.symmetry
            .as_ref()
            .and_then(|s| s.irrep_labels.get(irrep))
            .cloned()
            .unwrap_or_else(|| (irrep + 1).to_string())
    }

    /// 检查 `n_sym`, `n_bas`, 轨道与矩阵的尺寸是否一致
    pub fn validate(&self) -> Result<()> {
        if self.n_bas.len() != self.n_sym {
            return Err(WfnError::InconsistentWavefunction(format!(
                "{} basis block sizes for {} symmetry blocks",
                self.n_bas.len(),
                self.n_sym
            )));
        }

        for (kind, set) in &self.mo {
            set.validate(*kind, &self.n_bas)?;
        }

        let square = |name: &str, blocks: &Option<Vec<DMatrix<f64>>>| -> Result<()> {
            let Some(blocks) = blocks else {
                return Ok(());
            };
            let ok = blocks.len() == self.n_sym
                && blocks
                    .iter()
                    .zip(&self.n_bas)
                    .all(|(m, &nb)| m.nrows() == nb && m.ncols() == nb);
            if ok {
                Ok(())
            } else {
                Err(WfnError::InconsistentWavefunction(format!(
                    "{} blocks do not match the basis dimensions",
                    name
                )))
            }
        };
        square("overlap matrix", &self.overlap)?;
        square("one-electron Hamiltonian", &self.one_electron)?;

        Ok(())
    }
}

/// 块起始位置
pub fn block_offsets(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |acc, &n| {
            let start = *acc;
            *acc += n;
            Some(start)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_block_wavefunction() -> Wavefunction {
        let basis = Rc::new(BasisSet::anonymous(3));
        let mut wfn = Wavefunction::new("test", vec![2, 1], Rc::clone(&basis));
        let set = OrbitalSet::from_blocks(
            basis,
            vec![DMatrix::identity(2, 2), DMatrix::identity(1, 1)],
        );
        wfn.mo.insert(OrbitalKind::Restricted, set);
        wfn
    }

    #[test]
    fn test_validate_ok() {
        let wfn = two_block_wavefunction();
        assert!(wfn.validate().is_ok());
        assert_eq!(wfn.bas_offsets(), vec![0, 2]);
    }

    #[test]
    fn test_validate_n_sym_mismatch() {
        let mut wfn = two_block_wavefunction();
        wfn.n_sym = 3;
        assert!(matches!(
            wfn.validate(),
            Err(WfnError::InconsistentWavefunction(_))
        ));
    }

    #[test]
    fn test_validate_basis_size_mismatch() {
        let mut wfn = two_block_wavefunction();
        if let Some(set) = wfn.mo.get_mut(&OrbitalKind::Restricted) {
            set.basis_set = Rc::new(BasisSet::anonymous(5));
        }
        assert!(wfn.validate().is_err());
    }

    #[test]
    fn test_locate_and_irreps() {
        let wfn = two_block_wavefunction();
        let set = &wfn.mo[&OrbitalKind::Restricted];
        assert_eq!(set.irreps, vec![0, 0, 1]);
        assert_eq!(set.locate(2), Some((1, 0)));
        assert_eq!(set.locate(3), None);
    }

    #[test]
    fn test_orbital_type_chars() {
        for c in ['f', 'i', '1', '2', '3', 's', 'd'] {
            assert_eq!(OrbitalType::from_char(c).to_char(), c);
        }
        assert_eq!(OrbitalType::from_char('x'), OrbitalType::Unknown);
        assert!(OrbitalType::Inactive.rank() < OrbitalType::Secondary.rank());
    }

    #[test]
    fn test_irrep_label_fallback() {
        let wfn = two_block_wavefunction();
        assert_eq!(wfn.irrep_label(0), "1");
    }
}
