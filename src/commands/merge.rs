//! # 轨道合并 (--joinorb)
//!
//! 用一个 INPORB 文件中的轨道替换输入波函数的轨道，同时保留输入波函数的基组描述。
//! INPORB 不带基组信息，因此新轨道改为引用输入中同种类轨道的 `Rc<BasisSet>`
//! (同一个对象，不复制)。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`, `parsers/inporb.rs`

use crate::error::{Result, WfnError};
use crate::models::Wavefunction;
use crate::parsers::inporb;
use crate::utils::output;

use std::path::Path;
use std::rc::Rc;

/// 读取 --joinorb 指定的 INPORB 文件
///
/// 文件不存在与格式不符分别报告，不经过格式探测。
pub fn read_joinorb(path: &Path) -> Result<Wavefunction> {
    if !path.exists() {
        return Err(WfnError::JoinOrbNotFound {
            path: path.display().to_string(),
        });
    }

    inporb::parse_inporb_file(path).map_err(|e| WfnError::JoinOrbFormat {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// 把 `secondary` 的轨道合并进 `primary`
///
/// 结果的轨道种类与 `secondary` 完全一致；每个种类都必须在 `primary` 中存在。
/// `n_sym` 与 `n_bas` 随轨道一起取自 `secondary`，其余数据保留 `primary` 的。
pub fn join_orbitals(primary: Wavefunction, secondary: Wavefunction) -> Result<Wavefunction> {
    let mut mo = secondary.mo;
    for (kind, set) in mo.iter_mut() {
        let source = primary
            .mo
            .get(kind)
            .ok_or_else(|| WfnError::MissingOrbitalKind {
                kind: kind.to_string(),
            })?;
        set.basis_set = Rc::clone(&source.basis_set);
    }

    let dropped: Vec<String> = primary
        .mo
        .keys()
        .filter(|k| !mo.contains_key(*k))
        .map(|k| k.to_string())
        .collect();
    if !dropped.is_empty() {
        output::print_warning(&format!(
            "Joined orbitals replace all input orbitals, dropping: {}",
            dropped.join(", ")
        ));
    }

    output::print_info(&format!(
        "Joined {} orbital set(s) into the input wavefunction",
        mo.len()
    ));

    Ok(Wavefunction {
        mo,
        n_sym: secondary.n_sym,
        n_bas: secondary.n_bas,
        ..primary
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::h2_wavefunction;
    use crate::models::{BasisSet, OrbitalKind, OrbitalSet};
    use nalgebra::DMatrix;
    use std::io::Write;

    fn anonymous_set(n: usize) -> OrbitalSet {
        OrbitalSet::from_blocks(
            Rc::new(BasisSet::anonymous(n)),
            vec![DMatrix::identity(n, n)],
        )
    }

    /// 三个种类的主波函数 (restricted, alpha, beta)
    fn primary_abc() -> Wavefunction {
        let mut wfn = h2_wavefunction();
        let restricted = wfn.mo[&OrbitalKind::Restricted].clone();
        wfn.mo.insert(OrbitalKind::Alpha, restricted.clone());
        wfn.mo.insert(OrbitalKind::Beta, restricted);
        wfn
    }

    #[test]
    fn test_join_keeps_secondary_keys_and_primary_basis() {
        let primary = primary_abc();
        let alpha_basis = Rc::clone(&primary.mo[&OrbitalKind::Alpha].basis_set);
        let beta_basis = Rc::clone(&primary.mo[&OrbitalKind::Beta].basis_set);

        let mut secondary = Wavefunction::new("other", vec![2], Rc::new(BasisSet::anonymous(2)));
        secondary.mo.insert(OrbitalKind::Alpha, anonymous_set(2));
        secondary.mo.insert(OrbitalKind::Beta, anonymous_set(2));
        let secondary_alpha = Rc::clone(&secondary.mo[&OrbitalKind::Alpha].basis_set);

        let merged = join_orbitals(primary, secondary).unwrap();

        let keys: Vec<OrbitalKind> = merged.mo.keys().copied().collect();
        assert_eq!(keys, vec![OrbitalKind::Alpha, OrbitalKind::Beta]);
        assert!(Rc::ptr_eq(&merged.mo[&OrbitalKind::Alpha].basis_set, &alpha_basis));
        assert!(Rc::ptr_eq(&merged.mo[&OrbitalKind::Beta].basis_set, &beta_basis));
        assert!(!Rc::ptr_eq(&merged.mo[&OrbitalKind::Alpha].basis_set, &secondary_alpha));

        // 其余数据来自主波函数
        assert_eq!(merged.title, "H2 STO-3G");
        assert!(merged.overlap.is_some());
        merged.validate().unwrap();
    }

    #[test]
    fn test_join_missing_kind() {
        let primary = h2_wavefunction();
        let mut secondary = Wavefunction::new("other", vec![2], Rc::new(BasisSet::anonymous(2)));
        secondary.mo.insert(OrbitalKind::Alpha, anonymous_set(2));

        let err = join_orbitals(primary, secondary).unwrap_err();
        assert!(matches!(err, WfnError::MissingOrbitalKind { ref kind } if kind == "alpha"));
    }

    #[test]
    fn test_join_takes_block_structure() {
        let primary = h2_wavefunction();
        let mut secondary =
            Wavefunction::new("other", vec![1, 1], Rc::new(BasisSet::anonymous(2)));
        secondary.mo.insert(
            OrbitalKind::Restricted,
            OrbitalSet::from_blocks(
                Rc::new(BasisSet::anonymous(2)),
                vec![DMatrix::identity(1, 1), DMatrix::identity(1, 1)],
            ),
        );
        let merged = join_orbitals(primary, secondary).unwrap();
        assert_eq!(merged.n_sym, 2);
        assert_eq!(merged.n_bas, vec![1, 1]);
    }

    #[test]
    fn test_read_joinorb_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.inporb");
        assert!(matches!(
            read_joinorb(&missing),
            Err(WfnError::JoinOrbNotFound { .. })
        ));

        let bogus = dir.path().join("bogus.inporb");
        let mut file = std::fs::File::create(&bogus).unwrap();
        writeln!(file, "not an orbital file").unwrap();
        assert!(matches!(
            read_joinorb(&bogus),
            Err(WfnError::JoinOrbFormat { .. })
        ));
    }
}
