//! # 对称类型与 SUPSYM 报告
//!
//! - `print_symmetry_species`: 每个轨道的不可约表示标签
//! - `print_supsym`: 按不可约表示分组的轨道序号，可直接用作 SUPSYM 输入
//!
//! ## 依赖关系
//! - 被 `report/mod.rs` 导出
//! - 使用 `models/`

use super::{write_wrapped, ReportOptions};
use crate::error::Result;
use crate::models::Wavefunction;
use crate::utils::output;

use std::collections::BTreeMap;
use std::io::Write;

/// 列出每个轨道的对称类型
pub fn print_symmetry_species<W: Write>(
    wfn: &Wavefunction,
    opts: &ReportOptions,
    w: &mut W,
) -> Result<()> {
    writeln!(w, "Symmetry species")?;
    for (kind, set) in &wfn.mo {
        if wfn.is_unrestricted() {
            writeln!(w, "{}:", kind)?;
        }
        for (index, (&irrep, &kind_of)) in set.irreps.iter().zip(&set.types).enumerate() {
            let label = wfn.irrep_label(irrep);
            if !opts.accepts_type(kind_of) || !opts.matches(&label) {
                continue;
            }
            writeln!(w, "{:>5}  {}", index + 1, label)?;
        }
    }
    Ok(())
}

/// 按不可约表示分组列出轨道序号 (1 起始)
///
/// 每个种类: 标题行、不同 irrep 的个数，然后每个 irrep 一行 `个数 序号...`。
pub fn print_supsym<W: Write>(wfn: &Wavefunction, opts: &ReportOptions, w: &mut W) -> Result<()> {
    for (kind, set) in &wfn.mo {
        writeln!(w, "SUPSYM ({})", kind)?;

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, &irrep) in set.irreps.iter().enumerate() {
            groups.entry(irrep).or_default().push(index + 1);
        }

        writeln!(w, "{}", groups.len())?;
        for (irrep, members) in &groups {
            let mut entries = Vec::with_capacity(members.len() + 1);
            entries.push(members.len().to_string());
            entries.extend(members.iter().map(|m| m.to_string()));
            output::print_debug(&format!(
                "SUPSYM group {} ({} orbitals)",
                wfn.irrep_label(*irrep),
                members.len()
            ));
            write_wrapped(w, &entries, opts.linewidth, "")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::h2_symmetric;
    use crate::models::OrbitalKind;
    use crate::transform::desymmetrize;

    fn species(wfn: &Wavefunction, opts: &ReportOptions) -> String {
        let mut buf = Vec::new();
        print_symmetry_species(wfn, opts, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_symmetry_species() {
        let text = species(&h2_symmetric(), &ReportOptions::default());
        assert_eq!(text, "Symmetry species\n    1  ag\n    2  b1u\n");
    }

    #[test]
    fn test_symmetry_species_match() {
        let opts = ReportOptions::new(80, Some("^b"), None).unwrap();
        let text = species(&h2_symmetric(), &opts);
        assert_eq!(text, "Symmetry species\n    2  b1u\n");
    }

    #[test]
    fn test_supsym_groups() {
        let mut wfn = desymmetrize(h2_symmetric()).unwrap();
        if let Some(set) = wfn.mo.get_mut(&OrbitalKind::Restricted) {
            set.irreps = vec![1, 0];
        }
        let mut buf = Vec::new();
        print_supsym(&wfn, &ReportOptions::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "SUPSYM (restricted)\n2\n1 2\n1 1\n");
    }
}
