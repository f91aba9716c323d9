//! # 轨道列表
//!
//! 每个轨道一行摘要 (对称块、块内序号、类型、能量、占据)，随后是按宽度换行的系数。
//! 所有轨道类型已知时按块内自然次序 (类型优先) 列出，否则按文件次序。
//!
//! ## 依赖关系
//! - 被 `report/mod.rs` 导出
//! - 使用 `models/`

use super::{write_wrapped, ReportOptions};
use crate::error::Result;
use crate::models::wavefunction::block_offsets;
use crate::models::{OrbitalSet, OrbitalType, Wavefunction};
use crate::utils::output;

use std::io::Write;

/// 块内按类型排序的下标；有未知类型时返回 None
fn native_order(set: &OrbitalSet) -> Option<Vec<usize>> {
    if set.types.iter().any(|t| *t == OrbitalType::Unknown) {
        return None;
    }
    let mut order: Vec<usize> = (0..set.n_orbitals()).collect();
    order.sort_by_key(|&i| {
        let (sym, _) = set.locate(i).unwrap_or((usize::MAX, i));
        (sym, set.types[i].rank(), i)
    });
    Some(order)
}

/// 列出轨道
pub fn print_orbitals<W: Write>(wfn: &Wavefunction, opts: &ReportOptions, w: &mut W) -> Result<()> {
    for (kind, set) in &wfn.mo {
        if wfn.is_unrestricted() {
            writeln!(w, "Molecular orbitals ({})", kind)?;
        } else {
            writeln!(w, "Molecular orbitals")?;
        }

        let order = native_order(set).unwrap_or_else(|| {
            output::print_debug(&format!(
                "Some {} orbitals have no type index, listing them in file order",
                kind
            ));
            (0..set.n_orbitals()).collect()
        });

        let rows: Vec<usize> = set.coefficients.iter().map(|c| c.nrows()).collect();
        let offsets = block_offsets(&rows);

        for index in order {
            let kind_of = set.types[index];
            if !opts.accepts_type(kind_of) {
                continue;
            }
            let Some((sym, local)) = set.locate(index) else {
                continue;
            };

            writeln!(
                w,
                "Orbital {:>5}  symmetry {} ({})  index {:>4}  type {}  energy {:>14.6}  occupation {:>8.4}",
                index + 1,
                sym + 1,
                wfn.irrep_label(set.irreps[index]),
                local + 1,
                kind_of.to_char(),
                set.energies[index],
                set.occupations[index]
            )?;

            let column = set.coefficients[sym].column(local);
            let entries: Vec<String> = column
                .iter()
                .enumerate()
                .filter_map(|(row, value)| {
                    let label = set.basis_set.function_label(offsets[sym] + row);
                    opts.matches(&label)
                        .then(|| format!("{:>10} {:>10.6}", label, value))
                })
                .collect();
            write_wrapped(w, &entries, opts.linewidth, "  ")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::h2_wavefunction;
    use crate::models::OrbitalKind;

    fn render(wfn: &Wavefunction, opts: &ReportOptions) -> String {
        let mut buf = Vec::new();
        print_orbitals(wfn, opts, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_lists_all_orbitals() {
        let text = render(&h2_wavefunction(), &ReportOptions::default());
        assert!(text.starts_with("Molecular orbitals\n"));
        assert_eq!(text.matches("Orbital ").count(), 2);
        assert!(text.contains("type i"));
        assert!(text.contains("H1:1s"));
        assert!(text.contains("H2:1s"));
    }

    #[test]
    fn test_native_order_puts_type_first() {
        let mut wfn = h2_wavefunction();
        if let Some(set) = wfn.mo.get_mut(&OrbitalKind::Restricted) {
            set.types = vec![OrbitalType::Secondary, OrbitalType::Inactive];
        }
        let text = render(&wfn, &ReportOptions::default());
        let first = text.find("type i").unwrap();
        let second = text.find("type s").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_unknown_types_fall_back_to_file_order() {
        let mut wfn = h2_wavefunction();
        if let Some(set) = wfn.mo.get_mut(&OrbitalKind::Restricted) {
            set.types = vec![OrbitalType::Unknown, OrbitalType::Inactive];
        }
        assert!(native_order(&wfn.mo[&OrbitalKind::Restricted]).is_none());
        let text = render(&wfn, &ReportOptions::default());
        assert!(text.find("type ?").unwrap() < text.find("type i").unwrap());
    }

    #[test]
    fn test_filters_apply() {
        let opts = ReportOptions::new(80, Some("^H2"), Some("i")).unwrap();
        let text = render(&h2_wavefunction(), &opts);
        assert_eq!(text.matches("Orbital ").count(), 1);
        assert!(text.contains("H2:1s"));
        assert!(!text.contains("H1:1s"));
    }
}
