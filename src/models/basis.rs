//! # 基组描述数据模型
//!
//! 原子中心、基函数标识 (center, n, l, m) 以及可选的原始高斯函数。
//! `BasisSet` 构造后不再修改，通过 `Rc` 在 `Wavefunction` 与 `OrbitalSet` 之间共享。
//!
//! ## 依赖关系
//! - 被 `models/wavefunction.rs`, `parsers/`, `transform/`, `report/` 使用
//! - 无外部模块依赖

use std::collections::BTreeMap;

/// 原子中心
#[derive(Debug, Clone, PartialEq)]
pub struct Center {
    /// 中心标签，如 `C1`
    pub label: String,

    /// 核电荷
    pub charge: f64,

    /// 笛卡尔坐标 (bohr)
    pub coordinates: [f64; 3],
}

impl Center {
    pub fn new(label: impl Into<String>, charge: f64, coordinates: [f64; 3]) -> Self {
        Center {
            label: label.into(),
            charge,
            coordinates,
        }
    }
}

/// 单个基函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisFunction {
    /// 所属中心 (0 起始)，未知时为 None
    pub center: Option<usize>,

    /// 壳层编号 (同一中心同一 l 下从 1 开始)
    pub shell: i32,

    /// 角动量，-1 表示未知
    pub l: i32,

    /// 磁量子数 (实球谐函数)
    pub m: i32,
}

impl BasisFunction {
    pub fn new(center: usize, shell: i32, l: i32, m: i32) -> Self {
        BasisFunction {
            center: Some(center),
            shell,
            l,
            m,
        }
    }

    /// 只知道存在、不知道身份的基函数 (INPORB 文件中的基函数)
    pub fn unknown() -> Self {
        BasisFunction {
            center: None,
            shell: 0,
            l: -1,
            m: 0,
        }
    }

    pub fn is_known(&self) -> bool {
        self.center.is_some() && self.l >= 0
    }
}

/// 原始高斯函数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub center: usize,
    pub l: i32,
    pub shell: i32,
    pub exponent: f64,
    pub coefficient: f64,
}

/// 收缩壳层，由 `BasisSet::shells` 组装
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub center: usize,
    pub l: i32,
    pub shell: i32,
    /// (exponent, coefficient)
    pub primitives: Vec<(f64, f64)>,
}

/// 基组描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasisSet {
    pub centers: Vec<Center>,
    pub functions: Vec<BasisFunction>,
    pub primitives: Option<Vec<Primitive>>,
}

/// 角动量字母
pub fn angular_letter(l: i32) -> char {
    match l {
        0 => 's',
        1 => 'p',
        2 => 'd',
        3 => 'f',
        4 => 'g',
        5 => 'h',
        6 => 'i',
        7 => 'k',
        _ => '?',
    }
}

/// Molden / Gaussian 球谐函数分量次序
///
/// p: x(+1), y(-1), z(0)；l >= 2: 0, +1, -1, +2, -2, ...
pub fn component_rank(l: i32, m: i32) -> i32 {
    match l {
        0 => 0,
        1 => match m {
            1 => 0,
            -1 => 1,
            _ => 2,
        },
        _ => {
            if m == 0 {
                0
            } else if m > 0 {
                2 * m - 1
            } else {
                -2 * m
            }
        }
    }
}

impl BasisSet {
    pub fn new(centers: Vec<Center>, functions: Vec<BasisFunction>) -> Self {
        BasisSet {
            centers,
            functions,
            primitives: None,
        }
    }

    /// 只有基函数个数的基组
    pub fn anonymous(n_functions: usize) -> Self {
        BasisSet::new(Vec::new(), vec![BasisFunction::unknown(); n_functions])
    }

    pub fn n_functions(&self) -> usize {
        self.functions.len()
    }

    pub fn center_labels(&self) -> Vec<String> {
        self.centers.iter().map(|c| c.label.clone()).collect()
    }

    /// 所有基函数的中心与角动量均已知
    pub fn is_fully_labelled(&self) -> bool {
        !self.functions.is_empty()
            && self
                .functions
                .iter()
                .all(|f| f.is_known() && f.center.map_or(false, |c| c < self.centers.len()))
    }

    /// 基函数标签，如 `C1:2p+1`
    pub fn function_label(&self, index: usize) -> String {
        let Some(function) = self.functions.get(index) else {
            return format!("bf{}", index + 1);
        };
        let center = function
            .center
            .and_then(|c| self.centers.get(c))
            .map(|c| c.label.as_str());

        match center {
            Some(label) if function.l >= 0 => {
                let m = if function.l == 0 {
                    String::new()
                } else {
                    format!("{:+}", function.m)
                };
                format!(
                    "{}:{}{}{}",
                    label,
                    function.shell,
                    angular_letter(function.l),
                    m
                )
            }
            _ => format!("bf{}", index + 1),
        }
    }

    /// 按 (center, l, shell) 组装收缩壳层
    pub fn shells(&self) -> Option<Vec<Shell>> {
        let primitives = self.primitives.as_ref()?;
        let mut grouped: BTreeMap<(usize, i32, i32), Vec<(f64, f64)>> = BTreeMap::new();
        for p in primitives {
            grouped
                .entry((p.center, p.l, p.shell))
                .or_default()
                .push((p.exponent, p.coefficient));
        }

        Some(
            grouped
                .into_iter()
                .map(|((center, l, shell), primitives)| Shell {
                    center,
                    l,
                    shell,
                    primitives,
                })
                .collect(),
        )
    }

    /// 按 Molden/Gaussian 次序排列的基函数下标
    ///
    /// 与 `shells()` 的次序一致: center, l, shell, 分量。
    pub fn shell_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.functions.len()).collect();
        order.sort_by_key(|&i| {
            let f = &self.functions[i];
            (
                f.center.unwrap_or(usize::MAX),
                f.l,
                f.shell,
                component_rank(f.l, f.m),
            )
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_minimal() -> BasisSet {
        let centers = vec![
            Center::new("O1", 8.0, [0.0, 0.0, 0.0]),
            Center::new("H1", 1.0, [0.0, 1.43, -1.1]),
        ];
        let functions = vec![
            BasisFunction::new(0, 1, 0, 0),
            BasisFunction::new(0, 2, 0, 0),
            BasisFunction::new(0, 2, 1, 0),
            BasisFunction::new(0, 2, 1, 1),
            BasisFunction::new(0, 2, 1, -1),
            BasisFunction::new(1, 1, 0, 0),
        ];
        BasisSet::new(centers, functions)
    }

    #[test]
    fn test_function_labels() {
        let basis = water_minimal();
        assert_eq!(basis.function_label(0), "O1:1s");
        assert_eq!(basis.function_label(3), "O1:2p+1");
        assert_eq!(basis.function_label(4), "O1:2p-1");
        assert_eq!(basis.function_label(42), "bf43");
    }

    #[test]
    fn test_anonymous_basis() {
        let basis = BasisSet::anonymous(3);
        assert_eq!(basis.n_functions(), 3);
        assert!(!basis.is_fully_labelled());
        assert_eq!(basis.function_label(1), "bf2");
    }

    #[test]
    fn test_shell_order_puts_px_py_pz() {
        let basis = water_minimal();
        // O 1s, O 2s, O px, O py, O pz, H 1s
        assert_eq!(basis.shell_order(), vec![0, 1, 3, 4, 2, 5]);
    }

    #[test]
    fn test_component_rank_d() {
        let ranks: Vec<i32> = [0, 1, -1, 2, -2].iter().map(|&m| component_rank(2, m)).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_shells_grouping() {
        let mut basis = water_minimal();
        basis.primitives = Some(vec![
            Primitive { center: 1, l: 0, shell: 1, exponent: 3.4, coefficient: 0.15 },
            Primitive { center: 0, l: 0, shell: 1, exponent: 130.7, coefficient: 0.15 },
            Primitive { center: 1, l: 0, shell: 1, exponent: 0.6, coefficient: 0.53 },
        ]);
        let shells = basis.shells().unwrap();
        assert_eq!(shells.len(), 2);
        assert_eq!(shells[0].center, 0);
        assert_eq!(shells[1].primitives.len(), 2);
    }
}
