//! # 数据模型模块
//!
//! 定义统一的波函数与基组数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `transform/`, `commands/`, `report/` 使用
//! - 子模块: basis, wavefunction

pub mod basis;
pub mod wavefunction;

pub use basis::{BasisFunction, BasisSet, Center, Primitive};
pub use wavefunction::{OrbitalKind, OrbitalSet, OrbitalType, SymmetryData, Wavefunction};

#[cfg(test)]
pub(crate) mod fixtures;
