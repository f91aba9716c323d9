//! # 工具函数模块
//!
//! 提供美化输出和 Fortran 风格数值格式化工具。
//!
//! ## 依赖关系
//! - 被 `commands/`、`parsers/`、`report/` 模块使用
//! - 子模块: output, fortran

pub mod fortran;
pub mod output;
