//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 命令结构
//! `wfnconv <infile> [-c FORMAT] [-o OUTFILE] [变换开关] [报告开关] [-v|-w]`
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert

pub mod convert;

use clap::{ArgAction, Parser};

/// wfnconv - 量子化学波函数文件转换工具
#[derive(Parser, Debug)]
#[command(name = "wfnconv")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Convert, transform and inspect quantum-chemistry wavefunction files",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub convert: convert::ConvertArgs,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print warnings
    #[arg(short, long, default_value_t = false)]
    pub warnings: bool,
}
