//! # wfnconv - 量子化学波函数文件转换工具
//!
//! 读取 HDF5 或 INPORB 波函数，按需变换后写成另一种格式，并输出文本报告。
//!
//! ## 流水线
//! 读取 -> 去对称化 -> 合并 (--joinorb) -> SALC -> 初猜 -> 对称化 -> 写出 -> 报告
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (流水线与轨道合并)
//!   │     ├── parsers/   (格式读写)
//!   │     ├── transform/ (对称化、SALC、初猜、Mulliken)
//!   │     ├── report/    (文本报告)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出样式、Fortran 数值格式)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod report;
mod transform;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    utils::output::set_verbosity(cli.verbose, cli.warnings);

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
