//! # 美化输出工具
//!
//! 提供统一的终端输出样式，并按 `-v` / `-w` 控制输出级别。
//! 报告内容不经过这里，而是直接写入调用方提供的 sink。
//!
//! ## 依赖关系
//! - 被所有 `commands/`、`parsers/`、`transform/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

/// 0: 只输出错误; 1: 警告; 2: 信息 (-v); 3: 调试 (-vv)
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

const LEVEL_WARNING: u8 = 1;
const LEVEL_INFO: u8 = 2;
const LEVEL_DEBUG: u8 = 3;

/// 根据命令行参数设置输出级别
pub fn set_verbosity(verbose: u8, warnings: bool) {
    let level = if verbose > 0 {
        LEVEL_INFO.saturating_add(verbose - 1)
    } else if warnings {
        LEVEL_WARNING
    } else {
        0
    };
    VERBOSITY.store(level, Ordering::Relaxed);
}

fn enabled(level: u8) -> bool {
    VERBOSITY.load(Ordering::Relaxed) >= level
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    if enabled(LEVEL_WARNING) {
        eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
    }
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    if enabled(LEVEL_INFO) {
        eprintln!("{} {}", "[*]".blue().bold(), msg);
    }
}

/// 打印调试消息
pub fn print_debug(msg: &str) {
    if enabled(LEVEL_DEBUG) {
        eprintln!("{} {}", "[DBG]".dimmed(), msg.dimmed());
    }
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    if enabled(LEVEL_INFO) {
        eprintln!("{} {}", "[DONE]".green().bold(), msg);
    }
}

/// 打印转换成功消息
pub fn print_conversion(from: &str, to: &str) {
    eprintln!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        from.dimmed(),
        "->".cyan(),
        to
    );
}

/// 打印标题栏
pub fn print_header(title: &str) {
    if enabled(LEVEL_INFO) {
        let line = "─".repeat(60);
        eprintln!("\n{}", line.dimmed());
        eprintln!("  {}", title.bold());
        eprintln!("{}\n", line.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        set_verbosity(0, false);
        assert!(!enabled(LEVEL_WARNING));

        set_verbosity(0, true);
        assert!(enabled(LEVEL_WARNING));
        assert!(!enabled(LEVEL_INFO));

        set_verbosity(1, false);
        assert!(enabled(LEVEL_INFO));
        assert!(!enabled(LEVEL_DEBUG));

        set_verbosity(2, false);
        assert!(enabled(LEVEL_DEBUG));

        set_verbosity(0, false);
    }
}
