//! # 统一错误处理模块
//!
//! 定义 wfnconv 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// wfnconv 统一错误类型
#[derive(Error, Debug)]
pub enum WfnError {
    // ─────────────────────────────────────────────────────────────
    // 输入文件错误
    // ─────────────────────────────────────────────────────────────
    #[error("Input file does not exist: {path}")]
    InputNotFound { path: String },

    #[error(
        "{path} is neither a structured-binary (HDF5) nor a legacy-text (INPORB) wavefunction file\n{reasons}"
    )]
    UnrecognizedFormat { path: String, reasons: String },

    #[error("Orbital file given to --joinorb does not exist: {path}")]
    JoinOrbNotFound { path: String },

    #[error("Orbital file given to --joinorb is not a legacy-text (INPORB) file: {path}\nReason: {reason}")]
    JoinOrbFormat { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    OutputError(#[from] std::io::Error),

    #[error(
        "Output file {path} already exists.\nRemove it, pass --force to overwrite, or choose another name with -o/--outfile"
    )]
    OutputExists { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    // ─────────────────────────────────────────────────────────────
    // 数据错误
    // ─────────────────────────────────────────────────────────────
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Orbital kind '{kind}' is present in the joined orbitals but missing from the input wavefunction")]
    MissingOrbitalKind { kind: String },

    #[error("Inconsistent wavefunction: {0}")]
    InconsistentWavefunction(String),

    #[error("Mulliken analysis returned {charges} charges for {labels} centers")]
    MullikenLengthMismatch { labels: usize, charges: usize },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, WfnError>;
