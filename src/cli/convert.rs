//! # 转换参数 CLI 定义
//!
//! 输入文件、输出格式、变换开关与报告选项。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 支持的输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Legacy-text orbital file, latest version (2.2)
    #[value(name = "inporb")]
    Inporb,
    /// Legacy-text orbital file, version 1.1
    #[value(name = "inporb11")]
    Inporb11,
    /// Legacy-text orbital file, version 2.0
    #[value(name = "inporb20")]
    Inporb20,
    /// Structured-binary (HDF5) wavefunction file
    #[value(name = "h5")]
    H5,
    /// Gaussian formatted checkpoint
    #[value(name = "fchk")]
    Fchk,
    /// Molden file
    #[value(name = "molden")]
    Molden,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Inporb => write!(f, "inporb"),
            OutputFormat::Inporb11 => write!(f, "inporb11"),
            OutputFormat::Inporb20 => write!(f, "inporb20"),
            OutputFormat::H5 => write!(f, "h5"),
            OutputFormat::Fchk => write!(f, "fchk"),
            OutputFormat::Molden => write!(f, "molden"),
        }
    }
}

impl OutputFormat {
    /// 未指定 --outfile 时使用的扩展名 (与格式名相同)
    pub fn extension(&self) -> String {
        self.to_string()
    }
}

/// 转换参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input wavefunction file (HDF5 or INPORB)
    pub infile: PathBuf,

    /// Output file (default: input name with the --convert extension)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// INPORB file whose orbitals replace the input orbitals
    #[arg(long)]
    pub joinorb: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub convert: Option<OutputFormat>,

    /// Overwrite an existing output file
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Replace the orbitals with a core Hamiltonian guess
    #[arg(short, long, default_value_t = false)]
    pub guessorb: bool,

    /// Project orbitals onto symmetry adapted linear combinations
    #[arg(short, long, default_value_t = false)]
    pub salcorb: bool,

    /// Remove symmetry blocking
    #[arg(short, long, default_value_t = false)]
    pub desymmetrize: bool,

    /// Re-impose symmetry blocking
    #[arg(long, default_value_t = false)]
    pub symmetrize: bool,

    /// Print orbitals
    #[arg(short = 'p', long = "print_orbitals", default_value_t = false)]
    pub print_orbitals: bool,

    /// Print the symmetry species of each orbital
    #[arg(long = "print_symmetry_species", default_value_t = false)]
    pub print_symmetry_species: bool,

    /// Print orbital indices grouped by irrep (SUPSYM input)
    #[arg(long, default_value_t = false)]
    pub supsym: bool,

    /// Print Mulliken charges
    #[arg(long, default_value_t = false)]
    pub mulliken: bool,

    /// Line width of printed coefficient lists
    #[arg(long, default_value_t = 80, env = "WFNCONV_LINEWIDTH")]
    pub linewidth: usize,

    /// Only print basis functions / species labels matching this regex
    #[arg(short = 'm', long = "match")]
    pub pattern: Option<String>,

    /// Only print orbitals of these types (f, i, 1, 2, 3, s, d)
    #[arg(short, long)]
    pub typeids: Option<String>,
}
