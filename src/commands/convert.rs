//! # 转换流水线
//!
//! 按固定次序执行：
//! 读取 -> 去对称化 -> 合并 -> SALC -> 初猜 -> 对称化 -> 写出 -> 报告
//!
//! 整个过程只持有一个 `Wavefunction`，每一步消耗旧值并返回新值。
//! 任何一步出错立即终止，由 `main` 打印错误并以退出码 1 结束。
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `parsers/`, `transform/`, `report/`, `commands/merge.rs`
//! - 使用 `utils/output.rs`

use crate::cli::convert::{ConvertArgs, OutputFormat};
use crate::commands::merge;
use crate::error::{Result, WfnError};
use crate::models::Wavefunction;
use crate::parsers::inporb::{self, InpOrbVersion};
use crate::parsers::{self, fchk, h5, molden};
use crate::report::{self, ReportOptions};
use crate::transform;
use crate::utils::output;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 变换开关
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub desymmetrize: bool,
    pub joinorb: Option<PathBuf>,
    pub salcorb: bool,
    pub guessorb: bool,
    pub symmetrize: bool,
}

impl From<&ConvertArgs> for PipelineOptions {
    fn from(args: &ConvertArgs) -> Self {
        PipelineOptions {
            desymmetrize: args.desymmetrize,
            joinorb: args.joinorb.clone(),
            salcorb: args.salcorb,
            guessorb: args.guessorb,
            symmetrize: args.symmetrize,
        }
    }
}

/// 执行转换，报告写到 stdout
pub fn execute(args: ConvertArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut sink = stdout.lock();
    execute_with(args, &mut sink)
}

/// 执行转换，报告写到给定 sink
pub fn execute_with<W: Write>(args: ConvertArgs, sink: &mut W) -> Result<()> {
    output::print_header(&format!("Reading {}", args.infile.display()));

    let report_opts = ReportOptions::new(
        args.linewidth,
        args.pattern.as_deref(),
        args.typeids.as_deref(),
    )?;

    if !args.infile.exists() {
        return Err(WfnError::InputNotFound {
            path: args.infile.display().to_string(),
        });
    }

    let wfn = parsers::probe_wavefunction(&args.infile)?;
    wfn.validate()?;
    output::print_info(&format!(
        "Input format: {}",
        wfn.source_format.as_deref().unwrap_or("unknown")
    ));
    output::print_debug(&format!(
        "{} symmetry block(s), basis sizes {:?}, orbital kinds {:?}",
        wfn.n_sym,
        wfn.n_bas,
        wfn.mo.keys().collect::<Vec<_>>()
    ));

    let wfn = run_transforms(wfn, &PipelineOptions::from(&args))?;

    if let Some(format) = args.convert {
        let path = resolve_output_path(&args.infile, args.outfile.as_deref(), format);
        check_output_path(&path, args.force)?;
        write_output(&wfn, format, &path)?;
        output::print_conversion(
            &args.infile.display().to_string(),
            &path.display().to_string(),
        );
    }

    run_reports(&wfn, &args, &report_opts, sink)?;
    sink.flush()?;

    output::print_done("Finished");
    Ok(())
}

/// 按固定次序执行请求的变换
pub fn run_transforms(wfn: Wavefunction, opts: &PipelineOptions) -> Result<Wavefunction> {
    let mut wfn = wfn;

    if opts.desymmetrize {
        wfn = transform::desymmetrize(wfn)?;
    }

    if let Some(path) = &opts.joinorb {
        let other = merge::read_joinorb(path)?;
        wfn = merge::join_orbitals(wfn, other)?;
        wfn.validate()?;
    }

    if opts.salcorb {
        wfn = transform::salcorb(&wfn)?;
    }

    if opts.guessorb {
        wfn.mo = transform::guessorb(&wfn)?;
    }

    if opts.symmetrize {
        wfn = transform::symmetrize(wfn)?;
    }

    Ok(wfn)
}

/// 输出路径: --outfile，否则为输入文件名换成格式扩展名
pub fn resolve_output_path(infile: &Path, outfile: Option<&Path>, format: OutputFormat) -> PathBuf {
    match outfile {
        Some(path) => path.to_path_buf(),
        None => infile.with_extension(format.extension()),
    }
}

/// 输出文件已存在且未指定 --force 时拒绝写出
pub fn check_output_path(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(WfnError::OutputExists {
            path: path.display().to_string(),
        });
    }
    if path.exists() {
        output::print_warning(&format!("Overwriting {}", path.display()));
    }
    Ok(())
}

/// 检查所选格式需要的数据是否齐全
fn check_requirements(wfn: &Wavefunction, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Inporb | OutputFormat::Inporb11 | OutputFormat::Inporb20 => {
            inporb::check_requirements(wfn)
        }
        OutputFormat::Molden => molden::check_requirements(wfn),
        OutputFormat::Fchk => fchk::check_requirements(wfn),
        OutputFormat::H5 => Ok(()),
    }
}

/// 写出文件；文本格式先检查数据再创建文件
pub fn write_output(wfn: &Wavefunction, format: OutputFormat, path: &Path) -> Result<()> {
    check_requirements(wfn, format)?;

    if format == OutputFormat::H5 {
        return h5::write_h5_file(wfn, path);
    }

    let file = File::create(path).map_err(|e| WfnError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    write_text(wfn, format, &mut writer)?;

    writer.flush().map_err(|e| WfnError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

fn write_text<W: Write>(wfn: &Wavefunction, format: OutputFormat, w: &mut W) -> Result<()> {
    match format {
        OutputFormat::Inporb => inporb::write_inporb(wfn, InpOrbVersion::V22, w),
        OutputFormat::Inporb20 => inporb::write_inporb(wfn, InpOrbVersion::V20, w),
        OutputFormat::Inporb11 => inporb::write_inporb(wfn, InpOrbVersion::V11, w),
        OutputFormat::Molden => molden::write_molden(wfn, w),
        OutputFormat::Fchk => fchk::write_fchk(wfn, w),
        OutputFormat::H5 => Err(WfnError::UnsupportedFormat(
            "HDF5 output is written directly to a file".to_string(),
        )),
    }
}

/// 按请求依次输出报告
fn run_reports<W: Write>(
    wfn: &Wavefunction,
    args: &ConvertArgs,
    opts: &ReportOptions,
    sink: &mut W,
) -> Result<()> {
    if args.print_orbitals {
        report::print_orbitals(wfn, opts, sink)?;
    }
    if args.print_symmetry_species {
        report::print_symmetry_species(wfn, opts, sink)?;
    }
    if args.supsym {
        report::print_supsym(wfn, opts, sink)?;
    }
    if args.mulliken {
        let charges = transform::mulliken_charges(wfn)?;
        report::print_mulliken(&wfn.basis_set.center_labels(), &charges, sink)?;
    }
    Ok(())
}
