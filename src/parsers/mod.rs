//! # 解析器模块
//!
//! 波函数文件的读写：
//! - `h5`: 结构化二进制 (HDF5)，读 + 写
//! - `inporb`: 旧式文本轨道文件 INPORB 1.1/2.0/2.2，读 + 写
//! - `fchk`: Gaussian formatted checkpoint，只写
//! - `molden`: Molden，只写
//!
//! 输入文件没有可靠的扩展名，因此按固定优先级依次尝试解码器：
//! 先 HDF5，再 INPORB。第一个成功的结果胜出，全部失败时汇总为一个错误。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: h5, inporb, fchk, molden

pub mod fchk;
pub mod h5;
pub mod inporb;
pub mod molden;

use crate::error::{Result, WfnError};
use crate::models::basis::Shell;
use crate::models::{BasisSet, Wavefunction};
use crate::utils::output;
use std::path::Path;
use std::rc::Rc;

/// 波函数解码器
pub trait WavefunctionDecoder {
    /// 格式名称，用于错误信息
    fn name(&self) -> &'static str;

    fn decode(&self, path: &Path) -> Result<Wavefunction>;
}

/// 按默认优先级 (HDF5, INPORB) 识别并解析文件
///
/// 调用方需先确认文件存在。
pub fn probe_wavefunction(path: &Path) -> Result<Wavefunction> {
    probe_with(path, &[&h5::H5Decoder, &inporb::InpOrbDecoder])
}

/// 按给定次序尝试解码器
pub fn probe_with(path: &Path, decoders: &[&dyn WavefunctionDecoder]) -> Result<Wavefunction> {
    let mut reasons = Vec::with_capacity(decoders.len());

    for decoder in decoders {
        match decoder.decode(path) {
            Ok(wfn) => {
                output::print_info(&format!(
                    "Read {} as {} wavefunction",
                    path.display(),
                    decoder.name()
                ));
                return Ok(wfn);
            }
            Err(e) => {
                output::print_debug(&format!("{} decoder rejected {}: {}", decoder.name(), path.display(), e));
                reasons.push(format!("  {}: {}", decoder.name(), e));
            }
        }
    }

    Err(WfnError::UnrecognizedFormat {
        path: path.display().to_string(),
        reasons: reasons.join("\n"),
    })
}

/// 读取文本文件，非 UTF-8 内容视为格式不符
pub(crate) fn read_text_file(path: &Path, format: &str) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| WfnError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    String::from_utf8(bytes).map_err(|_| WfnError::ParseError {
        format: format.to_string(),
        path: path.display().to_string(),
        reason: "Not a text file".to_string(),
    })
}

/// 对称块数上限 (D2h 及其子群)
pub(crate) const MAX_SYMMETRY_BLOCKS: usize = 8;

/// 基函数总数上限，更大的声明视为文件损坏
pub(crate) const MAX_BASIS_FUNCTIONS: usize = 1 << 24;

/// 核对文件头声明的块尺寸，返回轨道系数的总个数
///
/// 在按声明尺寸分配任何内存之前调用；失败时返回原因，由调用方包装成格式错误。
pub(crate) fn declared_coefficients(
    n_bas: &[usize],
    n_orb: &[usize],
) -> std::result::Result<usize, String> {
    if n_bas.is_empty() || n_bas.len() > MAX_SYMMETRY_BLOCKS {
        return Err(format!(
            "{} symmetry blocks declared, expected 1 to {}",
            n_bas.len(),
            MAX_SYMMETRY_BLOCKS
        ));
    }
    if n_orb.len() != n_bas.len() {
        return Err(format!(
            "{} orbital counts for {} symmetry blocks",
            n_orb.len(),
            n_bas.len()
        ));
    }

    let mut total_bas = 0usize;
    let mut total_coef = 0usize;
    for (&nb, &no) in n_bas.iter().zip(n_orb) {
        if no > nb {
            return Err(format!(
                "{} orbitals cannot be expanded in {} basis functions",
                no, nb
            ));
        }
        total_bas = total_bas
            .checked_add(nb)
            .filter(|&n| n <= MAX_BASIS_FUNCTIONS)
            .ok_or_else(|| format!("more than {} basis functions declared", MAX_BASIS_FUNCTIONS))?;
        total_coef = nb
            .checked_mul(no)
            .and_then(|n| total_coef.checked_add(n))
            .ok_or_else(|| "declared orbital dimensions overflow".to_string())?;
    }
    Ok(total_coef)
}

/// Molden / fchk 输出需要的基组与壳层
///
/// 要求: 单一对称块 (已去对称化)、至少一组轨道、基函数均有中心与角动量、带原始高斯函数。
/// 轨道自带的基组优先 (合并后它比 `Wavefunction::basis_set` 更完整)。
pub(crate) fn export_basis(wfn: &Wavefunction, format: &str) -> Result<(Rc<BasisSet>, Vec<Shell>)> {
    if wfn.n_sym != 1 {
        return Err(WfnError::DataNotAvailable(format!(
            "{} output needs orbitals without symmetry blocking (use --desymmetrize)",
            format
        )));
    }

    let basis = wfn
        .mo
        .values()
        .next()
        .map(|set| Rc::clone(&set.basis_set))
        .ok_or_else(|| WfnError::DataNotAvailable(format!("{} output needs orbitals", format)))?;

    if !basis.is_fully_labelled() {
        return Err(WfnError::DataNotAvailable(format!(
            "{} output needs basis function centers and angular momenta",
            format
        )));
    }

    let shells = basis.shells().ok_or_else(|| {
        WfnError::DataNotAvailable(format!("{} output needs the primitive basis set", format))
    })?;

    Ok((basis, shells))
}
