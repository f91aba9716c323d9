//! # INPORB 旧式文本轨道文件
//!
//! 读写 INPORB 1.1 / 2.0 / 2.2 格式。
//!
//! ## INPORB 格式说明
//! ```text
//! #INPORB 2.2
//! #INFO
//! * title
//!        0       2       0        (uhf, nsym, 0)
//!        4       2                (每块基函数数)
//!        4       2                (每块轨道数)
//! #ORB
//! * ORBITAL    1    1
//!   0.12345678901234E+00 ...      (2.x: 5E22.14, 1.1: 4E18.12)
//! #OCC
//! * OCCUPATION NUMBERS
//! #OCHR                           (仅 2.x)
//! #ONE
//! * ONE ELECTRON ENERGIES         (2.x: 10E12.4, 1.1: 4E18.12)
//! #INDEX
//! * 1234567890
//! 0 iiiissssss
//! ```
//! 非限制性波函数另有 `#UORB`, `#UOCC`, `#UOCHR`, `#UONE`, `#UINDEX`。
//!
//! INPORB 不携带基组信息，读入后的基组只有基函数个数。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/` 使用
//! - 使用 `models/`, `utils/fortran.rs`

use crate::error::{Result, WfnError};
use crate::models::{BasisSet, OrbitalKind, OrbitalSet, OrbitalType, Wavefunction};
use crate::parsers::{
    declared_coefficients, read_text_file, WavefunctionDecoder, MAX_SYMMETRY_BLOCKS,
};
use crate::utils::fortran::{format_e, parse_reals, write_columns};

use nalgebra::DMatrix;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// INPORB 版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InpOrbVersion {
    V11,
    V20,
    V22,
}

impl InpOrbVersion {
    fn from_header(version: &str) -> Option<Self> {
        match version {
            "1.0" | "1.1" => Some(InpOrbVersion::V11),
            "2.0" | "2.1" => Some(InpOrbVersion::V20),
            "2.2" => Some(InpOrbVersion::V22),
            _ => None,
        }
    }

    /// 系数与占据数: (每行个数, 列宽, 小数位)
    fn real_format(self) -> (usize, usize, usize) {
        match self {
            InpOrbVersion::V11 => (4, 18, 12),
            _ => (5, 22, 14),
        }
    }

    /// 轨道能量
    fn energy_format(self) -> (usize, usize, usize) {
        match self {
            InpOrbVersion::V11 => (4, 18, 12),
            _ => (10, 12, 4),
        }
    }

    fn has_human_readable_occupations(self) -> bool {
        self != InpOrbVersion::V11
    }
}

impl std::fmt::Display for InpOrbVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InpOrbVersion::V11 => write!(f, "1.1"),
            InpOrbVersion::V20 => write!(f, "2.0"),
            InpOrbVersion::V22 => write!(f, "2.2"),
        }
    }
}

/// INPORB 解码器
pub struct InpOrbDecoder;

impl WavefunctionDecoder for InpOrbDecoder {
    fn name(&self) -> &'static str {
        "INPORB"
    }

    fn decode(&self, path: &Path) -> Result<Wavefunction> {
        parse_inporb_file(path)
    }
}

/// 解析 INPORB 文件
pub fn parse_inporb_file(path: &Path) -> Result<Wavefunction> {
    let content = read_text_file(path, "INPORB")?;
    parse_inporb_content(&content, &path.display().to_string())
}

/// 按 `#` 标记切分的段落
struct Sections<'a> {
    version: InpOrbVersion,
    blocks: HashMap<String, Vec<&'a str>>,
}

fn split_sections<'a>(content: &'a str, source: &str) -> Result<Sections<'a>> {
    let mut version = None;
    let mut current: Option<String> = None;
    let mut blocks: HashMap<String, Vec<&'a str>> = HashMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('#') {
            let mut parts = trimmed.split_whitespace();
            let tag = parts.next().unwrap_or_default().to_uppercase();
            if tag == "#INPORB" {
                let number = parts.next().unwrap_or_default();
                version = Some(InpOrbVersion::from_header(number).ok_or_else(|| {
                    parse_error(source, format!("Unknown INPORB version '{}'", number))
                })?);
            } else if version.is_none() {
                return Err(parse_error(source, "Missing #INPORB header"));
            }
            blocks.entry(tag.clone()).or_default();
            current = Some(tag);
            continue;
        }

        match &current {
            Some(tag) => blocks.entry(tag.clone()).or_default().push(line),
            None => return Err(parse_error(source, "Missing #INPORB header")),
        }
    }

    let version = version.ok_or_else(|| parse_error(source, "Missing #INPORB header"))?;
    Ok(Sections { version, blocks })
}

fn parse_error(source: &str, reason: impl Into<String>) -> WfnError {
    WfnError::ParseError {
        format: "INPORB".to_string(),
        path: source.to_string(),
        reason: reason.into(),
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('*')
}

/// `#INFO` 段: (标题, uhf, n_bas, n_orb)
fn parse_info(lines: &[&str], source: &str) -> Result<(String, bool, Vec<usize>, Vec<usize>)> {
    let mut title = None;
    let mut numbers: Vec<usize> = Vec::new();

    for line in lines {
        if is_comment(line) {
            if title.is_none() {
                title = Some(line.trim_start().trim_start_matches('*').trim().to_string());
            }
            continue;
        }
        for token in line.split_whitespace() {
            let value = token
                .parse()
                .map_err(|_| parse_error(source, format!("Invalid integer '{}' in #INFO", token)))?;
            numbers.push(value);
        }
    }

    if numbers.len() < 3 {
        return Err(parse_error(source, "Incomplete #INFO section"));
    }
    let uhf = numbers[0] == 1;
    let n_sym = numbers[1];
    if n_sym == 0 || n_sym > MAX_SYMMETRY_BLOCKS {
        return Err(parse_error(
            source,
            format!("#INFO declares {} symmetries, expected 1 to {}", n_sym, MAX_SYMMETRY_BLOCKS),
        ));
    }
    if numbers.len() < 3 + 2 * n_sym {
        return Err(parse_error(
            source,
            format!("#INFO section needs basis and orbital counts for {} symmetries", n_sym),
        ));
    }
    let n_bas = numbers[3..3 + n_sym].to_vec();
    let n_orb = numbers[3 + n_sym..3 + 2 * n_sym].to_vec();

    Ok((title.unwrap_or_default(), uhf, n_bas, n_orb))
}

fn read_values(lines: &[&str], width: usize, tag: &str, source: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for line in lines.iter().filter(|l| !is_comment(l)) {
        let parsed = parse_reals(line, width)
            .ok_or_else(|| parse_error(source, format!("Invalid number in {}: '{}'", tag, line.trim())))?;
        values.extend(parsed);
    }
    Ok(values)
}

/// 读取轨道数值段，长度不符时报错
fn read_section(
    sections: &Sections,
    tag: &str,
    width: usize,
    expected: usize,
    source: &str,
) -> Result<Option<Vec<f64>>> {
    let Some(lines) = sections.blocks.get(tag) else {
        return Ok(None);
    };
    let values = read_values(lines, width, tag, source)?;
    if values.len() != expected {
        return Err(parse_error(
            source,
            format!("{} has {} values, expected {}", tag, values.len(), expected),
        ));
    }
    Ok(Some(values))
}

fn read_type_indices(lines: &[&str], expected: usize, source: &str) -> Result<Vec<OrbitalType>> {
    let mut types = Vec::with_capacity(expected);
    for line in lines.iter().filter(|l| !is_comment(l)) {
        let chars = line
            .trim()
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");
        types.extend(chars.chars().filter(|c| !c.is_whitespace()).map(OrbitalType::from_char));
    }
    if types.len() != expected {
        return Err(parse_error(
            source,
            format!("#INDEX has {} entries, expected {}", types.len(), expected),
        ));
    }
    Ok(types)
}

/// 读取 `#ORB` / `#UORB` 中的全部系数，个数必须与声明一致
fn read_coefficients(sections: &Sections, prefix: &str, expected: usize, source: &str) -> Result<Vec<f64>> {
    let (_, width, _) = sections.version.real_format();
    let orb_tag = format!("#{}ORB", prefix);
    read_section(sections, &orb_tag, width, expected, source)?
        .ok_or_else(|| parse_error(source, format!("Missing {} section", orb_tag)))
}

/// 读取一个自旋通道，`prefix` 为 "" 或 "U"
fn read_orbital_set(
    sections: &Sections,
    prefix: &str,
    coefficients: Vec<f64>,
    n_bas: &[usize],
    n_orb: &[usize],
    basis_set: &Rc<BasisSet>,
    source: &str,
) -> Result<OrbitalSet> {
    let (_, width, _) = sections.version.real_format();
    let (_, energy_width, _) = sections.version.energy_format();
    let total_orb: usize = n_orb.iter().sum();

    let mut blocks = Vec::with_capacity(n_bas.len());
    let mut pos = 0;
    for (&nb, &no) in n_bas.iter().zip(n_orb) {
        blocks.push(DMatrix::from_column_slice(nb, no, &coefficients[pos..pos + nb * no]));
        pos += nb * no;
    }

    let mut set = OrbitalSet::from_blocks(Rc::clone(basis_set), blocks);

    let occ_tag = format!("#{}OCC", prefix);
    if let Some(occupations) = read_section(sections, &occ_tag, width, total_orb, source)? {
        set.occupations = occupations;
    }

    let one_tag = format!("#{}ONE", prefix);
    if let Some(energies) = read_section(sections, &one_tag, energy_width, total_orb, source)? {
        set.energies = energies;
    }

    let index_tag = format!("#{}INDEX", prefix);
    let index_lines = sections
        .blocks
        .get(&index_tag)
        .or_else(|| sections.blocks.get("#INDEX"));
    if let Some(lines) = index_lines {
        set.types = read_type_indices(lines, total_orb, source)?;
    }

    Ok(set)
}

/// 从字符串内容解析 INPORB
pub fn parse_inporb_content(content: &str, source: &str) -> Result<Wavefunction> {
    let sections = split_sections(content, source)?;
    let info = sections
        .blocks
        .get("#INFO")
        .ok_or_else(|| parse_error(source, "Missing #INFO section"))?;
    let (title, uhf, n_bas, n_orb) = parse_info(info, source)?;
    let total_coef =
        declared_coefficients(&n_bas, &n_orb).map_err(|reason| parse_error(source, reason))?;

    let channels: &[(&str, OrbitalKind)] = if uhf {
        &[("", OrbitalKind::Alpha), ("U", OrbitalKind::Beta)]
    } else {
        &[("", OrbitalKind::Restricted)]
    };
    // 系数个数核对通过后才按声明的尺寸建立基组和矩阵
    let coefficients = channels
        .iter()
        .map(|(prefix, _)| read_coefficients(&sections, prefix, total_coef, source))
        .collect::<Result<Vec<_>>>()?;

    let basis_set = Rc::new(BasisSet::anonymous(n_bas.iter().sum()));
    let mut wfn = Wavefunction::new(title, n_bas.clone(), Rc::clone(&basis_set));
    for ((prefix, kind), values) in channels.iter().zip(coefficients) {
        let set = read_orbital_set(&sections, prefix, values, &n_bas, &n_orb, &basis_set, source)?;
        wfn.mo.insert(*kind, set);
    }

    wfn.source_format = Some(format!("INPORB {}", sections.version));
    Ok(wfn)
}

// ─────────────────────────────────────────────────────────────
// 写出
// ─────────────────────────────────────────────────────────────

fn split_blocks<'a, T>(values: &'a [T], sizes: &[usize]) -> Vec<&'a [T]> {
    let mut out = Vec::with_capacity(sizes.len());
    let mut pos = 0;
    for &n in sizes {
        out.push(&values[pos..pos + n]);
        pos += n;
    }
    out
}

/// 选出要写的自旋通道: (第一个通道, 可选的 beta 通道)
fn channels(wfn: &Wavefunction) -> Result<(&OrbitalSet, Option<&OrbitalSet>)> {
    if let Some(set) = wfn.mo.get(&OrbitalKind::Restricted) {
        return Ok((set, None));
    }
    match (wfn.mo.get(&OrbitalKind::Alpha), wfn.mo.get(&OrbitalKind::Beta)) {
        (Some(alpha), Some(beta)) => Ok((alpha, Some(beta))),
        _ => Err(WfnError::DataNotAvailable(
            "INPORB output needs restricted orbitals or both alpha and beta orbitals".to_string(),
        )),
    }
}

/// 检查波函数能否写成 INPORB
pub fn check_requirements(wfn: &Wavefunction) -> Result<()> {
    let (first, beta) = channels(wfn)?;
    match beta {
        Some(beta) if beta.n_orb() != first.n_orb() => Err(WfnError::InconsistentWavefunction(
            "alpha and beta orbital counts differ".to_string(),
        )),
        _ => Ok(()),
    }
}

/// 将波函数写为 INPORB
pub fn write_inporb<W: Write>(wfn: &Wavefunction, version: InpOrbVersion, w: &mut W) -> Result<()> {
    check_requirements(wfn)?;
    let (first, beta) = channels(wfn)?;
    let n_orb = first.n_orb();

    let (per_line, width, decimals) = version.real_format();
    let (e_per_line, e_width, e_decimals) = version.energy_format();
    let real = |v: &f64| format_e(*v, width, decimals);
    let energy = |v: &f64| format_e(*v, e_width, e_decimals);

    writeln!(w, "#INPORB {}", version)?;
    writeln!(w, "#INFO")?;
    writeln!(w, "* {}", wfn.title)?;
    writeln!(w, "{:8}{:8}{:8}", u8::from(beta.is_some()), wfn.n_sym, 0)?;
    write_columns(w, &wfn.n_bas, 8, |n| format!("{:8}", n))?;
    write_columns(w, &n_orb, 8, |n| format!("{:8}", n))?;

    let sets: Vec<(&str, &OrbitalSet)> = std::iter::once(("", first))
        .chain(beta.map(|b| ("U", b)))
        .collect();

    for (prefix, set) in &sets {
        writeln!(w, "#{}ORB", prefix)?;
        for (sym, block) in set.coefficients.iter().enumerate() {
            for (j, column) in block.column_iter().enumerate() {
                writeln!(w, "* ORBITAL{:5}{:5}", sym + 1, j + 1)?;
                let values: Vec<f64> = column.iter().copied().collect();
                write_columns(w, &values, per_line, real)?;
            }
        }
    }

    for (prefix, set) in &sets {
        writeln!(w, "#{}OCC", prefix)?;
        let label = if prefix.is_empty() { "" } else { "Beta " };
        writeln!(w, "* {}OCCUPATION NUMBERS", label)?;
        for block in split_blocks(&set.occupations, &n_orb) {
            write_columns(w, block, per_line, real)?;
        }
    }

    if version.has_human_readable_occupations() {
        for (prefix, set) in &sets {
            writeln!(w, "#{}OCHR", prefix)?;
            writeln!(w, "* OCCUPATION NUMBERS (HUMAN-READABLE)")?;
            for block in split_blocks(&set.occupations, &n_orb) {
                write_columns(w, block, 10, |v| format!(" {:7.4}", v))?;
            }
        }
    }

    for (prefix, set) in &sets {
        writeln!(w, "#{}ONE", prefix)?;
        writeln!(w, "* ONE ELECTRON ENERGIES")?;
        for block in split_blocks(&set.energies, &n_orb) {
            write_columns(w, block, e_per_line, energy)?;
        }
    }

    for (prefix, set) in &sets {
        writeln!(w, "#{}INDEX", prefix)?;
        for block in split_blocks(&set.types, &n_orb) {
            writeln!(w, "* 1234567890")?;
            for (line, chunk) in block.chunks(10).enumerate() {
                let chars: String = chunk.iter().map(|t| t.to_char()).collect();
                writeln!(w, "{} {}", line % 10, chars)?;
            }
        }
    }

    Ok(())
}
