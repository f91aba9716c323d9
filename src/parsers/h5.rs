//! # 结构化二进制 (HDF5) 波函数文件
//!
//! 读写 HDF5 波函数文件，布局:
//! ```text
//! 属性:   NSYM, NBAS, NORB, MOLCAS_MODULE, TITLE
//! 数据集: CENTER_LABELS, CENTER_CHARGES, CENTER_COORDINATES
//!         BASIS_FUNCTION_IDS (center, shell, l, m)
//!         PRIMITIVE_IDS (center, l, shell), PRIMITIVES (exponent, coefficient)
//!         MO_[ALPHA_|BETA_]VECTORS / OCCUPATIONS / ENERGIES / TYPEINDICES
//!         SUPSYM_IRREP_INDICES, AO_OVERLAP_MATRIX, AO_ONEINT_MATRIX
//!         DESYM_MATRIX, DESYM_CENTER_*, DESYM_BASIS_FUNCTION_IDS, IRREP_LABELS
//! ```
//! 矩阵按对称块展平，每个轨道的系数连续存放。
//!
//! 真正的读写需要 `hdf5` feature (依赖系统 libhdf5)。未启用时仍能
//! 通过文件签名识别 HDF5 文件，并给出明确的错误信息。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/convert.rs` 使用
//! - 使用 `models/`, `hdf5` crate (可选)

use crate::error::{Result, WfnError};
use crate::models::Wavefunction;
use crate::parsers::WavefunctionDecoder;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// HDF5 文件签名
const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// 签名可能出现的位置 (存在 user block 时签名后移)
const SIGNATURE_OFFSETS: [u64; 5] = [0, 512, 1024, 2048, 4096];

/// 检查文件是否带有 HDF5 签名
pub fn has_hdf5_signature(path: &Path) -> Result<bool> {
    let read_error = |e| WfnError::FileReadError {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();

    let mut buffer = [0u8; 8];
    for offset in SIGNATURE_OFFSETS {
        if offset + 8 > len {
            break;
        }
        file.seek(SeekFrom::Start(offset)).map_err(read_error)?;
        file.read_exact(&mut buffer).map_err(read_error)?;
        if buffer == HDF5_SIGNATURE {
            return Ok(true);
        }
    }
    Ok(false)
}

/// HDF5 解码器
pub struct H5Decoder;

impl WavefunctionDecoder for H5Decoder {
    fn name(&self) -> &'static str {
        "HDF5"
    }

    fn decode(&self, path: &Path) -> Result<Wavefunction> {
        if !has_hdf5_signature(path)? {
            return Err(WfnError::UnsupportedFormat("no HDF5 signature".to_string()));
        }
        read_h5_file(path)
    }
}

#[cfg(not(feature = "hdf5"))]
const NO_HDF5: &str = "wfnconv was built without HDF5 support; rebuild with `--features hdf5`";

/// 读取 HDF5 波函数文件
#[cfg(not(feature = "hdf5"))]
pub fn read_h5_file(_path: &Path) -> Result<Wavefunction> {
    Err(WfnError::UnsupportedFormat(NO_HDF5.to_string()))
}

/// 写出 HDF5 波函数文件
#[cfg(not(feature = "hdf5"))]
pub fn write_h5_file(_wfn: &Wavefunction, _path: &Path) -> Result<()> {
    Err(WfnError::UnsupportedFormat(NO_HDF5.to_string()))
}

#[cfg(feature = "hdf5")]
pub use backend::{read_h5_file, write_h5_file};

#[cfg(feature = "hdf5")]
mod backend {
    use super::*;
    use crate::parsers::declared_coefficients;
    use crate::models::{
        BasisFunction, BasisSet, Center, OrbitalKind, OrbitalSet, OrbitalType, Primitive,
        SymmetryData,
    };

    use hdf5::types::FixedAscii;
    use nalgebra::DMatrix;
    use std::rc::Rc;

    const LABEL_LEN: usize = 16;
    type Label = FixedAscii<LABEL_LEN>;

    /// (数据集前缀, 轨道种类)
    const RESTRICTED: [(&str, OrbitalKind); 1] = [("MO_", OrbitalKind::Restricted)];
    const UNRESTRICTED: [(&str, OrbitalKind); 2] = [
        ("MO_ALPHA_", OrbitalKind::Alpha),
        ("MO_BETA_", OrbitalKind::Beta),
    ];

    fn format_error(path: &Path, reason: impl Into<String>) -> WfnError {
        WfnError::ParseError {
            format: "HDF5".to_string(),
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn to_usize(values: Vec<i64>) -> Vec<usize> {
        values.into_iter().map(|v| v.max(0) as usize).collect()
    }

    fn read_ints(file: &hdf5::File, name: &str) -> Result<Vec<i64>> {
        if file.link_exists(name) {
            Ok(file.dataset(name)?.read_raw::<i64>()?)
        } else {
            Ok(file.attr(name)?.read_raw::<i64>()?)
        }
    }

    fn optional_reals(file: &hdf5::File, name: &str) -> Result<Option<Vec<f64>>> {
        if file.link_exists(name) {
            Ok(Some(file.dataset(name)?.read_raw::<f64>()?))
        } else {
            Ok(None)
        }
    }

    fn optional_ints(file: &hdf5::File, name: &str) -> Result<Option<Vec<i64>>> {
        if file.link_exists(name) {
            Ok(Some(file.dataset(name)?.read_raw::<i64>()?))
        } else {
            Ok(None)
        }
    }

    fn optional_labels(file: &hdf5::File, name: &str) -> Result<Option<Vec<String>>> {
        if !file.link_exists(name) {
            return Ok(None);
        }
        let raw = file.dataset(name)?.read_raw::<Label>()?;
        Ok(Some(raw.iter().map(|s| s.as_str().trim().to_string()).collect()))
    }

    fn read_centers(file: &hdf5::File, prefix: &str) -> Result<Vec<Center>> {
        let labels = optional_labels(file, &format!("{}CENTER_LABELS", prefix))?.unwrap_or_default();
        let charges = optional_reals(file, &format!("{}CENTER_CHARGES", prefix))?.unwrap_or_default();
        let coords = optional_reals(file, &format!("{}CENTER_COORDINATES", prefix))?.unwrap_or_default();

        Ok(labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let charge = charges.get(i).copied().unwrap_or(0.0);
                let xyz = coords
                    .get(3 * i..3 * i + 3)
                    .map(|c| [c[0], c[1], c[2]])
                    .unwrap_or([0.0; 3]);
                Center::new(label, charge, xyz)
            })
            .collect())
    }

    fn read_functions(
        file: &hdf5::File,
        path: &Path,
        name: &str,
        n_total: usize,
    ) -> Result<Vec<BasisFunction>> {
        let Some(ids) = optional_ints(file, name)? else {
            return Ok(vec![BasisFunction::unknown(); n_total]);
        };
        if ids.len() != 4 * n_total {
            return Err(format_error(
                path,
                format!("{} has {} entries, expected {}", name, ids.len(), 4 * n_total),
            ));
        }
        Ok(ids
            .chunks_exact(4)
            .map(|id| BasisFunction {
                center: usize::try_from(id[0] - 1).ok(),
                shell: id[1] as i32,
                l: id[2] as i32,
                m: id[3] as i32,
            })
            .collect())
    }

    fn read_primitives(file: &hdf5::File) -> Result<Option<Vec<Primitive>>> {
        let (Some(ids), Some(values)) = (
            optional_ints(file, "PRIMITIVE_IDS")?,
            optional_reals(file, "PRIMITIVES")?,
        ) else {
            return Ok(None);
        };
        Ok(Some(
            ids.chunks_exact(3)
                .zip(values.chunks_exact(2))
                .map(|(id, v)| Primitive {
                    center: (id[0] - 1).max(0) as usize,
                    l: id[1] as i32,
                    shell: id[2] as i32,
                    exponent: v[0],
                    coefficient: v[1],
                })
                .collect(),
        ))
    }

    fn square_blocks(values: &[f64], n_bas: &[usize]) -> Option<Vec<DMatrix<f64>>> {
        let expected: usize = n_bas.iter().map(|n| n * n).sum();
        if values.len() != expected {
            return None;
        }
        let mut pos = 0;
        Some(
            n_bas
                .iter()
                .map(|&n| {
                    let block = DMatrix::from_column_slice(n, n, &values[pos..pos + n * n]);
                    pos += n * n;
                    block
                })
                .collect(),
        )
    }

    fn read_orbital_set(
        file: &hdf5::File,
        path: &Path,
        prefix: &str,
        n_bas: &[usize],
        n_orb: &[usize],
        basis_set: &Rc<BasisSet>,
    ) -> Result<OrbitalSet> {
        let vectors = file.dataset(&format!("{}VECTORS", prefix))?.read_raw::<f64>()?;
        let expected: usize = n_bas.iter().zip(n_orb).map(|(b, o)| b * o).sum();
        if vectors.len() != expected {
            return Err(format_error(
                path,
                format!("{}VECTORS has {} values, expected {}", prefix, vectors.len(), expected),
            ));
        }

        let mut blocks = Vec::with_capacity(n_bas.len());
        let mut pos = 0;
        for (&nb, &no) in n_bas.iter().zip(n_orb) {
            blocks.push(DMatrix::from_column_slice(nb, no, &vectors[pos..pos + nb * no]));
            pos += nb * no;
        }

        let mut set = OrbitalSet::from_blocks(Rc::clone(basis_set), blocks);
        let n = set.n_orbitals();

        if let Some(occ) = optional_reals(file, &format!("{}OCCUPATIONS", prefix))? {
            if occ.len() == n {
                set.occupations = occ;
            }
        }
        if let Some(energies) = optional_reals(file, &format!("{}ENERGIES", prefix))? {
            if energies.len() == n {
                set.energies = energies;
            }
        }
        if let Some(types) = optional_labels(file, &format!("{}TYPEINDICES", prefix))? {
            if types.len() == n {
                set.types = types
                    .iter()
                    .map(|t| t.chars().next().map_or(OrbitalType::Unknown, OrbitalType::from_char))
                    .collect();
            }
        }
        if let Some(irreps) = optional_ints(file, "SUPSYM_IRREP_INDICES")? {
            if irreps.len() == n {
                set.irreps = to_usize(irreps);
            }
        }

        Ok(set)
    }

    fn read_symmetry(
        file: &hdf5::File,
        path: &Path,
        n_bas: &[usize],
        symmetric_basis: &Rc<BasisSet>,
    ) -> Result<Option<SymmetryData>> {
        let Some(matrix) = optional_reals(file, "DESYM_MATRIX")? else {
            return Ok(None);
        };
        let n_total: usize = n_bas.iter().sum();
        if matrix.len() != n_total * n_total {
            return Ok(None);
        }

        let centers = read_centers(file, "DESYM_")?;
        let functions = read_functions(file, path, "DESYM_BASIS_FUNCTION_IDS", n_total)?;
        let mut desymmetrized = BasisSet::new(centers, functions);
        desymmetrized.primitives = read_primitives(file)?;

        Ok(Some(SymmetryData {
            desym_matrix: DMatrix::from_row_slice(n_total, n_total, &matrix),
            n_bas: n_bas.to_vec(),
            symmetric_basis: Rc::clone(symmetric_basis),
            desymmetrized_basis: Rc::new(desymmetrized),
            irrep_labels: optional_labels(file, "IRREP_LABELS")?.unwrap_or_default(),
        }))
    }

    fn read_string_attr(file: &hdf5::File, name: &str) -> Option<String> {
        file.attr(name)
            .and_then(|a| a.read_scalar::<FixedAscii<64>>())
            .ok()
            .map(|s| s.as_str().trim().to_string())
    }

    /// 读取 HDF5 波函数文件
    pub fn read_h5_file(path: &Path) -> Result<Wavefunction> {
        let file = hdf5::File::open(path)?;

        let n_sym = read_ints(&file, "NSYM")?
            .first()
            .map_or(0, |&n| n.max(0) as usize);
        let n_bas = to_usize(read_ints(&file, "NBAS")?);
        if n_bas.len() != n_sym {
            return Err(format_error(
                path,
                format!("NBAS has {} entries for NSYM = {}", n_bas.len(), n_sym),
            ));
        }
        let n_orb = if file.attr_names()?.iter().any(|a| a == "NORB") {
            to_usize(read_ints(&file, "NORB")?)
        } else {
            n_bas.clone()
        };
        declared_coefficients(&n_bas, &n_orb).map_err(|reason| format_error(path, reason))?;
        let n_total: usize = n_bas.iter().sum();

        let mut basis = BasisSet::new(
            read_centers(&file, "")?,
            read_functions(&file, path, "BASIS_FUNCTION_IDS", n_total)?,
        );
        if n_sym == 1 {
            basis.primitives = read_primitives(&file)?;
        }
        let basis_set = Rc::new(basis);

        let title = read_string_attr(&file, "TITLE").unwrap_or_default();
        let mut wfn = Wavefunction::new(title, n_bas.clone(), Rc::clone(&basis_set));
        wfn.module = read_string_attr(&file, "MOLCAS_MODULE");

        let channels: &[(&str, OrbitalKind)] = if file.link_exists("MO_ALPHA_VECTORS") {
            &UNRESTRICTED
        } else if file.link_exists("MO_VECTORS") {
            &RESTRICTED
        } else {
            &[]
        };
        for (prefix, kind) in channels {
            let set = read_orbital_set(&file, path, prefix, &n_bas, &n_orb, &basis_set)?;
            wfn.mo.insert(*kind, set);
        }

        wfn.overlap = optional_reals(&file, "AO_OVERLAP_MATRIX")?
            .and_then(|v| square_blocks(&v, &n_bas));
        wfn.one_electron = optional_reals(&file, "AO_ONEINT_MATRIX")?
            .and_then(|v| square_blocks(&v, &n_bas));
        if n_sym > 1 {
            wfn.symmetry = read_symmetry(&file, path, &n_bas, &basis_set)?.map(Rc::new);
        }

        wfn.source_format = Some("HDF5".to_string());
        Ok(wfn)
    }

    // ─────────────────────────────────────────────────────────────
    // 写出
    // ─────────────────────────────────────────────────────────────

    fn label(text: &str) -> Result<Label> {
        let truncated: String = text.chars().filter(char::is_ascii).take(LABEL_LEN).collect();
        Label::from_ascii(truncated.as_bytes())
            .map_err(|e| WfnError::InvalidArgument(format!("Invalid label '{}': {}", text, e)))
    }

    fn write_reals(file: &hdf5::File, name: &str, values: &[f64]) -> Result<()> {
        file.new_dataset::<f64>()
            .shape(values.len())
            .create(name)?
            .write_raw(values)?;
        Ok(())
    }

    fn write_ints(file: &hdf5::File, name: &str, values: &[i64]) -> Result<()> {
        file.new_dataset::<i64>()
            .shape(values.len())
            .create(name)?
            .write_raw(values)?;
        Ok(())
    }

    fn write_labels(file: &hdf5::File, name: &str, values: &[String]) -> Result<()> {
        let labels = values.iter().map(|s| label(s)).collect::<Result<Vec<_>>>()?;
        file.new_dataset::<Label>()
            .shape(labels.len())
            .create(name)?
            .write_raw(&labels)?;
        Ok(())
    }

    fn write_int_attr(file: &hdf5::File, name: &str, values: &[i64]) -> Result<()> {
        file.new_attr::<i64>()
            .shape(values.len())
            .create(name)?
            .write_raw(values)?;
        Ok(())
    }

    fn write_string_attr(file: &hdf5::File, name: &str, value: &str) -> Result<()> {
        let truncated: String = value.chars().filter(char::is_ascii).take(64).collect();
        let text = FixedAscii::<64>::from_ascii(truncated.as_bytes())
            .map_err(|e| WfnError::InvalidArgument(e.to_string()))?;
        file.new_attr::<FixedAscii<64>>()
            .shape(())
            .create(name)?
            .write_scalar(&text)?;
        Ok(())
    }

    fn write_basis(file: &hdf5::File, prefix: &str, basis: &BasisSet) -> Result<()> {
        if !basis.centers.is_empty() {
            write_labels(file, &format!("{}CENTER_LABELS", prefix), &basis.center_labels())?;
            let charges: Vec<f64> = basis.centers.iter().map(|c| c.charge).collect();
            write_reals(file, &format!("{}CENTER_CHARGES", prefix), &charges)?;
            let coords: Vec<f64> = basis.centers.iter().flat_map(|c| c.coordinates).collect();
            write_reals(file, &format!("{}CENTER_COORDINATES", prefix), &coords)?;
        }
        if basis.functions.iter().any(|f| f.is_known()) {
            let ids: Vec<i64> = basis
                .functions
                .iter()
                .flat_map(|f| {
                    let center = f.center.map_or(0, |c| c as i64 + 1);
                    [center, f.shell as i64, f.l as i64, f.m as i64]
                })
                .collect();
            write_ints(file, &format!("{}BASIS_FUNCTION_IDS", prefix), &ids)?;
        }
        Ok(())
    }

    fn write_primitives(file: &hdf5::File, primitives: &[Primitive]) -> Result<()> {
        let ids: Vec<i64> = primitives
            .iter()
            .flat_map(|p| [p.center as i64 + 1, p.l as i64, p.shell as i64])
            .collect();
        let values: Vec<f64> = primitives
            .iter()
            .flat_map(|p| [p.exponent, p.coefficient])
            .collect();
        write_ints(file, "PRIMITIVE_IDS", &ids)?;
        write_reals(file, "PRIMITIVES", &values)
    }

    fn flatten_blocks(blocks: &[DMatrix<f64>]) -> Vec<f64> {
        blocks.iter().flat_map(|b| b.iter().copied()).collect()
    }

    /// 写出 HDF5 波函数文件
    pub fn write_h5_file(wfn: &Wavefunction, path: &Path) -> Result<()> {
        let file = hdf5::File::create(path)?;

        write_int_attr(&file, "NSYM", &[wfn.n_sym as i64])?;
        let n_bas: Vec<i64> = wfn.n_bas.iter().map(|&n| n as i64).collect();
        write_int_attr(&file, "NBAS", &n_bas)?;
        write_string_attr(&file, "TITLE", &wfn.title)?;
        if let Some(module) = &wfn.module {
            write_string_attr(&file, "MOLCAS_MODULE", module)?;
        }

        // 合并后 OrbitalSet 的基组可能比 Wavefunction 的更完整
        let basis = wfn
            .mo
            .values()
            .next()
            .map(|set| Rc::clone(&set.basis_set))
            .unwrap_or_else(|| Rc::clone(&wfn.basis_set));
        write_basis(&file, "", &basis)?;
        if wfn.n_sym == 1 {
            if let Some(primitives) = &basis.primitives {
                write_primitives(&file, primitives)?;
            }
        }

        let unrestricted = wfn.is_unrestricted();
        for (kind, set) in &wfn.mo {
            let prefix = match kind {
                OrbitalKind::Restricted if !unrestricted => "MO_",
                OrbitalKind::Alpha => "MO_ALPHA_",
                OrbitalKind::Beta => "MO_BETA_",
                OrbitalKind::Restricted => continue,
            };
            let n_orb: Vec<i64> = set.n_orb().iter().map(|&n| n as i64).collect();
            if n_orb != n_bas && !file.attr_names()?.iter().any(|a| a == "NORB") {
                write_int_attr(&file, "NORB", &n_orb)?;
            }
            write_reals(&file, &format!("{}VECTORS", prefix), &flatten_blocks(&set.coefficients))?;
            write_reals(&file, &format!("{}OCCUPATIONS", prefix), &set.occupations)?;
            write_reals(&file, &format!("{}ENERGIES", prefix), &set.energies)?;
            let types: Vec<String> = set.types.iter().map(|t| t.to_char().to_string()).collect();
            write_labels(&file, &format!("{}TYPEINDICES", prefix), &types)?;
            if !file.link_exists("SUPSYM_IRREP_INDICES") {
                let irreps: Vec<i64> = set.irreps.iter().map(|&i| i as i64).collect();
                write_ints(&file, "SUPSYM_IRREP_INDICES", &irreps)?;
            }
        }

        if let Some(overlap) = &wfn.overlap {
            write_reals(&file, "AO_OVERLAP_MATRIX", &flatten_blocks(overlap))?;
        }
        if let Some(one_electron) = &wfn.one_electron {
            write_reals(&file, "AO_ONEINT_MATRIX", &flatten_blocks(one_electron))?;
        }

        if let Some(symmetry) = wfn.symmetry.as_ref().filter(|_| wfn.n_sym > 1) {
            let d = &symmetry.desym_matrix;
            let row_major: Vec<f64> = d.transpose().iter().copied().collect();
            write_reals(&file, "DESYM_MATRIX", &row_major)?;
            write_basis(&file, "DESYM_", &symmetry.desymmetrized_basis)?;
            if !symmetry.irrep_labels.is_empty() {
                write_labels(&file, "IRREP_LABELS", &symmetry.irrep_labels)?;
            }
            if let Some(primitives) = &symmetry.desymmetrized_basis.primitives {
                write_primitives(&file, primitives)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_signature_detection() {
        let mut signed = tempfile::NamedTempFile::new().unwrap();
        signed.write_all(&HDF5_SIGNATURE).unwrap();
        signed.write_all(&[0u8; 64]).unwrap();
        assert!(has_hdf5_signature(signed.path()).unwrap());

        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "#INPORB 2.2").unwrap();
        assert!(!has_hdf5_signature(text.path()).unwrap());
    }

    #[test]
    fn test_decoder_rejects_text() {
        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "#INPORB 2.2").unwrap();
        let result = H5Decoder.decode(text.path());
        assert!(matches!(result, Err(WfnError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_signed_file_is_unrecognized() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&HDF5_SIGNATURE).unwrap();
        file.write_all(&[0xffu8; 64]).unwrap();
        let err = crate::parsers::probe_wavefunction(file.path()).unwrap_err();
        assert!(matches!(err, WfnError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn test_signature_after_user_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 512]).unwrap();
        file.write_all(&HDF5_SIGNATURE).unwrap();
        assert!(has_hdf5_signature(file.path()).unwrap());
    }
}

#[cfg(all(test, feature = "hdf5"))]
mod backend_tests {
    use super::*;
    use crate::models::fixtures::{h2_symmetric, h2_wavefunction};
    use crate::models::{OrbitalKind, OrbitalSet};
    use crate::parsers::probe_wavefunction;
    use std::rc::Rc;

    fn write_and_read(wfn: &Wavefunction) -> Wavefunction {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h2.h5");
        write_h5_file(wfn, &path).unwrap();
        assert!(has_hdf5_signature(&path).unwrap());
        read_h5_file(&path).unwrap()
    }

    #[test]
    fn test_round_trip_single_block() {
        let wfn = h2_wavefunction();
        let back = write_and_read(&wfn);
        back.validate().unwrap();

        assert_eq!(back.title, "H2 STO-3G");
        assert_eq!(back.n_sym, 1);
        assert_eq!(back.n_bas, vec![2]);
        assert!(back.symmetry.is_none());

        let original = &wfn.mo[&OrbitalKind::Restricted];
        let restored = &back.mo[&OrbitalKind::Restricted];
        assert_eq!(restored.n_orb(), vec![2]);
        assert!((&restored.coefficients[0] - &original.coefficients[0]).amax() < 1e-12);
        assert_eq!(restored.energies, original.energies);
        assert_eq!(restored.occupations, original.occupations);
        assert_eq!(restored.types, original.types);
        assert_eq!(restored.irreps, vec![0, 0]);

        // 基组信息足够再写 Molden
        assert!(restored.basis_set.is_fully_labelled());
        assert_eq!(restored.basis_set.center_labels(), vec!["H1", "H2"]);
        assert_eq!(restored.basis_set.primitives.as_ref().map(Vec::len), Some(4));

        let overlap = back.overlap.as_ref().unwrap();
        assert!((overlap[0][(0, 1)] - wfn.overlap.as_ref().unwrap()[0][(0, 1)]).abs() < 1e-12);
        assert!(back.one_electron.is_some());
    }

    #[test]
    fn test_round_trip_symmetry_blocked() {
        let mut wfn = h2_symmetric();
        // 非对称的 D，行列次序错了就能看出来
        let mut symmetry = (**wfn.symmetry.as_ref().unwrap()).clone();
        let r = std::f64::consts::FRAC_1_SQRT_2;
        symmetry.desym_matrix = nalgebra::DMatrix::from_row_slice(2, 2, &[r, -r, r, r]);
        wfn.symmetry = Some(Rc::new(symmetry));
        let back = write_and_read(&wfn);
        back.validate().unwrap();

        assert_eq!(back.n_sym, 2);
        assert_eq!(back.n_bas, vec![1, 1]);
        let restored = &back.mo[&OrbitalKind::Restricted];
        assert_eq!(restored.n_orb(), vec![1, 1]);
        assert_eq!(restored.irreps, vec![0, 1]);

        let original = wfn.symmetry.as_ref().unwrap();
        let symmetry = back.symmetry.as_ref().unwrap();
        assert!((&symmetry.desym_matrix - &original.desym_matrix).amax() < 1e-12);
        assert!(symmetry.desym_matrix[(0, 1)] < 0.0);
        assert!(symmetry.desym_matrix[(1, 0)] > 0.0);
        assert_eq!(symmetry.irrep_labels, vec!["ag", "b1u"]);
        assert_eq!(symmetry.n_bas, vec![1, 1]);

        // 原始高斯函数只属于去对称化的基组
        assert!(restored.basis_set.primitives.is_none());
        assert_eq!(
            symmetry.desymmetrized_basis.primitives.as_ref().map(Vec::len),
            Some(4)
        );
        assert!(symmetry.desymmetrized_basis.is_fully_labelled());
    }

    #[test]
    fn test_fewer_orbitals_than_basis_functions() {
        let mut wfn = h2_wavefunction();
        let full = &wfn.mo[&OrbitalKind::Restricted];
        let mut set = OrbitalSet::from_blocks(
            Rc::clone(&full.basis_set),
            vec![full.coefficients[0].columns(0, 1).into_owned()],
        );
        set.energies = vec![-0.5782];
        set.occupations = vec![2.0];
        wfn.mo.insert(OrbitalKind::Restricted, set);

        let back = write_and_read(&wfn);
        back.validate().unwrap();
        assert_eq!(back.n_bas, vec![2]);
        assert_eq!(back.mo[&OrbitalKind::Restricted].n_orb(), vec![1]);
        assert_eq!(back.mo[&OrbitalKind::Restricted].occupations, vec![2.0]);
    }

    #[test]
    fn test_round_trip_unrestricted() {
        let mut wfn = h2_wavefunction();
        let set = wfn.mo.remove(&OrbitalKind::Restricted).unwrap();
        let mut beta = set.clone();
        beta.occupations = vec![0.0, 1.0];
        let mut alpha = set;
        alpha.occupations = vec![1.0, 0.0];
        wfn.mo.insert(OrbitalKind::Alpha, alpha);
        wfn.mo.insert(OrbitalKind::Beta, beta);

        let back = write_and_read(&wfn);
        let kinds: Vec<OrbitalKind> = back.mo.keys().copied().collect();
        assert_eq!(kinds, vec![OrbitalKind::Alpha, OrbitalKind::Beta]);
        assert_eq!(back.mo[&OrbitalKind::Beta].occupations, vec![0.0, 1.0]);
    }

    #[test]
    fn test_hdf5_decoder_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.h5");
        write_h5_file(&h2_symmetric(), &path).unwrap();

        let wfn = probe_wavefunction(&path).unwrap();
        assert_eq!(wfn.source_format.as_deref(), Some("HDF5"));
        assert_eq!(wfn.n_bas, vec![1, 1]);
        assert!(wfn.symmetry.is_some());
    }

    #[test]
    fn test_oversized_nbas_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.h5");
        {
            let file = hdf5::File::create(&path).unwrap();
            file.new_attr::<i64>().shape(1).create("NSYM").unwrap().write_raw(&[1i64][..]).unwrap();
            file.new_attr::<i64>()
                .shape(1)
                .create("NBAS")
                .unwrap()
                .write_raw(&[4_294_967_296i64][..])
                .unwrap();
        }
        let err = read_h5_file(&path).unwrap_err();
        assert!(matches!(err, WfnError::ParseError { .. }), "{}", err);
    }
}
