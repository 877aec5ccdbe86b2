//! Reading annotation archives and encoding text columns.

use crate::{common::*, error::ConvertError};
use ndarray::OwnedRepr;
use ndarray_npy::{NpzReader, ReadNpzError, ReadableElement};
use std::fs::File;

/// An opened `.npz` annotation archive.
///
/// Float arrays stored as `f32` are widened to `f64`. Flag arrays may be
/// stored as booleans, integers or floats, where non-zero means set.
pub struct AnnotationArchive {
    path: PathBuf,
    names: Vec<String>,
    reader: NpzReader<File>,
}

impl Debug for AnnotationArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationArchive")
            .field("path", &self.path)
            .field("names", &self.names)
            .finish()
    }
}

impl AnnotationArchive {
    pub fn open<P>(path: P) -> Result<Self, ConvertError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| ConvertError::missing(path, err))?;
        let mut reader = NpzReader::new(file).map_err(|err| ConvertError::missing(path, err))?;
        let names = reader
            .names()
            .map_err(|err| ConvertError::missing(path, err))?
            .into_iter()
            .map(|name| name.trim_end_matches(".npy").to_owned())
            .collect();

        Ok(Self {
            path: path.to_owned(),
            names,
            reader,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|stored| stored == name)
    }

    pub fn floats<D>(&mut self, name: &str) -> Result<Array<f64, D>, ConvertError>
    where
        D: Dimension,
    {
        self.ensure_contains(name)?;
        let err = match self.read::<f64, D>(name) {
            Ok(array) => return Ok(array),
            Err(err) => err,
        };
        if let Ok(array) = self.read::<f32, D>(name) {
            return Ok(array.mapv(f64::from));
        }
        Err(self.malformed(name, err))
    }

    pub fn flags<D>(&mut self, name: &str) -> Result<Array<bool, D>, ConvertError>
    where
        D: Dimension,
    {
        self.ensure_contains(name)?;
        let err = match self.read::<bool, D>(name) {
            Ok(array) => return Ok(array),
            Err(err) => err,
        };
        if let Ok(array) = self.read::<u8, D>(name) {
            return Ok(array.mapv(|value| value != 0));
        }
        if let Ok(array) = self.read::<i64, D>(name) {
            return Ok(array.mapv(|value| value != 0));
        }
        if let Ok(array) = self.read::<i32, D>(name) {
            return Ok(array.mapv(|value| value != 0));
        }
        if let Ok(array) = self.floats::<D>(name) {
            return Ok(array.mapv(|value| value != 0.0));
        }
        Err(self.malformed(name, err))
    }

    /// Read a text column, one string per row.
    ///
    /// A one-dimensional byte array is read as one single-byte string per entry.
    pub fn string_rows(&mut self, name: &str) -> Result<Vec<String>, ConvertError> {
        let bytes = self.bytes(name)?;
        let rows: Vec<String> = match bytes.ndim() {
            1 => bytes
                .iter()
                .map(|&byte| decode_string(&[byte]))
                .collect(),
            2 => bytes
                .outer_iter()
                .map(|row| decode_string(&row.iter().copied().collect::<Vec<u8>>()))
                .collect(),
            _ => {
                return Err(self.malformed(
                    name,
                    format!(
                        "expect a 1 or 2 dimensional text array, but found {:?}",
                        bytes.shape()
                    ),
                ))
            }
        };
        Ok(rows)
    }

    /// Read a one-dimensional byte array as a single string.
    pub fn string(&mut self, name: &str) -> Result<String, ConvertError> {
        let bytes = self.bytes(name)?;
        if bytes.ndim() != 1 {
            return Err(self.malformed(
                name,
                format!("expect a 1 dimensional text array, but found {:?}", bytes.shape()),
            ));
        }
        Ok(decode_string(&bytes.iter().copied().collect::<Vec<_>>()))
    }

    fn bytes(&mut self, name: &str) -> Result<ArrayD<u8>, ConvertError> {
        self.ensure_contains(name)?;
        let err = match self.read::<u8, _>(name) {
            Ok(array) => return Ok(array),
            Err(err) => err,
        };
        if let Ok(array) = self.read::<i8, _>(name) {
            return Ok(array.mapv(|value| value as u8));
        }
        Err(self.malformed(name, err))
    }

    fn read<T, D>(&mut self, name: &str) -> Result<Array<T, D>, ReadNpzError>
    where
        T: ReadableElement,
        D: Dimension,
    {
        self.reader.by_name::<OwnedRepr<T>, D>(name)
    }

    fn ensure_contains(&self, name: &str) -> Result<(), ConvertError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(ConvertError::missing(
                &self.path,
                format!("array '{}' is not found", name),
            ))
        }
    }

    fn malformed(&self, name: &str, reason: impl Display) -> ConvertError {
        ConvertError::malformed(format!("'{}' of '{}'", name, self.path.display()), reason)
    }
}

/// Pack strings into a NUL-padded `(N, L)` byte matrix.
///
/// `L` is the longest encoded length, at least one.
pub fn encode_strings<S>(strings: &[S]) -> Array2<u8>
where
    S: AsRef<str>,
{
    let width = strings
        .iter()
        .map(|text| text.as_ref().len())
        .max()
        .unwrap_or(0)
        .max(1);
    let mut matrix = Array2::zeros((strings.len(), width));

    strings.iter().enumerate().for_each(|(index, text)| {
        let bytes = text.as_ref().as_bytes();
        matrix
            .slice_mut(s![index, ..bytes.len()])
            .assign(&ArrayView1::from(bytes));
    });

    matrix
}

/// Decode UTF-8 bytes, dropping trailing NUL padding.
pub fn decode_string(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&byte| byte != 0)
        .map(|index| index + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
