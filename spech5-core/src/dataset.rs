//! Dataset values of the virtual tree.
//!
//! Backing stores hand out [`RawData`] in whatever type they hold. A
//! [`Dataset`] always stores numbers as `float32` and strings unchanged;
//! booleans, complex numbers and opaque blobs are rejected.

use crate::attrs::{attributes_for, Attrs};
use crate::{Error, Result};
use ndarray::{arr0, Array1, Array2, ArrayD};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source-typed n-dimensional data, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Int(ArrayD<i64>),
    UInt(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Str(ArrayD<String>),
    Bytes(ArrayD<Vec<u8>>),
    Bool(ArrayD<bool>),
    /// Complex values as `[re, im]` pairs.
    Complex(ArrayD<[f64; 2]>),
    Opaque(Vec<u8>),
}

impl RawData {
    /// Short name of the source type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Bool(_) => "bool",
            Self::Complex(_) => "complex",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl From<f64> for RawData {
    fn from(value: f64) -> Self {
        Self::Float64(arr0(value).into_dyn())
    }
}

impl From<&str> for RawData {
    fn from(value: &str) -> Self {
        Self::Str(arr0(value.to_string()).into_dyn())
    }
}

impl From<String> for RawData {
    fn from(value: String) -> Self {
        Self::Str(arr0(value).into_dyn())
    }
}

impl From<Vec<f64>> for RawData {
    fn from(value: Vec<f64>) -> Self {
        Self::Float64(Array1::from(value).into_dyn())
    }
}

impl From<[f64; 3]> for RawData {
    fn from(value: [f64; 3]) -> Self {
        Self::from(value.to_vec())
    }
}

impl From<Array1<f64>> for RawData {
    fn from(value: Array1<f64>) -> Self {
        Self::Float64(value.into_dyn())
    }
}

impl From<Array2<f64>> for RawData {
    fn from(value: Array2<f64>) -> Self {
        Self::Float64(value.into_dyn())
    }
}

/// Element type of a coerced payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DType {
    Float32,
    Str,
    Bytes,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Float32 => "float32",
            Self::Str => "str",
            Self::Bytes => "bytes",
        })
    }
}

/// Coerced dataset content.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Float(ArrayD<f32>),
    Str(ArrayD<String>),
    Bytes(ArrayD<Vec<u8>>),
}

impl Payload {
    /// Applies the dtype convention: int, uint and float become `float32`,
    /// strings and bytes are kept.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedDtype`] for booleans, complex and opaque data.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn coerce(raw: RawData) -> Result<Self> {
        match raw {
            RawData::Int(a) => Ok(Self::Float(a.mapv(|v| v as f32))),
            RawData::UInt(a) => Ok(Self::Float(a.mapv(|v| v as f32))),
            RawData::Float32(a) => Ok(Self::Float(a)),
            RawData::Float64(a) => Ok(Self::Float(a.mapv(|v| v as f32))),
            RawData::Str(a) => Ok(Self::Str(a)),
            RawData::Bytes(a) => Ok(Self::Bytes(a)),
            other @ (RawData::Bool(_) | RawData::Complex(_) | RawData::Opaque(_)) => {
                Err(Error::UnsupportedDtype(other.type_name()))
            }
        }
    }

    /// Element type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float(_) => DType::Float32,
            Self::Str(_) => DType::Str,
            Self::Bytes(_) => DType::Bytes,
        }
    }

    /// Array shape; empty for scalars.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float(a) => a.shape(),
            Self::Str(a) => a.shape(),
            Self::Bytes(a) => a.shape(),
        }
    }
}

/// A materialized dataset: payload plus its name and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    attrs: Attrs,
    payload: Payload,
    is_link: bool,
}

impl Dataset {
    /// Builds a dataset, coercing `raw` and attaching the attributes of `name`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedDtype`] if `raw` cannot be coerced.
    pub fn new(name: impl Into<String>, raw: RawData) -> Result<Self> {
        let name = name.into();
        Ok(Self {
            attrs: attributes_for(&name),
            payload: Payload::coerce(raw)?,
            name,
            is_link: false,
        })
    }

    /// Builds a dataset reached through a link.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedDtype`] if `raw` cannot be coerced.
    pub fn link(name: impl Into<String>, raw: RawData) -> Result<Self> {
        let mut dataset = Self::new(name, raw)?;
        dataset.is_link = true;
        Ok(dataset)
    }

    /// Full path of the dataset.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes of the dataset.
    #[must_use]
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Coerced content.
    #[must_use]
    pub fn value(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Returns true if the dataset was reached through a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.is_link
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.payload.dtype()
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.payload.shape()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements (1 for scalars).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric content, if the dataset is numeric.
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayD<f32>> {
        match &self.payload {
            Payload::Float(a) => Some(a),
            _ => None,
        }
    }

    /// Value of a numeric scalar.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        self.as_array()
            .filter(|a| a.ndim() == 0)
            .and_then(|a| a.first().copied())
    }

    /// Value of a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(a) if a.ndim() == 0 => a.first().map(String::as_str),
            _ => None,
        }
    }
}
