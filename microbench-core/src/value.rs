//! Argument Values
//!
//! Arguments cross the registration boundary as [`ArgValue`], a closed set of
//! dynamically typed values. Resolution decodes them once into concrete Rust
//! types through [`FromArg`], so the timed loop never touches an `ArgValue`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime type of an argument, used to match a registered member's parameter shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// Owned string
    Str,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgKind::Int => "int",
            ArgKind::Float => "float",
            ArgKind::Bool => "bool",
            ArgKind::Str => "str",
        };
        f.write_str(name)
    }
}

/// A single benchmark argument as stored at registration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Integer argument
    Int(i64),
    /// Floating-point argument
    Float(f64),
    /// Boolean argument
    Bool(bool),
    /// String argument
    Str(String),
}

impl ArgValue {
    /// Runtime kind of this value
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Int(_) => ArgKind::Int,
            ArgValue::Float(_) => ArgKind::Float,
            ArgValue::Bool(_) => ArgKind::Bool,
            ArgValue::Str(_) => ArgKind::Str,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{}", v),
            ArgValue::Float(v) => write!(f, "{}", v),
            ArgValue::Bool(v) => write!(f, "{}", v),
            ArgValue::Str(v) => write!(f, "{:?}", v),
        }
    }
}

/// Shape of an argument list, e.g. `(int, int)`
pub fn shape_of(args: &[ArgValue]) -> Vec<ArgKind> {
    args.iter().map(ArgValue::kind).collect()
}

/// Render a shape for diagnostics
pub fn format_shape(shape: &[ArgKind]) -> String {
    let parts: Vec<String> = shape.iter().map(|k| k.to_string()).collect();
    format!("({})", parts.join(", "))
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(v: $ty) -> Self {
                    ArgValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        ArgValue::Float(f64::from(v))
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

/// Build a `Vec<ArgValue>` from heterogeneous literals.
///
/// ```ignore
/// runner.register("demo.Strings.concatenation", args![10_000, 5])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::ArgValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ArgValue::from($value)),+]
    };
}

/// Decode an [`ArgValue`] into a concrete parameter type
pub trait FromArg: Sized {
    /// Kind this type is declared as in a member's shape
    const KIND: ArgKind;

    /// Decode, returning `None` on a kind mismatch or an out-of-range value
    fn from_arg(value: &ArgValue) -> Option<Self>;
}

macro_rules! impl_from_arg_int {
    ($($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                const KIND: ArgKind = ArgKind::Int;

                fn from_arg(value: &ArgValue) -> Option<Self> {
                    match value {
                        ArgValue::Int(v) => <$ty>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_arg_int!(i32, i64, u32, u64, usize);

impl FromArg for f64 {
    const KIND: ArgKind = ArgKind::Float;

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for bool {
    const KIND: ArgKind = ArgKind::Bool;

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for String {
    const KIND: ArgKind = ArgKind::Str;

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}
