use super::Value;
use crate::{Error, Result};

/// The declared type of an entity field.
///
/// Column values read from an executor are coerced to the field's type
/// before they are stored on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// String type
    String,

    /// Opaque byte array
    Bytes,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Bool => "Bool",
            Type::I32 => "I32",
            Type::I64 => "I64",
            Type::F64 => "F64",
            Type::String => "String",
            Type::Bytes => "Bytes",
        }
    }

    /// Coerces `value` to this type.
    ///
    /// `Null` is accepted by every type. Numeric values convert between
    /// widths when lossless, strings are parsed, and numbers render to
    /// strings.
    pub fn cast(self, value: Value) -> Result<Value> {
        let fail = |value: Value| -> Result<Value> { Err(Error::type_conversion(value, self.name())) };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Type::Bool, Value::Bool(v)) => Ok(Value::Bool(v)),
            (Type::Bool, Value::I32(v)) => Ok(Value::Bool(v != 0)),
            (Type::Bool, Value::I64(v)) => Ok(Value::Bool(v != 0)),
            (Type::Bool, Value::String(v)) => match v.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => fail(Value::String(v)),
            },
            (Type::I32, Value::I32(v)) => Ok(Value::I32(v)),
            (Type::I32, Value::I64(v)) => match i32::try_from(v) {
                Ok(v) => Ok(Value::I32(v)),
                Err(_) => fail(Value::I64(v)),
            },
            (Type::I64, Value::I32(v)) => Ok(Value::I64(v.into())),
            (Type::I64, Value::I64(v)) => Ok(Value::I64(v)),
            (Type::I32 | Type::I64, Value::Bool(v)) => self.cast(Value::I64(v.into())),
            (Type::I32 | Type::I64, Value::F64(v)) => {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    self.cast(Value::I64(v as i64))
                } else {
                    fail(Value::F64(v))
                }
            }
            (Type::I32 | Type::I64, Value::String(v)) => match v.trim().parse::<i64>() {
                Ok(parsed) => self.cast(Value::I64(parsed)),
                Err(_) => fail(Value::String(v)),
            },
            (Type::F64, Value::F64(v)) => Ok(Value::F64(v)),
            (Type::F64, Value::I32(v)) => Ok(Value::F64(v.into())),
            (Type::F64, Value::I64(v)) => Ok(Value::F64(v as f64)),
            (Type::F64, Value::String(v)) => match v.trim().parse::<f64>() {
                Ok(parsed) => Ok(Value::F64(parsed)),
                Err(_) => fail(Value::String(v)),
            },
            (Type::String, Value::String(v)) => Ok(Value::String(v)),
            (Type::String, Value::Bool(v)) => Ok(Value::String(v.to_string())),
            (Type::String, Value::I32(v)) => Ok(Value::String(v.to_string())),
            (Type::String, Value::I64(v)) => Ok(Value::String(v.to_string())),
            (Type::String, Value::F64(v)) => Ok(Value::String(v.to_string())),
            (Type::String, Value::Bytes(v)) => match String::from_utf8(v) {
                Ok(v) => Ok(Value::String(v)),
                Err(err) => fail(Value::Bytes(err.into_bytes())),
            },
            (Type::Bytes, Value::Bytes(v)) => Ok(Value::Bytes(v)),
            (Type::Bytes, Value::String(v)) => Ok(Value::Bytes(v.into_bytes())),
            (_, value) => fail(value),
        }
    }
}
