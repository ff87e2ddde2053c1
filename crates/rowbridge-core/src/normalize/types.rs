//! Type name, length and full type normalization.

use crate::column::{ColumnModel, ColumnType, GenerationStrategy, NativeType};
use crate::options::Flavor;

use super::Normalizer;

/// Fixed textual width of a UUID.
const UUID_LENGTH: &str = "36";

const BOOLEAN_WIDTH: u32 = 1;

/// Length assumed for variable-length character and binary columns.
const DEFAULT_VARCHAR_LENGTH: &str = "255";

impl Normalizer {
    /// Maps a declared type to the type name the server reports.
    ///
    /// Types without a rule are returned unchanged. Normalizing an
    /// already normalized type is a no-op.
    #[must_use]
    pub fn canonical_type(&self, column_type: &ColumnType) -> ColumnType {
        match column_type {
            ColumnType::Native(NativeType::Number) | ColumnType::Integer => ColumnType::Int,
            ColumnType::Native(NativeType::String)
            | ColumnType::Uuid
            | ColumnType::NVarChar
            | ColumnType::NationalVarChar => ColumnType::VarChar,
            ColumnType::Native(NativeType::Date) => ColumnType::DateTime,
            ColumnType::Native(NativeType::Buffer) => ColumnType::Blob,
            ColumnType::Native(NativeType::Boolean) | ColumnType::Bool | ColumnType::Boolean => {
                ColumnType::TinyInt
            }
            ColumnType::Json if self.flavor == Flavor::Mariadb => ColumnType::LongText,
            ColumnType::SimpleArray | ColumnType::SimpleJson => ColumnType::Text,
            ColumnType::SimpleEnum => ColumnType::Enum,
            ColumnType::DoublePrecision | ColumnType::Real => ColumnType::Double,
            ColumnType::Dec | ColumnType::Numeric | ColumnType::Fixed => ColumnType::Decimal,
            ColumnType::NChar | ColumnType::NationalChar => ColumnType::Char,
            other => other.clone(),
        }
    }

    /// Returns the normalized type name of a column.
    #[must_use]
    pub fn normalize_type(&self, column: &ColumnModel) -> String {
        self.canonical_type(&column.column_type).to_string()
    }

    /// Returns the length the server reports for a column, or an empty
    /// string when the type carries no length.
    #[must_use]
    pub fn column_length(&self, column: &ColumnModel) -> String {
        if let Some(length) = column.length {
            return length.to_string();
        }
        if column.is_primary && column.generation_strategy == Some(GenerationStrategy::Uuid) {
            return UUID_LENGTH.to_string();
        }
        match column.column_type {
            ColumnType::Uuid => UUID_LENGTH.to_string(),
            ColumnType::Native(NativeType::String)
            | ColumnType::VarChar
            | ColumnType::NVarChar
            | ColumnType::NationalVarChar
            | ColumnType::VarBinary => DEFAULT_VARCHAR_LENGTH.to_string(),
            _ => String::new(),
        }
    }

    /// Returns the display width the server reports for a column.
    ///
    /// Boolean columns are created as `tinyint(1)`, so they carry width 1
    /// unless one is declared.
    #[must_use]
    pub fn column_width(&self, column: &ColumnModel) -> Option<u32> {
        column.width.or(match column.column_type {
            ColumnType::Native(NativeType::Boolean) | ColumnType::Bool | ColumnType::Boolean => {
                Some(BOOLEAN_WIDTH)
            }
            _ => None,
        })
    }

    /// Builds the full type clause, e.g. `decimal(10,2)` or `int(11)`.
    #[must_use]
    pub fn full_type(&self, column: &ColumnModel) -> String {
        let mut full = self.normalize_type(column);
        let width = self.column_width(column);
        let size = match (column.length, width, column.precision, column.scale) {
            (Some(length), ..) => Some(length.to_string()),
            (None, Some(width), ..) => Some(width.to_string()),
            (None, None, Some(precision), Some(scale)) => Some(format!("{precision},{scale}")),
            (None, None, Some(precision), None) => Some(precision.to_string()),
            _ => None,
        };
        if let Some(size) = size {
            full.push('(');
            full.push_str(&size);
            full.push(')');
        }
        if column.is_array {
            full.push_str(" array");
        }
        full
    }
}

/// Sizes the server assumes when a type is declared without them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeDefaults {
    /// Implied length.
    pub length: Option<u32>,
    /// Implied display width.
    pub width: Option<u32>,
    /// Implied precision.
    pub precision: Option<u32>,
    /// Implied scale.
    pub scale: Option<u32>,
}

impl TypeDefaults {
    const fn length(length: u32) -> Self {
        Self {
            length: Some(length),
            width: None,
            precision: None,
            scale: None,
        }
    }

    const fn width(width: u32) -> Self {
        Self {
            length: None,
            width: Some(width),
            precision: None,
            scale: None,
        }
    }

    const fn precision(precision: u32, scale: Option<u32>) -> Self {
        Self {
            length: None,
            width: None,
            precision: Some(precision),
            scale,
        }
    }
}

/// Returns the implied sizes of a normalized type name.
#[must_use]
pub fn data_type_defaults(type_name: &str) -> Option<TypeDefaults> {
    let defaults = match type_name {
        "varchar" | "nvarchar" | "national varchar" | "varbinary" => TypeDefaults::length(255),
        "char" | "nchar" | "national char" | "binary" => TypeDefaults::length(1),
        "decimal" | "dec" | "numeric" | "fixed" => TypeDefaults::precision(10, Some(0)),
        "float" => TypeDefaults::precision(12, None),
        "double" => TypeDefaults::precision(22, None),
        "time" | "datetime" | "timestamp" => TypeDefaults::precision(0, None),
        "bit" => TypeDefaults::width(1),
        "int" | "integer" => TypeDefaults::width(11),
        "tinyint" => TypeDefaults::width(4),
        "smallint" => TypeDefaults::width(6),
        "mediumint" => TypeDefaults::width(9),
        "bigint" => TypeDefaults::width(20),
        "year" => TypeDefaults::width(4),
        _ => return None,
    };
    Some(defaults)
}
