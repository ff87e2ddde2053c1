//! Column and table models.
//!
//! [`ColumnModel`] and [`EntityModel`] describe what the application
//! expects, [`LiveColumn`] describes what introspection found on the
//! server. Both sides are plain data; normalization happens in
//! [`crate::normalize`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::{Computed, Value};

// ================================================================
// Column types
// ================================================================

/// Language-level type aliases a column can be declared with instead of
/// a dialect type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// `Boolean`.
    Boolean,
    /// `Number`.
    Number,
    /// `String`.
    String,
    /// `Date`.
    Date,
    /// `Buffer`.
    Buffer,
}

impl NativeType {
    /// Returns the alias spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::String => "String",
            Self::Date => "Date",
            Self::Buffer => "Buffer",
        }
    }
}

macro_rules! column_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A declared column type.
        ///
        /// Dialect types are spelled the way MySQL spells them, the
        /// language-level aliases are wrapped in [`ColumnType::Native`] and
        /// anything else is kept verbatim in [`ColumnType::Other`].
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum ColumnType {
            $(
                #[doc = concat!("`", $name, "`.")]
                $variant,
            )+
            /// A language-level alias.
            Native(NativeType),
            /// A type this crate has no rules for; assumed dialect-native.
            Other(String),
        }

        impl ColumnType {
            /// Returns the type spelling.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Native(native) => native.as_str(),
                    Self::Other(name) => name,
                }
            }
        }

        impl FromStr for ColumnType {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    "Boolean" => Self::Native(NativeType::Boolean),
                    "Number" => Self::Native(NativeType::Number),
                    "String" => Self::Native(NativeType::String),
                    "Date" => Self::Native(NativeType::Date),
                    "Buffer" => Self::Native(NativeType::Buffer),
                    other => match other.to_ascii_lowercase().as_str() {
                        $($name => Self::$variant,)+
                        _ => Self::Other(other.to_string()),
                    },
                })
            }
        }
    };
}

column_types! {
    Bit => "bit",
    Int => "int",
    Integer => "integer",
    TinyInt => "tinyint",
    SmallInt => "smallint",
    MediumInt => "mediumint",
    BigInt => "bigint",
    Float => "float",
    Double => "double",
    DoublePrecision => "double precision",
    Real => "real",
    Decimal => "decimal",
    Dec => "dec",
    Numeric => "numeric",
    Fixed => "fixed",
    Bool => "bool",
    Boolean => "boolean",
    Date => "date",
    DateTime => "datetime",
    Timestamp => "timestamp",
    Time => "time",
    Year => "year",
    Char => "char",
    NChar => "nchar",
    NationalChar => "national char",
    VarChar => "varchar",
    NVarChar => "nvarchar",
    NationalVarChar => "national varchar",
    Text => "text",
    TinyText => "tinytext",
    MediumText => "mediumtext",
    LongText => "longtext",
    Blob => "blob",
    TinyBlob => "tinyblob",
    MediumBlob => "mediumblob",
    LongBlob => "longblob",
    Binary => "binary",
    VarBinary => "varbinary",
    Enum => "enum",
    Set => "set",
    Json => "json",
    Uuid => "uuid",
    Inet4 => "inet4",
    Inet6 => "inet6",
    Geometry => "geometry",
    Point => "point",
    LineString => "linestring",
    Polygon => "polygon",
    MultiPoint => "multipoint",
    MultiLineString => "multilinestring",
    MultiPolygon => "multipolygon",
    GeometryCollection => "geometrycollection",
    SimpleArray => "simple-array",
    SimpleJson => "simple-json",
    SimpleEnum => "simple-enum",
}

impl ColumnType {
    /// Returns `true` for `enum` and `simple-enum`.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self, Self::Enum | Self::SimpleEnum)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ColumnType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

impl From<NativeType> for ColumnType {
    fn from(native: NativeType) -> Self {
        Self::Native(native)
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

// ================================================================
// Column attributes
// ================================================================

/// How a generated column gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStrategy {
    /// Server-side auto increment.
    Increment,
    /// Application-side UUID.
    Uuid,
}

/// A member of an enum column's domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumMember {
    /// Integer member (numeric enums).
    Int(i64),
    /// Text member.
    Text(String),
}

impl fmt::Display for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EnumMember {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for EnumMember {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Declared default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Explicit `NULL`: no default clause is emitted.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// Text literal.
    Text(String),
    /// List literal (`set` columns).
    List(Vec<String>),
    /// SQL produced on demand (e.g. `CURRENT_TIMESTAMP`).
    Computed(Computed),
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let json = match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::from(items.clone()),
            Self::Computed(c) => serde_json::json!({ "sql": c.call() }),
        };
        json.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let json = serde_json::Value::deserialize(deserializer)?;
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => Ok(n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Integer)),
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Array(items) => Ok(Self::List(
                items.iter().map(|item| Value::from(item.clone()).stringify()).collect(),
            )),
            serde_json::Value::Object(map) => match map.get("sql") {
                Some(serde_json::Value::String(sql)) => Ok(Self::Computed(Computed::sql(sql.clone()))),
                _ => Err(D::Error::custom("object defaults must be of the form {\"sql\": \"...\"}")),
            },
        }
    }
}

/// Converts values between the application and the database
/// representation of a column.
pub trait ValueTransformer: fmt::Debug + Send + Sync {
    /// Application value to persisted value.
    fn to_database(&self, value: Value) -> Value;

    /// Persisted value to application value.
    fn from_database(&self, value: Value) -> Value;
}

type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A [`ValueTransformer`] built from two closures.
#[derive(Clone)]
pub struct FnTransformer {
    name: &'static str,
    to: TransformFn,
    from: TransformFn,
}

impl FnTransformer {
    /// Creates a transformer from its two directions.
    pub fn new(
        name: &'static str,
        to: impl Fn(Value) -> Value + Send + Sync + 'static,
        from: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            to: Arc::new(to),
            from: Arc::new(from),
        }
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ValueTransformer for FnTransformer {
    fn to_database(&self, value: Value) -> Value {
        (self.to)(value)
    }

    fn from_database(&self, value: Value) -> Value {
        (self.from)(value)
    }
}

// ================================================================
// Desired state
// ================================================================

/// Desired definition of a column, as derived from the entity model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnModel {
    /// Property name on the entity.
    pub name: String,
    /// Column name in the database.
    pub database_name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Character or binary length.
    pub length: Option<u32>,
    /// Integer display width.
    pub width: Option<u32>,
    /// Numeric or fractional-seconds precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Whether the column is part of the primary key.
    pub is_primary: bool,
    /// Whether the value is generated.
    pub is_generated: bool,
    /// How the value is generated.
    pub generation_strategy: Option<GenerationStrategy>,
    /// Declared default; `None` means no default was declared.
    pub default: Option<DefaultValue>,
    /// Enum or set domain.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumMember>>,
    /// Column comment.
    pub comment: Option<String>,
    /// Converters applied around marshalling, outermost first.
    #[serde(skip)]
    pub transformers: Vec<Arc<dyn ValueTransformer>>,
    /// `ON UPDATE` expression.
    pub on_update: Option<String>,
    /// `ZEROFILL` attribute.
    pub zerofill: bool,
    /// `UNSIGNED` attribute.
    pub unsigned: bool,
    /// Generated-column expression.
    pub as_expression: Option<String>,
    /// `VIRTUAL` or `STORED` for generated columns.
    pub generated_type: Option<String>,
    /// Whether the column holds an array of its type.
    pub is_array: bool,
    /// Property path of the embedded object holding this column.
    pub embedded_path: Vec<String>,
}

impl Default for ColumnModel {
    fn default() -> Self {
        Self::new("", ColumnType::Native(NativeType::String))
    }
}

impl ColumnModel {
    /// Creates a nullable column whose database name equals its
    /// property name.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        let name = name.into();
        Self {
            database_name: name.clone(),
            name,
            column_type: column_type.into(),
            length: None,
            width: None,
            precision: None,
            scale: None,
            is_nullable: true,
            is_primary: false,
            is_generated: false,
            generation_strategy: None,
            default: None,
            enum_values: None,
            comment: None,
            transformers: Vec::new(),
            on_update: None,
            zerofill: false,
            unsigned: false,
            as_expression: None,
            generated_type: None,
            is_array: false,
            embedded_path: Vec::new(),
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the display width.
    #[must_use]
    pub const fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the precision.
    #[must_use]
    pub const fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the scale.
    #[must_use]
    pub const fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Marks the column as primary key (implies NOT NULL).
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self.is_nullable = false;
        self
    }

    /// Marks the column as generated by the given strategy.
    #[must_use]
    pub const fn generated(mut self, strategy: GenerationStrategy) -> Self {
        self.is_generated = true;
        self.generation_strategy = Some(strategy);
        self
    }

    /// Sets the default.
    #[must_use]
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the enum domain.
    #[must_use]
    pub fn enum_values<I, M>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<EnumMember>,
    {
        self.enum_values = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Appends a transformer.
    #[must_use]
    pub fn transformer(mut self, transformer: impl ValueTransformer + 'static) -> Self {
        self.transformers.push(Arc::new(transformer));
        self
    }

    /// Sets the `ON UPDATE` expression.
    #[must_use]
    pub fn on_update(mut self, expr: impl Into<String>) -> Self {
        self.on_update = Some(expr.into());
        self
    }

    /// Sets `UNSIGNED`.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets `ZEROFILL`.
    #[must_use]
    pub const fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }

    /// Makes this a generated column.
    #[must_use]
    pub fn as_expression(mut self, expr: impl Into<String>, generated_type: impl Into<String>) -> Self {
        self.as_expression = Some(expr.into());
        self.generated_type = Some(generated_type.into());
        self
    }

    /// Marks the column as an array column.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Places the column inside an embedded object.
    #[must_use]
    pub fn embedded_in<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embedded_path = path.into_iter().map(Into::into).collect();
        self
    }
}

/// A table index on the desired side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexModel {
    /// Index name.
    pub name: String,
    /// Database names of the indexed columns, in index order.
    pub columns: Vec<String>,
    /// Whether the index is UNIQUE.
    #[serde(default)]
    pub is_unique: bool,
}

impl IndexModel {
    /// Creates a non-unique index.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            is_unique: false,
        }
    }

    /// Makes the index UNIQUE.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

/// Desired definition of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityModel {
    /// Table name; never contains a database prefix.
    pub table_name: String,
    /// Database the table lives in, if pinned.
    pub database: Option<String>,
    /// Schema the table lives in, if pinned.
    pub schema: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnModel>,
    /// Indices declared on the table.
    pub indices: Vec<IndexModel>,
}

impl EntityModel {
    /// Creates an empty entity for the given table.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Pins the database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnModel) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexModel) -> Self {
        self.indices.push(index);
        self
    }

    /// Parses an entity from JSON.
    ///
    /// Columns without a `database_name` are stored under their property
    /// name.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error for malformed input.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut entity: Self = serde_json::from_str(json)?;
        for column in &mut entity.columns {
            if column.database_name.is_empty() {
                column.database_name.clone_from(&column.name);
            }
        }
        Ok(entity)
    }

    /// Looks up a column by its database name.
    #[must_use]
    pub fn column_by_database_name(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.database_name == name)
    }

    /// Returns the generated columns.
    pub fn generated_columns(&self) -> impl Iterator<Item = &ColumnModel> {
        self.columns.iter().filter(|c| c.is_generated)
    }

    /// Whether `column` is the sole column of some unique index.
    ///
    /// Evaluated against the current index list on every call.
    #[must_use]
    pub fn is_unique(&self, column: &ColumnModel) -> bool {
        self.indices.iter().any(|index| {
            index.is_unique
                && index.columns.len() == 1
                && index.columns[0] == column.database_name
        })
    }
}

// ================================================================
// Observed state
// ================================================================

/// A column as reported by schema introspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Normalized type name.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Length; empty when the type carries none.
    pub length: String,
    /// Integer display width.
    pub width: Option<u32>,
    /// Precision.
    pub precision: Option<u32>,
    /// Scale.
    pub scale: Option<u32>,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Whether the column is part of the primary key.
    pub is_primary: bool,
    /// Whether a single-column unique index covers the column.
    pub is_unique: bool,
    /// Whether the value is generated (auto increment).
    pub is_generated: bool,
    /// Default as the server reports it.
    pub default: Option<String>,
    /// Enum or set domain.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
    /// Comment.
    pub comment: Option<String>,
    /// `ON UPDATE` expression.
    pub on_update: Option<String>,
    /// `ZEROFILL` attribute.
    pub zerofill: bool,
    /// `UNSIGNED` attribute.
    pub unsigned: bool,
    /// Generated-column expression.
    pub as_expression: Option<String>,
    /// `VIRTUAL` or `STORED`.
    pub generated_type: Option<String>,
}

impl LiveColumn {
    /// Creates a nullable live column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            is_nullable: true,
            ..Self::default()
        }
    }
}
