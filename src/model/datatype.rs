//! Column data types and the widening hierarchy.
//!
//! Types form a fixed rooted tree used to find a common type for two
//! observations of the same column:
//!
//! ```text
//! VarWChar
//! ├── Boolean
//! ├── DbTimeStamp
//! └── Decimal
//!     └── Double
//!         ├── Single
//!         └── BigInt
//!             └── Integer
//!                 └── SmallInt
//!                     └── TinyInt
//! ```
//!
//! Tags outside the tree hang directly off the root. `Unknown` is the
//! identity of [`DataType::common_type`] and never appears in the tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::confidence::Candidate;

/// Error converting a source system type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataTypeError {
    #[error("Unmapped source data type: {0}")]
    Unmapped(String),
}

/// Type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// No information yet (empty sample, unknown source type).
    Unknown,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UnsignedTinyInt,
    UnsignedSmallInt,
    UnsignedInt,
    UnsignedBigInt,
    Single,
    Double,
    Decimal,
    Numeric,
    Currency,
    Date,
    DbDate,
    DbTime,
    DbTimeStamp,
    Char,
    VarChar,
    LongVarChar,
    WChar,
    VarWChar,
    LongVarWChar,
    Bstr,
    Guid,
    Binary,
    VarBinary,
    LongVarBinary,
}

impl TypeTag {
    /// The root of the widening tree.
    pub const ROOT: TypeTag = TypeTag::VarWChar;

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeTag::TinyInt
                | TypeTag::SmallInt
                | TypeTag::Integer
                | TypeTag::BigInt
                | TypeTag::UnsignedTinyInt
                | TypeTag::UnsignedSmallInt
                | TypeTag::UnsignedInt
                | TypeTag::UnsignedBigInt
                | TypeTag::Single
                | TypeTag::Double
                | TypeTag::Decimal
                | TypeTag::Numeric
                | TypeTag::Currency
        )
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            TypeTag::Char
                | TypeTag::VarChar
                | TypeTag::LongVarChar
                | TypeTag::WChar
                | TypeTag::VarWChar
                | TypeTag::LongVarWChar
                | TypeTag::Bstr
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            TypeTag::Date | TypeTag::DbDate | TypeTag::DbTime | TypeTag::DbTimeStamp
        )
    }

    /// Wide-character types whose byte length counts two bytes per char.
    pub fn is_wide(self) -> bool {
        matches!(
            self,
            TypeTag::WChar | TypeTag::VarWChar | TypeTag::LongVarWChar
        )
    }

    /// Parent in the widening tree; `None` for the root and for `Unknown`.
    pub fn parent(self) -> Option<TypeTag> {
        match self {
            TypeTag::VarWChar | TypeTag::Unknown => None,
            TypeTag::Boolean | TypeTag::DbTimeStamp | TypeTag::Decimal => Some(TypeTag::ROOT),
            TypeTag::Double => Some(TypeTag::Decimal),
            TypeTag::Single | TypeTag::BigInt => Some(TypeTag::Double),
            TypeTag::Integer => Some(TypeTag::BigInt),
            TypeTag::SmallInt => Some(TypeTag::Integer),
            TypeTag::TinyInt => Some(TypeTag::SmallInt),
            _ => Some(TypeTag::ROOT),
        }
    }

    /// Path from the root down to this tag (inclusive).
    pub fn path_from_root(self) -> Vec<TypeTag> {
        let mut path = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Lowest common ancestor of two tags.
    pub fn common(self, other: TypeTag) -> TypeTag {
        if self == other {
            return self;
        }
        if self == TypeTag::Unknown {
            return other;
        }
        if other == TypeTag::Unknown {
            return self;
        }

        let left = self.path_from_root();
        let right = other.path_from_root();
        let mut common = TypeTag::ROOT;
        for (a, b) in left.iter().zip(right.iter()) {
            if a != b {
                break;
            }
            common = *a;
        }
        common
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Unknown => "unknown",
            TypeTag::Boolean => "boolean",
            TypeTag::TinyInt => "tinyint",
            TypeTag::SmallInt => "smallint",
            TypeTag::Integer => "integer",
            TypeTag::BigInt => "bigint",
            TypeTag::UnsignedTinyInt => "unsigned_tinyint",
            TypeTag::UnsignedSmallInt => "unsigned_smallint",
            TypeTag::UnsignedInt => "unsigned_int",
            TypeTag::UnsignedBigInt => "unsigned_bigint",
            TypeTag::Single => "single",
            TypeTag::Double => "double",
            TypeTag::Decimal => "decimal",
            TypeTag::Numeric => "numeric",
            TypeTag::Currency => "currency",
            TypeTag::Date => "date",
            TypeTag::DbDate => "dbdate",
            TypeTag::DbTime => "dbtime",
            TypeTag::DbTimeStamp => "dbtimestamp",
            TypeTag::Char => "char",
            TypeTag::VarChar => "varchar",
            TypeTag::LongVarChar => "longvarchar",
            TypeTag::WChar => "wchar",
            TypeTag::VarWChar => "varwchar",
            TypeTag::LongVarWChar => "longvarwchar",
            TypeTag::Bstr => "bstr",
            TypeTag::Guid => "guid",
            TypeTag::Binary => "binary",
            TypeTag::VarBinary => "varbinary",
            TypeTag::LongVarBinary => "longvarbinary",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type tag with optional length, precision and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub tag: TypeTag,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl DataType {
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(TypeTag::Unknown)
    }

    /// Build from raw source metadata.
    ///
    /// Non-positive sizes mean "absent". Wide-character lengths are reported
    /// in bytes by most catalogs and are halved here.
    pub fn from_source(tag: TypeTag, length: i64, precision: i64, scale: i64) -> Self {
        let positive = |v: i64| u32::try_from(v).ok().filter(|v| *v > 0);
        let mut length = positive(length);
        if tag.is_wide() {
            length = length.map(|l| (l / 2).max(1));
        }
        Self {
            tag,
            length,
            precision: positive(precision),
            scale: positive(scale),
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = (length > 0).then_some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = (precision > 0).then_some(precision);
        self.scale = (scale > 0).then_some(scale);
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.tag.is_numeric()
    }

    pub fn is_string(&self) -> bool {
        self.tag.is_string()
    }

    pub fn is_temporal(&self) -> bool {
        self.tag.is_temporal()
    }

    pub fn is_unknown(&self) -> bool {
        self.tag == TypeTag::Unknown
    }

    /// Common type of two observations, keeping the sizes of the winner.
    ///
    /// Equal types return themselves; `Unknown` yields the other side.
    pub fn common_type(a: &DataType, b: &DataType) -> DataType {
        if a == b {
            return *a;
        }
        let tag = a.tag.common(b.tag);
        if tag == a.tag {
            *a
        } else if tag == b.tag {
            *b
        } else {
            DataType::new(tag)
        }
    }

    /// Common type with the elementwise maximum of length, precision and scale.
    ///
    /// Idempotent, commutative and associative, so a column's sample can be
    /// folded in any order.
    pub fn widen(a: &DataType, b: &DataType) -> DataType {
        DataType {
            tag: a.tag.common(b.tag),
            length: a.length.max(b.length),
            precision: a.precision.max(b.precision),
            scale: a.scale.max(b.scale),
        }
    }

    /// Map a SQL Server type name onto a tag.
    pub fn from_sql_type(
        name: &str,
        length: i64,
        precision: i64,
        scale: i64,
    ) -> Result<DataType, DataTypeError> {
        let tag = match name.trim().to_lowercase().as_str() {
            "bigint" => TypeTag::BigInt,
            "bit" => TypeTag::Boolean,
            "datetime" | "datetime2" | "datetimeoffset" | "smalldatetime" | "timestamp" => {
                TypeTag::DbTimeStamp
            }
            "date" => TypeTag::Date,
            "time" => TypeTag::DbTime,
            "decimal" | "money" => TypeTag::Decimal,
            "numeric" => TypeTag::Numeric,
            "float" | "real" | "smallmoney" => TypeTag::Single,
            "int" | "integer" => TypeTag::Integer,
            "nchar" => TypeTag::WChar,
            "nvarchar" => TypeTag::VarWChar,
            "ntext" => TypeTag::LongVarWChar,
            "text" | "xml" => TypeTag::LongVarChar,
            "varchar" => TypeTag::VarChar,
            "char" => TypeTag::Char,
            "uniqueidentifier" => TypeTag::Guid,
            "binary" => TypeTag::Binary,
            "varbinary" => TypeTag::VarBinary,
            "image" => TypeTag::LongVarBinary,
            "smallint" => TypeTag::SmallInt,
            "tinyint" => TypeTag::TinyInt,
            other => return Err(DataTypeError::Unmapped(other.to_string())),
        };
        Ok(DataType::from_source(tag, length, precision, scale))
    }
}

/// Confidence given to the wide-character fallback for unmapped types.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Turn a conversion result into a datatype candidate.
///
/// Unmapped types become a low-confidence `VarWChar` so that a single odd
/// column never fails schema extraction.
pub fn datatype_candidate_or_fallback(
    converted: Result<DataType, DataTypeError>,
    confidence: f64,
    column: &str,
) -> Candidate<DataType> {
    match converted {
        Ok(datatype) => Candidate::new(datatype, confidence),
        Err(err) => {
            tracing::warn!(column, error = %err, "falling back to wide string type");
            Candidate::new(DataType::new(TypeTag::ROOT), FALLBACK_CONFIDENCE)
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        match (self.length, self.precision, self.scale) {
            (Some(len), _, _) => write!(f, "({len})"),
            (None, Some(p), Some(s)) => write!(f, "({p},{s})"),
            (None, Some(p), None) => write!(f, "({p})"),
            _ => Ok(()),
        }
    }
}
