//! Drift detection between entity columns and live table columns.
//!
//! Only columns present on both sides are compared. Columns missing from
//! the live table (creations) and live columns missing from the entity
//! (drops) are someone else's business.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::column::{ColumnModel, EntityModel, GenerationStrategy, LiveColumn};
use crate::normalize::{compare_default_values, escape_comment, Normalizer};

// ================================================================
// Nullability
// ================================================================

/// Decides whether a desired and a live column agree on nullability.
///
/// Some column kinds report nullability differently from how they are
/// declared; implementations can encode those exceptions.
pub trait NullableComparator {
    /// Returns `true` when both sides agree.
    fn same_nullability(&self, desired: &ColumnModel, live: &LiveColumn) -> bool {
        desired.is_nullable == live.is_nullable
    }
}

/// Plain equality of the nullable flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictNullability;

impl NullableComparator for StrictNullability {}

/// A [`NullableComparator`] backed by a closure.
#[derive(Clone, Copy)]
pub struct NullabilityFn<F>(pub F);

impl<F> NullableComparator for NullabilityFn<F>
where
    F: Fn(&ColumnModel, &LiveColumn) -> bool,
{
    fn same_nullability(&self, desired: &ColumnModel, live: &LiveColumn) -> bool {
        (self.0)(desired, live)
    }
}

// ================================================================
// Drift
// ================================================================

/// The first attribute found to differ for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnAttribute {
    /// Column name.
    Name,
    /// Normalized type.
    Type,
    /// Length.
    Length,
    /// Display width.
    Width,
    /// `ZEROFILL`.
    Zerofill,
    /// `UNSIGNED`.
    Unsigned,
    /// Generated-column expression.
    AsExpression,
    /// `VIRTUAL` / `STORED`.
    GeneratedType,
    /// Precision.
    Precision,
    /// Scale.
    Scale,
    /// Comment.
    Comment,
    /// Default.
    Default,
    /// Enum or set domain.
    Enum,
    /// `ON UPDATE` expression.
    OnUpdate,
    /// Primary key membership.
    Primary,
    /// Nullability.
    Nullable,
    /// Single-column unique index membership.
    Unique,
    /// Auto-generation.
    Generated,
}

impl ColumnAttribute {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::Length => "length",
            Self::Width => "width",
            Self::Zerofill => "zerofill",
            Self::Unsigned => "unsigned",
            Self::AsExpression => "as_expression",
            Self::GeneratedType => "generated_type",
            Self::Precision => "precision",
            Self::Scale => "scale",
            Self::Comment => "comment",
            Self::Default => "default",
            Self::Enum => "enum",
            Self::OnUpdate => "on_update",
            Self::Primary => "primary",
            Self::Nullable => "nullable",
            Self::Unique => "unique",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ColumnAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compares entity columns against live columns.
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff<C = StrictNullability> {
    normalizer: Normalizer,
    nullable: C,
}

impl SchemaDiff {
    /// Creates a diff with strict nullability comparison.
    #[must_use]
    pub const fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            nullable: StrictNullability,
        }
    }
}

impl<C: NullableComparator> SchemaDiff<C> {
    /// Replaces the nullability comparison.
    #[must_use]
    pub fn with_nullable_comparator<D: NullableComparator>(self, nullable: D) -> SchemaDiff<D> {
        SchemaDiff {
            normalizer: self.normalizer,
            nullable,
        }
    }

    /// Returns the entity columns whose live definition differs, in
    /// entity declaration order.
    #[must_use]
    pub fn changed_columns<'e>(
        &self,
        live: &[LiveColumn],
        entity: &'e EntityModel,
    ) -> Vec<&'e ColumnModel> {
        entity
            .columns
            .iter()
            .filter(|column| {
                let Some(live_column) = live.iter().find(|l| l.name == column.database_name)
                else {
                    return false;
                };
                match self.drift(live_column, column, entity) {
                    Some(attribute) => {
                        debug!(
                            table = %entity.table_name,
                            column = %column.database_name,
                            %attribute,
                            "column definition drifted"
                        );
                        true
                    }
                    None => false,
                }
            })
            .collect()
    }

    /// Returns the first attribute on which `column` and `live` disagree.
    #[must_use]
    pub fn drift(
        &self,
        live: &LiveColumn,
        column: &ColumnModel,
        entity: &EntityModel,
    ) -> Option<ColumnAttribute> {
        let n = &self.normalizer;
        let checks = [
            (ColumnAttribute::Name, live.name != column.database_name),
            (ColumnAttribute::Type, live.column_type != n.normalize_type(column)),
            (ColumnAttribute::Length, live.length != n.column_length(column)),
            (ColumnAttribute::Width, live.width != n.column_width(column)),
            (ColumnAttribute::Zerofill, live.zerofill != column.zerofill),
            (ColumnAttribute::Unsigned, live.unsigned != column.unsigned),
            (ColumnAttribute::AsExpression, live.as_expression != column.as_expression),
            (ColumnAttribute::GeneratedType, live.generated_type != column.generated_type),
            (
                ColumnAttribute::Precision,
                column.precision.is_some() && live.precision != column.precision,
            ),
            (
                ColumnAttribute::Scale,
                column.scale.is_some() && live.scale != column.scale,
            ),
            (
                ColumnAttribute::Comment,
                escape_comment(live.comment.as_deref())
                    != escape_comment(column.comment.as_deref()),
            ),
            (
                ColumnAttribute::Default,
                !compare_default_values(n.normalize_default(column).as_deref(), live.default.as_deref()),
            ),
            (ColumnAttribute::Enum, !same_enum(live, column)),
            (
                ColumnAttribute::OnUpdate,
                n.normalize_datetime_function(live.on_update.as_deref())
                    != n.normalize_datetime_function(column.on_update.as_deref()),
            ),
            (ColumnAttribute::Primary, live.is_primary != column.is_primary),
            (
                ColumnAttribute::Nullable,
                !self.nullable.same_nullability(column, live),
            ),
            (ColumnAttribute::Unique, live.is_unique != entity.is_unique(column)),
            (
                ColumnAttribute::Generated,
                column.generation_strategy != Some(GenerationStrategy::Uuid)
                    && live.is_generated != column.is_generated,
            ),
        ];
        checks
            .into_iter()
            .find_map(|(attribute, differs)| differs.then_some(attribute))
    }
}

/// Enum domains compare as sets, and only when both sides have one.
fn same_enum(live: &LiveColumn, column: &ColumnModel) -> bool {
    let (Some(live_values), Some(desired)) = (&live.enum_values, &column.enum_values) else {
        return true;
    };
    let live_set: BTreeSet<&str> = live_values.iter().map(String::as_str).collect();
    let desired_set: BTreeSet<String> = desired.iter().map(ToString::to_string).collect();
    live_values.len() == desired.len()
        && desired_set.iter().all(|member| live_set.contains(member.as_str()))
}
