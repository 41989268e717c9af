//! Conformed date and time dimensions for temporal fact columns.

use crate::model::{
    Cardinality, ColumnId, DataType, DateGranularity, StarColumnSpec, StarColumnType, StarModel,
    StarRelation, StarTableId, StarTableKind, TimeGranularity, TypeTag,
};
use crate::modules::ModuleResult;

use super::keys::surrogate_key_spec;

pub const DATE_DIMENSION_NAME: &str = "Date";
pub const TIME_DIMENSION_NAME: &str = "Time";

fn attribute(name: &str, datatype: DataType) -> StarColumnSpec {
    StarColumnSpec::new(name, datatype).flags(StarColumnType::DESCRIPTIVE_MEASURE)
}

fn small_int() -> DataType {
    DataType::new(TypeTag::SmallInt)
}

fn wchar(length: u32) -> DataType {
    DataType::new(TypeTag::WChar).with_length(length)
}

/// Add an unattached date dimension at day granularity.
pub fn create_date_dimension(star: &mut StarModel) -> StarTableId {
    let table = star.add_table(
        DATE_DIMENSION_NAME,
        StarTableKind::Date(DateGranularity::Days),
        None,
    );
    let key = star.push_column(table, surrogate_key_spec());
    for spec in [
        attribute("FullDate", wchar(10)),
        attribute("Day", small_int()),
        attribute("NameOfDay", wchar(10)),
        attribute("Week", small_int()),
        attribute("Month", small_int()),
        attribute("NameOfMonth", wchar(10)),
        attribute("Year", small_int()),
        attribute("IsHoliday", DataType::new(TypeTag::Boolean)),
        attribute("Holiday", wchar(32)),
    ] {
        star.push_column(table, spec);
    }
    let constraints = &mut star.table_mut(table).constraints;
    constraints.primary_key.push(key);
    constraints.not_nullables.push(key);
    table
}

/// Add an unattached time dimension at second granularity.
pub fn create_time_dimension(star: &mut StarModel) -> StarTableId {
    let table = star.add_table(
        TIME_DIMENSION_NAME,
        StarTableKind::Time(TimeGranularity::Seconds),
        None,
    );
    let key = star.push_column(table, surrogate_key_spec());
    for name in ["Hour", "Minute", "Second"] {
        star.push_column(table, attribute(name, small_int()));
    }
    let constraints = &mut star.table_mut(table).constraints;
    constraints.primary_key.push(key);
    constraints.not_nullables.push(key);
    table
}

/// A conformed dimension, created on first use.
#[derive(Default)]
struct Conformed {
    actual: Option<StarTableId>,
}

impl Conformed {
    /// The actual dimension on first use, a new role afterwards.
    fn attach(&mut self, star: &mut StarModel, create: fn(&mut StarModel) -> StarTableId) -> StarTableId {
        let table = match self.actual {
            None => {
                let actual = create(star);
                self.actual = Some(actual);
                actual
            }
            Some(actual) => star.add_role_playing(actual),
        };
        star.push_dimension(table);
        table
    }
}

/// Replaces every temporal fact column by keys into a conformed date and/or
/// time dimension.
#[derive(Debug, Clone, Default)]
pub struct DateTimeDimensions;

impl DateTimeDimensions {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let present = star
            .dimensions()
            .iter()
            .any(|d| star.table(*d).kind.is_calendar());
        if present {
            return Ok(());
        }

        let fact = star.fact();
        let temporal: Vec<_> = star
            .columns_of(fact)
            .filter(|(_, c)| c.datatype.is_temporal())
            .map(|(id, c)| (id, c.name.clone(), c.datatype.tag, c.column_ref()))
            .collect();

        let mut dates = Conformed::default();
        let mut times = Conformed::default();
        for (column, name, tag, column_ref) in temporal {
            let (needs_time, needs_date) = match tag {
                TypeTag::DbTime => (true, false),
                TypeTag::Date | TypeTag::DbDate => (false, true),
                TypeTag::DbTimeStamp => (true, true),
                _ => (false, false),
            };

            if needs_time {
                let dimension = times.attach(star, create_time_dimension);
                link_to_fact(star, dimension, format!("{name}_Time_Key"), column_ref);
            }
            if needs_date {
                let dimension = dates.attach(star, create_date_dimension);
                link_to_fact(star, dimension, format!("{name}_Date_Key"), column_ref);
            }
            if needs_time || needs_date {
                star.remove_column(column);
            }
        }
        Ok(())
    }
}

/// Append a fact key referencing `dimension`'s surrogate key.
fn link_to_fact(
    star: &mut StarModel,
    dimension: StarTableId,
    name: String,
    column_ref: Option<ColumnId>,
) {
    let fact = star.fact();
    let mut spec = StarColumnSpec::new(name, DataType::new(TypeTag::Integer)).flags(StarColumnType::KEY);
    spec.column_ref = column_ref;
    let key = star.push_column(fact, spec);

    let anchor_key = star.column_ids(dimension).first().copied();
    let mut relation = StarRelation::between(dimension, fact, Cardinality::ManyToOne);
    relation.anchor_columns.extend(anchor_key);
    relation.link_columns.push(key);
    star.add_relation(relation);
    star.table_mut(fact).constraints.primary_key.push(key);
}
