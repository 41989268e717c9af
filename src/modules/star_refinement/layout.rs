//! Column order and string widths.

use crate::model::StarModel;
use crate::modules::ModuleResult;

const STRING_LENGTH_PADDING: u32 = 10;

/// Keys first, then alphabetical. Date and time dimensions keep their
/// natural order.
#[derive(Debug, Clone, Default)]
pub struct OrderColumns;

impl OrderColumns {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        for table in star.table_ids() {
            let entry = star.table(table);
            if entry.kind.is_calendar() || entry.is_role_playing() {
                continue;
            }
            let mut order: Vec<_> = star
                .columns_of(table)
                .map(|(id, c)| (id, c.column_type.key_bits(), c.name.clone()))
                .collect();
            order.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
            star.set_column_order(table, order.into_iter().map(|(id, _, _)| id).collect());
        }
        Ok(())
    }
}

/// Pads every string length by ten characters.
#[derive(Debug, Clone, Default)]
pub struct ExtendStringLength;

impl ExtendStringLength {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        for table in star.table_ids() {
            if star.table(table).is_role_playing() {
                continue;
            }
            for column in star.column_ids(table).to_vec() {
                let datatype = &mut star.column_mut(column).datatype;
                if datatype.is_string() {
                    datatype.length = Some(datatype.length.unwrap_or(0) + STRING_LENGTH_PADDING);
                }
            }
        }
        Ok(())
    }
}
