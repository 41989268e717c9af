#[cfg(test)]
mod tests {
    use starforge::graph::{connected_components, split_components};
    use starforge::model::{
        Cardinality, CommonModel, DataType, DatabaseId, IdGenerator, OriginId, Relation, TableId,
        TypeTag,
    };
    use std::collections::BTreeSet;

    fn relate(model: &mut CommonModel, link: TableId, anchor: TableId) {
        let int = DataType::new(TypeTag::Integer);
        let anchor_name = model.table(anchor).name.clone();
        let fk = model.add_typed_column(link, &format!("{anchor_name}ID"), int, 1.0);
        let pk = model.add_typed_column(anchor, &format!("{anchor_name}Key"), int, 1.0);
        model.add_relation(Relation::new(anchor, link, vec![pk], vec![fk], Cardinality::ManyToOne));
    }

    #[test]
    fn test_order_and_customer_form_one_group() {
        let mut model = CommonModel::new(OriginId(0));
        let order = model.add_table("Order", "dbo", DatabaseId(0), Some(100));
        let customer = model.add_table("Customer", "dbo", DatabaseId(0), Some(10));
        relate(&mut model, order, customer);

        let mut ids = IdGenerator::new();
        ids.next_origin();
        let groups = split_components(&model, &mut ids);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].table_ids(), &[order, customer]);
        assert_eq!(groups[0].origin_id(), OriginId(1));
    }

    #[test]
    fn test_components_partition_tables_exactly_once() {
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let sales = model.add_table("Sales", "dbo", db, None);
        let store = model.add_table("Store", "dbo", db, None);
        let audit = model.add_table("Audit", "dbo", db, None);
        let region = model.add_table("Region", "dbo", db, None);
        let tickets = model.add_table("Tickets", "dbo", db, None);
        let agent = model.add_table("Agent", "dbo", db, None);
        relate(&mut model, sales, store);
        relate(&mut model, store, region);
        relate(&mut model, tickets, agent);

        let components = connected_components(&model);

        assert_eq!(components, vec![vec![sales, store, region], vec![audit], vec![tickets, agent]]);
        let all: Vec<TableId> = components.iter().flatten().copied().collect();
        let unique: BTreeSet<TableId> = all.iter().copied().collect();
        assert_eq!(all.len(), model.table_count());
        assert_eq!(unique.len(), model.table_count());
    }

    #[test]
    fn test_each_group_gets_a_fresh_origin() {
        let mut model = CommonModel::new(OriginId(0));
        model.add_table("A", "dbo", DatabaseId(0), None);
        model.add_table("B", "dbo", DatabaseId(0), None);

        let mut ids = IdGenerator::new();
        ids.next_origin();
        let groups = split_components(&model, &mut ids);

        let origins: Vec<OriginId> = groups.iter().map(|g| g.origin_id()).collect();
        assert_eq!(origins, vec![OriginId(1), OriginId(2)]);
        assert!(groups.iter().all(|g| g.table_count() == 1 && g.suffix().is_empty()));
    }

    #[test]
    fn test_empty_model_has_no_groups() {
        let model = CommonModel::new(OriginId(0));
        assert!(connected_components(&model).is_empty());
    }
}
