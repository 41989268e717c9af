#[cfg(test)]
mod tests {
    use starforge::graph::{plan_joins, JoinPathError};
    use starforge::model::{
        Cardinality, CommonModel, DataType, DatabaseId, OriginId, Relation, RelationId, TableId,
        TypeTag,
    };

    fn relate(model: &mut CommonModel, link: TableId, anchor: TableId) -> RelationId {
        let int = DataType::new(TypeTag::Integer);
        let fk = model.add_typed_column(link, "FK", int, 1.0);
        let pk = model.add_typed_column(anchor, "PK", int, 1.0);
        model.add_relation(Relation::new(anchor, link, vec![pk], vec![fk], Cardinality::ManyToOne))
    }

    fn position(order: &[TableId], table: TableId) -> usize {
        order.iter().position(|t| *t == table).unwrap()
    }

    #[test]
    fn test_every_join_follows_a_table_it_references() {
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let region = model.add_table("Region", "dbo", db, None);
        let customer = model.add_table("Customer", "dbo", db, None);
        let product = model.add_table("Product", "dbo", db, None);
        let order = model.add_table("Order", "dbo", db, None);
        relate(&mut model, order, customer);
        relate(&mut model, order, product);
        relate(&mut model, customer, region);

        let plan = plan_joins(&model, &[region, customer, product, order]).unwrap();
        let order_of = plan.tables();

        assert_eq!(plan.from, order);
        assert_eq!(order_of.len(), 4);
        assert!(position(&order_of, customer) < position(&order_of, region));
        for step in &plan.joins {
            assert_eq!(step.relations.len(), 1);
            let rel = model.relation(step.relations[0]);
            let other = rel.other_side(step.table).unwrap();
            assert!(position(&order_of, other) < position(&order_of, step.table));
        }
    }

    #[test]
    fn test_unrelated_table_joins_without_relations() {
        let mut model = CommonModel::new(OriginId(0));
        let a = model.add_table("A", "dbo", DatabaseId(0), None);
        let b = model.add_table("B", "dbo", DatabaseId(0), None);

        let plan = plan_joins(&model, &[a, b]).unwrap();

        assert!(!plan.is_direct());
        assert_eq!(plan.joins.len(), 1);
        assert!(plan.joins[0].relations.is_empty());
    }

    #[test]
    fn test_tables_outside_the_projection_are_ignored() {
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let order = model.add_table("Order", "dbo", db, None);
        let customer = model.add_table("Customer", "dbo", db, None);
        let product = model.add_table("Product", "dbo", db, None);
        let rel = relate(&mut model, order, customer);
        relate(&mut model, order, product);

        let plan = plan_joins(&model, &[customer, order, customer]).unwrap();

        assert_eq!(plan.from, order);
        assert_eq!(plan.joins.len(), 1);
        assert_eq!(plan.joins[0].table, customer);
        assert_eq!(plan.joins[0].relations, vec![rel]);
    }

    #[test]
    fn test_mutual_references_are_cyclic() {
        let mut model = CommonModel::new(OriginId(0));
        let a = model.add_table("A", "dbo", DatabaseId(0), None);
        let b = model.add_table("B", "dbo", DatabaseId(0), None);
        relate(&mut model, a, b);
        relate(&mut model, b, a);

        assert_eq!(plan_joins(&model, &[a, b]), Err(JoinPathError::Cyclic));
    }

    #[test]
    fn test_self_relation_is_ignored() {
        let mut model = CommonModel::new(OriginId(0));
        let employee = model.add_table("Employee", "dbo", DatabaseId(0), None);
        let dept = model.add_table("Dept", "dbo", DatabaseId(0), None);
        relate(&mut model, employee, employee);
        relate(&mut model, employee, dept);

        let plan = plan_joins(&model, &[employee, dept]).unwrap();
        assert_eq!(plan.tables(), vec![employee, dept]);
    }

    #[test]
    fn test_links_sharing_an_anchor_never_cross_join() {
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let order = model.add_table("Order", "dbo", db, None);
        let invoice = model.add_table("Invoice", "dbo", db, None);
        let shipment = model.add_table("Shipment", "dbo", db, None);
        let customer = model.add_table("Customer", "dbo", db, None);
        relate(&mut model, order, customer);
        relate(&mut model, invoice, customer);
        relate(&mut model, shipment, customer);

        let plan = plan_joins(&model, &[order, invoice, shipment, customer]).unwrap();
        let order_of = plan.tables();

        assert_eq!(order_of.len(), 4);
        assert_eq!(order_of[1], customer);
        for step in &plan.joins {
            assert_eq!(step.relations.len(), 1, "{:?} has no joined neighbour", step.table);
        }
    }
}
