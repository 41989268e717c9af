#[cfg(test)]
mod tests {
    use starforge::graph::split_components;
    use starforge::model::{
        Cardinality, ColumnSet, CommonModel, DataType, DatabaseId, IdGenerator, OriginId,
        Relation, StarColumnType, StarTableKind, TableId, TypeTag,
    };
    use starforge::modules::dimension::{DimensionModule, FlattenDimensions, Measures};
    use starforge::modules::fact::{
        average_scores, discover_facts, select_facts, FactModule, ManyToOne, NumericRatio,
        RowCount,
    };
    use std::sync::Arc;

    fn int() -> DataType {
        DataType::new(TypeTag::Integer)
    }

    fn text() -> DataType {
        DataType::new(TypeTag::VarWChar)
    }

    fn fact_modules() -> Vec<FactModule> {
        vec![
            FactModule::ManyToOne(ManyToOne),
            FactModule::NumericRatio(NumericRatio),
            FactModule::RowCount(RowCount),
        ]
    }

    /// `Order(OrderID PK, CustomerID FK, Amount)` and `Customer(CustomerID PK, Name)`.
    fn order_customer() -> (CommonModel, TableId, TableId) {
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let order = model.add_table("Order", "dbo", db, Some(1000));
        let order_id = model.add_typed_column(order, "OrderID", int(), 1.0);
        let order_customer = model.add_typed_column(order, "CustomerID", int(), 1.0);
        let amount = model.add_typed_column(order, "Amount", DataType::new(TypeTag::Double), 1.0);
        let customer = model.add_table("Customer", "dbo", db, Some(10));
        let customer_id = model.add_typed_column(customer, "CustomerID", int(), 1.0);
        model.add_typed_column(customer, "Name", text(), 1.0);

        let t = model.table_mut(order);
        t.add_primary_key_candidate(ColumnSet::from([order_id]), 1.0);
        t.add_not_null_candidate(order_id, 0.8);
        t.add_not_null_candidate(order_customer, 0.8);
        t.add_not_null_candidate(amount, 0.8);
        model
            .table_mut(customer)
            .add_primary_key_candidate(ColumnSet::from([customer_id]), 1.0);
        model.add_relation(Relation::new(
            customer,
            order,
            vec![customer_id],
            vec![order_customer],
            Cardinality::ManyToOne,
        ));
        (model, order, customer)
    }

    #[test]
    fn test_order_is_favoured_as_fact() {
        let (model, order, customer) = order_customer();
        let mut ids = IdGenerator::new();
        let groups = split_components(&model, &mut ids);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].table_count(), 2);

        let averaged = average_scores(&groups[0], &fact_modules());
        let score = |t: TableId| averaged.iter().find(|(id, _)| *id == t).unwrap().1;
        assert!(score(order) > score(customer));

        let facts = select_facts(&groups[0], &averaged, 0.3);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].0, order);
    }

    #[test]
    fn test_customer_becomes_dimension_of_order() {
        let (model, order, customer) = order_customer();
        let mut stars = discover_facts(Arc::new(model), &fact_modules(), 0.3);
        assert_eq!(stars.len(), 1);
        let star = &mut stars[0];
        assert_eq!(star.fact_table_ref(), Some(order));

        DimensionModule::FlattenDimensions(FlattenDimensions)
            .refine(star)
            .unwrap();

        assert_eq!(star.dimensions().len(), 1);
        let dimension = star.dimensions()[0];
        assert_eq!(star.table(dimension).name, "Customer");
        assert_eq!(star.table(dimension).kind, StarTableKind::Dimension);
        assert_eq!(star.table(dimension).table_ref(), Some(customer));

        let relations: Vec<_> = star.relations_of(star.fact()).map(|(_, r)| r.clone()).collect();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].anchor, dimension);
        assert_eq!(relations[0].link, star.fact());
        assert_eq!(relations[0].cardinality, Cardinality::ManyToOne);
    }

    #[test]
    fn test_measures_skip_foreign_keys() {
        let (model, _, _) = order_customer();
        let mut stars = discover_facts(Arc::new(model), &fact_modules(), 0.3);
        let star = &mut stars[0];
        DimensionModule::FlattenDimensions(FlattenDimensions)
            .refine(star)
            .unwrap();
        DimensionModule::Measures(Measures).refine(star).unwrap();

        let fact = star.fact();
        let measure = |name: &str| {
            let id = star.find_column(fact, name).unwrap();
            star.column(id).column_type
        };
        assert!(measure("Amount").contains(StarColumnType::NUMERIC_MEASURE));
        assert!(measure("OrderID").contains(StarColumnType::NUMERIC_MEASURE));
        assert!(!measure("CustomerID").is_measure());
    }

    #[test]
    fn test_transitive_references_are_flattened() {
        let (mut model, _, customer) = order_customer();
        let region = model.add_table("Region", "dbo", DatabaseId(0), Some(3));
        let region_id = model.add_typed_column(region, "RegionID", int(), 1.0);
        model.add_typed_column(region, "Label", text(), 1.0);
        let customer_region = model.add_typed_column(customer, "RegionID", int(), 1.0);
        model.add_relation(Relation::new(
            region,
            customer,
            vec![region_id],
            vec![customer_region],
            Cardinality::ManyToOne,
        ));

        let mut star = discover_facts(Arc::new(model), &fact_modules(), 0.3)
            .into_iter()
            .next()
            .unwrap();
        FlattenDimensions.refine(&mut star).unwrap();

        assert_eq!(star.dimensions().len(), 1);
        let dimension = star.dimensions()[0];
        let names: Vec<String> = star
            .columns_of(dimension)
            .map(|(_, c)| c.name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["CustomerID", "Name", "RegionID", "Region_RegionID", "Region_Label"]
        );
    }

    #[test]
    fn test_raising_threshold_never_adds_facts() {
        let (model, _, _) = order_customer();
        let averaged = average_scores(&model, &fact_modules());
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.05, 0.2, 0.3, 0.5, 0.8, 1.0] {
            let count = select_facts(&model, &averaged, threshold).len();
            assert!(count <= previous);
            previous = count;
        }
        assert_eq!(select_facts(&model, &averaged, 0.0).len(), 2);
    }

    #[test]
    fn test_only_combined_tables_qualify_in_combined_models() {
        let (mut model, order, customer) = order_customer();
        let combined =
            model.add_combined_table("Order_Customer", "dbo", DatabaseId(0), Some(1000), vec![order, customer]);
        model.add_typed_column(combined, "Total", DataType::new(TypeTag::Double), 1.0);

        let averaged = vec![(order, 0.9), (customer, 0.9), (combined, 0.9)];
        let facts = select_facts(&model, &averaged, 0.5);
        assert_eq!(facts, vec![(combined, 0.9)]);
    }
}
