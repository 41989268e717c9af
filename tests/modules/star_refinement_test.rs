#[cfg(test)]
mod tests {
    use starforge::config::NamingSettings;
    use starforge::model::{
        Cardinality, ColumnSet, CommonModel, DataType, DatabaseId, DateGranularity, OriginId,
        Relation, StarModel, StarTableKind, TableId, TypeTag,
    };
    use starforge::modules::dimension::FlattenDimensions;
    use starforge::modules::star_refinement::{
        chain_order, DateTimeDimensions, ExtendStringLength, FactRelationColumns, JunkDimension,
        NamingConvention, OrderColumns, RemoveOldForeignKeys, StarRefinementModule,
        SurrogateKeys, SURROGATE_KEY_NAME,
    };
    use std::sync::Arc;

    fn single_table(columns: &[(&str, DataType)]) -> StarModel {
        let mut model = CommonModel::new(OriginId(0));
        let sales = model.add_table("Sales", "dbo", DatabaseId(0), Some(100));
        for (name, datatype) in columns {
            model.add_typed_column(sales, name, *datatype, 1.0);
        }
        StarModel::new(Arc::new(model), sales, 1.0)
    }

    fn names(star: &StarModel, table: starforge::model::StarTableId) -> Vec<String> {
        star.columns_of(table).map(|(_, c)| c.name.clone()).collect()
    }

    #[test]
    fn test_timestamp_becomes_date_and_time_keys() {
        let mut star = single_table(&[
            ("Amount", DataType::new(TypeTag::Double)),
            ("SoldAt", DataType::new(TypeTag::DbTimeStamp)),
        ]);
        DateTimeDimensions.refine(&mut star).unwrap();

        let fact = star.fact();
        assert_eq!(
            names(&star, fact),
            vec!["Amount", "SoldAt_Time_Key", "SoldAt_Date_Key"]
        );
        for name in ["SoldAt_Time_Key", "SoldAt_Date_Key"] {
            let column = star.column(star.find_column(fact, name).unwrap());
            assert_eq!(column.datatype.tag, TypeTag::Integer);
            assert!(column.is_key());
        }

        let kinds: Vec<StarTableKind> = star.dimensions().iter().map(|d| star.table(*d).kind).collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.iter().any(|k| k.is_date()));
        assert!(kinds.iter().any(|k| k.is_time()));
        assert_eq!(star.relations_of(fact).count(), 2);
        for (_, relation) in star.relations_of(fact) {
            assert_eq!(relation.link, fact);
            assert_eq!(relation.link_columns.len(), 1);
            assert_eq!(relation.anchor_columns.len(), 1);
        }
    }

    #[test]
    fn test_existing_calendar_dimension_suppresses_calendar() {
        let mut star = single_table(&[("SoldAt", DataType::new(TypeTag::DbDate))]);
        let dim = star.add_table("Calendar", StarTableKind::Date(DateGranularity::Days), None);
        star.push_dimension(dim);

        DateTimeDimensions.refine(&mut star).unwrap();

        assert_eq!(star.dimensions().len(), 1);
        assert_eq!(names(&star, star.fact()), vec!["SoldAt"]);
    }

    #[test]
    fn test_plain_dimensions_do_not_suppress_calendar() {
        let mut star = single_table(&[("SoldAt", DataType::new(TypeTag::DbTimeStamp))]);
        for name in ["Timezone", "OrderDates"] {
            let dim = star.add_table(name, StarTableKind::Dimension, None);
            star.push_dimension(dim);
        }

        DateTimeDimensions.refine(&mut star).unwrap();

        let fact = star.fact();
        assert_eq!(names(&star, fact), vec!["SoldAt_Time_Key", "SoldAt_Date_Key"]);
        let kinds: Vec<StarTableKind> = star.dimensions().iter().map(|d| star.table(*d).kind).collect();
        assert!(kinds.iter().any(|k| k.is_date()));
        assert!(kinds.iter().any(|k| k.is_time()));
        assert_eq!(star.relations_of(fact).count(), 2);
    }

    #[test]
    fn test_descriptive_columns_move_into_junk_dimension() {
        let mut star = single_table(&[
            ("Amount", DataType::new(TypeTag::Double)),
            ("Channel", DataType::new(TypeTag::VarWChar)),
            ("Promo", DataType::new(TypeTag::VarWChar)),
            ("Region", DataType::new(TypeTag::WChar)),
        ]);
        JunkDimension.refine(&mut star).unwrap();

        let fact = star.fact();
        assert_eq!(names(&star, fact), vec!["Amount", "Junk_Sales_Key"]);
        let key = star.column(star.find_column(fact, "Junk_Sales_Key").unwrap());
        assert_eq!(key.datatype.tag, TypeTag::Integer);

        assert_eq!(star.dimensions().len(), 1);
        let junk = star.dimensions()[0];
        assert!(star.table(junk).kind.is_junk());
        assert_eq!(star.table(junk).name, "Junk_Sales");
        assert_eq!(
            names(&star, junk),
            vec![SURROGATE_KEY_NAME, "Channel", "Promo", "Region"]
        );

        let constraints = &star.table(junk).constraints;
        let surrogate = star.find_column(junk, SURROGATE_KEY_NAME).unwrap();
        assert_eq!(constraints.primary_key, vec![surrogate]);
        assert!(constraints.not_nullables.contains(&surrogate));
        assert_eq!(constraints.uniques.len(), 1);
        assert_eq!(constraints.uniques[0].len(), 3);
    }

    #[test]
    fn test_numeric_only_fact_has_no_junk() {
        let mut star = single_table(&[("Amount", DataType::new(TypeTag::Double))]);
        JunkDimension.refine(&mut star).unwrap();
        assert!(star.dimensions().is_empty());
    }

    #[test]
    fn test_string_lengths_are_padded() {
        let mut star = single_table(&[
            ("Code", DataType::new(TypeTag::VarWChar).with_length(20)),
            ("Amount", DataType::new(TypeTag::Double)),
        ]);
        ExtendStringLength.refine(&mut star).unwrap();

        let fact = star.fact();
        let code = star.column(star.find_column(fact, "Code").unwrap());
        assert_eq!(code.datatype.length, Some(30));
        let amount = star.column(star.find_column(fact, "Amount").unwrap());
        assert_eq!(amount.datatype.length, None);
    }

    /// `Order(OrderID, CustomerID -> Customer, Amount, Channel, OrderDate)`.
    fn order_star() -> (StarModel, TableId) {
        let int = DataType::new(TypeTag::Integer);
        let mut model = CommonModel::new(OriginId(0));
        let db = DatabaseId(0);
        let order = model.add_table("Order", "dbo", db, Some(1000));
        let order_id = model.add_typed_column(order, "OrderID", int, 1.0);
        let fk = model.add_typed_column(order, "CustomerID", int, 1.0);
        model.add_typed_column(order, "Amount", DataType::new(TypeTag::Double), 1.0);
        model.add_typed_column(order, "Channel", DataType::new(TypeTag::VarWChar), 1.0);
        model.add_typed_column(order, "OrderDate", DataType::new(TypeTag::DbTimeStamp), 1.0);
        let customer = model.add_table("Customer", "dbo", db, Some(10));
        let pk = model.add_typed_column(customer, "CustomerID", int, 1.0);
        model.add_typed_column(customer, "Name", DataType::new(TypeTag::VarWChar), 1.0);
        model
            .table_mut(order)
            .add_primary_key_candidate(ColumnSet::from([order_id]), 1.0);
        model.add_relation(Relation::new(
            customer,
            order,
            vec![pk],
            vec![fk],
            Cardinality::ManyToOne,
        ));

        let mut star = StarModel::new(Arc::new(model), order, 0.8);
        FlattenDimensions.refine(&mut star).unwrap();
        (star, customer)
    }

    fn default_chain() -> Vec<StarRefinementModule> {
        // Deliberately shuffled; the chain order is fixed
        chain_order(vec![
            StarRefinementModule::OrderColumns(OrderColumns),
            StarRefinementModule::NamingConvention(NamingConvention::new(NamingSettings::default())),
            StarRefinementModule::JunkDimension(JunkDimension),
            StarRefinementModule::RemoveOldForeignKeys(RemoveOldForeignKeys),
            StarRefinementModule::DateTimeDimensions(DateTimeDimensions),
            StarRefinementModule::SurrogateKeys(SurrogateKeys),
            StarRefinementModule::FactRelationColumns(FactRelationColumns),
        ])
    }

    #[test]
    fn test_chain_order_is_fixed() {
        let keys: Vec<_> = default_chain().iter().map(|m| m.key()).collect();
        assert_eq!(
            keys,
            vec![
                "fact_relation_columns",
                "surrogate_keys",
                "date_time_dimensions",
                "junk_dimension",
                "remove_old_foreign_keys",
                "naming_convention",
                "order_columns",
            ]
        );
    }

    #[test]
    fn test_full_chain_shapes_the_star() {
        let (mut star, customer) = order_star();
        for module in default_chain() {
            module.refine(&mut star).unwrap();
        }

        let fact = star.fact();
        assert_eq!(star.table(fact).name, "Fact_Order");
        assert_eq!(
            names(&star, fact),
            vec![
                "CustomerKey",
                "JunkOrderKey",
                "OrderDateDateKey",
                "OrderDateTimeKey",
                "Amount",
                "OrderID",
            ]
        );
        let ordinals: Vec<usize> = star.columns_of(fact).map(|(_, c)| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);

        let mut dimension_names: Vec<String> = star
            .dimensions()
            .iter()
            .map(|d| star.table(*d).name.clone())
            .collect();
        dimension_names.sort();
        assert_eq!(
            dimension_names,
            vec!["Dim_Customer", "Dim_Date", "Dim_JunkOrder", "Dim_Time"]
        );

        let customer_dim = star
            .dimensions()
            .iter()
            .copied()
            .find(|d| star.table(*d).table_ref() == Some(customer))
            .unwrap();
        assert_eq!(names(&star, customer_dim), vec!["SurKey", "CustomerID", "Name"]);
        let surrogate = star.find_column(customer_dim, "SurKey").unwrap();
        assert!(star.column(surrogate).is_surrogate_key());

        let link = star
            .relations_of(fact)
            .find(|(_, r)| r.anchor == customer_dim)
            .map(|(_, r)| r.clone())
            .unwrap();
        assert_eq!(link.anchor_columns, vec![surrogate]);
        assert_eq!(link.link_columns, vec![star.find_column(fact, "CustomerKey").unwrap()]);
    }
}
