#[cfg(test)]
mod tests {
    use starforge::model::{
        Cardinality, CommonModel, DataType, DatabaseId, OriginId, Relation, TableId, TypeTag,
    };
    use starforge::modules::combination::{
        CombinationModule, CombineTables, LinkProfile, PermutationSuffixes,
    };
    use starforge::modules::metadata::SampleDirectory;

    fn int() -> DataType {
        DataType::new(TypeTag::Integer)
    }

    fn text() -> DataType {
        DataType::new(TypeTag::VarWChar)
    }

    /// `link.<name>` referencing the first column of `anchor`.
    fn reference(model: &mut CommonModel, link: TableId, name: &str, anchor: TableId) {
        let fk = model.add_typed_column(link, name, int(), 1.0);
        let pk = model.table(anchor).columns()[0];
        model.add_relation(Relation::new(anchor, link, vec![pk], vec![fk], Cardinality::ManyToOne));
    }

    struct Shop {
        model: CommonModel,
        order: TableId,
        order_line: TableId,
        customer: TableId,
        product: TableId,
    }

    fn shop() -> Shop {
        let mut model = CommonModel::new(OriginId(7));
        let db = DatabaseId(0);
        let customer = model.add_table("Customer", "dbo", db, Some(10));
        model.add_typed_column(customer, "CustomerID", int(), 1.0);
        model.add_typed_column(customer, "Name", text(), 1.0);
        let product = model.add_table("Product", "dbo", db, Some(20));
        model.add_typed_column(product, "ProductID", int(), 1.0);
        model.add_typed_column(product, "Title", text(), 1.0);
        let order = model.add_table("Order", "dbo", db, Some(100));
        model.add_typed_column(order, "OrderID", int(), 1.0);
        reference(&mut model, order, "CustomerID", customer);
        let order_line = model.add_table("OrderLine", "dbo", db, Some(300));
        reference(&mut model, order_line, "OrderID", order);
        reference(&mut model, order_line, "ProductID", product);
        Shop {
            model,
            order,
            order_line,
            customer,
            product,
        }
    }

    #[test]
    fn test_order_line_is_a_thin_link() {
        let shop = shop();
        let profile = LinkProfile::of(&shop.model, shop.order_line);
        assert_eq!(
            profile,
            LinkProfile {
                keys: 2,
                numerics: 0,
                descriptive: 0
            }
        );
        assert!(profile.is_thin());
        assert!(!LinkProfile::of(&shop.model, shop.customer).is_thin());
    }

    #[test]
    fn test_only_anchors_with_outgoing_references_qualify() {
        let shop = shop();
        let candidates = CombineTables.candidates(&shop.model);
        assert_eq!(candidates.len(), 1);
        let relation = shop.model.relation(candidates[0]);
        assert_eq!(relation.link, shop.order_line);
        assert_eq!(relation.anchor, shop.order);
    }

    #[tokio::test]
    async fn test_order_line_merges_into_order() {
        let shop = shop();
        let samples = SampleDirectory::new();
        let mut suffixes = PermutationSuffixes::new();
        let module = CombinationModule::CombineTables(CombineTables);

        let models = module.combine(shop.model.clone(), &samples, &mut suffixes).await;

        assert_eq!(models.len(), 2);
        let source = &models[0];
        assert_eq!(source.table_count(), 4);
        assert!(source.suffix().is_empty());

        let permutation = &models[1];
        assert_eq!(permutation.origin_id(), OriginId(7));
        assert_eq!(permutation.label(), "7.A");
        assert_eq!(permutation.table_count(), 3);
        assert!(permutation.find_table("OrderLine").is_none());
        assert!(permutation.find_table("Order").is_none());

        let combined = permutation.find_table("OrderLine_Order").unwrap();
        assert!(permutation.table(combined).is_combined());
        assert_eq!(
            permutation.table(combined).sources(),
            &[shop.order_line, shop.order]
        );
        assert!(permutation.has_combined_tables());

        let names: Vec<String> = permutation
            .columns_of(combined)
            .map(|(_, c)| c.name())
            .collect();
        assert_eq!(names, vec!["OrderID", "CustomerID", "ProductID"]);

        assert!(permutation.has_relation_between(combined, shop.customer));
        assert!(permutation.has_relation_between(combined, shop.product));
        for (_, relation) in permutation.relations_of(combined) {
            assert_eq!(relation.link, combined);
            assert_eq!(relation.cardinality, Cardinality::ManyToOne);
        }
    }

    #[tokio::test]
    async fn test_double_connection_still_merges() {
        let mut shop = shop();
        // Customer referenced from the order line as well as from the order
        let line = shop.order_line;
        let customer = shop.customer;
        reference(&mut shop.model, line, "CustomerID", customer);

        let samples = SampleDirectory::new();
        let mut suffixes = PermutationSuffixes::new();
        let models = CombineTables
            .combine(shop.model, &samples, &mut suffixes)
            .await;

        let permutation = &models[1];
        let combined = permutation.find_table("OrderLine_Order").unwrap();
        let to_customer = permutation
            .relations_of(customer)
            .filter(|(_, r)| r.link == combined)
            .count();
        assert_eq!(to_customer, 2);
    }

    #[tokio::test]
    async fn test_models_without_candidates_pass_through() {
        let mut model = CommonModel::new(OriginId(1));
        model.add_table("Lonely", "dbo", DatabaseId(0), None);
        let samples = SampleDirectory::new();
        let mut suffixes = PermutationSuffixes::new();

        let models = CombineTables.combine(model, &samples, &mut suffixes).await;

        assert_eq!(models.len(), 1);
        assert_eq!(suffixes.next(OriginId(1)), ".A");
    }
}
