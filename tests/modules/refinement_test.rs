#[cfg(test)]
mod tests {
    use starforge::config::{default_patterns, CsvSettings};
    use starforge::graph::order_modules;
    use starforge::model::{Cardinality, CommonModel, Database, DatabaseId, OriginId, TypeTag};
    use starforge::modules::metadata::{CsvInference, InferenceModule, SampleDirectory};
    use starforge::modules::refinement::{
        CardinalityInference, DistinctPrimaryKeys, NameRelations, NonNullability, PatternNames,
        RefinementModule, UniqueValues, ZipCodes,
    };
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn load(dir: &TempDir) -> (CommonModel, SampleDirectory) {
        let database = Database {
            id: DatabaseId(0),
            name: "shop".to_string(),
            connection_string: dir.path().to_string_lossy().into_owned(),
            source_type: "csv".to_string(),
        };
        let csv = Arc::new(CsvInference::new(CsvSettings::default()));
        let model = csv.schema(&database, OriginId(0)).await.unwrap();
        let mut samples = SampleDirectory::new();
        samples.register(database, csv).unwrap();
        (model, samples)
    }

    fn shop() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Orders.csv"),
            "OrderID,CustomerID,ShipZip,Note\n\
             1,10,0800,\n\
             2,11,2100,gift\n\
             3,10,0800,\n\
             4,12,8000,rush\n\
             5,11,2100,\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Customers.csv"),
            "CustomerID,Name\n10,Ann\n11,Bob\n12,Cy\n13,Di\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("contacts.csv"),
            "1,ann@example.com\n2,bob@example.org\n3,cy@example.net\n4,di@example.com\n",
        )
        .unwrap();
        dir
    }

    fn all_modules() -> Vec<RefinementModule> {
        vec![
            RefinementModule::NameRelations(NameRelations),
            RefinementModule::Cardinality(CardinalityInference),
            RefinementModule::DistinctPrimaryKeys(DistinctPrimaryKeys),
            RefinementModule::UniqueValues(UniqueValues),
            RefinementModule::NonNullability(NonNullability),
            RefinementModule::ZipCodes(ZipCodes),
            RefinementModule::PatternNames(PatternNames::new(&default_patterns()).unwrap()),
        ]
    }

    #[tokio::test]
    async fn test_not_null_only_for_complete_samples() {
        let dir = shop();
        let (mut model, samples) = load(&dir).await;
        NonNullability.refine(&mut model, &samples).await.unwrap();

        let orders = model.find_table("Orders").unwrap();
        let order_id = model.find_column(orders, "OrderID").unwrap();
        let note = model.find_column(orders, "Note").unwrap();
        assert_eq!(model.not_null_for(order_id), Some(0.8));
        assert_eq!(model.not_null_for(note), None);
    }

    #[tokio::test]
    async fn test_unique_and_primary_key_from_samples() {
        let dir = shop();
        let (mut model, samples) = load(&dir).await;
        NonNullability.refine(&mut model, &samples).await.unwrap();
        UniqueValues.refine(&mut model, &samples).await.unwrap();
        DistinctPrimaryKeys.refine(&mut model, &samples).await.unwrap();

        let orders = model.find_table("Orders").unwrap();
        let order_id = model.find_column(orders, "OrderID").unwrap();
        let customer_id = model.find_column(orders, "CustomerID").unwrap();

        let unique = model.unique_for(order_id).unwrap();
        assert!((unique.confidence - 0.8).abs() < 1e-9);
        assert!(model.unique_for(customer_id).is_none());

        let pk = model.table(orders).primary_key().unwrap();
        assert!(pk.value.contains(&order_id));
        assert!(!model.is_primary_key(customer_id));
    }

    #[tokio::test]
    async fn test_zero_padded_integers_become_strings() {
        let dir = shop();
        let (mut model, samples) = load(&dir).await;
        let orders = model.find_table("Orders").unwrap();
        let zip = model.find_column(orders, "ShipZip").unwrap();
        assert_eq!(model.column(zip).datatype().tag, TypeTag::Integer);

        ZipCodes.refine(&mut model, &samples).await.unwrap();

        assert_eq!(model.column(zip).datatype().tag, TypeTag::VarWChar);
        let customers = model.find_table("Customers").unwrap();
        let customer_id = model.find_column(customers, "CustomerID").unwrap();
        assert_eq!(model.column(customer_id).datatype().tag, TypeTag::Integer);
    }

    #[tokio::test]
    async fn test_pattern_names_replace_generated_names() {
        let dir = shop();
        let (mut model, samples) = load(&dir).await;
        let contacts = model.find_table("contacts").unwrap();
        let second = model.table(contacts).columns()[1];
        assert_eq!(model.column(second).name(), "Column_2");

        PatternNames::new(&default_patterns())
            .unwrap()
            .refine(&mut model, &samples)
            .await
            .unwrap();

        assert_eq!(model.column(second).name(), "Email");
        let candidate = model
            .column(second)
            .name_candidates()
            .iter()
            .find(|c| c.value == "Email")
            .unwrap();
        assert_eq!(candidate.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_ordered_chain_links_orders_to_customers() {
        let dir = shop();
        let (mut model, samples) = load(&dir).await;
        for module in order_modules(all_modules()).unwrap() {
            module.refine(&mut model, &samples).await.unwrap();
        }

        let orders = model.find_table("Orders").unwrap();
        let customers = model.find_table("Customers").unwrap();
        let relations: Vec<_> = model.relations_of(orders).map(|(_, r)| r.clone()).collect();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].anchor, customers);
        assert_eq!(relations[0].link, orders);
        assert_eq!(relations[0].cardinality, Cardinality::ManyToOne);
        let fk = model.find_column(orders, "CustomerID").unwrap();
        assert!(model.is_foreign_key(fk));
    }
}
