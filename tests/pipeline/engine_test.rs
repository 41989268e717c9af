#[cfg(test)]
mod tests {
    use starforge::config::{ConnectionSettings, Settings};
    use starforge::pipeline::{EngineBuilder, ModuleRegistry, PipelineError};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn shop() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Orders.csv"),
            "OrderID,CustomerID,Quantity,Amount,Discount,OrderDate\n\
             1,10,2,9.50,0.0,2024-03-01 09:00:00\n\
             2,11,1,9.50,0.1,2024-03-01 09:00:00\n\
             3,10,2,4.25,0.0,2024-03-02 14:30:00\n\
             4,12,3,4.25,0.1,2024-03-02 14:30:00\n\
             5,11,1,9.50,0.0,2024-03-03 17:45:00\n\
             6,12,2,4.25,0.1,2024-03-03 17:45:00\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Customers.csv"),
            "CustomerID,Name\n10,Ann\n11,Bob\n12,Cy\n",
        )
        .unwrap();
        dir
    }

    fn settings(source: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.connections.push(ConnectionSettings::new(
            "csv",
            source.to_string_lossy().into_owned(),
        ));
        settings.star.fact_threshold = 0.5;
        settings
    }

    async fn run(settings: &Settings, output: &Path) -> Result<starforge::RunReport, PipelineError> {
        let registry = ModuleRegistry::builtin(settings)?;
        let engine = EngineBuilder::build(settings, &registry)?;
        engine.run(output).await
    }

    #[tokio::test]
    async fn test_end_to_end_writes_scripts() {
        let source = shop();
        let output = TempDir::new().unwrap();

        let report = run(&settings(source.path()), output.path()).await.unwrap();

        assert!(!report.run_id.is_nil());
        assert_eq!(report.connections, 1);
        assert_eq!(report.skipped_connections, 0);
        assert_eq!(report.tables, 2);
        assert_eq!(report.groups, 1);
        assert_eq!(report.permutations, 1);
        assert_eq!(report.star_models, 1);

        let names: Vec<String> = report
            .artifacts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["DW_Fact_Orders.sql", "ETL_Fact_Orders.sql"]);
        for artifact in &report.artifacts {
            assert!(artifact.starts_with(output.path()));
            assert!(artifact.exists());
        }

        let create = fs::read_to_string(&report.artifacts[0]).unwrap();
        assert!(create.contains("CREATE TABLE [Fact_Orders] ("));
        assert!(create.contains("CREATE TABLE [Dim_Customers] ("));
        assert!(create.contains("CREATE TABLE [Dim_Date] ("));
        assert!(create.contains("REFERENCES [Dim_Customers] ([SurKey]);"));

        let etl = fs::read_to_string(&report.artifacts[1]).unwrap();
        assert!(etl.starts_with("TRUNCATE TABLE [Fact_Orders];"));
        assert!(etl.contains("INSERT INTO [Dim_Customers]"));
    }

    #[tokio::test]
    async fn test_bad_connections_are_skipped() {
        let source = shop();
        let output = TempDir::new().unwrap();
        let mut settings = settings(source.path());
        settings
            .connections
            .push(ConnectionSettings::new("csv", "/definitely/not/here"));
        settings
            .connections
            .push(ConnectionSettings::new("mssql", "Server=db;Database=shop"));

        let report = run(&settings, output.path()).await.unwrap();

        assert_eq!(report.connections, 1);
        assert_eq!(report.skipped_connections, 2);
        assert_eq!(report.tables, 2);
        assert_eq!(report.star_models, 1);
    }

    #[tokio::test]
    async fn test_no_fact_means_no_artifacts() {
        let source = shop();
        let output = TempDir::new().unwrap();
        let target = output.path().join("scripts");
        let mut settings = settings(source.path());
        settings.star.fact_threshold = 1.0;

        let report = run(&settings, &target).await.unwrap();

        assert_eq!(report.star_models, 0);
        assert!(report.artifacts.is_empty());
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_min_dimensions_drops_small_stars() {
        let source = shop();
        let output = TempDir::new().unwrap();
        let mut settings = settings(source.path());
        settings.star.min_dimensions = 1;

        let report = run(&settings, output.path()).await.unwrap();

        assert_eq!(report.star_models, 0);
    }

    #[tokio::test]
    async fn test_unusable_output_dir_aborts() {
        let source = shop();
        let output = TempDir::new().unwrap();
        let blocked = output.path().join("taken");
        fs::write(&blocked, "a file, not a directory").unwrap();

        let err = run(&settings(source.path()), &blocked).await.unwrap_err();

        match err {
            PipelineError::Output { path, .. } => assert_eq!(path, blocked),
            other => panic!("unexpected error: {other}"),
        }
    }
}
