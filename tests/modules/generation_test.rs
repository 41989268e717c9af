#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use starforge::config::NamingSettings;
    use starforge::model::{
        CommonModel, DataType, DatabaseId, OriginId, StarColumnType, StarModel, TypeTag,
    };
    use starforge::modules::generation::{
        AliasContext, CreateScript, EtlScript, GenerationModule,
    };
    use starforge::modules::star_refinement::{
        DateTimeDimensions, JunkDimension, NamingConvention, OrderColumns, StarRefinementModule,
    };
    use std::sync::Arc;

    /// `Sales` refined through the junk, calendar, naming and ordering steps.
    fn refined_sales(columns: &[(&str, DataType)]) -> StarModel {
        let mut model = CommonModel::new(OriginId(0));
        let sales = model.add_table("Sales", "dbo", DatabaseId(0), Some(100));
        for (name, datatype) in columns {
            model.add_typed_column(sales, name, *datatype, 1.0);
        }
        let mut star = StarModel::new(Arc::new(model), sales, 1.0);
        if let Some(amount) = star.find_column(star.fact(), "Amount") {
            star.column_mut(amount)
                .column_type
                .insert(StarColumnType::NUMERIC_MEASURE);
        }

        for module in [
            StarRefinementModule::DateTimeDimensions(DateTimeDimensions),
            StarRefinementModule::JunkDimension(JunkDimension),
            StarRefinementModule::NamingConvention(NamingConvention::new(NamingSettings::default())),
            StarRefinementModule::OrderColumns(OrderColumns),
        ] {
            module.refine(&mut star).unwrap();
        }
        star
    }

    fn sales_with_channel() -> StarModel {
        refined_sales(&[
            ("Amount", DataType::new(TypeTag::Double)),
            ("Channel", DataType::new(TypeTag::VarWChar).with_length(20)),
        ])
    }

    #[test]
    fn test_create_script() {
        let star = sales_with_channel();
        let artifact = CreateScript.generate(&star).unwrap();

        assert_eq!(artifact.file_name, "DW_Fact_Sales.sql");
        assert_snapshot!(artifact.content.trim_end(), @r"
CREATE TABLE [Fact_Sales] (
    [JunkSalesKey] int NOT NULL,
    [Amount] float NULL,
    CONSTRAINT [PK_Fact_Sales] PRIMARY KEY ([JunkSalesKey])
);

CREATE TABLE [Dim_JunkSales] (
    [SurKey] int IDENTITY(1,1) NOT NULL,
    [Channel] nvarchar(20) NULL,
    CONSTRAINT [PK_Dim_JunkSales] PRIMARY KEY ([SurKey])
);

ALTER TABLE [Fact_Sales] ADD CONSTRAINT [FK_Fact_Sales_Dim_JunkSales] FOREIGN KEY ([JunkSalesKey]) REFERENCES [Dim_JunkSales] ([SurKey]);
");
    }

    #[test]
    fn test_etl_script() {
        let star = sales_with_channel();
        let mut aliases = AliasContext::new();
        let artifact = EtlScript::for_year(2024).generate(&star, &mut aliases).unwrap();

        assert_eq!(artifact.file_name, "ETL_Fact_Sales.sql");
        assert_snapshot!(artifact.content.trim_end(), @r"
TRUNCATE TABLE [Fact_Sales];

DELETE FROM [Dim_JunkSales];
INSERT INTO [Dim_JunkSales] ([Channel])
SELECT DISTINCT S_Sa1.[Channel] AS [Channel]
FROM [dbo].[Sales] S_Sa1;

INSERT INTO [Fact_Sales] ([JunkSalesKey], [Amount])
SELECT T_Di1.[SurKey], S_Sa1.[Amount]
FROM [dbo].[Sales] S_Sa1
INNER JOIN [Dim_JunkSales] T_Di1 ON (S_Sa1.[Channel] = T_Di1.[Channel] OR S_Sa1.[Channel] IS NULL AND T_Di1.[Channel] IS NULL);
");
    }

    #[test]
    fn test_calendar_dimensions_in_scripts() {
        let star = refined_sales(&[
            ("Amount", DataType::new(TypeTag::Double)),
            ("SoldAt", DataType::new(TypeTag::DbTimeStamp)),
        ]);

        let create = CreateScript.generate(&star).unwrap().content;
        assert!(create.contains("CREATE TABLE [Dim_Date] ("));
        assert!(create.contains("CREATE TABLE [Dim_Time] ("));
        assert!(create.contains(
            "ALTER TABLE [Fact_Sales] ADD CONSTRAINT [FK_Fact_Sales_SoldAtDateKey_Dim_Date] \
             FOREIGN KEY ([SoldAtDateKey]) REFERENCES [Dim_Date] ([SurKey]);"
        ));
        assert!(create.contains("[FK_Fact_Sales_SoldAtTimeKey_Dim_Time]"));

        let mut aliases = AliasContext::new();
        let etl = EtlScript::for_year(2024).generate(&star, &mut aliases).unwrap().content;
        assert!(etl.contains("DECLARE @StartDate DATETIME = '01/01/2024';"));
        assert!(etl.contains("DELETE FROM [Dim_Time];"));
        assert!(etl.contains("DATEPART(HOUR, S_Sa1.[SoldAt]) = T_Di1.[Hour]"));
        assert!(etl.contains("CONVERT(char(10), S_Sa1.[SoldAt], 103) = T_Di2.[FullDate]"));
    }

    #[test]
    fn test_modules_share_the_alias_context() {
        let star = sales_with_channel();
        let mut aliases = AliasContext::new();
        let etl = GenerationModule::EtlScript(EtlScript::for_year(2024));
        etl.generate(&star, &mut aliases).unwrap();

        // Aliases handed out by the script stay taken
        assert_eq!(aliases.star(star.fact(), "Fact_Sales"), "T_Fa1");
        let junk = star.dimensions()[0];
        assert_eq!(aliases.star(junk, "Dim_JunkSales"), "T_Di1");
    }
}
