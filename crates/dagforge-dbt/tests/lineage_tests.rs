//! Lineage compilation against real-shaped dbt manifests
//!
//! The fixtures under `tests/fixtures/` hold one small dbt project compiled for
//! a warehouse-catalog target and one for a lake-table target.

use std::path::PathBuf;

use dagforge_core::{AdapterKind, ErrorCode, LineageSettings};
use dagforge_dbt::{
    CompiledIo, Descriptor, LineageCompiler, LineageDefaults, LineageError, Manifest,
};
use dagforge_pipeline::builtin_io_registry;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn fixture(name: &str) -> Manifest {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    Manifest::from_file(&path).unwrap()
}

fn athena_compiler() -> LineageCompiler {
    let mut settings = LineageSettings {
        data_bucket: Some("bucket1-data-lake".to_string()),
        ..LineageSettings::default()
    };
    LineageDefaults::from_profile_output(&json!({
        "type": "athena",
        "s3_data_dir": "s3://bucket1-data-lake/path1/tmp",
        "s3_staging_dir": "s3://bucket1-data-lake/path1/",
    }))
    .apply(&mut settings);

    LineageCompiler::from_settings(fixture("athena_manifest.json"), &settings)
}

fn databricks_compiler(cross_registration: bool) -> LineageCompiler {
    let settings = LineageSettings {
        adapter: AdapterKind::Databricks,
        create_external_athena_table: cross_registration,
        ..LineageSettings::default()
    };
    LineageCompiler::from_settings(fixture("databricks_manifest.json"), &settings)
}

fn values(descriptors: &[Descriptor]) -> Vec<Value> {
    descriptors.iter().map(Descriptor::to_value).collect()
}

fn athena(schema: &str, table: &str, follow: bool) -> Value {
    let mut descriptor = json!({
        "type": "athena",
        "name": format!("{}__{}_athena", schema, table),
        "schema": schema,
        "table": table,
    });
    if follow {
        descriptor["follow_external_dependency"] = json!(true);
    }
    descriptor
}

fn s3(name: &str, path: &str, bucket: &str) -> Value {
    json!({"type": "s3", "name": name, "bucket": bucket, "path": path})
}

fn dummy(name: &str) -> Value {
    json!({"type": "dummy", "name": name})
}

const AE: &str = "analytics_engineering";

// =============================================================================
// Warehouse-catalog adapter
// =============================================================================

#[test]
fn athena_model_inputs() {
    let io = athena_compiler().generate_io("model1").unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            athena(AE, "stg_core_schema2__table2", false),
            athena("core_schema2", "table2", true),
            athena("core_schema2", "table3", true),
            athena(AE, "seed_buyer_country_overwrite", false),
            athena(AE, "model2", true),
            s3("s3_model2", "path2/model2", "bucket1-data-lake"),
            dummy("int_model3"),
            dummy("int_model2"),
            athena(AE, "stg_core_schema1__table1", true),
            s3(
                "s3_stg_core_schema1__table1",
                "path2/stg_core_schema1__table1",
                "bucket1-data-lake"
            ),
        ]
    );
}

#[test]
fn athena_model_outputs() {
    let io = athena_compiler().generate_io("model1").unwrap();

    assert_eq!(
        values(&io.outputs),
        vec![
            athena(AE, "model1", false),
            s3("output_s3_path", "path1/model1", "bucket1-data-lake"),
        ]
    );
}

#[test]
fn athena_unmaterialized_model_with_many_dependencies() {
    let io = athena_compiler().generate_io("model3").unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            dummy("int_model3"),
            dummy("int_model2"),
            athena(AE, "seed_buyer_country_overwrite", false),
            athena(AE, "stg_core_schema1__table1", true),
            s3(
                "s3_stg_core_schema1__table1",
                "path2/stg_core_schema1__table1",
                "bucket1-data-lake"
            ),
            athena(AE, "model2", true),
            s3("s3_model2", "path2/model2", "bucket1-data-lake"),
            athena(AE, "stg_core_schema2__table2", false),
            athena("core_schema2", "table2", true),
            athena("core_schema2", "table3", true),
        ]
    );
    assert_eq!(values(&io.outputs), vec![athena(AE, "model3", false)]);
}

#[test]
fn athena_staging_view() {
    let io = athena_compiler()
        .generate_io("stg_core_schema2__table2")
        .unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            athena("core_schema2", "table2", true),
            athena("core_schema2", "table3", true),
            athena(AE, "seed_buyer_country_overwrite", false),
        ]
    );
    assert_eq!(values(&io.outputs), vec![dummy("stg_core_schema2__table2")]);
}

#[test]
fn athena_staging_table_is_not_flattened() {
    let io = athena_compiler()
        .generate_io("model.main.stg_core_schema1__table1")
        .unwrap();

    assert_eq!(values(&io.inputs), vec![athena("core_schema1", "table1", true)]);
    assert_eq!(
        values(&io.outputs),
        vec![
            athena(AE, "stg_core_schema1__table1", false),
            s3(
                "output_s3_path",
                "path2/stg_core_schema1__table1",
                "bucket1-data-lake"
            ),
        ]
    );
}

#[test]
fn athena_intermediate_model() {
    let io = athena_compiler().generate_io("int_model2").unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            athena(AE, "seed_buyer_country_overwrite", false),
            athena(AE, "stg_core_schema1__table1", true),
            s3(
                "s3_stg_core_schema1__table1",
                "path2/stg_core_schema1__table1",
                "bucket1-data-lake"
            ),
        ]
    );
    assert_eq!(values(&io.outputs), vec![dummy("int_model2")]);
}

/// model1 (incremental) <- stg_x (staging view) <- source table1, plus model2
#[test]
fn staging_node_flattens_into_its_source() {
    let manifest = Manifest::from_str(
        r#"{
            "nodes": {
                "model.shop.model1": {
                    "unique_id": "model.shop.model1",
                    "name": "model1",
                    "schema": "marts",
                    "config": {
                        "materialized": "incremental",
                        "external_location": "s3://shop-lake/marts/model1"
                    },
                    "depends_on": {"nodes": ["model.shop.stg_x", "model.shop.model2"]}
                },
                "model.shop.stg_x": {
                    "unique_id": "model.shop.stg_x",
                    "name": "stg_x",
                    "schema": "staging",
                    "config": {"materialized": "view"},
                    "depends_on": {"nodes": ["source.shop.raw.table1"]}
                },
                "model.shop.model2": {
                    "unique_id": "model.shop.model2",
                    "name": "model2",
                    "schema": "marts",
                    "config": {
                        "materialized": "table",
                        "external_location": "s3://shop-lake/marts/model2"
                    }
                }
            },
            "sources": {
                "source.shop.raw.table1": {
                    "unique_id": "source.shop.raw.table1",
                    "name": "table1",
                    "schema": "raw",
                    "resource_type": "source"
                }
            }
        }"#,
    )
    .unwrap();

    let settings = LineageSettings {
        data_bucket: Some("shop-lake".to_string()),
        ..LineageSettings::default()
    };
    let io = LineageCompiler::from_settings(manifest, &settings)
        .generate_io("model1")
        .unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            athena("staging", "stg_x", false),
            athena("raw", "table1", true),
            athena("marts", "model2", true),
            s3("s3_model2", "marts/model2", "shop-lake"),
        ]
    );
    assert_eq!(
        values(&io.outputs),
        vec![
            athena("marts", "model1", false),
            s3("output_s3_path", "marts/model1", "shop-lake"),
        ]
    );
}

// =============================================================================
// Lake-table adapter
// =============================================================================

fn databricks(catalog: &str, schema: &str, table: &str, follow: bool) -> Value {
    let mut descriptor = json!({
        "type": "databricks",
        "name": format!("{}__{}__{}_databricks", catalog, schema, table),
        "catalog": catalog,
        "schema": schema,
        "table": table,
    });
    if follow {
        descriptor["follow_external_dependency"] = json!(true);
    }
    descriptor
}

#[test]
fn databricks_model_inputs() {
    let io = databricks_compiler(false).generate_io("model1").unwrap();

    assert_eq!(
        values(&io.inputs),
        vec![
            databricks("hive_metastore", "data_preparation", "stg_core_schema2__table2", false),
            athena("core_schema2", "table2", true),
            athena("core_schema2", "table3", true),
            dummy("seed_buyer_country_overwrite"),
            databricks("marts", AE, "model2", true),
            s3(
                "marts__analytics_engineering__model2_s3",
                "analytics_warehouse/data/marts/analytics_engineering/model2",
                "acme-data-lake"
            ),
            dummy("int_model3"),
            dummy("int_model2"),
            databricks("hive_metastore", "data_preparation", "stg_core_schema1__table1", false),
            athena("core_schema1", "table1", true),
        ]
    );
}

#[test]
fn databricks_outputs_with_cross_registration() {
    let io = databricks_compiler(true).generate_io("model1").unwrap();

    assert_eq!(
        values(&io.outputs),
        vec![
            databricks("marts", AE, "model1", false),
            s3(
                "marts__analytics_engineering__model1_s3",
                "analytics_warehouse/data/marts/analytics_engineering/model1",
                "acme-data-lake"
            ),
            athena(AE, "model1", false),
        ]
    );
}

#[test]
fn databricks_outputs_without_cross_registration() {
    let io = databricks_compiler(false).generate_io("model1").unwrap();
    assert_eq!(io.outputs.len(), 2);
    assert!(io.outputs.iter().all(|d| d.kind() != "athena"));
}

#[test]
fn databricks_preparation_model_outputs_placeholder() {
    let io = databricks_compiler(true)
        .generate_io("stg_core_schema2__table2")
        .unwrap();

    assert_eq!(values(&io.outputs), vec![dummy("stg_core_schema2__table2")]);
    assert_eq!(
        values(&io.inputs),
        vec![
            athena("core_schema2", "table2", true),
            athena("core_schema2", "table3", true),
            dummy("seed_buyer_country_overwrite"),
        ]
    );
}

// =============================================================================
// Validation and errors
// =============================================================================

#[test]
fn compiled_descriptors_validate_as_ios() {
    let registry = builtin_io_registry();

    for compiler in [athena_compiler(), databricks_compiler(true)] {
        let io = compiler.generate_io("model1").unwrap();
        let validated = io.validate(&registry, "dbt/model1.yaml").unwrap();

        assert_eq!(validated.inputs.len(), io.inputs.len());
        assert_eq!(validated.outputs.len(), io.outputs.len());
        assert!(validated.outputs.iter().all(|io| !io.follow_external_dependency()));
    }
}

#[test]
fn athena_model_aliases() {
    let registry = builtin_io_registry();
    let validated = athena_compiler()
        .generate_io("model1")
        .unwrap()
        .validate(&registry, "dbt/model1.yaml")
        .unwrap();

    let aliases: Vec<String> = validated.outputs.iter().map(|io| io.alias()).collect();
    assert_eq!(
        aliases,
        vec![
            "athena://analytics_engineering/model1",
            "s3:///bucket1-data-lake/path1/model1",
        ]
    );
}

#[test]
fn descriptor_failing_validation() {
    let io = CompiledIo {
        inputs: vec![Descriptor::new("athena", "broken").with("schema", "s")],
        outputs: Vec::new(),
    };

    let err = io
        .validate(&builtin_io_registry(), "dbt/broken.yaml")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingRequiredField);
}

#[test]
fn missing_model() {
    let err = athena_compiler().generate_io("model9").unwrap_err();
    assert_eq!(err, LineageError::ModelNotFound("model9".to_string()));
}

#[test]
fn compiled_io_serializes_as_plain_maps() {
    let io = athena_compiler().generate_io("int_model3").unwrap();
    let value = serde_json::to_value(&io).unwrap();

    assert_eq!(value["outputs"], json!([{"type": "dummy", "name": "int_model3"}]));
    assert_eq!(value["inputs"][0], dummy("int_model2"));
}
