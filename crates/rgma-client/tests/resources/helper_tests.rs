// crates/rgma-client/tests/resources/helper_tests.rs
// ============================================================================
// Module: Helper Service Tests
// Description: Row mapping and parameters of schema, registry and server calls.
// ============================================================================

use rgma_client::Registry;
use rgma_client::ResourceId;
use rgma_client::RgmaService;
use rgma_client::RgmaType;
use rgma_client::Schema;
use rgma_client::TimeUnit;

use crate::common::Script;
use crate::common::column_body;
use crate::common::context;
use crate::common::nullable_rows_body;
use crate::common::ok_body;
use crate::common::param;
use crate::common::param_values;
use crate::common::rows_body;

// ============================================================================
// SECTION: Schema
// ============================================================================

#[test]
fn schema_calls_carry_vdb_and_forwarding() {
    let script = Script::bodies([ok_body(), ok_body(), column_body(&["t1", "t2"], false)]);
    let ctx = context(&script, 5);
    let schema = Schema::new(&ctx, "default");

    schema
        .create_table("CREATE TABLE t1 (a INTEGER PRIMARY KEY)", &["::R", "[DN]::RW"])
        .unwrap();
    schema.drop_index("t1", "idx").unwrap();
    assert_eq!(schema.get_all_tables().unwrap(), ["t1", "t2"]);

    let requests = script.requests();
    for request in &requests {
        assert_eq!(param(request, "vdbName").as_deref(), Some("default"));
        assert_eq!(param(request, "canForward").as_deref(), Some("true"));
    }
    assert_eq!(param_values(&requests[0], "tableAuthz"), ["::R", "[DN]::RW"]);
    assert_eq!(param(&requests[1], "indexName").as_deref(), Some("idx"));
    assert_eq!(script.commands(), ["createTable", "dropIndex", "getAllTables"]);
}

#[test]
fn schema_maps_table_definition() {
    let body = nullable_rows_body(&[
        vec![Some("userTable"), Some("a"), Some("INTEGER"), Some("0"), Some("true"), Some("true"), None],
        vec![Some("userTable"), Some("b"), Some("VARCHAR"), Some("32"), Some("false"), Some("false"), None],
        vec![Some("userTable"), Some("c"), Some("93"), Some("0"), Some("false"), Some("false"), None],
    ]);
    let script = Script::bodies([body]);
    let ctx = context(&script, 5);

    let definition = Schema::new(&ctx, "default").get_table_definition("userTable").unwrap();

    assert_eq!(definition.table_name, "userTable");
    assert!(!definition.is_view());
    assert_eq!(definition.columns.len(), 3);
    assert_eq!(definition.columns[0].column_type, RgmaType::Integer);
    assert!(definition.columns[0].primary_key);
    assert_eq!(definition.columns[1].size, 32);
    assert_eq!(definition.columns[2].column_type, RgmaType::Timestamp);
    assert_eq!(
        definition.to_string(),
        "userTable (a INTEGER PRIMARY KEY NOT NULL, b VARCHAR(32), c TIMESTAMP)"
    );
}

#[test]
fn schema_reports_view_base_table() {
    let body = rows_body(&[vec!["v1", "a", "INTEGER", "0", "false", "false", "userTable"]], false);
    let script = Script::bodies([body]);
    let ctx = context(&script, 5);

    let definition = Schema::new(&ctx, "default").get_table_definition("v1").unwrap();
    assert_eq!(definition.view_for.as_deref(), Some("userTable"));
}

#[test]
fn schema_view_is_decided_by_null_not_empty() {
    let empty = rows_body(&[vec!["v2", "a", "INTEGER", "0", "false", "false", ""]], false);
    let null = nullable_rows_body(&[vec![
        Some("t2"),
        Some("a"),
        Some("INTEGER"),
        Some("0"),
        Some("false"),
        Some("false"),
        None,
    ]]);
    let script = Script::bodies([empty, null]);
    let ctx = context(&script, 5);
    let schema = Schema::new(&ctx, "default");

    let view = schema.get_table_definition("v2").unwrap();
    assert!(view.is_view());
    assert_eq!(view.view_for.as_deref(), Some(""));
    let table = schema.get_table_definition("t2").unwrap();
    assert!(!table.is_view());
}

#[test]
fn schema_empty_definition_is_permanent() {
    let script = Script::bodies([column_body(&[], false)]);
    let ctx = context(&script, 5);

    let err = Schema::new(&ctx, "default").get_table_definition("missing").unwrap_err();
    assert!(!err.is_temporary());
}

#[test]
fn schema_groups_index_columns() {
    let body = rows_body(
        &[vec!["pk", "a"], vec!["by_bc", "b"], vec!["pk", "d"], vec!["by_bc", "c"]],
        false,
    );
    let script = Script::bodies([body]);
    let ctx = context(&script, 5);

    let indexes = Schema::new(&ctx, "default").get_table_indexes("userTable").unwrap();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].name, "pk");
    assert_eq!(indexes[0].columns, ["a", "d"]);
    assert_eq!(indexes[1].to_string(), "by_bc [b c]");
}

#[test]
fn schema_authorization_rules_round_trip_parameters() {
    let script = Script::bodies([ok_body(), column_body(&["::R"], false)]);
    let ctx = context(&script, 5);
    let schema = Schema::new(&ctx, "default");

    schema.set_authorization_rules("userTable", &["::R"]).unwrap();
    assert_eq!(schema.get_authorization_rules("userTable").unwrap(), ["::R"]);
    assert_eq!(param_values(&script.requests()[0], "tableAuthz"), ["::R"]);
}

// ============================================================================
// SECTION: Registry
// ============================================================================

#[test]
fn registry_maps_producer_entries() {
    let body = rows_body(
        &[vec![
            "https://p.example.org:8443/R-GMA/PrimaryProducerServlet",
            "42",
            "false",
            "true",
            "false",
            "true",
            "false",
            "WHERE a = 1",
            "3600",
        ]],
        false,
    );
    let script = Script::bodies([body]);
    let ctx = context(&script, 5);

    let entries = Registry::new(&ctx, "default").get_all_producers_for_table("userTable").unwrap();

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.endpoint.resource_id(), ResourceId::new(42));
    assert!(entry.continuous && entry.history);
    assert!(!entry.secondary && !entry.latest && !entry.is_static);
    assert_eq!(entry.retention_period.value_as(TimeUnit::Hours), 1);
    let request = &script.requests()[0];
    assert_eq!(param(request, "tableName").as_deref(), Some("userTable"));
    assert_eq!(param(request, "canForward").as_deref(), Some("true"));
}

// ============================================================================
// SECTION: Server Service
// ============================================================================

#[test]
fn rgma_service_reads_server_values() {
    let script = Script::bodies([
        column_body(&["600"], false),
        rows_body(&[vec!["archive", "true", "false"]], false),
        ok_body(),
    ]);
    let ctx = context(&script, 5);
    let service = RgmaService::new(&ctx);

    assert_eq!(service.get_termination_interval().unwrap().value_as(TimeUnit::Minutes), 10);
    let stores = service.list_tuple_stores().unwrap();
    assert_eq!(stores[0].logical_name, "archive");
    assert!(stores[0].history && !stores[0].latest);
    service.drop_tuple_store("archive").unwrap();
    assert_eq!(param(&script.requests()[2], "logicalName").as_deref(), Some("archive"));
}

#[test]
fn rgma_service_drop_requires_acknowledgement() {
    let script = Script::bodies([column_body(&["NO"], false)]);
    let ctx = context(&script, 5);

    let err = RgmaService::new(&ctx).drop_tuple_store("archive").unwrap_err();
    assert_eq!(err.message(), "Failed to return status of OK");
}
