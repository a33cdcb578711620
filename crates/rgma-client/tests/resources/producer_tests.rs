// crates/rgma-client/tests/resources/producer_tests.rs
// ============================================================================
// Module: Producer Tests
// Description: Declaration, insert and recovery behaviour of producers.
// ============================================================================

use rgma_client::HttpMethod;
use rgma_client::OnDemandProducer;
use rgma_client::PrimaryProducer;
use rgma_client::ResourceHandle;
use rgma_client::ResourceId;
use rgma_client::RgmaError;
use rgma_client::SecondaryProducer;
use rgma_client::Storage;
use rgma_client::SupportedQueries;
use rgma_client::TimeInterval;
use rgma_client::TimeUnit;

use crate::common::Script;
use crate::common::assert_method;
use crate::common::context;
use crate::common::id_body;
use crate::common::ok_body;
use crate::common::param;
use crate::common::param_values;
use crate::common::temporary_body;
use crate::common::unknown_body;

/// Retention used by every declaration in this module.
fn minutes(value: i64) -> TimeInterval {
    TimeInterval::new(value, TimeUnit::Minutes).unwrap()
}

// ============================================================================
// SECTION: Primary Producer
// ============================================================================

#[test]
fn primary_producer_declares_and_inserts() {
    let script = Script::bodies([id_body(17), ok_body(), ok_body()]);
    let ctx = context(&script, 5);

    let mut producer =
        PrimaryProducer::new(&ctx, Storage::database(Some("archive")), SupportedQueries::CH).unwrap();
    producer.declare_table("userTable", "WHERE a = 1", minutes(60), minutes(5)).unwrap();
    producer.insert("INSERT INTO userTable (a) VALUES (1)", None).unwrap();

    assert_eq!(producer.resource_id(), ResourceId::new(17));
    assert_eq!(producer.declared_tables().len(), 1);
    assert_eq!(producer.declared_tables()[0].name, "userTable");
    assert_eq!(script.commands(), ["createPrimaryProducer", "declareTable", "insert"]);

    let requests = script.requests();
    assert_eq!(
        requests[0].path_and_query.split('?').next().unwrap(),
        "/R-GMA/PrimaryProducerServlet/createPrimaryProducer"
    );
    assert_eq!(param(&requests[0], "type").as_deref(), Some("database"));
    assert_eq!(param(&requests[0], "logicalName").as_deref(), Some("archive"));
    assert_eq!(param(&requests[0], "isHistory").as_deref(), Some("true"));
    assert_eq!(param(&requests[0], "isLatest").as_deref(), Some("false"));
    assert_eq!(param(&requests[1], "connectionId").as_deref(), Some("17"));
    assert_eq!(param(&requests[1], "hrpSec").as_deref(), Some("3600"));
    assert_eq!(param(&requests[1], "lrpSec").as_deref(), Some("300"));
    assert_method(&requests[2], HttpMethod::Post);
    assert_eq!(param(&requests[2], "lrpSec"), None);
}

#[test]
fn primary_producer_batches_inserts_with_latest_retention() {
    let script = Script::bodies([id_body(1), ok_body()]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::CL).unwrap();

    producer
        .insert_all(&["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"], Some(minutes(2)))
        .unwrap();

    let insert = &script.requests()[1];
    assert_eq!(param_values(insert, "insert").len(), 2);
    assert_eq!(param(insert, "lrpSec").as_deref(), Some("120"));
    assert_eq!(param(&script.requests()[0], "logicalName"), None);
}

#[test]
fn primary_producer_insert_fault_reports_successful_ops() {
    let script = Script::bodies([
        id_body(1),
        r#"<p m="Bad value" o="1"/>"#.to_string(),
    ]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    let err = producer.insert_all(&["INSERT a", "INSERT b"], None).unwrap_err();
    assert!(matches!(err, RgmaError::Permanent { .. }));
    assert_eq!(err.message(), "Bad value");
    assert_eq!(err.num_successful_ops(), 1);
}

#[test]
fn primary_producer_recovers_lost_resource_and_replays_declarations() {
    let script = Script::bodies([
        id_body(1),
        ok_body(),
        unknown_body(),
        id_body(2),
        ok_body(),
        ok_body(),
    ]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();
    producer.declare_table("userTable", "", minutes(1), minutes(1)).unwrap();

    producer.insert("INSERT INTO userTable (a) VALUES (1)", None).unwrap();

    assert_eq!(producer.resource_id(), ResourceId::new(2));
    assert_eq!(producer.declared_tables().len(), 1);
    assert_eq!(
        script.commands(),
        ["createPrimaryProducer", "declareTable", "insert", "createPrimaryProducer", "declareTable", "insert"]
    );
    let requests = script.requests();
    assert_eq!(param(&requests[4], "connectionId").as_deref(), Some("2"));
    assert_eq!(param(&requests[4], "tableName").as_deref(), Some("userTable"));
    assert_eq!(param(&requests[5], "connectionId").as_deref(), Some("2"));
    assert_eq!(script.remaining(), 0);
}

#[test]
fn failed_replay_keeps_lost_id_and_restores_again() {
    let script = Script::bodies([
        id_body(1),
        ok_body(),
        unknown_body(),
        id_body(2),
        temporary_body("busy"),
        unknown_body(),
        id_body(3),
        ok_body(),
        ok_body(),
    ]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();
    producer.declare_table("userTable", "", minutes(1), minutes(1)).unwrap();

    let err = producer.insert("INSERT INTO userTable (a) VALUES (1)", None).unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(err.message(), "busy");
    assert_eq!(producer.resource_id(), ResourceId::new(1));

    producer.insert("INSERT INTO userTable (a) VALUES (1)", None).unwrap();
    assert_eq!(producer.resource_id(), ResourceId::new(3));
    assert_eq!(
        script.commands(),
        [
            "createPrimaryProducer",
            "declareTable",
            "insert",
            "createPrimaryProducer",
            "declareTable",
            "insert",
            "createPrimaryProducer",
            "declareTable",
            "insert",
        ]
    );
    let requests = script.requests();
    assert_eq!(param(&requests[4], "connectionId").as_deref(), Some("2"));
    assert_eq!(param(&requests[5], "connectionId").as_deref(), Some("1"));
    assert_eq!(param(&requests[7], "connectionId").as_deref(), Some("3"));
    assert_eq!(param(&requests[8], "connectionId").as_deref(), Some("3"));
    assert_eq!(script.remaining(), 0);
}

#[test]
fn primary_producer_second_unknown_resource_is_temporary() {
    let script = Script::bodies([id_body(1), unknown_body(), id_body(2), unknown_body()]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    let err = producer.insert("INSERT INTO t VALUES (1)", None).unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(err.message(), "Unknown resource.");
    assert_eq!(producer.resource_id(), ResourceId::new(2));
}

#[test]
fn primary_producer_failed_recreate_surfaces_fault() {
    let script = Script::bodies([id_body(1), unknown_body(), temporary_body("Server busy")]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    let err = producer.insert("INSERT INTO t VALUES (1)", None).unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(err.message(), "Server busy");
    assert_eq!(producer.resource_id(), ResourceId::new(1));
}

#[test]
fn declaration_is_recorded_only_when_acknowledged() {
    let script = Script::bodies([id_body(1), r#"<p m="No such table"/>"#.to_string()]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    let err = producer.declare_table("missing", "", minutes(1), minutes(1)).unwrap_err();
    assert_eq!(err.message(), "No such table");
    assert!(producer.declared_tables().is_empty());
}

// ============================================================================
// SECTION: Secondary Producer
// ============================================================================

#[test]
fn secondary_producer_heartbeat_recreates_without_resending() {
    let script = Script::bodies([id_body(3), ok_body(), unknown_body(), id_body(4), ok_body()]);
    let ctx = context(&script, 5);
    let mut producer = SecondaryProducer::new(&ctx, Storage::memory(), SupportedQueries::CHL).unwrap();
    producer.declare_table("userTable", "", minutes(10)).unwrap();

    producer.show_sign_of_life().unwrap();

    assert_eq!(producer.resource_id(), ResourceId::new(4));
    assert_eq!(
        script.commands(),
        ["createSecondaryProducer", "declareTable", "showSignOfLife", "createSecondaryProducer", "declareTable"]
    );
    assert_eq!(param(&script.requests()[1], "lrpSec"), None);
}

#[test]
fn secondary_producer_static_operations_tolerate_unknown_resource() {
    let script = Script::bodies([ok_body(), unknown_body(), unknown_body(), ok_body()]);
    let ctx = context(&script, 5);
    let id = ResourceId::new(9);

    assert!(SecondaryProducer::static_show_sign_of_life(&ctx, id).unwrap());
    assert!(!SecondaryProducer::static_show_sign_of_life(&ctx, id).unwrap());
    SecondaryProducer::static_close(&ctx, id).unwrap();
    SecondaryProducer::static_close(&ctx, id).unwrap();

    for request in script.requests() {
        assert_eq!(param(&request, "connectionId").as_deref(), Some("9"));
    }
}

// ============================================================================
// SECTION: On-Demand Producer
// ============================================================================

#[test]
fn on_demand_producer_sends_listener_address() {
    let script = Script::bodies([id_body(12), ok_body()]);
    let ctx = context(&script, 5);
    let mut producer = OnDemandProducer::new(&ctx, "listener.example.org", 9090).unwrap();
    producer.declare_table("userTable", "WHERE b = 2").unwrap();

    assert_eq!(producer.host_name(), "listener.example.org");
    assert_eq!(producer.port(), 9090);
    let create = &script.requests()[0];
    assert_eq!(param(create, "hostName").as_deref(), Some("listener.example.org"));
    assert_eq!(param(create, "port").as_deref(), Some("9090"));
    assert_eq!(param(&script.requests()[1], "predicate").as_deref(), Some("WHERE b = 2"));
    assert_eq!(
        producer.endpoint().unwrap().connection_string(),
        "12 https://rgma.example.org:8443/R-GMA/OnDemandProducerServlet"
    );
}
