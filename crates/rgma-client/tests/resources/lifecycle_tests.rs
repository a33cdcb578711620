// crates/rgma-client/tests/resources/lifecycle_tests.rs
// ============================================================================
// Module: Lifecycle Tests
// Description: Close, destroy and dead-handle behaviour.
// ============================================================================

use rgma_client::Consumer;
use rgma_client::ConsumerOptions;
use rgma_client::PrimaryProducer;
use rgma_client::QueryType;
use rgma_client::ResourceHandle;
use rgma_client::RgmaError;
use rgma_client::Storage;
use rgma_client::SupportedQueries;
use rgma_client::resource::DEAD_RESOURCE_MESSAGE;

use crate::common::Script;
use crate::common::context;
use crate::common::id_body;
use crate::common::ok_body;
use crate::common::temporary_body;
use crate::common::unknown_body;

#[test]
fn close_twice_sends_one_request() {
    let script = Script::bodies([id_body(1), ok_body()]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    producer.close().unwrap();
    assert!(producer.is_dead());
    producer.close().unwrap();
    producer.destroy().unwrap();
    assert_eq!(script.commands(), ["createPrimaryProducer", "close"]);
}

#[test]
fn dead_handle_fails_locally() {
    let script = Script::bodies([id_body(1), ok_body()]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();
    producer.destroy().unwrap();

    let err = producer.insert("INSERT INTO t VALUES (1)", None).unwrap_err();
    assert!(matches!(err, RgmaError::Permanent { .. }));
    assert_eq!(err.message(), DEAD_RESOURCE_MESSAGE);
    assert_eq!(script.commands(), ["createPrimaryProducer", "destroy"]);
}

#[test]
fn close_of_lost_resource_succeeds() {
    let script = Script::bodies([id_body(1), unknown_body()]);
    let ctx = context(&script, 5);
    let mut consumer = Consumer::new(&ctx, "SELECT * FROM t", QueryType::Continuous, ConsumerOptions::default())
        .unwrap();

    consumer.close().unwrap();
    assert!(consumer.is_dead());
    assert_eq!(script.remaining(), 0);
}

#[test]
fn failed_close_still_kills_handle() {
    let script = Script::bodies([id_body(1), temporary_body("Server busy")]);
    let ctx = context(&script, 5);
    let mut producer = PrimaryProducer::new(&ctx, Storage::memory(), SupportedQueries::C).unwrap();

    let err = producer.close().unwrap_err();
    assert!(err.is_temporary());
    assert!(producer.is_dead());
}
