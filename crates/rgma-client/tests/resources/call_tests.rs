// crates/rgma-client/tests/resources/call_tests.rs
// ============================================================================
// Module: Call Path Tests
// Description: Transport retry, HTTP status handling and context failures.
// ============================================================================

use std::sync::mpsc;
use std::thread;

use rgma_client::ClientContext;
use rgma_client::RgmaError;
use rgma_client::RgmaService;
use rgma_client::pool::POOL_EXHAUSTED_MESSAGE;
use rgma_client::service::ServiceCaller;

use crate::common::Script;
use crate::common::Scripted;
use crate::common::column_body;
use crate::common::context;
use crate::common::ok;

#[test]
fn transport_failure_is_retried_once_on_fresh_connection() {
    let script = Script::steps([Scripted::Fail("reset by peer".to_string()), ok(column_body(&["3.1.0"], false))]);
    let ctx = context(&script, 1);

    let version = RgmaService::new(&ctx).get_version().unwrap();
    assert_eq!(version, "3.1.0");
    assert_eq!(script.requests().len(), 2);
    assert_eq!(script.connects(), 2);
    assert_eq!(ctx.pool_stats().unwrap().in_use, 0);
}

#[test]
fn second_transport_failure_is_temporary() {
    let script = Script::steps([
        Scripted::Fail("reset by peer".to_string()),
        Scripted::Fail("connection refused".to_string()),
    ]);
    let ctx = context(&script, 1);

    let err = RgmaService::new(&ctx).get_version().unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(err.message(), "rgma.example.org:8443: connection refused");
    let stats = ctx.pool_stats().unwrap();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.idle, 0);
}

#[test]
fn broken_body_is_retried_as_transport_failure() {
    let script = Script::steps([
        Scripted::Reset(r#"<r c="1" r="2"><v>a</v>"#.to_string()),
        ok(column_body(&["3.1.0"], false)),
    ]);
    let ctx = context(&script, 1);

    let version = RgmaService::new(&ctx).get_version().unwrap();
    assert_eq!(version, "3.1.0");
    assert_eq!(script.requests().len(), 2);
    assert_eq!(script.connects(), 2);
}

#[test]
fn second_broken_body_is_temporary() {
    let script = Script::steps([
        Scripted::Reset(r#"<r c="1" r="2"><v>a</v>"#.to_string()),
        Scripted::Reset(String::new()),
    ]);
    let ctx = context(&script, 1);

    let err = RgmaService::new(&ctx).get_version().unwrap_err();
    assert!(err.is_temporary());
    assert!(err.message().starts_with("rgma.example.org:8443: "));
    assert!(err.message().contains("connection reset by peer"));
    let stats = ctx.pool_stats().unwrap();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.idle, 0);
}

#[test]
fn non_ok_status_is_temporary_and_names_url() {
    let script = Script::steps([Scripted::Reply {
        status: 500,
        body: String::new(),
    }]);
    let ctx = context(&script, 1);

    let err = RgmaService::new(&ctx).get_version().unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(
        err.message(),
        "https://rgma.example.org:8443/R-GMA/RGMAService/getVersion?: HTTP error 500 (Server Error)"
    );
}

#[test]
fn failed_context_reports_stored_error() {
    let ctx = ClientContext::failed(RgmaError::permanent("Environment variable RGMA_HOME is not set"));

    let err = RgmaService::new(&ctx).get_version().unwrap_err();
    assert_eq!(err.message(), "Environment variable RGMA_HOME is not set");
    assert!(ctx.address().is_err());
    assert!(ctx.pool_stats().is_err());
}

#[test]
fn exhausted_pool_refuses_calls() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let script = Script::steps([Scripted::Held {
        entered: entered_tx,
        release: release_rx,
        body: column_body(&["3.1.0"], false),
    }]);
    let ctx = context(&script, 1);

    thread::scope(|scope| {
        let holder = scope.spawn(|| RgmaService::new(&ctx).get_version());
        entered_rx.recv().unwrap();

        let err = RgmaService::new(&ctx).get_version().unwrap_err();
        assert!(err.is_temporary());
        assert_eq!(err.message(), POOL_EXHAUSTED_MESSAGE);
        assert_eq!(ctx.pool_stats().unwrap().in_use, 1);

        release_tx.send(()).unwrap();
        assert_eq!(holder.join().unwrap().unwrap(), "3.1.0");
    });
    assert_eq!(ctx.pool_stats().unwrap().in_use, 0);
    assert_eq!(script.requests().len(), 1);
}

#[test]
fn unknown_resource_outside_a_resource_is_temporary() {
    let script = Script::bodies(["<u/>"]);
    let ctx = context(&script, 1);

    let err = RgmaService::new(&ctx).list_tuple_stores().unwrap_err();
    assert!(err.is_temporary());
    assert_eq!(err.message(), "Unknown resource.");
}

#[test]
fn service_url_includes_prefix() {
    let script = Script::bodies(Vec::<String>::new());
    let caller = ServiceCaller::new(context(&script, 1), "RegistryServlet");
    assert_eq!(caller.service_url().unwrap(), "https://rgma.example.org:8443/R-GMA/RegistryServlet");
}
