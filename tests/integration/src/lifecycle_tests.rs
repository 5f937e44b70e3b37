//! Lifecycle Tests - Generation and Connection Lifecycle
//!
//! Runs the reference manager against a live naming directory:
//! - Resolution at configuration load and publication per connection
//! - Names missing from the directory
//! - Unreachable directories and runtime start failures
//! - Deferred runtime shutdown while connections are still open
//! - Release logging

mod common;

use common::*;
use refmgr::orb::OrbRuntime;
use refmgr::{
    ConnectionPhase, GenerationState, RefError, ReferenceModule, ReleaseReport, RuntimeFactory,
};

/// Test: a bound name is cached, published, and released once
#[test]
fn test_registry_is_published_and_released() {
    init_logging();
    let directory = TestDirectory::start();
    let reference = directory.bind("fred", "Registry", 40123);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    ));
    assert_eq!(generation.state(), GenerationState::Serving);

    let cache = generation.cache("main").unwrap();
    assert_eq!(cache.aliases().collect::<Vec<_>>(), vec!["registry"]);
    assert_eq!(
        cache.get("registry").unwrap().as_str(),
        reference.to_stringified().unwrap()
    );

    let conn = generation.next_connection_id();
    let references = generation.process_connection("main", conn).unwrap();
    assert_eq!(references.phase(), ConnectionPhase::Ready);

    let proxy = references.get("registry").unwrap();
    assert_eq!(proxy.reference(), &reference);
    assert_eq!(proxy.endpoint(), "127.0.0.1:40123");
    assert_eq!(live_proxies(&generation), 1);

    let report = references.close();
    assert_eq!(report, ReleaseReport { released: 1, failed: 0 });
    assert_eq!(live_proxies(&generation), 0);

    generation.shutdown();
}

/// Test: a name absent from the directory is absent everywhere
#[test]
fn test_missing_name_is_omitted() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject context.Missing m\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    ));

    assert!(generation.cache("main").unwrap().get("m").is_none());

    let references = generation
        .process_connection("main", generation.next_connection_id())
        .unwrap();
    assert!(references.get("m").is_none());
    assert!(references.get("registry").is_some());
    assert_eq!(references.len(), 1);
}

/// Test: names without a context use the configured default context
#[test]
fn test_default_context() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Whois", 40125);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesDefaultContext fred\n\
         ReferencesObject Whois whois\n",
        directory.location()
    ));

    let references = generation
        .process_connection("main", generation.next_connection_id())
        .unwrap();
    assert_eq!(references.get("whois").unwrap().type_id(), "IDL:Whois:1.0");
}

/// Test: an unreachable directory degrades only its own server
#[test]
fn test_unreachable_directory_degrades_one_server() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);

    let dead_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n\
         <Server broken.example>\n\
             ReferencesEnable on\n\
             ReferencesDirectory 127.0.0.1:{}\n\
         </Server>\n",
        directory.location(),
        dead_port
    ));

    assert!(generation.cache("broken.example").unwrap().is_empty());
    assert_eq!(generation.cache("main").unwrap().len(), 1);

    let broken = generation
        .process_connection("broken.example", generation.next_connection_id())
        .unwrap();
    assert!(broken.is_empty());
}

/// Factory whose runtime never starts
struct BrokenFactory;

impl RuntimeFactory for BrokenFactory {
    type Runtime = OrbRuntime;

    fn init(&self) -> refmgr::Result<OrbRuntime> {
        Err(RefError::RuntimeInitFailed("no transport available".into()))
    }
}

/// Test: a runtime that cannot start aborts the generation
#[test]
fn test_runtime_init_failure_aborts_startup() {
    init_logging();
    let module = ReferenceModule::new(BrokenFactory);
    let result = module.post_config(&servers(
        "ReferencesEnable on\nReferencesObject fred.Registry registry\n",
    ));
    assert!(matches!(result, Err(RefError::RuntimeInitFailed(_))));
}

/// Test: the runtime outlives the generation while a connection is open
#[test]
fn test_shutdown_waits_for_open_connections() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    ));

    let references = generation
        .process_connection("main", generation.next_connection_id())
        .unwrap();
    let runtime = generation.runtime().unwrap().clone();
    generation.shutdown();

    // the open connection still holds a usable handle
    assert_eq!(references.get("registry").unwrap().endpoint(), "127.0.0.1:40123");
    assert_eq!(runtime.live_proxies(), 1);

    drop(references);
    assert_eq!(runtime.live_proxies(), 0);
    assert_eq!(runtime.holders(), 1);
}

/// Test: a reload builds a new generation from fresh directory contents
#[test]
fn test_new_generation_sees_new_bindings() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);
    let text = format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    );

    let module = ReferenceModule::new(test_factory());
    let first = module.post_config(&servers(&text)).unwrap();

    let moved = directory.bind("fred", "Registry", 40200);
    // the frozen cache keeps the old descriptor
    let old = first.process_connection("main", first.next_connection_id()).unwrap();
    assert_eq!(old.get("registry").unwrap().endpoint(), "127.0.0.1:40123");
    drop(old);
    first.shutdown();

    let second = module.post_config(&servers(&text)).unwrap();
    assert_eq!(second.id(), 2);
    let new = second.process_connection("main", second.next_connection_id()).unwrap();
    assert_eq!(new.get("registry").unwrap().reference(), &moved);
}

/// Test: the registry scenario logs its release exactly once
#[test]
fn test_registry_release_logged_once() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    ));

    let conn = generation.next_connection_id();
    let expected = format!(
        "reference with alias 'registry', belonging to connection {} was released",
        conn
    );

    let logs = CapturedLogs::new();
    logs.capture(|| {
        let references = generation.process_connection("main", conn).unwrap();
        assert!(references.contains("registry"));
        drop(references);
    });

    assert_eq!(logs.count(&expected), 1);
    assert_eq!(logs.count("failed to release"), 0);
}

/// Test: the last connection may end inside an async task after a reload
#[test]
fn test_last_holder_dropped_in_async_task() {
    init_logging();
    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);

    let generation = generation(&format!(
        "ReferencesEnable on\n\
         ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n",
        directory.location()
    ));

    let references = generation
        .process_connection("main", generation.next_connection_id())
        .unwrap();
    generation.shutdown();

    let host = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let logs = CapturedLogs::new();
    let report = logs.capture(|| host.block_on(async move { references.close() }));

    assert_eq!(report, ReleaseReport { released: 1, failed: 0 });
    assert_eq!(logs.count("global runtime released"), 1);
}
