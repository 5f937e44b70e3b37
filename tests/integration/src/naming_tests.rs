//! Naming Tests - Directory Server and Client over TCP
//!
//! Exercises the naming directory protocol end to end:
//! - bind, resolve, list and unbind from a remote client
//! - rebind semantics and conflict reporting
//! - many concurrent clients against one server

mod common;

use std::sync::Arc;

use common::*;
use naming::{Name, NamingClient, NamingError, NamingServer};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Barrier};

async fn start_server() -> (std::net::SocketAddr, Arc<NamingServer>, oneshot::Sender<()>) {
    let server = Arc::new(NamingServer::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let running = Arc::clone(&server);
    tokio::spawn(async move {
        running
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await
    });
    (addr, server, tx)
}

/// Test: a remote client manages bindings
#[tokio::test]
async fn test_remote_bind_resolve_unbind() {
    init_logging();
    let (addr, _server, _stop) = start_server().await;
    let client = NamingClient::connect(addr).await.unwrap();

    let name = Name::new("fred", "Registry").unwrap();
    let reference = test_reference("Registry", 40123);

    client.bind(&name, &reference).await.unwrap();
    assert_eq!(client.resolve(&name).await.unwrap(), reference);

    let listing = client.list("fred").await.unwrap();
    assert_eq!(listing, vec![("Registry".to_string(), reference.clone())]);

    client.unbind(&name).await.unwrap();
    assert!(matches!(client.resolve(&name).await, Err(NamingError::NotFound(_))));
    assert!(matches!(client.unbind(&name).await, Err(NamingError::NotFound(_))));
}

/// Test: bind refuses a taken name, rebind replaces it
#[tokio::test]
async fn test_bind_conflict_and_rebind() {
    init_logging();
    let (addr, server, _stop) = start_server().await;
    let client = NamingClient::connect(addr).await.unwrap();

    let name = Name::new("billing", "Invoice").unwrap();
    client.bind(&name, &test_reference("Invoice", 1)).await.unwrap();

    let result = client.bind(&name, &test_reference("Invoice", 2)).await;
    assert!(matches!(result, Err(NamingError::AlreadyBound(_))));

    client.rebind(&name, &test_reference("Invoice", 2)).await.unwrap();
    assert_eq!(client.resolve(&name).await.unwrap().port, 2);
    assert_eq!(server.registry().read().await.len(), 1);
}

/// Test: many clients resolve concurrently against one server
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_clients() {
    init_logging();
    const NUM_CLIENTS: usize = 32;
    const REQUESTS_PER_CLIENT: usize = 20;

    let (addr, server, _stop) = start_server().await;
    server
        .bind(Name::new("fred", "Registry").unwrap(), test_reference("Registry", 40123))
        .await
        .unwrap();

    let stats = Arc::new(ConcurrentStats::new());
    let barrier = Arc::new(Barrier::new(NUM_CLIENTS));
    let mut handles = Vec::new();

    for _ in 0..NUM_CLIENTS {
        let stats = Arc::clone(&stats);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let client = match NamingClient::connect(addr).await {
                Ok(client) => client,
                Err(_) => {
                    stats.record_failure();
                    return;
                }
            };
            let name = Name::new("fred", "Registry").unwrap();
            for _ in 0..REQUESTS_PER_CLIENT {
                match client.resolve(&name).await {
                    Ok(reference) if reference.port == 40123 => stats.record_success(),
                    _ => stats.record_failure(),
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(stats.successes(), NUM_CLIENTS * REQUESTS_PER_CLIENT);
    assert_eq!(stats.failures(), 0);
    assert_eq!(
        server
            .stats()
            .connections_accepted
            .load(std::sync::atomic::Ordering::Relaxed),
        NUM_CLIENTS as u64
    );
}
