use cmesh_events::EventBus;
use cmesh_messaging::{MessageComposer, MessageFeed, MessageReader, MessagesFetched, MessagingError};
use cmesh_protocol::ProtocolManager;
use cmesh_registry::{KeyCache, Registry};
use cmesh_storage::Storage;
use std::time::Duration;
use tempfile::TempDir;

async fn mem_registry() -> Registry {
    Registry::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://")
}

async fn session(registry: &Registry, dir: &TempDir, user: &str) -> ProtocolManager {
    let storage = Storage::builder().root(dir.path()).connect().await.unwrap();
    ProtocolManager::builder()
        .session(user)
        .storage(storage)
        .registry(registry.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn own_messages_round_trip_through_the_store() {
    let registry = mem_registry().await;
    let dir = TempDir::new().unwrap();
    let manager = session(&registry, &dir, "amjad").await;
    manager.create_protocol().await.unwrap();

    let composer = MessageComposer::new(manager.clone(), registry.clone(), "amjad");
    let stored = composer.compose("meet at dawn").await.unwrap();
    assert_ne!(stored.content, "meet at dawn", "content must be stored encoded");

    let rows = registry.recent_messages(50).await.unwrap();
    assert_eq!(rows.len(), 1);

    let reader = MessageReader::new(manager);
    let resolved = reader.resolve(&rows[0]);
    assert!(resolved.is_decoded());
    assert_eq!(resolved.display_text(), "meet at dawn");
}

#[tokio::test]
async fn foreign_protocol_traffic_stays_encoded() {
    let registry = mem_registry().await;

    let alice_dir = TempDir::new().unwrap();
    let alice = session(&registry, &alice_dir, "alice").await;
    alice.create_protocol().await.unwrap();
    let alice_composer = MessageComposer::new(alice.clone(), registry.clone(), "alice");
    alice_composer.compose("for my circle only").await.unwrap();

    let bob_dir = TempDir::new().unwrap();
    let bob = session(&registry, &bob_dir, "bob").await;
    bob.create_protocol().await.unwrap();

    let rows = registry.recent_messages(50).await.unwrap();
    let reader = MessageReader::new(bob);
    let resolved = reader.resolve(&rows[0]);

    assert!(!resolved.is_decoded());
    assert_eq!(resolved.display_text(), rows[0].content);
}

#[tokio::test]
async fn admin_reader_decodes_every_protocol() {
    let registry = mem_registry().await;

    // Two users on two different protocols.
    for user in ["alice", "bob"] {
        let dir = TempDir::new().unwrap();
        let manager = session(&registry, &dir, user).await;
        manager.create_protocol().await.unwrap();
        let composer = MessageComposer::new(manager, registry.clone(), user);
        composer.compose(&format!("hello from {user}")).await.unwrap();
    }

    // The admin runs a protocol of their own plus the bulk cache.
    let admin_dir = TempDir::new().unwrap();
    let admin = session(&registry, &admin_dir, "amjad").await;
    admin.create_protocol().await.unwrap();

    let cache = KeyCache::new(registry.clone(), Duration::from_secs(60));
    cache.refresh().await.unwrap();

    let reader = MessageReader::with_cache(admin, cache);
    let rows = registry.recent_messages(50).await.unwrap();
    let resolved = reader.resolve_all(&rows);

    let texts: Vec<&str> = resolved.iter().map(|r| r.display_text()).collect();
    assert_eq!(texts, vec!["hello from alice", "hello from bob"]);
    assert!(resolved.iter().all(cmesh_messaging::Resolved::is_decoded));
}

#[tokio::test]
async fn blank_input_is_rejected_before_encoding() {
    let registry = mem_registry().await;
    let dir = TempDir::new().unwrap();
    let manager = session(&registry, &dir, "amjad").await;
    manager.create_protocol().await.unwrap();

    let composer = MessageComposer::new(manager, registry.clone(), "amjad");
    let err = composer.compose("   \n\t ").await.unwrap_err();
    assert!(matches!(err, MessagingError::EmptyMessage { .. }));

    assert!(registry.recent_messages(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn composing_without_a_protocol_is_rejected() {
    let registry = mem_registry().await;
    let dir = TempDir::new().unwrap();
    let manager = session(&registry, &dir, "amjad").await;

    let composer = MessageComposer::new(manager, registry, "amjad");
    let err = composer.compose("hello").await.unwrap_err();
    assert!(matches!(err, MessagingError::NoActiveProtocol { .. }));
}

#[tokio::test]
async fn replies_carry_the_parent_reference() {
    let registry = mem_registry().await;
    let dir = TempDir::new().unwrap();
    let manager = session(&registry, &dir, "amjad").await;
    manager.create_protocol().await.unwrap();

    let composer = MessageComposer::new(manager, registry.clone(), "amjad");
    composer.compose_reply("agreed", "msg-123").await.unwrap();

    let rows = registry.recent_messages(50).await.unwrap();
    assert_eq!(rows[0].reply_to.as_deref(), Some("msg-123"));
}

#[tokio::test]
async fn feed_publishes_pages_on_the_bus() {
    let registry = mem_registry().await;
    let dir = TempDir::new().unwrap();
    let manager = session(&registry, &dir, "amjad").await;
    manager.create_protocol().await.unwrap();

    let composer = MessageComposer::new(manager, registry.clone(), "amjad");
    composer.compose("first signal").await.unwrap();

    let bus = EventBus::new();
    let mut rx = bus.subscribe::<MessagesFetched>().unwrap();

    let handle = MessageFeed::new(registry, bus).page_size(10).spawn(Duration::from_millis(50));

    let page = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("a page within the timeout")
        .expect("bus stays open");
    assert_eq!(page.messages.len(), 1);

    handle.abort();
}
