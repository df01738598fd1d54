use cmesh_cipher::codec::{decode_with, encode};
use cmesh_domain::alphabet::ALPHABET;
use cmesh_domain::key::{CipherKey, KeyId, SubstitutionMap};
use cmesh_domain::message::EncodedMessage;
use cmesh_registry::{KeyCache, Registry, RegistryError};
use std::time::Duration;

async fn mem_registry() -> Registry {
    Registry::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://")
}

/// Key that maps 'a' to `target` (and `target`'s preimage to 'a').
fn key_mapping_a_to(id: &str, target: char) -> CipherKey {
    let mut outputs = *ALPHABET;
    let pos = ALPHABET.iter().position(|&c| c == target).unwrap();
    outputs.swap(0, pos);
    CipherKey::new(KeyId::parse(id).unwrap(), SubstitutionMap::new(outputs).unwrap())
}

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let registry = mem_registry().await;

    registry.health().await.expect("health check");
    registry.use_ns("test_ns").use_db("test_db").await.expect("session switch");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Registry::builder().init().await.unwrap_err();
    assert!(matches!(err, RegistryError::Validation { .. }));
}

#[tokio::test]
async fn create_then_find_round_trips() {
    let registry = mem_registry().await;
    let key = key_mapping_a_to("KEY-1234", 'x');

    registry.create(&key).await.unwrap();
    let found = registry.find_by_id(&key.id).await.unwrap();

    assert_eq!(found, key);
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let registry = mem_registry().await;
    let first = key_mapping_a_to("KEY-5555", 'x');
    let second = key_mapping_a_to("KEY-5555", 'z');

    registry.create(&first).await.unwrap();
    let err = registry.create(&second).await.unwrap_err();

    assert!(matches!(err, RegistryError::DuplicateKeyId { .. }));

    // The original record is untouched.
    let found = registry.find_by_id(&first.id).await.unwrap();
    assert_eq!(found.map, first.map);
}

#[tokio::test]
async fn unknown_id_reports_key_not_found() {
    let registry = mem_registry().await;

    let err = registry.find_by_id(&KeyId::parse("KEY-0000").unwrap()).await.unwrap_err();
    assert!(matches!(err, RegistryError::KeyNotFound { .. }));
}

#[tokio::test]
async fn list_all_returns_every_key() {
    let registry = mem_registry().await;
    let k1 = key_mapping_a_to("KEY-1111", 'x');
    let k2 = key_mapping_a_to("KEY-2222", 'z');

    registry.create(&k1).await.unwrap();
    registry.create(&k2).await.unwrap();

    let mut ids: Vec<String> =
        registry.list_all().await.unwrap().into_iter().map(|k| k.id.to_string()).collect();
    ids.sort();

    assert_eq!(ids, vec!["KEY-1111", "KEY-2222"]);
}

#[tokio::test]
async fn message_rows_round_trip_in_chronological_order() {
    let registry = mem_registry().await;
    let key = key_mapping_a_to("KEY-4242", 'x');
    registry.create(&key).await.unwrap();

    for (i, text) in ["first", "second", "third"].iter().enumerate() {
        let row = EncodedMessage {
            content: encode(text, &key),
            key_id: key.id.clone(),
            author: "amjad".to_owned(),
            reply_to: None,
            created_at: chrono::Utc::now() + chrono::Duration::milliseconds(i as i64),
        };
        registry.insert_message(&row).await.unwrap();
    }

    let rows = registry.recent_messages(50).await.unwrap();
    assert_eq!(rows.len(), 3);

    let inverse = key.map.invert();
    let texts: Vec<String> = rows.iter().map(|r| decode_with(&r.content, &inverse)).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn recent_messages_honors_the_limit() {
    let registry = mem_registry().await;
    let key = key_mapping_a_to("KEY-7777", 'q');
    registry.create(&key).await.unwrap();

    for i in 0..5 {
        let row = EncodedMessage {
            content: encode(&format!("message {i}"), &key),
            key_id: key.id.clone(),
            author: "amjad".to_owned(),
            reply_to: None,
            created_at: chrono::Utc::now() + chrono::Duration::milliseconds(i),
        };
        registry.insert_message(&row).await.unwrap();
    }

    let rows = registry.recent_messages(2).await.unwrap();
    assert_eq!(rows.len(), 2);

    // The newest two, oldest of the pair first.
    let inverse = key.map.invert();
    assert_eq!(decode_with(&rows[0].content, &inverse), "message 3");
    assert_eq!(decode_with(&rows[1].content, &inverse), "message 4");
}

#[tokio::test]
async fn profile_last_key_pointer_round_trips() {
    let registry = mem_registry().await;
    let key = key_mapping_a_to("KEY-9001", 'm');

    assert_eq!(registry.last_key("amjad").await.unwrap(), None);

    registry.record_last_key("amjad", &key.id).await.unwrap();
    assert_eq!(registry.last_key("amjad").await.unwrap(), Some(key.id.clone()));

    // Switching protocols overwrites the pointer.
    let other = key_mapping_a_to("KEY-9002", 'n');
    registry.record_last_key("amjad", &other.id).await.unwrap();
    assert_eq!(registry.last_key("amjad").await.unwrap(), Some(other.id));
}

#[tokio::test]
async fn admin_cache_decodes_per_message_keys() {
    let registry = mem_registry().await;

    // k1 maps a->x, k2 maps a->z.
    let k1 = key_mapping_a_to("KEY-1001", 'x');
    let k2 = key_mapping_a_to("KEY-1002", 'z');
    registry.create(&k1).await.unwrap();
    registry.create(&k2).await.unwrap();

    let cache = KeyCache::new(registry.clone(), Duration::from_secs(60));
    let refreshed = cache.refresh().await.unwrap();
    assert_eq!(refreshed, 2);

    // Each ciphertext resolves through its own key, not the admin's active one.
    let inv1 = cache.inverse_for(&k1.id).unwrap();
    let inv2 = cache.inverse_for(&k2.id).unwrap();
    assert_eq!(decode_with("x", &inv1), "a");
    assert_eq!(decode_with("z", &inv2), "a");
    assert_ne!(decode_with("z", &inv1), "a");
}

#[tokio::test]
async fn cache_misses_are_not_errors() {
    let registry = mem_registry().await;
    let cache = KeyCache::new(registry, Duration::from_secs(60));

    assert!(cache.inverse_for(&KeyId::parse("KEY-0000").unwrap()).is_none());
}

#[tokio::test]
async fn cache_insert_makes_a_key_visible_before_the_next_poll() {
    let registry = mem_registry().await;
    let cache = KeyCache::new(registry.clone(), Duration::from_secs(60));

    let key = key_mapping_a_to("KEY-3003", 'k');
    registry.create(&key).await.unwrap();
    cache.insert(&key);

    let inverse = cache.inverse_for(&key.id).unwrap();
    assert_eq!(decode_with("k", &inverse), "a");
}
