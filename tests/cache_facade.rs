use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use tracing_callwrap::cache::{Cache, MemoryStore};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    items: Vec<String>,
}

#[test]
fn typed_values_roundtrip() {
    let cache = Cache::new(MemoryStore::new()).unwrap();
    let order = Order {
        id: 12,
        items: vec!["tea".into(), "scone".into()],
    };
    cache.set("order:12", &order, None).unwrap();

    assert_eq!(cache.get_as::<Order>("order:12").unwrap(), Some(order));
    assert_eq!(
        cache.get("order:12").unwrap(),
        Some(json!({"id": 12, "items": ["tea", "scone"]}))
    );
}

#[test]
fn entries_expire_after_their_ttl() {
    let cache = Cache::new(MemoryStore::new()).unwrap();
    cache.set("short", &1, Some(1)).unwrap();
    cache.set("long", &2, None).unwrap();
    assert_eq!(cache.get("short").unwrap(), Some(json!(1)));

    thread::sleep(Duration::from_millis(1100));
    assert_eq!(cache.get("short").unwrap(), None);
    assert_eq!(cache.get("long").unwrap(), Some(json!(2)));
}

#[test]
fn overwrite_replaces_previous_value() {
    let cache = Cache::new(MemoryStore::new()).unwrap();
    cache.set("k", "old", None).unwrap();
    cache.set("k", &vec![1, 2], None).unwrap();
    assert_eq!(cache.get("k").unwrap(), Some(json!([1, 2])));
}
