use serde::{Deserialize, Serialize};

use tracing_callwrap::cache::{Cache, MemoryStore};

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    id: u64,
    name: String,
    tags: Vec<String>,
}

/// Example of the cache facade over the in-process store. With the
/// `redis` feature, `Cache::connect("localhost", 6379, 0)` gives the same
/// API over a Redis server.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cache = Cache::new(MemoryStore::new())?;

    let profile = Profile {
        id: 7,
        name: "Ada".into(),
        tags: vec!["admin".into(), "beta".into()],
    };
    cache.set("profile:7", &profile, Some(300))?;

    println!("raw value: {:?}", cache.get("profile:7")?);
    println!("typed value: {:?}", cache.get_as::<Profile>("profile:7")?);

    cache.delete("profile:7")?;
    println!("after delete: {:?}", cache.get("profile:7")?);
    Ok(())
}
