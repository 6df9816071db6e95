/// Read-through caching around an async lookup that may find nothing.
///
/// Looks `$key` up in the cache and returns a hit as `Some`. On a miss,
/// awaits `$block` (an `AppResult<Option<T>>`). A found value is queued for a
/// background write with `$ttl` seconds; `None` is never cached, so an entry
/// added later is seen on the next lookup. Cache read failures are logged and
/// treated as misses.
///
/// `$cache` is an `Option<&Cache>`; `None` always runs the block.
///
/// # Example
/// ```rust,ignore
/// let place: Option<PlaceMetadata> = cached!(
///     self.cache.as_ref(),
///     CacheKey::PlaceMetadata(id),
///     3600,
///     self.directory.find_place(id)
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let key: $crate::db::CacheKey = $key;
        let hit = match cache {
            Some(cache) => match cache.get(&key).await {
                Ok(hit) => hit,
                Err(e) => {
                    ::tracing::warn!(error = %e, key = %key, "Cache read failed");
                    None
                }
            },
            None => None,
        };
        match hit {
            Some(value) => Ok(Some(value)),
            None => match $block.await {
                Ok(Some(value)) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(&key, &value, $ttl);
                    }
                    Ok(Some(value))
                }
                other => other,
            },
        }
    }};
}
