use xxhash_rust::xxh3::xxh3_64;

const SEPARATOR: char = '\u{1f}';

/// Stable cache/dedup key for an (identity, content) pair.
///
/// xxh3-64 rendered as 16 lowercase hex characters. It is seed-free so keys
/// survive restarts and match rows already in the cache. Not collision
/// resistant: two distinct comments sharing a key would share a score.
pub fn fingerprint(identity: &str, content: &str) -> String {
    let mut key = String::with_capacity(identity.len() + content.len() + 1);
    key.push_str(identity);
    key.push(SEPARATOR);
    key.push_str(content);
    format!("{:016x}", xxh3_64(key.as_bytes()))
}
