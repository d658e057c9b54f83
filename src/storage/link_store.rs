use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};
use url::Url;

use super::models::{FetchOutcome, LinkRecord};
use super::token::{ThreadRngSource, TokenSource, generate_token};
use crate::errors::{DecaylinkError, Result};

/// In-memory token → [`LinkRecord`] mapping.
///
/// Every operation goes through one `RwLock`. Only [`dump`](Self::dump) and
/// [`len`](Self::len) take it shared; everything that can change the mapping,
/// fetch included, takes it exclusively.
pub struct LinkStore {
    entries: RwLock<HashMap<String, LinkRecord>>,
    token_source: Arc<dyn TokenSource>,
}

impl Default for LinkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStore {
    pub fn new() -> Self {
        Self::with_token_source(Arc::new(ThreadRngSource))
    }

    pub fn with_token_source(token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            token_source,
        }
    }

    /// Store `url` under a freshly drawn token of `token_bytes` random bytes.
    ///
    /// A draw that lands on a live token fails with
    /// [`DecaylinkError::Collision`] and leaves the store untouched; retrying
    /// is up to the caller.
    pub fn submit(
        &self,
        url: Url,
        token_bytes: usize,
        expires_at: Option<DateTime<Utc>>,
        uses: u32,
    ) -> Result<String> {
        // 在加锁之前生成，避免在锁内等待随机数
        let token = generate_token(self.token_source.as_ref(), token_bytes)?;

        let mut entries = self.entries.write();
        if entries.contains_key(&token) {
            debug!("Token collision on {}", token);
            return Err(DecaylinkError::collision(format!(
                "token {} is already in use",
                token
            )));
        }

        entries.insert(token.clone(), LinkRecord::new(url, expires_at, uses));
        trace!("Stored token {} ({} live)", token, entries.len());
        Ok(token)
    }

    /// Resolve `token`, spending one use if the record is use-limited.
    ///
    /// Returns `None` for unknown tokens. The record in the outcome is the
    /// post-decrement view, and stays available to the caller even when this
    /// fetch evicted it.
    pub fn fetch(&self, token: &str) -> Option<FetchOutcome> {
        let mut entries = self.entries.write();
        let record = entries.get_mut(token)?;

        match record.remaining_uses {
            0 => Some(FetchOutcome {
                record: record.clone(),
                was_last_use: false,
            }),
            1 => entries.remove(token).map(|record| FetchOutcome {
                record,
                was_last_use: true,
            }),
            _ => {
                record.remaining_uses -= 1;
                Some(FetchOutcome {
                    record: record.clone(),
                    was_last_use: false,
                })
            }
        }
    }

    /// Remove every record whose expiry has passed, reporting each one to
    /// `on_expire` first. Returns how many were removed.
    pub fn reap<F>(&self, on_expire: F) -> usize
    where
        F: FnMut(&str, &LinkRecord),
    {
        self.reap_at(Utc::now(), on_expire)
    }

    /// [`reap`](Self::reap) against an explicit clock reading.
    pub fn reap_at<F>(&self, now: DateTime<Utc>, mut on_expire: F) -> usize
    where
        F: FnMut(&str, &LinkRecord),
    {
        let mut entries = self.entries.write();
        let before = entries.len();

        entries.retain(|token, record| {
            if record.is_expired_at(now) {
                on_expire(token, record);
                false
            } else {
                true
            }
        });

        before - entries.len()
    }

    /// Write the whole mapping to `sink` as indented JSON, tokens sorted.
    pub fn dump<W: Write>(&self, mut sink: W) -> Result<()> {
        let entries = self.entries.read();
        let ordered: BTreeMap<&str, &LinkRecord> =
            entries.iter().map(|(k, v)| (k.as_str(), v)).collect();

        serde_json::to_writer_pretty(&mut sink, &ordered).map_err(|e| {
            DecaylinkError::serialization(format!("Failed to dump link store: {}", e))
        })?;
        sink.write_all(b"\n")?;
        Ok(())
    }

    /// Replace the whole mapping with the one encoded in `source`.
    ///
    /// The input is decoded into a fresh map before the lock is taken, so a
    /// malformed document leaves the current mapping as it was. Returns the
    /// number of records now held.
    pub fn import<R: Read>(&self, source: R) -> Result<usize> {
        let fresh: HashMap<String, LinkRecord> = serde_json::from_reader(source).map_err(|e| {
            if e.is_io() {
                DecaylinkError::file_operation(format!("Failed to read link snapshot: {}", e))
            } else {
                DecaylinkError::deserialization(format!("Malformed link snapshot: {}", e))
            }
        })?;

        let count = fresh.len();
        *self.entries.write() = fresh;
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use parking_lot::Mutex;

    /// Hands out pre-recorded byte patterns, then fails.
    struct ScriptedSource(Mutex<Vec<u8>>);

    impl ScriptedSource {
        fn new(fills: &[u8]) -> Arc<Self> {
            let mut fills = fills.to_vec();
            fills.reverse();
            Arc::new(Self(Mutex::new(fills)))
        }
    }

    impl TokenSource for ScriptedSource {
        fn fill(&self, buf: &mut [u8]) -> Result<()> {
            match self.0.lock().pop() {
                Some(b) => {
                    buf.fill(b);
                    Ok(())
                }
                None => Err(DecaylinkError::generation("source exhausted")),
            }
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_collision_does_not_overwrite() {
        let store = LinkStore::with_token_source(ScriptedSource::new(&[1, 1]));
        let token = store
            .submit(url("https://example.com/first"), 3, None, 0)
            .unwrap();

        let err = store
            .submit(url("https://example.com/second"), 3, None, 0)
            .unwrap_err();
        assert!(matches!(err, DecaylinkError::Collision(_)));

        let outcome = store.fetch(&token).unwrap();
        assert_eq!(outcome.record.url.as_str(), "https://example.com/first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_generation_failure_leaves_store_empty() {
        let store = LinkStore::with_token_source(ScriptedSource::new(&[]));
        let err = store
            .submit(url("https://example.com"), 3, None, 0)
            .unwrap_err();
        assert!(matches!(err, DecaylinkError::Generation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_token_reusable_after_use_decay() {
        let store = LinkStore::with_token_source(ScriptedSource::new(&[9, 9]));
        let first = store.submit(url("https://a.example"), 3, None, 1).unwrap();
        assert!(store.fetch(&first).unwrap().was_last_use);

        let second = store.submit(url("https://b.example"), 3, None, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            store.fetch(&second).unwrap().record.url.as_str(),
            "https://b.example/"
        );
    }

    #[test]
    fn test_fetch_decrements_in_place() {
        let store = LinkStore::new();
        let token = store.submit(url("https://example.com"), 6, None, 3).unwrap();

        let first = store.fetch(&token).unwrap();
        assert_eq!(first.record.remaining_uses, 2);
        assert!(!first.was_last_use);

        let second = store.fetch(&token).unwrap();
        assert_eq!(second.record.remaining_uses, 1);

        let third = store.fetch(&token).unwrap();
        assert!(third.was_last_use);
        assert_eq!(third.record.remaining_uses, 1);

        assert!(store.fetch(&token).is_none());
    }

    #[test]
    fn test_fetch_ignores_expiry() {
        let store = LinkStore::new();
        let past = Utc::now() - Duration::hours(1);
        let token = store
            .submit(url("https://example.com"), 6, Some(past), 0)
            .unwrap();
        assert!(store.fetch(&token).is_some());

        assert_eq!(store.reap(|_, _| {}), 1);
        assert!(store.fetch(&token).is_none());
    }

    #[test]
    fn test_reap_at_reports_each_removed_record() {
        let store = LinkStore::new();
        let now = Utc::now();
        store
            .submit(url("https://old.example"), 6, Some(now - Duration::seconds(1)), 5)
            .unwrap();
        store
            .submit(url("https://new.example"), 6, Some(now + Duration::hours(1)), 0)
            .unwrap();
        store.submit(url("https://forever.example"), 6, None, 0).unwrap();

        let mut seen = Vec::new();
        let removed = store.reap_at(now, |token, record| {
            seen.push((token.to_string(), record.url.to_string()));
        });

        assert_eq!(removed, 1);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "https://old.example/");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_dump_is_sorted_and_stable() {
        let store = LinkStore::with_token_source(ScriptedSource::new(&[0xff, 0x00]));
        store.submit(url("https://z.example"), 3, None, 0).unwrap();
        store.submit(url("https://a.example"), 3, None, 2).unwrap();

        let mut first = Vec::new();
        store.dump(&mut first).unwrap();
        let mut second = Vec::new();
        store.dump(&mut second).unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(text.find("\"AAAA\"").unwrap() < text.find("\"____\"").unwrap());
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_malformed_import_keeps_current_mapping() {
        let store = LinkStore::new();
        let token = store.submit(url("https://keep.example"), 6, None, 0).unwrap();

        let truncated = br#"{"abcd": {"url": "https://x.example", "expires": null, "uses": 0}, "ef"#;
        let err = store.import(&truncated[..]).unwrap_err();
        assert!(matches!(err, DecaylinkError::Deserialization(_)));

        assert_eq!(store.len(), 1);
        assert!(store.fetch(&token).is_some());
    }

    #[test]
    fn test_import_replaces_wholesale() {
        let store = LinkStore::new();
        let old = store.submit(url("https://old.example"), 6, None, 0).unwrap();

        let doc = br#"{"fresh": {"url": "https://fresh.example", "expires": null, "uses": 1}}"#;
        assert_eq!(store.import(&doc[..]).unwrap(), 1);

        assert!(store.fetch(&old).is_none());
        let outcome = store.fetch("fresh").unwrap();
        assert!(outcome.was_last_use);
    }
}
