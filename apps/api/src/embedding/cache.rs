//! Bounded LRU cache of text → embedding, with a TTL.
//!
//! Keyed by exact text. Mostly saves re-encoding the same job description across
//! batches; resumes rarely repeat.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::embedding::EmbeddingVector;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    vector: EmbeddingVector,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    ttl: Duration,
}

impl EmbeddingCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
            capacity,
            ttl,
        }
    }

    pub fn get(&self, text: &str) -> Option<EmbeddingVector> {
        let mut inner = self.inner.lock();

        let expired = inner.entries.get(text)?.inserted_at.elapsed() >= self.ttl;
        if expired {
            inner.entries.remove(text);
            inner.order.retain(|k| k != text);
            return None;
        }

        if let Some(pos) = inner.order.iter().position(|k| k == text) {
            if let Some(key) = inner.order.remove(pos) {
                inner.order.push_back(key);
            }
        }
        inner.entries.get(text).map(|e| e.vector.clone())
    }

    pub fn put(&self, text: String, vector: EmbeddingVector) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&text) {
            inner.order.retain(|k| k != &text);
        } else {
            while inner.entries.len() >= self.capacity {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        inner.order.push_back(text.clone());
        inner.entries.insert(
            text,
            CacheEntry {
                vector,
                inserted_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}
