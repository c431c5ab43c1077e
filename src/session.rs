//! Anonymous sessions.
//!
//! A session is a `user_…` token handed to the client. The server remembers
//! the last scan made under each token so a UI can re-render results
//! without rescanning. Sessions carry no credentials and are not persisted.
//!
//! The registry is bounded: once `max_sessions` tokens exist, the least
//! recently created one is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use crate::models::ScanResponse;

struct Inner {
    last_scans: HashMap<String, Option<ScanResponse>>,
    // Creation order, oldest first
    order: VecDeque<String>,
}

pub struct SessionRegistry {
    inner: RwLock<Inner>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                last_scans: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a new session and return its token.
    pub fn create(&self) -> String {
        let user_id = new_user_id();
        if let Ok(mut inner) = self.inner.write() {
            self.ensure_locked(&mut inner, &user_id);
        }
        user_id
    }

    /// Remember `scan` as the latest result for `user_id`.
    ///
    /// Unknown tokens are registered on first use, so clients may pick their
    /// own identifiers.
    pub fn record_scan(&self, user_id: &str, scan: ScanResponse) {
        let Ok(mut inner) = self.inner.write() else {
            return;
        };
        self.ensure_locked(&mut inner, user_id);
        inner.last_scans.insert(user_id.to_string(), Some(scan));
    }

    pub fn last_scan(&self, user_id: &str) -> Option<ScanResponse> {
        let inner = self.inner.read().ok()?;
        inner.last_scans.get(user_id).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.last_scans.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `user_id` if unknown, evicting the oldest sessions first.
    /// Every key of `last_scans` is also in `order`.
    fn ensure_locked(&self, inner: &mut Inner, user_id: &str) {
        if inner.last_scans.contains_key(user_id) {
            return;
        }
        while inner.order.len() >= self.max_sessions {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.last_scans.remove(&oldest);
                }
                None => break,
            }
        }
        inner.last_scans.insert(user_id.to_string(), None);
        inner.order.push_back(user_id.to_string());
    }
}

/// `user_` followed by 8 hex chars.
fn new_user_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("user_{}", &raw[..8])
}
