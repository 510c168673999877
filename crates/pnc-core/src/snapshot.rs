//! Versioned, atomically published view of the installed routing plan.
//!
//! A single writer installs a new plan; readers grab an `Arc` to the current
//! snapshot at the start of a query and keep using it even if a newer plan is
//! published meanwhile.

use crate::models::RoutingResponse;
use crate::routing_index::RoutingIndex;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Immutable plan plus its derived index.
#[derive(Debug)]
pub struct RouteSnapshot {
    version: u64,
    installed_at: DateTime<Utc>,
    response: RoutingResponse,
    index: RoutingIndex,
}

impl RouteSnapshot {
    /// The startup snapshot: no plan installed.
    pub fn empty() -> Self {
        Self {
            version: 0,
            installed_at: Utc::now(),
            response: RoutingResponse::default(),
            index: RoutingIndex::default(),
        }
    }

    pub fn new(version: u64, response: RoutingResponse) -> Self {
        let index = RoutingIndex::build(&response);
        Self {
            version,
            installed_at: Utc::now(),
            response,
            index,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn installed_at(&self) -> DateTime<Utc> {
        self.installed_at
    }

    pub fn response(&self) -> &RoutingResponse {
        &self.response
    }

    pub fn index(&self) -> &RoutingIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Holder of the currently installed snapshot.
pub struct RoutePlanStore {
    current: RwLock<Arc<RouteSnapshot>>,
    version_counter: AtomicU64,
}

impl RoutePlanStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RouteSnapshot::empty())),
            version_counter: AtomicU64::new(1),
        }
    }

    /// Builds a snapshot for `response` and publishes it in one swap.
    pub fn install(&self, response: RoutingResponse) -> Arc<RouteSnapshot> {
        let version = self.version_counter.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(RouteSnapshot::new(version, response));

        let mut current = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = snapshot.clone();
        snapshot
    }

    /// The snapshot to run one query against.
    pub fn snapshot(&self) -> Arc<RouteSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for RoutePlanStore {
    fn default() -> Self {
        Self::new()
    }
}
