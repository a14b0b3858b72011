use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Tracks which users currently have an export running.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the export slot for `user_id`, or `None` while one is running.
    pub fn try_acquire(&self, user_id: &str) -> Option<ExportPermit> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(user_id.to_string()) {
            return None;
        }
        Some(ExportPermit {
            user_id: user_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// Releases the user's slot when dropped, whether the export succeeded or not.
#[derive(Debug)]
pub struct ExportPermit {
    user_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_export_per_user() {
        let guard = ExportGuard::new();
        let permit = guard.try_acquire("alice").unwrap();
        assert!(guard.try_acquire("alice").is_none());
        assert!(guard.try_acquire("bob").is_some());
        drop(permit);
        assert!(guard.try_acquire("alice").is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = ExportGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire("alice").unwrap();
        assert!(other.try_acquire("alice").is_none());
    }
}
