//! Registry of respawn hooks shared by the coordinator, sessions and host.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use super::{RespawnHook, RespawnRequest};

/// Handle returned by [`HookRegistry::register`], used to remove the hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Shared, mutable set of respawn hooks.
///
/// Clones share the same set. Hooks are kept sorted by priority; hooks with
/// equal priority run in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    hooks: RwLock<Vec<(HookId, Arc<dyn RespawnHook>)>>,
    next_id: AtomicU64,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: Arc<dyn RespawnHook>) -> HookId {
        let id = HookId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut hooks = self
            .inner
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let position = hooks.partition_point(|(_, existing)| existing.priority() <= hook.priority());
        trace!("Registered respawn hook {} as {:?}", hook.name(), id);
        hooks.insert(position, (id, hook));
        id
    }

    /// Remove a hook. Returns `false` if it was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self
            .inner
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let before = hooks.len();
        hooks.retain(|(registered, _)| *registered != id);
        hooks.len() != before
    }

    /// Run every hook against `request`.
    ///
    /// Hooks are called on a snapshot, outside the lock, so a hook may
    /// register or unregister hooks without deadlocking.
    pub fn dispatch_respawn(&self, request: &mut RespawnRequest) {
        let snapshot: Vec<Arc<dyn RespawnHook>> = self
            .inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        for hook in snapshot {
            hook.on_respawn(request);
            trace!("Respawn hook {} ran for {}", hook.name(), request.player());
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_core::{Location, PlayerId};

    struct MoveTo {
        priority: i32,
        x: f64,
    }

    impl RespawnHook for MoveTo {
        fn name(&self) -> &'static str {
            "move-to"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn on_respawn(&self, request: &mut RespawnRequest) {
            request.set_location(Location::new("world", self.x, 0.0, 0.0));
        }
    }

    #[test]
    fn test_hooks_run_in_priority_order() {
        let registry = HookRegistry::new();
        registry.register(Arc::new(MoveTo { priority: 10, x: 2.0 }));
        registry.register(Arc::new(MoveTo { priority: -5, x: 1.0 }));

        let mut request = RespawnRequest::new(PlayerId::new_random(), None);
        registry.dispatch_respawn(&mut request);

        // The higher priority value runs last and wins.
        assert_eq!(request.location().map(|l| l.x), Some(2.0));
    }

    #[test]
    fn test_unregister() {
        let registry = HookRegistry::new();
        let id = registry.register(Arc::new(MoveTo { priority: 0, x: 1.0 }));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());

        let mut request = RespawnRequest::new(PlayerId::new_random(), None);
        registry.dispatch_respawn(&mut request);
        assert!(request.into_location().is_none());
    }
}
