use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Watches {
    /// watched user -> watchers
    watchers: HashMap<String, HashSet<String>>,
    /// watcher -> watched users
    watching: HashMap<String, HashSet<String>>,
}

/// Who wants to hear about whose online status.
#[derive(Default)]
pub struct PresenceWatchers {
    inner: Mutex<Watches>,
}

impl PresenceWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&self, watcher: &str, targets: &[String]) {
        let mut inner = self.inner.lock();
        for target in targets.iter().filter(|t| t.as_str() != watcher) {
            inner
                .watchers
                .entry(target.clone())
                .or_default()
                .insert(watcher.to_string());
            inner
                .watching
                .entry(watcher.to_string())
                .or_default()
                .insert(target.clone());
        }
    }

    pub fn unwatch(&self, watcher: &str, targets: &[String]) {
        let mut inner = self.inner.lock();
        for target in targets {
            Self::unlink(&mut inner, watcher, target);
        }
    }

    /// Drop every watch held by `watcher`
    pub fn drop_watcher(&self, watcher: &str) {
        let mut inner = self.inner.lock();
        let targets = inner.watching.remove(watcher).unwrap_or_default();
        for target in targets {
            if let Some(set) = inner.watchers.get_mut(&target) {
                set.remove(watcher);
                if set.is_empty() {
                    inner.watchers.remove(&target);
                }
            }
        }
    }

    fn unlink(inner: &mut Watches, watcher: &str, target: &str) {
        if let Some(set) = inner.watchers.get_mut(target) {
            set.remove(watcher);
            if set.is_empty() {
                inner.watchers.remove(target);
            }
        }
        if let Some(set) = inner.watching.get_mut(watcher) {
            set.remove(target);
            if set.is_empty() {
                inner.watching.remove(watcher);
            }
        }
    }

    pub fn watchers_of(&self, target: &str) -> Vec<String> {
        self.inner
            .lock()
            .watchers
            .get(target)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn watching(&self, watcher: &str) -> Vec<String> {
        self.inner
            .lock()
            .watching
            .get(watcher)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
