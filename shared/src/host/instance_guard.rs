use std::{
    collections::HashSet,
    sync::{Mutex, OnceLock},
};

use log::{info, warn};

use crate::constants::INSTANCE_TOKEN_PREFIX;

/// Process-wide exclusion token deciding which engine instance intercepts.
///
/// `try_acquire` is attempted once at engine construction and never retried.
pub trait SingleInstanceGuard {
    /// Returns true if this guard now owns the token
    fn try_acquire(&mut self) -> bool;

    fn release(&mut self);
}

/// Default token name, unique per process
pub fn instance_token_name() -> String {
    format!("{}{}", INSTANCE_TOKEN_PREFIX, std::process::id())
}

fn held_tokens() -> &'static Mutex<HashSet<String>> {
    static HELD: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    HELD.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Named token held in a process-wide registry. Released on drop.
pub struct ProcessInstanceGuard {
    name: String,
    owned: bool,
}

impl ProcessInstanceGuard {
    pub fn new() -> Self {
        Self::named(instance_token_name())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owned: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_owner(&self) -> bool {
        self.owned
    }
}

impl Default for ProcessInstanceGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleInstanceGuard for ProcessInstanceGuard {
    fn try_acquire(&mut self) -> bool {
        if self.owned {
            return true;
        }
        let Ok(mut held) = held_tokens().lock() else {
            warn!("Instance token registry poisoned, {} stays non-owner", self.name);
            return false;
        };
        self.owned = held.insert(self.name.clone());
        if self.owned {
            info!("Acquired instance token {}", self.name);
        } else {
            info!("Instance token {} already held, running as observer", self.name);
        }
        self.owned
    }

    fn release(&mut self) {
        if !self.owned {
            return;
        }
        if let Ok(mut held) = held_tokens().lock() {
            held.remove(&self.name);
        }
        self.owned = false;
    }
}

impl Drop for ProcessInstanceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
