//! Process-wide compiler lifetime.
//!
//! glslang has to be initialised once per process and torn down after the
//! last user is done with it. Callers from the bridge may come and go on any
//! thread, so the state is a reference count guarded by a mutex.

use std::sync::Mutex;

static USERS: Mutex<usize> = Mutex::new(0);

fn with_users<T>(f: impl FnOnce(&mut usize) -> T) -> T {
    // A poisoned count is still a valid count.
    let mut guard = USERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

/// Registers a user. Returns `true` when this call performed the
/// process-wide initialisation.
pub fn initialize() -> bool {
    with_users(|users| {
        *users += 1;
        if *users == 1 {
            tracing::info!("shader compiler process initialised");
            true
        } else {
            tracing::debug!(users = *users, "shader compiler already initialised");
            false
        }
    })
}

/// Releases a user. The last release finalises the process state.
pub fn finalize() {
    with_users(|users| match *users {
        0 => tracing::warn!("finalize called without a matching initialize"),
        1 => {
            *users = 0;
            tracing::info!("shader compiler process finalised");
        }
        _ => {
            *users -= 1;
            tracing::debug!(users = *users, "shader compiler still in use");
        }
    })
}

pub fn is_initialized() -> bool {
    with_users(|users| *users > 0)
}

/// Holds one process registration for its lifetime.
#[derive(Debug)]
pub struct ProcessGuard {
    _private: (),
}

impl ProcessGuard {
    pub fn acquire() -> Self {
        initialize();
        Self { _private: () }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The counter is process-global; the lifecycle is exercised in a single
    // test so parallel tests cannot interleave.
    #[test]
    fn reference_counts_users() {
        let baseline = with_users(|users| *users);

        let first = ProcessGuard::acquire();
        assert!(is_initialized());
        let nested = initialize();
        assert!(!nested);
        finalize();
        assert!(is_initialized());
        drop(first);

        assert_eq!(with_users(|users| *users), baseline);
        if baseline == 0 {
            assert!(!is_initialized());
            finalize();
            assert_eq!(with_users(|users| *users), 0);
            assert!(initialize());
            finalize();
        }
    }
}
