// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pool of interpreter instances.
//!
//! Instances are keyed by availability, not by extension: any idle
//! instance can run any policy because every checkout starts from a reset
//! state over the shared base bindings.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use switchyard_script::{Globals, Interpreter};

pub struct InterpreterPool {
    base: Arc<Globals>,
    idle: Mutex<Vec<Interpreter>>,
    max_idle: usize,
    created: AtomicU64,
}

impl InterpreterPool {
    /// `max_idle` bounds how many instances are kept between calls; the
    /// number checked out at once is unbounded.
    pub fn new(base: Globals, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            base: Arc::new(base),
            idle: Mutex::new(Vec::new()),
            max_idle,
            created: AtomicU64::new(0),
        })
    }

    /// Take an idle instance or create a fresh one. The guard resets the
    /// instance and returns it when dropped.
    pub fn checkout(self: &Arc<Self>) -> PooledInterpreter {
        let reused = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let interp = reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            Interpreter::new(Arc::clone(&self.base))
        });
        PooledInterpreter {
            interp,
            pool: Arc::clone(self),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Total instances ever created.
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    fn give_back(&self, mut interp: Interpreter) {
        interp.reset();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(interp);
        }
    }
}

/// Exclusive use of one interpreter for the guard's lifetime.
pub struct PooledInterpreter {
    interp: Interpreter,
    pool: Arc<InterpreterPool>,
}

impl Deref for PooledInterpreter {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        &self.interp
    }
}

impl DerefMut for PooledInterpreter {
    fn deref_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }
}

impl Drop for PooledInterpreter {
    fn drop(&mut self) {
        // The placeholder holds no script state and is dropped with the guard.
        let placeholder = Interpreter::new(Arc::clone(&self.pool.base));
        let interp = std::mem::replace(&mut self.interp, placeholder);
        self.pool.give_back(interp);
    }
}
