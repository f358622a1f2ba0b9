// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Engine runtime
//!
//! [`Runtime`] wires the pieces together: it probes the host's identity
//! capabilities once at startup, owns the process-wide module registry, and
//! exposes the ambient `exports` / `module` / `require` surface that script
//! bodies call at well-defined points. It also carries the deferred-task
//! scheduler for asynchronous continuations.

mod scheduler;

pub use scheduler::{Scheduler, TaskId};

use crate::error::Result;
use crate::host::ScriptHost;
use crate::module_system::{Globals, IdentityResolver, Module, ModuleRegistry, Strategy};
use crate::value::Value;
use std::rc::Rc;

/// Runtime construction options
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Report `ModuleNotReady` instead of `ModuleNotFound` when a required
    /// URL is declared by the document but its script has not registered
    pub strict_missing: bool,
}

struct RuntimeInner {
    host: Rc<dyn ScriptHost>,
    registry: ModuleRegistry,
    globals: Globals,
    scheduler: Scheduler,
}

/// A handle to the module engine for one host document.
///
/// Cloning is cheap and yields a handle to the same engine; script bodies
/// and deferred tasks receive one so they can reach the ambient surface.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with default options
    pub fn new(host: Rc<dyn ScriptHost>) -> Result<Self> {
        Self::with_options(host, RuntimeOptions::default())
    }

    /// Create a runtime.
    ///
    /// Probes the host's identity channels and fails with
    /// [`crate::EngineError::UnsupportedHost`] when neither is available.
    /// Every script URL the document carries is declared to the registry
    /// up front.
    pub fn with_options(host: Rc<dyn ScriptHost>, options: RuntimeOptions) -> Result<Self> {
        let identity = IdentityResolver::probe(host.clone())?;
        let registry = ModuleRegistry::new(options.strict_missing);
        for script in host.scripts() {
            registry.declare_script(script.src);
        }
        let globals = Globals::new(host.clone(), registry.clone(), identity);
        Ok(Self {
            inner: Rc::new(RuntimeInner {
                host,
                registry,
                globals,
                scheduler: Scheduler::new(),
            }),
        })
    }

    /// The host document this runtime serves
    pub fn host(&self) -> &dyn ScriptHost {
        self.inner.host.as_ref()
    }

    /// The module registry
    pub fn registry(&self) -> &ModuleRegistry {
        &self.inner.registry
    }

    /// Which identity strategy the startup probe selected
    pub fn identity_strategy(&self) -> Strategy {
        self.inner.globals.identity().strategy()
    }

    /// The `exports` binding: the executing script's exports object,
    /// materializing and registering its module on first touch
    pub fn exports(&self) -> Result<Value> {
        self.inner.globals.exports()
    }

    /// The `module` binding: the executing script's module entity
    pub fn module(&self) -> Result<Rc<Module>> {
        self.inner.globals.module()
    }

    /// The global `require` binding, anchored on the executing script
    pub fn require(&self, id: &str) -> Result<Value> {
        self.inner.globals.require(id)
    }

    /// Schedule a continuation to run on the next task drain
    pub fn defer<F>(&self, task: F) -> TaskId
    where
        F: FnOnce(&Runtime) -> Result<()> + 'static,
    {
        self.set_timeout(0, task)
    }

    /// Schedule a continuation `delay_ms` of virtual time from now
    pub fn set_timeout<F>(&self, delay_ms: u64, task: F) -> TaskId
    where
        F: FnOnce(&Runtime) -> Result<()> + 'static,
    {
        self.inner.scheduler.schedule(delay_ms, task)
    }

    /// Drain scheduled continuations. They run with no current script, so
    /// ambient accessors fail and `require` degrades to document-rooted
    /// resolution. Returns the number of tasks run.
    pub fn run_tasks(&self) -> usize {
        self.inner.scheduler.run(self)
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.inner.scheduler.now()
    }

    /// Number of continuations waiting to run
    pub fn pending_tasks(&self) -> usize {
        self.inner.scheduler.pending()
    }
}
