// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Module entities and the dual-indexed registry
//!
//! One [`Module`] exists per canonical URL and per non-empty logical name,
//! created lazily on first touch and cached for the life of the process.
//! The registry owns every module; everyone else holds `Rc` references to
//! a module or clones of its exports handle, never the maps themselves.

use crate::error::{EngineError, Result};
use crate::module_system::resolver;
use crate::value::Value;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};
use url::Url;

/// A unit of script code: one canonical URL, an optional logical name, and
/// the exports object it publishes
pub struct Module {
    url: Url,
    name: Option<String>,
    directory: Url,
    exports: RefCell<Value>,
    registry: Weak<RefCell<RegistryState>>,
}

impl Module {
    /// Canonical absolute URL of the module's script
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Logical name the script declared, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// URL of the directory containing the module's script.
    ///
    /// Fixed at creation time, so requires issued by this module resolve
    /// relative to it no matter which caller triggered them.
    pub fn directory(&self) -> &Url {
        &self.directory
    }

    /// The module's exports object. Clones of the returned handle share
    /// contents, so property writes are visible to every holder.
    pub fn exports(&self) -> Value {
        self.exports.borrow().clone()
    }

    /// Wholesale reassignment of the exports object (`module.exports = ...`)
    pub fn set_exports(&self, value: Value) {
        *self.exports.borrow_mut() = value;
    }

    /// Require another module, resolving relative identifiers against this
    /// module's own directory
    pub fn require(&self, id: &str) -> Result<Value> {
        let inner = self.registry.upgrade().ok_or_else(|| {
            EngineError::Generic("module registry has been torn down".to_string())
        })?;
        resolver::require_from(&ModuleRegistry { inner }, &self.directory, id)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("url", &self.url.as_str())
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    by_url: FxHashMap<Url, Rc<Module>>,
    by_name: FxHashMap<String, Rc<Module>>,
    declared: FxHashSet<Url>,
    strict_missing: bool,
}

/// Dual-indexed, add-only store of every module in the document.
///
/// Cloning yields another handle to the same registry; the store itself
/// lives until the process ends.
#[derive(Clone)]
pub struct ModuleRegistry {
    inner: Rc<RefCell<RegistryState>>,
}

impl ModuleRegistry {
    /// Create an empty registry. With `strict_missing` set, a lookup miss
    /// for a URL the document declares reports [`EngineError::ModuleNotReady`]
    /// instead of [`EngineError::ModuleNotFound`].
    pub fn new(strict_missing: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryState {
                strict_missing,
                ..RegistryState::default()
            })),
        }
    }

    /// Return the module for `url`, or create and register it.
    ///
    /// An existing entry by URL wins regardless of the passed name; failing
    /// that, an existing entry by name is returned. A new module is always
    /// indexed by URL and additionally by name when one is declared.
    pub fn get_or_create(&self, url: Url, name: Option<&str>) -> Rc<Module> {
        let name = name.filter(|n| !n.is_empty());
        let mut state = self.inner.borrow_mut();

        if let Some(module) = state.by_url.get(&url) {
            trace!("found module by URL: {}", url);
            return module.clone();
        }
        if let Some(name) = name {
            if let Some(module) = state.by_name.get(name) {
                trace!("found module by name: {}", name);
                return module.clone();
            }
        }

        let directory = url.join(".").unwrap_or_else(|_| url.clone());
        let module = Rc::new(Module {
            url: url.clone(),
            name: name.map(str::to_string),
            directory,
            exports: RefCell::new(Value::object()),
            registry: Rc::downgrade(&self.inner),
        });
        debug!("new module {} (name: {:?})", url, name);
        if let Some(name) = name {
            state.by_name.insert(name.to_string(), module.clone());
        }
        state.by_url.insert(url, module.clone());
        module
    }

    /// Look up a module by canonical URL
    pub fn lookup_by_url(&self, url: &Url) -> Option<Rc<Module>> {
        self.inner.borrow().by_url.get(url).cloned()
    }

    /// Look up a module by logical name
    pub fn lookup_by_name(&self, name: &str) -> Option<Rc<Module>> {
        self.inner.borrow().by_name.get(name).cloned()
    }

    /// Record that the document carries a script element for `url`
    pub fn declare_script(&self, url: Url) {
        self.inner.borrow_mut().declared.insert(url);
    }

    /// Whether the document carries a script element for `url`
    pub fn is_declared(&self, url: &Url) -> bool {
        self.inner.borrow().declared.contains(url)
    }

    /// Whether declared-but-unregistered misses report `ModuleNotReady`
    pub fn strict_missing(&self) -> bool {
        self.inner.borrow().strict_missing
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.inner.borrow().by_url.len()
    }

    /// True if no module has registered yet
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().by_url.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ModuleRegistry")
            .field("modules", &state.by_url.len())
            .field("names", &state.by_name.len())
            .field("strict_missing", &state.strict_missing)
            .finish()
    }
}
