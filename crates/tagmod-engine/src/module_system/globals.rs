// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! The ambient `exports` / `module` / `require` surface
//!
//! Each accessor resolves the current script fresh on every call; only the
//! underlying module is cached. The first touch from a script materializes
//! and registers its module, so repeated reads compose onto one exports
//! object.

use crate::error::Result;
use crate::host::ScriptHost;
use crate::module_system::identity::IdentityResolver;
use crate::module_system::registry::{Module, ModuleRegistry};
use crate::module_system::resolver;
use crate::value::Value;
use std::rc::Rc;

pub(crate) struct Globals {
    host: Rc<dyn ScriptHost>,
    registry: ModuleRegistry,
    identity: IdentityResolver,
}

impl Globals {
    pub(crate) fn new(
        host: Rc<dyn ScriptHost>,
        registry: ModuleRegistry,
        identity: IdentityResolver,
    ) -> Self {
        Self {
            host,
            registry,
            identity,
        }
    }

    pub(crate) fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Resolve the executing script and get-or-create its module
    fn current_module(&self) -> Result<Rc<Module>> {
        let script = self.identity.current_script()?;
        Ok(self
            .registry
            .get_or_create(script.src, script.name.as_deref()))
    }

    /// The `exports` binding: the current module's exports object
    pub(crate) fn exports(&self) -> Result<Value> {
        Ok(self.current_module()?.exports())
    }

    /// The `module` binding: the current module entity
    pub(crate) fn module(&self) -> Result<Rc<Module>> {
        self.current_module()
    }

    /// The global `require` binding.
    ///
    /// Relative identifiers anchor on the requiring module's directory. A
    /// current script that never registered a module is anonymous and
    /// anchors on the document URL. When no script identity is available
    /// at all (a deferred continuation, for instance) resolution degrades
    /// to the legacy document-rooted variant.
    pub(crate) fn require(&self, id: &str) -> Result<Value> {
        let base = match self.identity.current_script() {
            Ok(script) => match self.registry.lookup_by_url(&script.src) {
                Some(module) => module.directory().clone(),
                None => self.host.document_url(),
            },
            Err(_) => return self.require_legacy(id),
        };
        resolver::require_from(&self.registry, &base, id)
    }

    /// Degraded require for callers with no determinable module: path
    /// identifiers resolve against the document URL only
    pub(crate) fn require_legacy(&self, id: &str) -> Result<Value> {
        resolver::require_from(&self.registry, &self.host.document_url(), id)
    }
}
