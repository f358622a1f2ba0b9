// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Require identifier grammar and resolution
//!
//! An identifier is one of three things, decided purely by its text:
//!
//! 1. a leading `/` marks an absolute path, always rejected
//! 2. a recognized script extension marks a path, resolved against the
//!    caller's base URL
//! 3. anything else is a logical module name
//!
//! Path identifiers that resolve to no registered URL fall back to a name
//! lookup before failing, so the URL index always takes precedence when an
//! identifier could match either.

use crate::error::{EngineError, Result};
use crate::module_system::registry::ModuleRegistry;
use crate::value::Value;
use tracing::trace;
use url::Url;

/// File extensions that mark an identifier as a script path
pub const SCRIPT_EXTENSIONS: [&str; 3] = [".js", ".mjs", ".cjs"];

/// A classified require identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// Leading path separator; unsupported
    Absolute(&'a str),
    /// Script path, resolved against a base URL
    RelativePath(&'a str),
    /// Logical module name
    Name(&'a str),
}

/// True if the identifier ends in a recognized script extension
pub fn has_script_extension(id: &str) -> bool {
    SCRIPT_EXTENSIONS.iter().any(|ext| id.ends_with(ext))
}

/// Classify a require identifier
pub fn classify(id: &str) -> Identifier<'_> {
    if id.starts_with('/') {
        Identifier::Absolute(id)
    } else if has_script_extension(id) {
        Identifier::RelativePath(id)
    } else {
        Identifier::Name(id)
    }
}

/// Resolve `id` against `base` and return the target module's exports.
///
/// `base` is the requiring module's directory, or the document URL when the
/// caller is anonymous.
pub(crate) fn require_from(registry: &ModuleRegistry, base: &Url, id: &str) -> Result<Value> {
    trace!("require '{}' from {}", id, base);
    let module = match classify(id) {
        Identifier::Absolute(_) => {
            return Err(EngineError::UnsupportedPath(id.to_string()));
        }
        Identifier::RelativePath(path) => {
            let url = base.join(path)?;
            match registry.lookup_by_url(&url) {
                Some(module) => module,
                // URL precedence: only an unresolved path may match a name
                None => registry
                    .lookup_by_name(id)
                    .ok_or_else(|| missing(registry, Some(&url), id))?,
            }
        }
        Identifier::Name(name) => registry
            .lookup_by_name(name)
            .ok_or_else(|| missing(registry, None, id))?,
    };
    Ok(module.exports())
}

/// The error for a lookup miss. In strict mode a miss on a URL the document
/// declares means the script simply has not run yet.
fn missing(registry: &ModuleRegistry, url: Option<&Url>, id: &str) -> EngineError {
    if registry.strict_missing() {
        if let Some(url) = url {
            if registry.is_declared(url) {
                return EngineError::ModuleNotReady(id.to_string());
            }
        }
    }
    EngineError::module_not_found(id)
}
