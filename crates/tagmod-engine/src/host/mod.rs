// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Host environment abstraction
//!
//! The engine never talks to a document directly; everything it needs from
//! the host is behind the [`ScriptHost`] trait:
//!
//! - the document URL (base for relative resolution)
//! - the ordered list of script elements with their `src` and declared name
//! - an optional native "currently executing script" reference
//! - an optional synthesized textual stack trace
//!
//! [`Page`] is the in-memory host used by the tests and the demo binary.

mod page;

pub use page::{IdentityMode, Page, RunReport, ScriptOutcome};

use crate::error::Result;
use url::Url;

/// A script element as seen by the engine: canonical absolute source URL
/// plus the optional logical module name declared on the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInfo {
    /// Canonical absolute source URL of the script
    pub src: Url,
    /// Logical module name declared by the script element, if any
    pub name: Option<String>,
}

impl ScriptInfo {
    /// Create a script descriptor
    pub fn new(src: Url, name: Option<String>) -> Self {
        Self { src, name }
    }
}

/// Ambient facilities a host document exposes to the module engine
pub trait ScriptHost {
    /// URL of the document itself; the root for anonymous resolution
    fn document_url(&self) -> Url;

    /// Whether the host exposes a native "currently executing script" hook
    fn supports_current_script(&self) -> bool;

    /// The currently executing script, if the host can tell
    fn current_script(&self) -> Option<ScriptInfo>;

    /// A textual execution-stack trace, if the host can produce one
    fn capture_stack(&self) -> Option<String>;

    /// Every script element in document order
    fn scripts(&self) -> Vec<ScriptInfo>;

    /// Resolve an href attribute value against the document base URL
    fn resolve_href(&self, href: &str) -> Result<Url> {
        Ok(self.document_url().join(href)?)
    }
}
