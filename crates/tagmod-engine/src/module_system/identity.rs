// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Current-script identity resolution
//!
//! Everything ambient in the module system hangs off one question: which
//! script element is executing right now? Hosts answer it through one of
//! two channels, probed once at startup:
//!
//! - [`Strategy::NativeHook`]: the host exposes a `document.currentScript`
//!   style reference. Preferred whenever available.
//! - [`Strategy::StackHeuristic`]: throw-and-parse. The host synthesizes a
//!   textual stack trace whose last frame names the executing script; the
//!   URL is extracted and matched against the document's script elements.
//!
//! The stack layouts are host-specific text, so exactly two are supported:
//! Chrome's `" at <url>:<line>:<column>"` and Firefox's `"<fn>@<url>:<line>"`.

use crate::error::{EngineError, Result};
use crate::host::{ScriptHost, ScriptInfo};
use std::rc::Rc;
use tracing::{debug, trace};

/// How the executing script is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The host's native "currently executing script" reference
    NativeHook,
    /// Parse a synthesized stack trace and match it against script elements
    StackHeuristic,
}

/// Resolves the currently executing script through the strategy chosen at
/// startup
pub struct IdentityResolver {
    host: Rc<dyn ScriptHost>,
    strategy: Strategy,
}

impl IdentityResolver {
    /// Probe the host's capabilities and pick a strategy.
    ///
    /// The native hook wins if the host supports it; otherwise the host must
    /// at least produce stack traces. A host that exposes neither channel
    /// cannot participate at all.
    pub fn probe(host: Rc<dyn ScriptHost>) -> Result<Self> {
        let strategy = if host.supports_current_script() {
            Strategy::NativeHook
        } else if host.capture_stack().is_some() {
            Strategy::StackHeuristic
        } else {
            return Err(EngineError::unsupported_host(
                "host exposes neither a currentScript reference nor stack traces",
            ));
        };
        debug!("identity strategy: {:?}", strategy);
        Ok(Self { host, strategy })
    }

    /// The strategy selected by [`IdentityResolver::probe`]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Identify the currently executing script.
    ///
    /// Fails with [`EngineError::UnsupportedHost`] when no script is
    /// executing or the heuristic cannot match a script element.
    pub fn current_script(&self) -> Result<ScriptInfo> {
        match self.strategy {
            Strategy::NativeHook => self.host.current_script().ok_or_else(|| {
                EngineError::unsupported_host("no script is currently executing")
            }),
            Strategy::StackHeuristic => {
                let stack = self.host.capture_stack().ok_or_else(|| {
                    EngineError::unsupported_host("host stopped producing stack traces")
                })?;
                let url = parse_stack_url(&stack).ok_or_else(|| {
                    EngineError::unsupported_host("unrecognized stack trace layout")
                })?;
                trace!("stack heuristic extracted {}", url);
                // First matching script element in document order wins
                self.host
                    .scripts()
                    .into_iter()
                    .find(|script| script.src.as_str() == url)
                    .ok_or_else(|| {
                        EngineError::unsupported_host(format!(
                            "stack frame URL {url} matches no script element"
                        ))
                    })
            }
        }
    }
}

/// Extract the executing script's URL from the last frame of a stack trace.
///
/// Two layouts are recognized: Chrome frames introduced by `" at "` and
/// carrying a `:<line>:<column>` suffix, and Firefox frames of the form
/// `<fn>@<url>:<line>`. Returns `None` for any other shape.
pub fn parse_stack_url(stack: &str) -> Option<String> {
    if let Some(pos) = stack.rfind(" at ") {
        // Chrome: " at <url>:<line>:<column>"; strip the two trailing fields
        let tail = stack[pos + 4..].trim_end();
        let column = tail.rfind(':')?;
        let line = tail[..column].rfind(':')?;
        Some(tail[..line].to_string())
    } else if let Some(pos) = stack.rfind('@') {
        // Firefox: "<fn>@<url>:<line>"; strip the trailing line field
        let tail = stack[pos + 1..].trim_end();
        let line = tail.rfind(':')?;
        Some(tail[..line].to_string())
    } else {
        None
    }
}
