// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! In-memory host document
//!
//! [`Page`] stands in for a browser document: a base URL, an ordered list of
//! script tags, and a record of which script is executing right now. Script
//! bodies are Rust closures run in document order by [`Page::run`]; the
//! selected [`IdentityMode`] controls which ambient identity channels the
//! page exposes, so every current-script strategy can be exercised against
//! the same content.

use crate::error::{EngineError, Result};
use crate::host::{ScriptHost, ScriptInfo};
use crate::runtime::Runtime;
use std::cell::Cell;
use std::fmt;
use tracing::debug;
use url::Url;

/// Which identity channels the page exposes to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Native `document.currentScript`-style hook
    CurrentScript,
    /// No native hook; stack traces in Chrome layout (`" at <url>:<line>:<col>"`)
    ChromeStack,
    /// No native hook; stack traces in Firefox layout (`"<fn>@<url>:<line>"`)
    FirefoxStack,
    /// Neither channel; the engine must refuse to start
    None,
}

type ScriptBody = Box<dyn Fn(&Runtime) -> Result<()>>;

struct PageScript {
    info: ScriptInfo,
    body: ScriptBody,
}

/// An in-memory document hosting script-tag modules
pub struct Page {
    base: Url,
    mode: IdentityMode,
    scripts: Vec<PageScript>,
    executing: Cell<Option<usize>>,
}

impl Page {
    /// Create an empty page with the given document URL
    pub fn new(document_url: &str, mode: IdentityMode) -> Result<Self> {
        Ok(Self {
            base: Url::parse(document_url)?,
            mode,
            scripts: Vec::new(),
            executing: Cell::new(None),
        })
    }

    /// Append a script tag. `src` is resolved against the document URL the
    /// way a browser canonicalizes the element's `src` property; `name` is
    /// the declared logical module name attribute.
    pub fn add_script<F>(&mut self, src: &str, name: Option<&str>, body: F) -> Result<()>
    where
        F: Fn(&Runtime) -> Result<()> + 'static,
    {
        let src = self.base.join(src)?;
        self.scripts.push(PageScript {
            info: ScriptInfo::new(src, name.map(str::to_string)),
            body: Box::new(body),
        });
        Ok(())
    }

    /// Execute every script body in document order.
    ///
    /// A failing script does not stop the page; its error is recorded in the
    /// returned [`RunReport`] and the remaining scripts still run, matching
    /// how a browser keeps loading after one script throws.
    pub fn run(&self, runtime: &Runtime) -> RunReport {
        let mut outcomes = Vec::with_capacity(self.scripts.len());
        for (index, script) in self.scripts.iter().enumerate() {
            self.executing.set(Some(index));
            let result = (script.body)(runtime);
            self.executing.set(None);
            if let Err(error) = &result {
                debug!("script {} failed: {}", script.info.src, error);
            }
            outcomes.push(ScriptOutcome {
                src: script.info.src.clone(),
                error: result.err(),
            });
        }
        RunReport { outcomes }
    }

    /// The URL a fabricated stack trace uses for loader-internal frames.
    /// It never matches a script element, so a trace that ends in an
    /// internal frame resolves to no script at all.
    fn loader_url(&self) -> Url {
        self.base
            .join("tagmod.js")
            .unwrap_or_else(|_| self.base.clone())
    }
}

impl ScriptHost for Page {
    fn document_url(&self) -> Url {
        self.base.clone()
    }

    fn supports_current_script(&self) -> bool {
        self.mode == IdentityMode::CurrentScript
    }

    fn current_script(&self) -> Option<ScriptInfo> {
        if self.mode != IdentityMode::CurrentScript {
            return None;
        }
        self.executing
            .get()
            .map(|index| self.scripts[index].info.clone())
    }

    fn capture_stack(&self) -> Option<String> {
        let loader = self.loader_url();
        match self.mode {
            IdentityMode::ChromeStack => {
                let mut stack = format!(
                    "Error\n    at currentScript ({loader}:27:13)\n    at Object.get exports ({loader}:64:20)"
                );
                if let Some(index) = self.executing.get() {
                    let src = &self.scripts[index].info.src;
                    stack.push_str(&format!("\n    at {src}:3:1"));
                }
                Some(stack)
            }
            IdentityMode::FirefoxStack => {
                let mut stack = format!("currentScript@{loader}:27\nget@{loader}:64");
                if let Some(index) = self.executing.get() {
                    let src = &self.scripts[index].info.src;
                    stack.push_str(&format!("\n@{src}:3"));
                }
                Some(stack)
            }
            IdentityMode::CurrentScript | IdentityMode::None => None,
        }
    }

    fn scripts(&self) -> Vec<ScriptInfo> {
        self.scripts.iter().map(|s| s.info.clone()).collect()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("base", &self.base.as_str())
            .field("mode", &self.mode)
            .field("scripts", &self.scripts.len())
            .finish()
    }
}

/// Outcome of one script body
#[derive(Debug)]
pub struct ScriptOutcome {
    /// The script's canonical source URL
    pub src: Url,
    /// The error the body returned, if it failed
    pub error: Option<EngineError>,
}

/// Per-script outcomes of a full page run
#[derive(Debug)]
pub struct RunReport {
    /// One outcome per script, in document order
    pub outcomes: Vec<ScriptOutcome>,
}

impl RunReport {
    /// True if every script finished without an error
    pub fn ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    /// The scripts that failed, in document order
    pub fn failures(&self) -> impl Iterator<Item = &ScriptOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}
