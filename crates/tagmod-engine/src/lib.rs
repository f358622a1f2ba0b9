// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! # tagmod-engine
//!
//! A CommonJS-style module graph for plain script-tag hosts: no bundler,
//! no build step. Each script publishes an API through `exports` /
//! `module.exports` and consumes other scripts through `require`, addressed
//! either by logical name or by a path relative to the requiring module.
//!
//! The core problem is ambient identity: which script is executing right
//! now? Hosts answer through a native `currentScript`-style hook when they
//! have one, or through a stack-trace heuristic when they don't; the
//! strategy is probed once at startup.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use tagmod_engine::{IdentityMode, Page, Runtime, Value};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut page = Page::new("http://localhost:8080/", IdentityMode::CurrentScript)?;
//!     page.add_script("modules/greeter.js", Some("greeter"), |rt| {
//!         rt.exports()?.set("greeting", Value::from("hello"))?;
//!         Ok(())
//!     })?;
//!     page.add_script("app.js", None, |rt| {
//!         let greeter = rt.require("greeter")?;
//!         println!("{}", greeter.get("greeting"));
//!         Ok(())
//!     })?;
//!
//!     let page = Rc::new(page);
//!     let runtime = Runtime::new(page.clone())?;
//!     page.run(&runtime);
//!     runtime.run_tasks();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod host;
pub mod module_system;
pub mod runtime;
pub mod value;

// Re-exports
pub use error::{EngineError, Result};
pub use host::{IdentityMode, Page, RunReport, ScriptHost, ScriptInfo, ScriptOutcome};
pub use module_system::{IdentityResolver, Module, ModuleRegistry, Strategy};
pub use runtime::{Runtime, RuntimeOptions, TaskId};
pub use value::Value;

/// Version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
