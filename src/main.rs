// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! tagmod CLI - script-tag module graph demo
//!
//! Assembles the canonical sample page (a named module, an
//! exports-property module with a timer callback, and a `module.exports`
//! reassignment module) and runs it under a selectable identity mode.

use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;
use std::rc::Rc;
use tagmod_engine::{IdentityMode, Page, Runtime, RuntimeOptions, Value, VERSION};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "tagmod",
    about = "CommonJS-style modules for plain script tags",
    version = VERSION,
    author = "The tagmod Authors"
)]
struct Cli {
    /// Identity channel the demo page exposes
    #[arg(long, value_enum, default_value = "native")]
    identity: Identity,

    /// Report declared-but-unregistered modules distinctly
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Identity {
    /// Native currentScript hook
    Native,
    /// Stack-trace heuristic, Chrome trace layout
    Chrome,
    /// Stack-trace heuristic, Firefox trace layout
    Firefox,
    /// No identity channel at all (the engine refuses to start)
    None,
}

impl From<Identity> for IdentityMode {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Native => IdentityMode::CurrentScript,
            Identity::Chrome => IdentityMode::ChromeStack,
            Identity::Firefox => IdentityMode::FirefoxStack,
            Identity::None => IdentityMode::None,
        }
    }
}

/// The sample page from the test suite: three modules and a consumer script
fn build_demo_page(mode: IdentityMode) -> anyhow::Result<Page> {
    let mut page = Page::new("http://localhost:8080/test/index.html", mode)?;

    page.add_script("modules/test_module_1.js", Some("test_module_1"), |rt| {
        println!("Executing test_module_1.js");
        rt.exports()?.set("name", Value::from("Module 1"))?;
        Ok(())
    })?;

    page.add_script("modules/test_module_2.js", None, |rt| {
        println!("Executing test_module_2.js");
        let exports = rt.exports()?;
        exports.set("name", Value::from("Module 2"))?;
        let rt = rt.clone();
        exports.set(
            "callMe",
            Value::native_fn("callMe", move |args| {
                let callback = args.first().cloned().unwrap_or_default();
                rt.set_timeout(1000, move |_| {
                    println!("Module 2, timeout expired.");
                    callback.call(&[])?;
                    Ok(())
                });
                Ok(Value::Undefined)
            }),
        )?;
        Ok(())
    })?;

    page.add_script("modules/test_module_3.js", None, |rt| {
        println!("Executing test_module_3.js");
        let module = rt.module()?;
        let mod2 = module.require("./test_module_2.js")?;
        println!("Required module 2 looks like: {:#}", mod2.to_json());

        mod2.get("callMe").call(&[Value::native_fn("done", |_| {
            println!("Got callback from mod2.callMe");
            Ok(Value::Undefined)
        })])?;

        let exports = Value::object();
        exports.set("name", Value::from("Module 3"))?;
        exports.set(
            "callMe",
            Value::native_fn("callMe", |_| {
                println!("Module 3 callMe.");
                Ok(Value::Undefined)
            }),
        )?;
        module.set_exports(exports);
        Ok(())
    })?;

    page.add_script("basic.js", None, |rt| {
        let mod1 = rt.require("./modules/test_module_1.js")?;
        println!("require by relative path: {:#}", mod1.to_json());

        let by_name = rt.require("test_module_1")?;
        println!(
            "require by module name returns the same exports: {}",
            by_name == mod1
        );

        match rt.require("/test_module_1.js") {
            Err(error) => println!("require with absolute path rejected: {error}"),
            Ok(_) => {
                return Err(tagmod_engine::EngineError::Generic(
                    "absolute path require unexpectedly succeeded".to_string(),
                ))
            }
        }

        let mod3 = rt.require("./modules/test_module_3.js")?;
        println!("require of module.exports module: {:#}", mod3.to_json());
        mod3.get("callMe").call(&[])?;
        Ok(())
    })?;

    Ok(page)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tagmod=debug,tagmod_engine=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("tagmod=warn,tagmod_engine=warn")
            .init();
    }

    let page = Rc::new(build_demo_page(cli.identity.into())?);
    let options = RuntimeOptions {
        strict_missing: cli.strict,
    };
    let runtime = match Runtime::with_options(page.clone(), options) {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("{}: {}", "Error".red().bold(), error);
            std::process::exit(1);
        }
    };
    println!("identity strategy: {:?}\n", runtime.identity_strategy());

    let report = page.run(&runtime);
    let tasks = runtime.run_tasks();
    info!("page finished, {} deferred task(s) ran", tasks);

    println!();
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("{} {}", "ok".green(), outcome.src),
            Some(error) => println!("{} {} ({})", "FAILED".red().bold(), outcome.src, error),
        }
    }

    if !report.ok() {
        std::process::exit(1);
    }
    Ok(())
}
