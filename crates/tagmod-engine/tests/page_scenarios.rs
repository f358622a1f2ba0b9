//! Full-page module graph scenarios
//!
//! Each test assembles an in-memory page, runs its scripts in document
//! order, and checks the observable module graph: the canonical sample
//! page from the demo (a named module, an exports-property module with a
//! timer callback, and a `module.exports` reassignment module) plus the
//! identity, ordering, and strict-mode properties.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tagmod_engine::{
    EngineError, IdentityMode, Page, Runtime, RuntimeOptions, Strategy, Value,
};

const DOC_URL: &str = "http://localhost:8080/test/index.html";

/// The three sample modules shared by most scenarios
fn sample_page(mode: IdentityMode) -> Page {
    let mut page = Page::new(DOC_URL, mode).unwrap();

    // Unnamed-by-URL module that also declares a logical name
    page.add_script("modules/test_module_1.js", Some("test_module_1"), |rt| {
        rt.exports()?.set("name", Value::from("Module 1"))?;
        Ok(())
    })
    .unwrap();

    // Publishes through property writes on the `exports` binding; its
    // callMe delivers the callback through a timer
    page.add_script("modules/test_module_2.js", None, |rt| {
        let exports = rt.exports()?;
        exports.set("name", Value::from("Module 2"))?;
        let rt = rt.clone();
        exports.set(
            "callMe",
            Value::native_fn("callMe", move |args| {
                let callback = args.first().cloned().unwrap_or_default();
                rt.set_timeout(1000, move |_| {
                    callback.call(&[])?;
                    Ok(())
                });
                Ok(Value::Undefined)
            }),
        )?;
        Ok(())
    })
    .unwrap();

    // Publishes through wholesale `module.exports` reassignment
    page.add_script("modules/test_module_3.js", None, |rt| {
        let module = rt.module()?;
        module.require("./test_module_2.js")?;
        let exports = Value::object();
        exports.set("name", Value::from("Module 3"))?;
        exports.set(
            "callMe",
            Value::native_fn("callMe", |_| Ok(Value::from("Module 3 called"))),
        )?;
        module.set_exports(exports);
        Ok(())
    })
    .unwrap();

    page
}

fn run(page: Page) -> (Rc<Page>, Runtime, tagmod_engine::RunReport) {
    let page = Rc::new(page);
    let runtime = Runtime::new(page.clone()).unwrap();
    let report = page.run(&runtime);
    (page, runtime, report)
}

#[test]
fn test_require_using_relative_path() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    let got = Rc::new(RefCell::new(Value::Undefined));
    let sink = got.clone();
    page.add_script("basic.js", None, move |rt| {
        *sink.borrow_mut() = rt.require("./modules/test_module_1.js")?;
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(report.ok());
    assert_eq!(got.borrow().get("name"), Value::from("Module 1"));
}

#[test]
fn test_require_using_module_name_returns_identical_exports() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    page.add_script("basic.js", None, |rt| {
        let by_path = rt.require("./modules/test_module_1.js")?;
        let by_name = rt.require("test_module_1")?;
        // The very same exports object, not an equal copy
        assert_eq!(by_path, by_name);
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(report.ok());
}

#[test]
fn test_require_with_absolute_path_fails() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    page.add_script("basic.js", None, |rt| {
        rt.require("/test_module_1.js")?;
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(!report.ok());
    let outcome = report.outcomes.last().unwrap();
    let error = outcome.error.as_ref().unwrap();
    assert!(matches!(error, EngineError::UnsupportedPath(_)));
    assert_eq!(
        error.to_string(),
        "Absolute paths are not supported by require. Use relative path or module name."
    );
}

#[test]
fn test_module_exports_reassignment() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    let got = Rc::new(RefCell::new(Value::Undefined));
    let sink = got.clone();
    page.add_script("basic.js", None, move |rt| {
        *sink.borrow_mut() = rt.require("./modules/test_module_3.js")?;
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(report.ok());
    let exports = got.borrow().clone();
    assert_eq!(exports.get("name"), Value::from("Module 3"));
    assert_eq!(
        exports.get("callMe").call(&[]).unwrap(),
        Value::from("Module 3 called")
    );
    // Exactly the reassigned object, nothing left from the original
    let json = exports.to_json();
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn test_exports_module_delivers_timer_callback() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    let called = Rc::new(Cell::new(false));
    let flag = called.clone();
    page.add_script("basic.js", None, move |rt| {
        let mod2 = rt.require("./modules/test_module_2.js")?;
        let flag = flag.clone();
        mod2.get("callMe").call(&[Value::native_fn("done", move |_| {
            flag.set(true);
            Ok(Value::Undefined)
        })])?;
        Ok(())
    })
    .unwrap();

    let (_page, runtime, report) = run(page);
    assert!(report.ok());
    // The callback only fires once the deferred tasks drain
    assert!(!called.get());
    assert!(runtime.run_tasks() >= 1);
    assert!(called.get());
    assert_eq!(runtime.now(), 1000);
}

#[test]
fn test_relative_resolution_anchored_on_declaring_module() {
    let mut page = Page::new(DOC_URL, IdentityMode::CurrentScript).unwrap();
    page.add_script("nested/c.js", None, |rt| {
        rt.exports()?.set("where", Value::from("nested/c"))?;
        Ok(())
    })
    .unwrap();
    page.add_script("nested/b.js", None, |rt| {
        let module = rt.module()?;
        // Resolves against this module's directory, not its caller's
        let c = module.require("./c.js")?;
        module.exports().set("c", c)?;
        Ok(())
    })
    .unwrap();
    let got = Rc::new(RefCell::new(Value::Undefined));
    let sink = got.clone();
    page.add_script("a.js", None, move |rt| {
        *sink.borrow_mut() = rt.require("./nested/b.js")?;
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(report.ok());
    assert_eq!(
        got.borrow().get("c").get("where"),
        Value::from("nested/c")
    );
}

#[test]
fn test_missing_modules_fail_with_module_not_found() {
    let page = Rc::new(Page::new(DOC_URL, IdentityMode::CurrentScript).unwrap());
    let runtime = Runtime::new(page).unwrap();

    let err = runtime.require("no_such_module").unwrap_err();
    assert!(matches!(err, EngineError::ModuleNotFound(_)));
    assert_eq!(err.to_string(), "Cannot find module 'no_such_module'");

    let err = runtime.require("./no/such/module.js").unwrap_err();
    assert!(matches!(err, EngineError::ModuleNotFound(_)));
}

#[test]
fn test_accessor_touches_return_the_same_module() {
    let mut page = Page::new(DOC_URL, IdentityMode::CurrentScript).unwrap();
    page.add_script("mod.js", Some("mod"), |rt| {
        let first = rt.module()?;
        first.exports().set("a", Value::from(1.0))?;
        rt.exports()?.set("b", Value::from(2.0))?;
        let second = rt.module()?;
        assert!(Rc::ptr_eq(&first, &second));
        // Both writes landed on the one exports object
        assert_eq!(second.exports().get("a"), Value::from(1.0));
        assert_eq!(second.exports().get("b"), Value::from(2.0));
        Ok(())
    })
    .unwrap();

    let (_page, _runtime, report) = run(page);
    assert!(report.ok());
}

#[test]
fn test_identity_strategies_build_the_same_graph() {
    let snapshot = |mode: IdentityMode| {
        let mut page = sample_page(mode);
        let got = Rc::new(RefCell::new(serde_json::Value::Null));
        let sink = got.clone();
        page.add_script("basic.js", None, move |rt| {
            let mod1 = rt.require("test_module_1")?;
            let mod2 = rt.require("./modules/test_module_2.js")?;
            let mod3 = rt.require("./modules/test_module_3.js")?;
            *sink.borrow_mut() = serde_json::json!([
                mod1.to_json(),
                mod2.to_json(),
                mod3.to_json()
            ]);
            Ok(())
        })
        .unwrap();

        let (_page, runtime, report) = run(page);
        assert!(report.ok(), "page failed under {mode:?}");
        (runtime.identity_strategy(), got.borrow().clone())
    };

    let (native_strategy, native) = snapshot(IdentityMode::CurrentScript);
    let (chrome_strategy, chrome) = snapshot(IdentityMode::ChromeStack);
    let (firefox_strategy, firefox) = snapshot(IdentityMode::FirefoxStack);

    assert_eq!(native_strategy, Strategy::NativeHook);
    assert_eq!(chrome_strategy, Strategy::StackHeuristic);
    assert_eq!(firefox_strategy, Strategy::StackHeuristic);
    assert_eq!(native, chrome);
    assert_eq!(native, firefox);
}

#[test]
fn test_host_without_identity_channel_is_rejected() {
    let page = Rc::new(sample_page(IdentityMode::None));
    let err = Runtime::new(page).unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedHost(_)));
}

#[test]
fn test_deferred_continuation_requires_through_legacy_fallback() {
    let mut page = sample_page(IdentityMode::CurrentScript);
    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = results.clone();
    page.add_script("basic.js", None, move |rt| {
        let sink = sink.clone();
        rt.defer(move |rt| {
            // No current script here: accessors fail outright
            assert!(matches!(
                rt.exports().unwrap_err(),
                EngineError::UnsupportedHost(_)
            ));
            // Bare names and document-rooted paths still resolve
            sink.borrow_mut().push(rt.require("test_module_1")?);
            sink.borrow_mut()
                .push(rt.require("./modules/test_module_2.js")?);
            Ok(())
        });
        Ok(())
    })
    .unwrap();

    let (_page, runtime, report) = run(page);
    assert!(report.ok());
    assert_eq!(runtime.run_tasks(), 1);
    let results = results.borrow();
    assert_eq!(results[0].get("name"), Value::from("Module 1"));
    assert_eq!(results[1].get("name"), Value::from("Module 2"));
}

#[test]
fn test_strict_mode_reports_declared_but_unregistered_scripts() {
    let build = |strict: bool| {
        let mut page = Page::new(DOC_URL, IdentityMode::CurrentScript).unwrap();
        // Runs without ever touching the accessors, so it never registers
        page.add_script("ghost.js", None, |_| Ok(())).unwrap();
        let page = Rc::new(page);
        let options = RuntimeOptions {
            strict_missing: strict,
        };
        let runtime = Runtime::with_options(page.clone(), options).unwrap();
        page.run(&runtime);
        runtime
    };

    let err = build(true).require("./ghost.js").unwrap_err();
    assert!(matches!(err, EngineError::ModuleNotReady(_)));
    assert_eq!(
        err.to_string(),
        "Module './ghost.js' is declared by the document but has not been registered yet"
    );

    let err = build(false).require("./ghost.js").unwrap_err();
    assert!(matches!(err, EngineError::ModuleNotFound(_)));
}

#[test]
fn test_premature_require_fails_but_later_scripts_proceed() {
    let mut page = Page::new(DOC_URL, IdentityMode::CurrentScript).unwrap();
    page.add_script("eager.js", None, |rt| {
        // The target script has not run yet; no waiting, just a miss
        rt.require("late")?;
        Ok(())
    })
    .unwrap();
    page.add_script("late.js", Some("late"), |rt| {
        rt.exports()?.set("ready", Value::from(true))?;
        Ok(())
    })
    .unwrap();

    let (_page, runtime, report) = run(page);
    assert!(!report.ok());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].src.as_str().ends_with("eager.js"));
    // The late module registered fine afterwards
    assert_eq!(
        runtime.require("late").unwrap().get("ready"),
        Value::from(true)
    );
}
