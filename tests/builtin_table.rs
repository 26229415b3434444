//! Behavior of the built-in shim table.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use shimreg::core::helpers::ShimHelper;
use shimreg::{
    Action, DispatchEngine, HostPlatform, OptInSet, ReleaseChannel, ResourceType, RuntimeContext,
    ShimRegistry,
};

const MOCHITEST_URL: &str =
    "https://example.com/browser/browser/extensions/webcompat/tests/browser/shims_test.js";
const MOCHITEST_3_URL: &str =
    "https://example.com/browser/browser/extensions/webcompat/tests/browser/shims_test_3.js";

fn engine() -> DispatchEngine {
    let report = ShimRegistry::builtin().unwrap();
    assert!(report.is_clean());
    DispatchEngine::new(Arc::new(report.registry))
}

fn desktop() -> RuntimeContext {
    RuntimeContext::new(HostPlatform::Desktop, ReleaseChannel::Release)
}

fn opted_in(ids: &[&str]) -> Arc<BTreeSet<String>> {
    Arc::new(ids.iter().map(|s| s.to_string()).collect())
}

#[test]
fn test_adnexus_serves_when_blocked() {
    let engine = engine();
    let ctx = desktop().with_etp_blocked(true);

    assert_eq!(
        engine.dispatch("https://acdn.adnxs.com/ast/ast.js", ResourceType::Script, &ctx),
        Some(Action::Serve {
            shim: "AdNexus".to_string(),
            resource: "empty-script.js".to_string(),
            resource_type: ResourceType::Script,
        })
    );

    let prebid = engine
        .dispatch("https://ib.adnxs.com/v3/pb.js", ResourceType::Script, &ctx)
        .unwrap();
    assert!(matches!(prebid, Action::Serve { ref resource, .. } if resource == "adnexus-prebid.js"));
}

#[test]
fn test_adnexus_needs_etp_block() {
    let engine = engine();
    assert_eq!(
        engine.dispatch(
            "https://acdn.adnxs.com/ast/ast.js",
            ResourceType::Script,
            &desktop()
        ),
        None
    );
}

#[test]
fn test_type_restricted_entry_ignores_other_types() {
    let engine = engine();
    let ctx = desktop().with_etp_blocked(true);
    assert_eq!(
        engine.dispatch("https://ib.adnxs.com/v3/pb.js", ResourceType::Image, &ctx),
        None
    );
}

#[test]
fn test_doubleclick_entries_are_tried_in_order() {
    let engine = engine();
    let ctx = desktop().with_etp_blocked(true);

    let action = engine
        .dispatch(
            "https://pubads.g.doubleclick.net/gampad/ads?sz=640x480&output=xml_vmap1",
            ResourceType::Xmlhttprequest,
            &ctx,
        )
        .unwrap();
    assert!(matches!(action, Action::Serve { ref resource, .. } if resource == "vmad.xml"));

    let action = engine
        .dispatch(
            "https://pubads.g.doubleclick.net/gampad/ads?sz=640x480",
            ResourceType::Image,
            &ctx,
        )
        .unwrap();
    assert!(matches!(action, Action::Serve { ref resource, .. } if resource == "vast3.xml"));
}

#[test]
fn test_mochitest_shim_injects_with_helpers() {
    let engine = engine();
    let action = engine
        .dispatch(MOCHITEST_URL, ResourceType::Script, &desktop())
        .unwrap();

    assert_eq!(
        action,
        Action::Inject {
            shim: "MochitestShim".to_string(),
            script: "mochitest-shim-1.js".to_string(),
            helpers: [ShimHelper::GetOptions, ShimHelper::OptIn].into_iter().collect(),
        }
    );
}

#[test]
fn test_host_gates() {
    let engine = engine();

    // MochitestShim3 excludes example.com, MochitestShim4 only runs on example.net
    let on_example_com = desktop().with_host("example.com");
    assert_eq!(
        engine.dispatch(MOCHITEST_3_URL, ResourceType::Script, &on_example_com),
        None
    );

    let on_example_net = desktop().with_host("example.net");
    let hits = engine.dispatch_all(MOCHITEST_3_URL, ResourceType::Script, &on_example_net);
    let ids: Vec<_> = hits.iter().map(|h| h.shim.id.as_str()).collect();
    assert_eq!(ids, vec!["MochitestShim3", "MochitestShim4"]);
    assert_eq!(hits[0].action.shim(), "MochitestShim3");
}

#[test]
fn test_dispatch_is_deterministic() {
    let engine = engine();
    let ctx = desktop().with_etp_blocked(true);
    let url = "https://securepubads.g.doubleclick.net/tag/js/gpt.js";

    let first = engine.dispatch(url, ResourceType::Script, &ctx);
    assert!(first.is_some());
    for _ in 0..10 {
        assert_eq!(engine.dispatch(url, ResourceType::Script, &ctx), first);
    }
}

#[test]
fn test_unblock_only_after_opt_in() {
    let engine = engine();
    let registry = engine.registry();
    let url = "https://trackertest.org/tracker.js";

    let opt_ins = OptInSet::new();
    assert!(!engine.unblock_check(url, &desktop().with_opted_in(opt_ins.snapshot())));

    opt_ins.opt_in(registry, "MochitestShim").unwrap();
    assert!(engine.unblock_check(url, &desktop().with_opted_in(opt_ins.snapshot())));

    // The disabled twin lists the same URL but never unblocks
    assert!(!engine.unblock_check(url, &desktop().with_opted_in(opted_in(&["MochitestShim2"]))));

    assert!(opt_ins.opt_in(registry, "NoSuchShim").is_err());
}

#[test]
fn test_facebook_sdk_is_nightly_android_only() {
    let engine = engine();
    let url = "https://connect.facebook.net/en_US/sdk.js";

    let mut ctx = desktop().with_etp_blocked(true);
    assert_eq!(engine.dispatch(url, ResourceType::Script, &ctx), None);

    ctx.platform = HostPlatform::Android;
    ctx.channel = ReleaseChannel::Nightly;
    let action = engine.dispatch(url, ResourceType::Script, &ctx).unwrap();
    assert!(matches!(action, Action::Inject { ref script, .. } if script == "facebook-sdk.js"));

    let ctx = ctx.with_opted_in(opted_in(&["FacebookSDK"]));
    assert!(engine.unblock_check("https://static.xx.fbcdn.net/rsrc.php/v3/x.js", &ctx));
    assert!(engine.unblock_check("https://www.facebook.com/rsrc.php/v3/y.js", &ctx));
}

#[test]
fn test_mochitest_options() {
    let report = ShimRegistry::builtin().unwrap();
    let options = report
        .registry
        .resolve_options("MochitestShim", &desktop())
        .unwrap();

    assert_eq!(options.get("simpleOption"), Some(&json!(true)));
    assert_eq!(options.get("complexOption"), Some(&json!({"a": 1, "b": "test"})));
    assert!(!options.contains_key("branchValue"));
    assert!(!options.contains_key("platformValue"));
}

#[test]
fn test_never_matching_shims_are_never_candidates() {
    let report = ShimRegistry::builtin().unwrap();
    let registry = report.registry;

    for platform in [HostPlatform::Desktop, HostPlatform::Android] {
        for channel in [
            ReleaseChannel::Nightly,
            ReleaseChannel::Beta,
            ReleaseChannel::Release,
            ReleaseChannel::Esr,
        ] {
            let ctx = RuntimeContext::new(platform, channel).with_etp_blocked(true);
            let ids: Vec<_> = registry.candidates_for(&ctx).map(|s| s.id.as_str()).collect();
            assert!(!ids.contains(&"MochitestShim2"));
            assert!(!ids.contains(&"MochitestShim5"));
            assert!(!ids.contains(&"MochitestShim6"));
        }
    }
}
