use super::*;
use crate::registry::MasterRecord;

fn failure() -> FailureContext {
    FailureContext {
        master_url: "https://build.chromium.org/p/chromium.win".to_string(),
        builder_name: "XP Tests (1)".to_string(),
        slave_name: "vm123-m1".to_string(),
        step_name: "browser_tests".to_string(),
    }
}

fn formatter_with(options: FormatterOptions) -> LinkFormatter {
    LinkFormatter::new(Arc::new(Registry::builtin()), options)
}

#[test]
fn test_master_url_path_segment() {
    assert_eq!(
        master_url_path_segment("https://build.chromium.org/p/chromium.win"),
        "chromium.win"
    );
    assert_eq!(
        master_url_path_segment("https://build.chromium.org/p/chromium.win/"),
        "chromium.win"
    );
    assert_eq!(master_url_path_segment("chromium.linux"), "chromium.linux");
}

#[test]
fn test_master_url_path_segment_malformed() {
    assert_eq!(master_url_path_segment(""), "");
    assert_eq!(master_url_path_segment("/"), "");
    assert_eq!(master_url_path_segment("https://"), "");
    assert_eq!(master_url_path_segment("https://build.chromium.org"), "");
    assert_eq!(master_url_path_segment("https://build.chromium.org/"), "");
}

#[test]
fn test_scheme_only_master_has_no_group() {
    let formatter = formatter_with(FormatterOptions {
        flakiness_addressing: FlakinessAddressing::Group,
        ..FormatterOptions::default()
    });
    assert_eq!(formatter.group_for_master("https://"), None);
    assert!(formatter
        .flakiness_dashboard_url(Some("Foo.Bar"), "unit_tests", "https://")
        .ends_with("&master="));
}

#[test]
fn test_master_display_name_strips_chromium_prefix() {
    let formatter = LinkFormatter::default();
    let name = |url: &str| formatter.master_display_name(Some(url));

    assert_eq!(name("https://build.chromium.org/p/chromium.win").as_deref(), Some("win"));
    assert_eq!(
        name("https://build.chromium.org/p/chromium.gpu.fyi").as_deref(),
        Some("gpu.fyi")
    );
    assert_eq!(
        name("https://build.chromium.org/p/tryserver.chromium.gpu").as_deref(),
        Some("tryserver.chromium.gpu")
    );
    assert_eq!(name("https://build.chromium.org/p/client.v8").as_deref(), Some("client.v8"));
}

#[test]
fn test_master_display_name_pass_through() {
    let formatter = LinkFormatter::default();
    assert_eq!(formatter.master_display_name(None), None);
    assert_eq!(formatter.master_display_name(Some("")).as_deref(), Some(""));
}

#[test]
fn test_master_display_name_placeholder() {
    let formatter = formatter_with(FormatterOptions {
        missing_master_label: MissingMasterLabel::Placeholder,
        ..FormatterOptions::default()
    });
    assert_eq!(formatter.master_display_name(None).as_deref(), Some("foo"));
    assert_eq!(formatter.master_display_name(Some("")).as_deref(), Some("foo"));
    assert_eq!(
        formatter
            .master_display_name(Some("https://build.chromium.org/p/chromium.mac"))
            .as_deref(),
        Some("mac")
    );
}

#[test]
fn test_group_for_master() {
    let formatter = LinkFormatter::default();
    assert_eq!(
        formatter.group_for_master("https://host/chromium.webkit"),
        Some("@ToT Chromium")
    );
    assert_eq!(
        formatter.group_for_master("https://host/chromium.webkit/"),
        Some("@ToT Chromium")
    );
    assert_eq!(formatter.group_for_master("https://host/unknown.master"), None);
    assert_eq!(formatter.group_for_master(""), None);
}

#[test]
fn test_group_for_master_uses_first_group_only() {
    let registry = Registry::new(
        Vec::new(),
        vec![MasterRecord {
            display_name: "Multi".to_string(),
            url_path_segment: "multi.master".to_string(),
            groups: vec!["@First".to_string(), "@Second".to_string()],
        }],
    )
    .unwrap();
    let formatter = LinkFormatter::new(Arc::new(registry), FormatterOptions::default());
    assert_eq!(formatter.group_for_master("https://host/multi.master"), Some("@First"));
}

#[test]
fn test_buildbot_link_hierarchy() {
    let failure = failure();
    assert_eq!(
        slave_url(&failure),
        "https://build.chromium.org/p/chromium.win/buildslaves/vm123-m1"
    );
    assert_eq!(
        builder_url(&failure),
        "https://build.chromium.org/p/chromium.win/builders/XP Tests (1)"
    );
    assert_eq!(
        stdio_url(&failure, 31886),
        "https://build.chromium.org/p/chromium.win/builders/XP Tests (1)/builds/31886/steps/browser_tests/logs/stdio"
    );
}

#[test]
fn test_link_composition_chain() {
    let failure = failure();
    for build_number in ["1", "31886", "latest"] {
        let build = build_url(&failure, build_number);
        let step = step_url(&failure, build_number);
        let stdio = stdio_url(&failure, build_number);

        assert_eq!(build, format!("{}/builds/{build_number}", builder_url(&failure)));
        assert_eq!(step, format!("{build}/steps/{}", failure.step_name));
        assert_eq!(stdio, format!("{step}/logs/stdio"));
    }
}

#[test]
fn test_flakiness_dashboard_requires_test_name() {
    let formatter = LinkFormatter::default();
    let url = "https://build.chromium.org/p/chromium.win";
    assert_eq!(formatter.flakiness_dashboard_url(None, "browser_tests", url), "");
    assert_eq!(formatter.flakiness_dashboard_url(Some(""), "browser_test", url), "");
}

#[test]
fn test_flakiness_dashboard_requires_test_step() {
    let formatter = LinkFormatter::default();
    let url = "https://build.chromium.org/p/chromium.win";
    assert_eq!(formatter.flakiness_dashboard_url(Some("MyTest"), "compile", url), "");
    assert_eq!(formatter.flakiness_dashboard_url(Some("MyTest"), "Browser_Tests", url), "");
}

#[test]
fn test_flakiness_dashboard_master_addressing() {
    let formatter = LinkFormatter::default();
    let url = formatter.flakiness_dashboard_url(
        Some("My Test"),
        "browser_tests",
        "https://build.chromium.org/p/chromium.win/",
    );
    assert_eq!(
        url,
        "http://test-results.appspot.com/dashboards/flakiness_dashboard.html\
         #testType=browser_tests&tests=My%20Test&master=chromium.win"
    );
}

#[test]
fn test_flakiness_dashboard_encodes_like_uri_component() {
    let formatter = LinkFormatter::default();
    let url = formatter.flakiness_dashboard_url(
        Some("Foo (1)!*'~ & bar"),
        "browser_tests",
        "https://build.chromium.org/p/chromium.win",
    );
    assert!(url.contains("&tests=Foo%20(1)!*'~%20%26%20bar&"));
}

#[test]
fn test_flakiness_dashboard_group_addressing() {
    let formatter = formatter_with(FormatterOptions {
        flakiness_addressing: FlakinessAddressing::Group,
        ..FormatterOptions::default()
    });
    let url = formatter.flakiness_dashboard_url(
        Some("Suite.Case/0"),
        "unit_tests",
        "https://build.chromium.org/p/chromium.webkit",
    );
    assert!(url.contains("testType=unit_tests"));
    assert!(url.contains("tests=Suite.Case%2F0"));
    assert!(url.ends_with("&group=@ToT Chromium"));
}

#[test]
fn test_flakiness_dashboard_group_falls_back_to_master() {
    let formatter = formatter_with(FormatterOptions {
        flakiness_addressing: FlakinessAddressing::Group,
        ..FormatterOptions::default()
    });
    let url = formatter.flakiness_dashboard_url(
        Some("Foo.Bar"),
        "content_browsertests",
        "https://build.example.org/p/unknown.master",
    );
    assert!(url.ends_with("&master=unknown.master"));
}

#[test]
fn test_parse_stdio_url() {
    let location = parse_stdio_url(
        "https://build.chromium.org/p/chromium.win/builders/XP%20Tests%20(1)/builds/31886/steps/browser_tests/logs/stdio",
    )
    .unwrap();

    assert_eq!(location.master_url, "https://build.chromium.org/p/chromium.win");
    assert_eq!(location.builder_name, "XP Tests (1)");
    assert_eq!(location.build_number, "31886");
    assert_eq!(location.step_name, "browser_tests");
}

#[test]
fn test_parse_stdio_url_plus_encoding() {
    let location =
        parse_stdio_url("https://host/p/m/builders/Linux+Tests/builds/7/steps/unit_tests/logs/stdio")
            .unwrap();
    assert_eq!(location.builder_name, "Linux Tests");
}

#[test]
fn test_parse_stdio_url_inverts_stdio_url() {
    let failure = failure();
    let location = parse_stdio_url(&stdio_url(&failure, 42)).unwrap();
    let context = location.failure_context();

    assert_eq!(context.master_url, failure.master_url);
    assert_eq!(context.builder_name, failure.builder_name);
    assert_eq!(context.step_name, failure.step_name);
    assert_eq!(location.build_number, "42");
}

#[test]
fn test_parse_stdio_url_rejects_other_shapes() {
    assert!(parse_stdio_url("https://host/p/m/builders/b/builds/7").is_none());
    assert!(parse_stdio_url("https://host/p/m/builders/b/builds/7/steps//logs/stdio").is_none());
    assert!(parse_stdio_url("https://host/p/m/builds/7/steps/s/logs/stdio").is_none());
}

#[test]
fn test_formatter_delegates_to_registry() {
    let formatter = LinkFormatter::default();
    assert_eq!(
        formatter.change_url("chromium", "281989").unwrap(),
        "http://crrev.com/281989"
    );
    assert!(formatter
        .changelog_url("nacl", "13441", "13452")
        .unwrap()
        .ends_with("range=13441:13452"));
    assert_eq!(formatter.short_name("blink").unwrap(), Some("bl"));
    assert!(formatter.change_url("does-not-exist", "1").is_err());
}

#[test]
fn test_failure_context_from_feed_json() {
    let failure: FailureContext = serde_json::from_str(
        r#"{"master_url": "https://host/p/chromium.mac", "builder_name": "Mac Builder",
            "step_name": "compile", "last_result_time": 1404775543}"#,
    )
    .unwrap();
    assert_eq!(failure.slave_name, "");
    assert_eq!(builder_url(&failure), "https://host/p/chromium.mac/builders/Mac Builder");
}
