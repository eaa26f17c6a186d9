/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use purge::extractor::extract_corpus;
use purge::safelist::{parse_safelist, Safelist};
use purge::{purge_stylesheet, UsageData};

fn usage(markup: &str, safelist: &str) -> UsageData {
    let documents = if markup.is_empty() {
        Vec::new()
    } else {
        vec![markup.to_owned()]
    };
    let tokens = extract_corpus(&documents);
    let (rules, errors) = parse_safelist(safelist);
    assert!(errors.is_empty(), "bad safelist in test: {:?}", errors);
    let (safelist, errors) = Safelist::compile(rules);
    assert!(errors.is_empty(), "bad safelist in test: {:?}", errors);
    UsageData::new(tokens, safelist)
}

fn purge(css: &str, usage: &UsageData) -> String {
    purge_stylesheet(css, usage).unwrap().css
}

#[test]
fn test_partial_list_pruning() {
    let usage = usage("<div class=\"a\"></div>", "");
    assert_eq!(
        purge(".a, .b { color: red; }", &usage),
        ".a { color: red; }"
    );
}

#[test]
fn test_unsatisfiable_rule_is_dropped() {
    let usage = usage("<div class=\"a\"></div>", "");
    assert_eq!(purge(".b { color: red; }", &usage), "");
}

#[test]
fn test_conservativeness() {
    // Every atomic component is reachable, so the rule must be kept even
    // though nothing proves the structural relationship between them.
    let usage = usage(
        "<main id=\"main\"></main><p class=\"card\"></p>",
        "",
    );
    let css = "#main > .card p:hover { color: red; }";
    assert_eq!(purge(css, &usage), css);
}

#[test]
fn test_pseudo_and_universal_survive_an_empty_corpus() {
    let usage = usage("", "");
    assert_eq!(purge("*:hover { color: red; }", &usage), "*:hover { color: red; }");
    assert_eq!(purge("::selection { background: gold; }", &usage),
               "::selection { background: gold; }");
}

#[test]
fn test_statement_and_declaration_at_rules_are_kept() {
    let usage = usage("", "");
    let css = "@import url(base.css);\n@font-face { font-family: Body; src: url(b.woff2); }";
    assert_eq!(purge(css, &usage), css);
}

#[test]
fn test_empty_at_rule_elimination() {
    let usage = usage("", "");
    assert_eq!(
        purge("@media (min-width: 768px) { .unused { color: red; } }", &usage),
        ""
    );
}

#[test]
fn test_media_block_is_pruned_recursively() {
    let usage = usage("<div class=\"kept\"></div>", "");
    let css = "@media screen {\n\
               .kept { color: red; }\n\
               .dropped { color: blue; }\n\
               }";
    assert_eq!(
        purge(css, &usage),
        "@media screen {\n.kept { color: red; }\n}"
    );
}

#[test]
fn test_keyframes_referential_keep() {
    let usage = usage("<div class=\"loader\"></div>", "");
    let css = ".loader { animation: spin 1s linear infinite; }\n\
               @keyframes spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } }";
    assert_eq!(purge(css, &usage), css);
}

#[test]
fn test_unreferenced_keyframes_are_dropped() {
    let usage = usage("<div class=\"loader\"></div>", "");
    let css = ".loader { color: red; }\n\
               @keyframes spin { to { transform: rotate(360deg); } }";
    assert_eq!(purge(css, &usage), ".loader { color: red; }");
}

#[test]
fn test_keyframes_reference_via_animation_name_and_vendor_prefix() {
    let usage = usage("<div class=\"loader\"></div>", "");
    let css = ".loader { -webkit-animation-name: fade; }\n\
               @-webkit-keyframes fade { to { opacity: 1; } }";
    assert_eq!(purge(css, &usage), css);
}

#[test]
fn test_keyframes_reference_from_dropped_rule_does_not_count() {
    let usage = usage("", "");
    let css = ".gone { animation: spin 1s; }\n\
               @keyframes spin { to { opacity: 1; } }";
    assert_eq!(purge(css, &usage), "");
}

#[test]
fn test_keyframes_removal_can_empty_a_media_block() {
    let usage = usage("", "");
    let css = "@media screen { @keyframes spin { to { opacity: 1; } } }";
    assert_eq!(purge(css, &usage), "");
}

#[test]
fn test_attribute_selectors() {
    let usage = usage(
        "<input type=\"hidden\" name=\"csrf\">\n\
         <a href=\"https://example.com/docs\">docs</a>",
        "",
    );
    // Name-only test.
    assert_eq!(purge("[name] { color: red; }", &usage), "[name] { color: red; }");
    // Operator tests against the recorded values.
    assert_eq!(
        purge("input[type=hidden] { display: none; }", &usage),
        "input[type=hidden] { display: none; }"
    );
    assert_eq!(purge("input[type=text] { color: red; }", &usage), "");
    assert_eq!(
        purge("a[href^=\"https://\"] { color: green; }", &usage),
        "a[href^=\"https://\"] { color: green; }"
    );
    assert_eq!(purge("a[href$=\".pdf\"] { color: red; }", &usage), "");
    // Unknown attribute name.
    assert_eq!(purge("[data-missing] { color: red; }", &usage), "");
}

#[test]
fn test_interpolated_attribute_value_satisfies_any_operator() {
    let usage = usage("<div data-state=\"{{ state }}\"></div>", "");
    assert_eq!(
        purge("[data-state=open] { color: red; }", &usage),
        "[data-state=open] { color: red; }"
    );
}

#[test]
fn test_case_insensitive_attribute_flag() {
    let usage = usage("<input type=\"HIDDEN\">", "");
    // Attribute values are compared case-sensitively by default; the `i`
    // flag opts a selector out of that.
    assert_eq!(purge("input[type=hidden] { display: none; }", &usage), "");
    assert_eq!(
        purge("input[type=hidden i] { display: none; }", &usage),
        "input[type=hidden i] { display: none; }"
    );
}

#[test]
fn test_safelist_override() {
    let usage = usage("", "class alert-*\n");
    assert_eq!(
        purge(".alert-warning { color: orange; }", &usage),
        ".alert-warning { color: orange; }"
    );
}

#[test]
fn test_forced_keep_overrides_everything() {
    let usage = usage("", "always .js-toggle > .panel\n");
    assert_eq!(
        purge(".js-toggle > .panel { display: none; }", &usage),
        ".js-toggle > .panel { display: none; }"
    );
    // The forced selector also pins its whole rule when it is one member of
    // a list.
    assert_eq!(
        purge(".js-toggle > .panel, .unused { display: none; }", &usage),
        ".js-toggle > .panel, .unused { display: none; }"
    );
}

#[test]
fn test_idempotence() {
    let usage = usage(
        "<div class=\"a loader\"><span id=\"s\"></span></div>",
        "class alert-*\n",
    );
    let css = "@import url(a.css);\n\
               .a, .b { color: red; }\n\
               .alert-danger { color: maroon; }\n\
               @media screen { #s { margin: 0; } .gone { margin: 1px; } }\n\
               .loader { animation: spin 2s; }\n\
               @keyframes spin { to { opacity: 1; } }\n\
               @keyframes unused { to { opacity: 0; } }";
    let once = purge(css, &usage);
    let twice = purge(&once, &usage);
    assert_eq!(once, twice);
}

#[test]
fn test_monotonicity() {
    let css = ".a { color: red; }\n.b { color: blue; }\n.c { color: green; }";
    let smaller = usage("<div class=\"a\"></div>", "");
    let larger = usage("<div class=\"a b\"></div>", "");
    let kept_smaller = purge_stylesheet(css, &smaller).unwrap().summary.rules_kept;
    let kept_larger = purge_stylesheet(css, &larger).unwrap().summary.rules_kept;
    assert!(kept_larger >= kept_smaller);

    // Adding safelist rules never decreases the kept count either.
    let with_safelist = usage("<div class=\"a\"></div>", "class c\n");
    let kept_with_safelist = purge_stylesheet(css, &with_safelist)
        .unwrap()
        .summary
        .rules_kept;
    assert!(kept_with_safelist >= kept_smaller);
}

#[test]
fn test_summary_counts() {
    let usage = usage("<div class=\"a\"></div>", "");
    let css = ".a { color: red; }\n\
               .b { color: blue; }\n\
               @media screen { .a { margin: 0; } }";
    let output = purge_stylesheet(css, &usage).unwrap();
    // Two top-level style rules, the @media rule, and the nested style rule.
    assert_eq!(output.summary.rules_total, 4);
    assert_eq!(output.summary.rules_kept, 3);
    assert_eq!(output.summary.bytes_before, css.len());
    assert_eq!(output.summary.bytes_after, output.css.len());
}

#[test]
fn test_tag_name_matching_is_case_insensitive() {
    let usage = usage("<div></div>", "");
    assert_eq!(purge("DIV { color: red; }", &usage), "DIV { color: red; }");
}

#[test]
fn test_parse_error_is_a_value() {
    let usage = usage("", "");
    assert!(purge_stylesheet("div { color: red;", &usage).is_err());
}
