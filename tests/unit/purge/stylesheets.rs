/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use purge::stylesheets::{CssRule, Stylesheet};

#[test]
fn test_parse_stylesheet() {
    let css = "@import url(fonts.css);\n\
               /* layout */\n\
               .card, .card-body { padding: 1rem; }\n\
               @media (min-width: 768px) {\n\
               nav .item { display: flex; }\n\
               }\n\
               @keyframes spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } }\n\
               @font-face { font-family: Body; src: url(body.woff2); }";
    let stylesheet = Stylesheet::from_str(css).unwrap();
    assert_eq!(stylesheet.rules.len(), 5);

    match &stylesheet.rules[0] {
        CssRule::Statement(rule) => {
            assert_eq!(rule.name, "import");
            assert_eq!(rule.prelude, "url(fonts.css)");
        },
        other => panic!("expected @import, got {:?}", other),
    }
    match &stylesheet.rules[1] {
        CssRule::Style(rule) => {
            assert_eq!(rule.selectors.to_css_string(), ".card, .card-body");
            assert_eq!(rule.block, " padding: 1rem; ");
        },
        other => panic!("expected style rule, got {:?}", other),
    }
    match &stylesheet.rules[2] {
        CssRule::Conditional(rule) => {
            assert_eq!(rule.name, "media");
            assert_eq!(rule.condition, "(min-width: 768px)");
            assert_eq!(rule.stylesheet.rules.len(), 1);
            match &rule.stylesheet.rules[0] {
                CssRule::Style(inner) => {
                    assert_eq!(inner.selectors.to_css_string(), "nav .item");
                },
                other => panic!("expected nested style rule, got {:?}", other),
            }
        },
        other => panic!("expected @media, got {:?}", other),
    }
    match &stylesheet.rules[3] {
        CssRule::Keyframes(rule) => {
            assert_eq!(rule.at_keyword, "keyframes");
            assert_eq!(rule.name, "spin");
            assert!(rule.block.contains("rotate(360deg)"));
        },
        other => panic!("expected @keyframes, got {:?}", other),
    }
    match &stylesheet.rules[4] {
        CssRule::Block(rule) => {
            assert_eq!(rule.name, "font-face");
            assert_eq!(rule.prelude, "");
            assert!(rule.block.contains("font-family: Body;"));
        },
        other => panic!("expected @font-face, got {:?}", other),
    }
}

#[test]
fn test_vendor_prefixed_keyframes() {
    let stylesheet =
        Stylesheet::from_str("@-webkit-keyframes fade { from { opacity: 0; } }").unwrap();
    match &stylesheet.rules[0] {
        CssRule::Keyframes(rule) => {
            assert_eq!(rule.at_keyword, "-webkit-keyframes");
            assert_eq!(rule.name, "fade");
        },
        other => panic!("expected @-webkit-keyframes, got {:?}", other),
    }
}

#[test]
fn test_commas_inside_not_do_not_split_the_list() {
    let stylesheet = Stylesheet::from_str(".x:not(.y, .z) { color: blue; }").unwrap();
    match &stylesheet.rules[0] {
        CssRule::Style(rule) => {
            assert_eq!(rule.selectors.0.len(), 1);
            assert_eq!(rule.selectors.to_css_string(), ".x:not(.y, .z)");
        },
        other => panic!("expected style rule, got {:?}", other),
    }
}

#[test]
fn test_commas_inside_attribute_brackets_do_not_split_the_list() {
    // An attribute value containing a comma must stay inside one selector.
    let stylesheet = Stylesheet::from_str("[data-list=\"a,b\"] { color: blue; }").unwrap();
    match &stylesheet.rules[0] {
        CssRule::Style(rule) => assert_eq!(rule.selectors.0.len(), 1),
        other => panic!("expected style rule, got {:?}", other),
    }
}

#[test]
fn test_quoted_braces_do_not_confuse_block_tracking() {
    let css = ".a { content: \"}\"; color: red; }\n.b { color: blue; }";
    let stylesheet = Stylesheet::from_str(css).unwrap();
    assert_eq!(stylesheet.rules.len(), 2);
    match &stylesheet.rules[0] {
        CssRule::Style(rule) => assert_eq!(rule.block, " content: \"}\"; color: red; "),
        other => panic!("expected style rule, got {:?}", other),
    }
}

#[test]
fn test_comments_are_not_rules() {
    let stylesheet =
        Stylesheet::from_str("/* a */ html , body /**/ { display: block; } /* b */").unwrap();
    assert_eq!(stylesheet.rules.len(), 1);
    match &stylesheet.rules[0] {
        CssRule::Style(rule) => assert_eq!(rule.selectors.0.len(), 2),
        other => panic!("expected style rule, got {:?}", other),
    }
}

#[test]
fn test_unbalanced_braces_are_fatal() {
    assert!(Stylesheet::from_str("div { color: red;").is_err());
    assert!(Stylesheet::from_str("@media screen { div { color: red; }").is_err());
}

#[test]
fn test_unterminated_string_is_fatal() {
    assert!(Stylesheet::from_str("p { content: \"abc").is_err());
}

#[test]
fn test_invalid_selector_is_fatal() {
    assert!(Stylesheet::from_str("..x { color: red; }").is_err());
}

#[test]
fn test_parse_error_carries_location() {
    let error = Stylesheet::from_str("div {\n  color: red;\n").unwrap_err();
    assert!(!error.message.is_empty());
}

#[test]
fn test_serialization_is_stable() {
    let css = "@import url(a.css);\n\
               .a { color: red; }\n\
               @media screen {\n\
               .b > .c { margin: 0; }\n\
               }\n\
               @keyframes k { to { opacity: 1; } }";
    let once = Stylesheet::from_str(css).unwrap().to_css_string();
    let twice = Stylesheet::from_str(&once).unwrap().to_css_string();
    assert_eq!(once, twice);
}

#[test]
fn test_layer_statement_and_block() {
    let stylesheet =
        Stylesheet::from_str("@layer base, theme;\n@layer base {\n.a { color: red; }\n}")
            .unwrap();
    match &stylesheet.rules[0] {
        CssRule::Statement(rule) => {
            assert_eq!(rule.name, "layer");
            assert_eq!(rule.prelude, "base, theme");
        },
        other => panic!("expected @layer statement, got {:?}", other),
    }
    match &stylesheet.rules[1] {
        CssRule::Conditional(rule) => {
            assert_eq!(rule.name, "layer");
            assert_eq!(rule.stylesheet.rules.len(), 1);
        },
        other => panic!("expected @layer block, got {:?}", other),
    }
}
