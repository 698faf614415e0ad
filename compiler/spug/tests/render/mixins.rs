use pretty_assertions::assert_eq;

use crate::common::{error_comment, render};

#[test]
fn test_greet() {
    assert_eq!(
        render("mixin greet(name)\n  p Hello #{name}\n+greet('Ann')"),
        "<p>Hello Ann</p>"
    );
}

#[test]
fn test_default_parameters() {
    assert_eq!(
        render("mixin tag(label, cls = 'x')\n  span(class=cls)= label\n+tag('a')\n+tag('b', 'y')"),
        r#"<span class="x">a</span><span class="y">b</span>"#
    );
}

#[test]
fn test_mixin_without_parameters() {
    assert_eq!(render("mixin rule\n  hr\n+rule\n+rule"), "<hr/><hr/>");
}

#[test]
fn test_lines_nested_under_a_call_follow_it() {
    assert_eq!(render("mixin m\n  b x\n+m\n  i y"), "<b>x</b><i>y</i>");
}

#[test]
fn test_mixin_scope_is_isolated() {
    assert_eq!(
        render("mixin m(a)\n  - var inner = a\n+m(1)\np= inner"),
        format!("<p>{}</p>", error_comment("Invalid variable name: inner"))
    );
}

#[test]
fn test_unknown_mixin() {
    assert_eq!(render("+missing"), error_comment("Mixin not found: missing"));
}

#[test]
fn test_missing_argument() {
    assert_eq!(
        render("mixin m(a)\n  p= a\n+m"),
        error_comment("Missing argument 'a' for mixin m")
    );
}

#[test]
fn test_redefinition_is_reported() {
    assert_eq!(
        render("mixin m\n  b one\nmixin m\n  b two\n+m"),
        format!("{}<b>one</b>", error_comment("Mixin already defined: m"))
    );
}

#[test]
fn test_recursion_is_bounded_by_step_limit() {
    let template = crate::common::compile("mixin r\n  +r\n+r");
    let mut ctx = spug::Context::new();
    ctx.set_step_limit(Some(50));
    let output = template.render(&mut ctx).unwrap();
    assert_eq!(output.matches("Step limit exceeded").count(), 1);
}

#[test]
fn test_default_binds_when_argument_is_missing() {
    assert_eq!(
        render("mixin greet(name, greeting=\"Hi\")\n  p #{greeting} #{name}\n+greet(\"Ann\")"),
        "<p>Hi Ann</p>"
    );
}
