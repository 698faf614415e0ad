use pretty_assertions::assert_eq;
use spug::{Context, Value};

use crate::common::{render, render_pretty, render_with};

#[test]
fn test_escaped_output() {
    assert_eq!(render(r#"p= "<b>""#), "<p>&lt;b&gt;</p>");
    assert_eq!(render(r#"p!= "<b>""#), "<p><b></p>");
}

#[test]
fn test_escaping_can_be_disabled_per_render() {
    let mut ctx = Context::new();
    ctx.set_escape_output(false);
    assert_eq!(render_with(r#"p= "<b>""#, &mut ctx), "<p><b></p>");
}

#[test]
fn test_interpolation() {
    let mut ctx = Context::new();
    ctx.set("name", "<Ann>");
    assert_eq!(
        render_with("p Hello #{name}!", &mut ctx),
        "<p>Hello &lt;Ann&gt;!</p>"
    );
    assert_eq!(render_with("p Hello !{name}!", &mut ctx), "<p>Hello <Ann>!</p>");
}

#[test]
fn test_dynamic_attributes() {
    let mut ctx = Context::new();
    ctx.set("url", "/a?b=1&c=2");
    ctx.set("classes", vec![Value::from("x"), Value::from("y")]);
    ctx.set("on", true);
    ctx.set("off", false);
    assert_eq!(
        render_with(
            "a(href=url, class=classes, checked=on, hidden=off) go",
            &mut ctx
        ),
        r#"<a href="/a?b=1&amp;c=2" class="x y" checked>go</a>"#
    );
}

#[test]
fn test_attribute_list() {
    let attrs: Value = [("id", Value::from("main")), ("data-n", Value::from(1))]
        .into_iter()
        .collect();
    let mut ctx = Context::new();
    ctx.set_ref("attrs", &attrs);
    assert_eq!(
        render_with("div&attributes(attrs)", &mut ctx),
        r#"<div data-n="1" id="main"></div>"#
    );
}

#[test]
fn test_style_dictionary() {
    assert_eq!(
        render(r#"p(style={color: "red", top: 0})"#),
        r#"<p style="color:red;top:0;"></p>"#
    );
}

#[test]
fn test_inline_tags() {
    assert_eq!(render("p Say #[b hi] now"), "<p>Say <b>hi</b> now</p>");
}

#[test]
fn test_raw_html_lines_pass_through() {
    assert_eq!(
        render("div\n  <em>raw</em>"),
        "<div><em>raw</em></div>"
    );
}

#[test]
fn test_doctype_and_nesting() {
    assert_eq!(
        render("doctype html\nhtml\n  body\n    h1 Title"),
        "<!DOCTYPE html><html><body><h1>Title</h1></body></html>"
    );
}

#[test]
fn test_pretty_output() {
    assert_eq!(
        render_pretty("doctype html\nhtml\n  body\n    p one\n    p\n      | two\n      | three"),
        "<!DOCTYPE html>\n<html>\n\t<body>\n\t\t<p>one</p>\n\t\t<p>\n\t\t\ttwo\n\t\t\tthree\n\t\t</p>\n\t</body>\n</html>"
    );
}
