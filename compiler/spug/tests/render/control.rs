use pretty_assertions::assert_eq;
use spug::{Context, Value};

use crate::common::{error_comment, render, render_with};

#[test]
fn test_if_elseif_else() {
    let source = "if n > 10\n  p big\nelseif n > 3\n  p mid\nelse\n  p small";
    for (n, expected) in [(20, "<p>big</p>"), (5, "<p>mid</p>"), (1, "<p>small</p>")] {
        let mut ctx = Context::new();
        ctx.set("n", n);
        assert_eq!(render_with(source, &mut ctx), expected);
    }
}

#[test]
fn test_unless() {
    let mut ctx = Context::new();
    ctx.set("admin", false);
    assert_eq!(
        render_with("unless admin\n  p guest\nelse\n  p admin", &mut ctx),
        "<p>guest</p>"
    );
}

#[test]
fn test_missing_guard_is_false() {
    assert_eq!(render("if user.name\n  p yes\nelse\n  p no"), "<p>no</p>");
}

#[test]
fn test_branch_variables_are_scoped() {
    assert_eq!(
        render("if true\n  - var x = 1\n  p= x\np= x"),
        format!("<p>1</p><p>{}</p>", error_comment("Invalid variable name: x"))
    );
}

#[test]
fn test_case_falls_through_empty_when() {
    let source = "case n\n  when 1\n    p one\n  when 2\n  when 3\n    p two or three\n  default\n    p other";
    for (n, expected) in [
        (1, "<p>one</p>"),
        (2, "<p>two or three</p>"),
        (3, "<p>two or three</p>"),
        (9, "<p>other</p>"),
    ] {
        let mut ctx = Context::new();
        ctx.set("n", n);
        assert_eq!(render_with(source, &mut ctx), expected);
    }
}

#[test]
fn test_each_over_array_with_index() {
    let mut ctx = Context::new();
    ctx.set("items", vec![Value::from("a"), Value::from("b")]);
    assert_eq!(
        render_with("ul\n  each v, i in items\n    li #{i}-#{v}", &mut ctx),
        "<ul><li>0-a</li><li>1-b</li></ul>"
    );
}

#[test]
fn test_each_over_dictionary_in_key_order() {
    let obj: Value = [("b", Value::from(2)), ("a", Value::from(1))]
        .into_iter()
        .collect();
    let mut ctx = Context::new();
    ctx.set_ref("obj", &obj);
    assert_eq!(
        render_with("each v, k in obj\n  b #{k}=#{v}", &mut ctx),
        "<b>a=1</b><b>b=2</b>"
    );
}

#[test]
fn test_each_else() {
    let source = "each x in items\n  p= x\nelse\n  p empty";
    let mut ctx = Context::new();
    ctx.set("items", Value::empty_array());
    assert_eq!(render_with(source, &mut ctx), "<p>empty</p>");

    let mut ctx = Context::new();
    ctx.set("items", Value::Null);
    assert_eq!(render_with(source, &mut ctx), "<p>empty</p>");
}

#[test]
fn test_each_over_scalar() {
    assert_eq!(render("each x in 5\n  p= x"), "<p>5</p>");
    assert_eq!(
        render("each x in 5\n  p= x\nelse\n  p none"),
        "<p>none</p>"
    );
}

#[test]
fn test_loop_variable_aliases_element() {
    assert_eq!(
        render("- var list = [{n: 1}, {n: 2}]\neach item in list\n  - item.seen = item.n * 10\np= list[1].seen"),
        "<p>20</p>"
    );
}

#[test]
fn test_while_loop() {
    assert_eq!(
        render("- var i = 0\nwhile i < 3\n  p= i++"),
        "<p>0</p><p>1</p><p>2</p>"
    );
}

#[test]
fn test_case_with_output_lines() {
    assert_eq!(
        render("case 2\n  when 1\n    = 'no'\n  when 2\n    = \"match\""),
        "match"
    );
}

#[test]
fn test_undefined_is_falsy_and_null() {
    assert_eq!(
        render("if missing == null\n  p unset\nif !missing\n  p falsy\np= 'still rendering'"),
        "<p>unset</p><p>falsy</p><p>still rendering</p>"
    );
}

#[test]
fn test_code_block_with_crlf_line_endings() {
    assert_eq!(render("-\r\n  var x = 1 +\r\n    2\r\np= x"), "<p>3</p>");
}
