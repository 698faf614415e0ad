use super::*;
use pretty_assertions::assert_eq;
use spug_lexer::lex;

fn compile_with(source: &str, options: &TemplateOptions) -> Result<ChunkTree, CompileError> {
    compile(lex(source).unwrap(), options)
}

fn describe(source: &str) -> String {
    compile_with(source, &TemplateOptions::default())
        .unwrap()
        .describe(true)
}

fn lines(expected: &[&str]) -> String {
    let mut out = expected.join("\n");
    out.push('\n');
    out
}

fn error(source: &str) -> String {
    compile_with(source, &TemplateOptions::default())
        .unwrap_err()
        .message()
        .to_owned()
}

fn text(source: &str, options: &TemplateOptions) -> String {
    let tree = compile_with(source, options).unwrap();
    let root = tree.get(ChunkId::ROOT);
    assert_eq!(root.children.len(), 1, "{}", tree.describe(true));
    let chunk = tree.get(root.children[0]);
    assert_eq!(chunk.kind, ChunkKind::Text);
    chunk.value.clone()
}

#[test]
fn test_constant_output_is_folded_into_text() {
    assert_eq!(
        describe("p Hello\n  span= 1 + 2\n"),
        lines(&["Block", r#"  Text "<p>Hello<span>3</span></p>""#])
    );
}

#[test]
fn test_dynamic_output_splits_text() {
    assert_eq!(
        describe("p= name"),
        lines(&[
            "Block",
            r#"  Text "<p>""#,
            "  OutputEscaped name",
            r#"  Text "</p>""#,
        ])
    );
}

#[test]
fn test_constant_needing_escape_stays_a_chunk() {
    assert_eq!(
        describe(r#"p= "<b>""#),
        lines(&[
            "Block",
            r#"  Text "<p>""#,
            r#"  OutputEscaped "<b>""#,
            r#"  Text "</p>""#,
        ])
    );
    assert_eq!(
        text(r#"p!= "<b>""#, &TemplateOptions::default()),
        "<p><b></p>"
    );
}

#[test]
fn test_tag_shorthand_and_attributes() {
    assert_eq!(
        text(
            r#"a.btn.big#go(href="/x", disabled) Go"#,
            &TemplateOptions::default()
        ),
        r#"<a id="go" class="btn big" href="/x" disabled>Go</a>"#
    );
    assert_eq!(text(".note", &TemplateOptions::default()), r#"<div class="note"></div>"#);
}

#[test]
fn test_dynamic_attribute() {
    assert_eq!(
        describe("a(href=url) x"),
        lines(&[
            "Block",
            r#"  Text "<a""#,
            r#"  AttributeEscaped "href" url"#,
            r#"  Text ">x</a>""#,
        ])
    );
}

#[test]
fn test_void_and_self_closing_tags() {
    assert_eq!(text("br", &TemplateOptions::default()), "<br/>");
    assert_eq!(text("foo/", &TemplateOptions::default()), "<foo/>");
    assert_eq!(
        error("img\n  p"),
        "Self-closing tag cannot have nested lines"
    );
}

#[test]
fn test_text_lines_are_joined() {
    assert_eq!(
        text("p\n  | one\n  | two", &TemplateOptions::default()),
        "<p>one\ntwo</p>"
    );
    assert_eq!(
        text("p.\n  one\n  two", &TemplateOptions::default()),
        "<p>one\ntwo</p>"
    );
}

#[test]
fn test_comments() {
    assert_eq!(
        text("//note\n//- hidden\np", &TemplateOptions::default()),
        "<!--note--><p></p>"
    );
}

#[test]
fn test_doctypes() {
    assert_eq!(
        text("doctype html\nhtml", &TemplateOptions::default()),
        "<!DOCTYPE html><html></html>"
    );
    assert_eq!(text("doctype", &TemplateOptions::default()), "<!DOCTYPE html>");
    assert_eq!(
        text("doctype xml", &TemplateOptions::default()),
        r#"<?xml version="1.0" encoding="utf-8" ?>"#
    );
    assert_eq!(
        text("doctype custom", &TemplateOptions::default()),
        "<!DOCTYPE custom>"
    );
}

#[test]
fn test_constant_code_is_dropped() {
    assert_eq!(text("- 1 + 2\np", &TemplateOptions::default()), "<p></p>");

    let tree = compile_with("- var x = 1\np= x", &TemplateOptions::default()).unwrap();
    let kinds: Vec<ChunkKind> = tree
        .get(ChunkId::ROOT)
        .children
        .iter()
        .map(|id| tree.get(*id).kind)
        .collect();
    assert_eq!(
        kinds,
        [
            ChunkKind::Code,
            ChunkKind::Text,
            ChunkKind::OutputEscaped,
            ChunkKind::Text
        ]
    );
}

#[test]
fn test_each_pair_variables() {
    assert_eq!(
        describe("each item, i in items\n  li= item\nelse\n  li none"),
        lines(&[
            "Block",
            r#"  ControlEachPair "item i" items"#,
            r#"    Text "<li>""#,
            "    OutputEscaped item",
            r#"    Text "</li>""#,
            "  ControlElse",
            r#"    Text "<li>none</li>""#,
        ])
    );
}

#[test]
fn test_conditional_chain() {
    assert_eq!(
        describe("if a\n  p A\nelseif b\n  p B\nelse\n  p C"),
        lines(&[
            "Block",
            "  ControlIf a",
            r#"    Text "<p>A</p>""#,
            "  ControlElseIf b",
            r#"    Text "<p>B</p>""#,
            "  ControlElse",
            r#"    Text "<p>C</p>""#,
        ])
    );
}

#[test]
fn test_case_branches() {
    assert_eq!(
        describe("case x\n  when 1\n  when 2\n    p two\n  default\n    p other"),
        lines(&[
            "Block",
            "  ControlCase x",
            "    ControlWhen 1",
            "    ControlWhen 2",
            r#"      Text "<p>two</p>""#,
            "    ControlDefault",
            r#"      Text "<p>other</p>""#,
        ])
    );
}

#[test]
fn test_misplaced_control_lines() {
    assert_eq!(error("else\n  p"), "'else' without 'if' or 'each'");
    assert_eq!(error("p\nelseif a\n  p"), "'elseif' without 'if'");
    assert_eq!(error("unless a\n  p\nelseif b\n  p"), "'elseif' without 'if'");
    assert_eq!(error("when 1\n  p"), "'when' outside of 'case'");
    assert_eq!(
        error("case x\n  p a"),
        "Only 'when' and 'default' can be nested in 'case'"
    );
}

#[test]
fn test_structure_error_location() {
    let error = compile_with("p\n  else", &TemplateOptions::default()).unwrap_err();
    let CompileError::Structure { offset, .. } = error else {
        panic!("expected a structure error, got {error:?}");
    };
    assert_eq!(offset, 4);
}

#[test]
fn test_mixin_definition_and_call() {
    let tree = compile_with(
        "mixin greet(name)\n  p= name\n+greet('Ann')",
        &TemplateOptions::default(),
    )
    .unwrap();
    let root = &tree.get(ChunkId::ROOT).children;
    assert_eq!(root.len(), 2);

    let definition = tree.get(root[0]);
    assert_eq!(definition.kind, ChunkKind::Mixin);
    assert_eq!(definition.value, "greet");
    assert_eq!(definition.children.len(), 3);

    let call = tree.get(root[1]);
    assert_eq!(call.kind, ChunkKind::MixinCall);
    assert_eq!(call.value, "greet");
    assert!(call.expr.is_some());
}

#[test]
fn test_includes_are_collected_once() {
    let tree = compile_with(
        "include header\ndiv\n  include header\n  include footer",
        &TemplateOptions::default(),
    )
    .unwrap();
    assert_eq!(tree.includes, ["header", "footer"]);

    let root = &tree.get(ChunkId::ROOT).children;
    let nested = tree.get(root[2]);
    assert_eq!(nested.kind, ChunkKind::Include);
    assert_eq!(nested.value, "header");
    assert_eq!(nested.indent, 1);
}

#[test]
fn test_pretty_block_tags() {
    let pretty = TemplateOptions::new().pretty(true);
    assert_eq!(
        text("div\n  p Hi\n  p Yo", &pretty),
        "<div>\n\t<p>Hi</p>\n\t<p>Yo</p>\n</div>"
    );
    assert_eq!(
        text("p\n  span a\n  b b", &pretty),
        "<p><span>a</span><b>b</b></p>"
    );
}
