use super::*;
use pretty_assertions::assert_eq;
use spug_ir::{TokenId, TokenKind};

fn describe(source: &str) -> String {
    lex(source).unwrap().describe()
}

fn lines(expected: &[&str]) -> String {
    let mut out = expected.join("\n");
    out.push('\n');
    out
}

fn error(source: &str) -> LexError {
    lex(source).unwrap_err()
}

#[test]
fn test_nested_tags() {
    assert_eq!(
        describe("ul\n  li= item\n"),
        lines(&[
            "Root",
            "  Line \"ul\"",
            "    LineData \"ul\"",
            "      Tag \"ul\"",
            "    Line \"li= item\"",
            "      LineData \"li= item\"",
            "        Tag \"li\"",
            "        TagTrailingEq \"=\"",
            "        OutputEscaped \"item\" item",
        ])
    );
}

#[test]
fn test_tag_info_and_attributes() {
    assert_eq!(
        describe(r#"a.btn#go(href="/x", disabled) Go"#),
        lines(&[
            "Root",
            r#"  Line "a.btn#go(href=\"/x\", disabled) Go""#,
            r#"    LineData "a.btn#go(href=\"/x\", disabled) Go""#,
            r#"      Tag "a""#,
            r#"      TagClassNote "btn""#,
            r#"      TagIdNote "go""#,
            r#"      TagAttrList "href=\"/x\", disabled""#,
            r#"        AttrPairEscaped "href=\"/x\"""#,
            r#"          AttrName "href""#,
            r#"            PlainText "href""#,
            r#"          AttrValue "\"/x\"" "/x""#,
            r#"        AttrPairEscaped "disabled""#,
            r#"          AttrName "disabled""#,
            r#"            PlainText "disabled""#,
            r#"      PlainText "Go""#,
        ])
    );
}

#[test]
fn test_attribute_list_spans_lines() {
    let tree = lex("input(\n  type='text'\n  value!=v\n)\np").unwrap();
    let line = tree.children(TokenId::ROOT).next().unwrap();
    let data = tree.get(line).child.unwrap();
    let list = tree
        .children(data)
        .find(|&id| tree.kind(id) == TokenKind::TagAttrList)
        .unwrap();
    let pairs: Vec<_> = tree.children(list).map(|id| tree.kind(id)).collect();
    assert_eq!(
        pairs,
        vec![TokenKind::AttrPairEscaped, TokenKind::AttrPairUnescaped]
    );
    assert_eq!(tree.children(TokenId::ROOT).count(), 2);
}

#[test]
fn test_quoted_attribute_name() {
    let tree = lex(r#"div('data-\'x\''=1)"#).unwrap();
    let line = tree.children(TokenId::ROOT).next().unwrap();
    let data = tree.get(line).child.unwrap();
    let list = tree.get(data).tail.unwrap();
    let pair = tree.get(list).child.unwrap();
    let name = tree.get(pair).child.unwrap();
    let text: String = tree.children(name).map(|id| tree.text(id)).collect();
    assert_eq!(text, "data-'x'");
}

#[test]
fn test_shorthand_div_and_text_block() {
    assert_eq!(
        describe(".note\n  p.\n    line #{x}\n    second"),
        lines(&[
            "Root",
            "  Line \".note\"",
            "    LineData \".note\"",
            "      Tag",
            "      TagClassNote \"note\"",
            "    Line \"p.\"",
            "      LineData \"p.\"",
            "        Tag \"p\"",
            "        TagTrailingDot \".\"",
            "      Line \"line #{x}\"",
            "        LinePlainText \"line #{x}\"",
            "          PlainText \"line \"",
            "          OutputEscaped \"x\" x",
            "      Line \"second\"",
            "        LinePlainText \"second\"",
            "          PlainText \"second\"",
        ])
    );
}

#[test]
fn test_interpolation() {
    let tree = lex(r"p Hello #{name}! \#{raw} #[b bold] end").unwrap();
    let line = tree.children(TokenId::ROOT).next().unwrap();
    let data = tree.get(line).child.unwrap();
    let children: Vec<_> = tree
        .children(data)
        .map(|id| (tree.kind(id), tree.text(id)))
        .collect();
    assert_eq!(
        children,
        vec![
            (TokenKind::Tag, "p"),
            (TokenKind::PlainText, "Hello "),
            (TokenKind::OutputEscaped, "name"),
            (TokenKind::PlainText, "! "),
            (TokenKind::PlainText, "#{raw} "),
            (TokenKind::LineData, "#[b bold]"),
            (TokenKind::PlainText, " end"),
        ]
    );
}

#[test]
fn test_chained_lines_nest() {
    let tree = lex("ul: li: a(href=x) link\n  span\np").unwrap();
    let roots: Vec<_> = tree.children(TokenId::ROOT).collect();
    assert_eq!(roots.len(), 2);

    let ul = roots[0];
    let li = tree.get(ul).tail.unwrap();
    assert_eq!(tree.text(li), "li");
    let a = tree.get(li).tail.unwrap();
    assert_eq!(tree.text(a), "a(href=x) link");
    let span = tree.get(a).tail.unwrap();
    assert_eq!(tree.text(span), "span");
}

#[test]
fn test_control_statements() {
    assert_eq!(
        describe("if user\n  p= user.name\nelse if guest\n  p guest\nelse\n  p nobody"),
        lines(&[
            "Root",
            "  ControlIf \"if user\" user",
            "    Line \"p= user.name\"",
            "      LineData \"p= user.name\"",
            "        Tag \"p\"",
            "        TagTrailingEq \"=\"",
            "        OutputEscaped \"user.name\" (. user name)",
            "  ControlElseIf \"else if guest\" guest",
            "    Line \"p guest\"",
            "      LineData \"p guest\"",
            "        Tag \"p\"",
            "        PlainText \"guest\"",
            "  ControlElse \"else\"",
            "    Line \"p nobody\"",
            "      LineData \"p nobody\"",
            "        Tag \"p\"",
            "        PlainText \"nobody\"",
        ])
    );
}

#[test]
fn test_each_variables() {
    assert_eq!(
        describe("each item, i in items\n  li= item"),
        lines(&[
            "Root",
            "  ControlEachPair \"each item, i in items\" items",
            "    ControlEachVariable \"item\"",
            "    ControlEachVariable \"i\"",
            "    Line \"li= item\"",
            "      LineData \"li= item\"",
            "        Tag \"li\"",
            "        TagTrailingEq \"=\"",
            "        OutputEscaped \"item\" item",
        ])
    );
    let tree = lex("for x in [1, 2]").unwrap();
    let each = tree.children(TokenId::ROOT).next().unwrap();
    assert_eq!(tree.kind(each), TokenKind::ControlEach);
}

#[test]
fn test_case_when_default() {
    let tree = lex("case n\n  when 1\n  when 2: p two\n  default: p other").unwrap();
    let case = tree.children(TokenId::ROOT).next().unwrap();
    let kinds: Vec<_> = tree.children(case).map(|id| tree.kind(id)).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::ControlWhen, TokenKind::ControlWhen, TokenKind::ControlDefault]
    );
    let default = tree.get(case).tail.unwrap();
    assert_eq!(tree.children(default).count(), 1);
}

#[test]
fn test_comments() {
    assert_eq!(
        describe("//- hidden\n// shown\n  nested"),
        lines(&[
            "Root",
            "  Line \"//- hidden\"",
            "    LineComment \"//- hidden\"",
            "      CommentTemplate \"//-\"",
            "      PlainText \" hidden\"",
            "  Line \"// shown\"",
            "    LineComment \"// shown\"",
            "      CommentHtml \"//\"",
            "      PlainText \" shown\"",
            "    Line \"nested\"",
            "      LinePlainText \"nested\"",
            "        PlainText \"nested\"",
        ])
    );
}

#[test]
fn test_piped_text_and_raw_lines() {
    let tree = lex("p\n  | one\n  | two\n<br>").unwrap();
    let roots: Vec<_> = tree.children(TokenId::ROOT).collect();
    let pipes: Vec<_> = tree
        .children(roots[0])
        .skip(1)
        .map(|line| tree.kind(tree.get(line).child.unwrap()))
        .collect();
    assert_eq!(pipes, vec![TokenKind::LinePiped, TokenKind::LinePiped]);
    let raw = tree.get(roots[1]).child.unwrap();
    assert_eq!(tree.kind(raw), TokenKind::LinePlainText);
    assert_eq!(tree.text(raw), "<br>");
}

#[test]
fn test_code_line_and_block() {
    assert_eq!(
        describe("- var a = 1; a++\n-\n  var b = a +\n    2\n\n  b--\np= b"),
        lines(&[
            "Root",
            "  Line \"- var a = 1; a++\"",
            "    LineCode \"- var a = 1; a++\"",
            "      Code \"var a = 1\" (= (var a) 1)",
            "      Code \"a++\" (post++ a)",
            "  Line \"-\\n  var b = a +\\n    2\\n\\n  b--\"",
            "    LineCodeBlock \"-\\n  var b = a +\\n    2\\n\\n  b--\"",
            "      Code \"var b = a +\\n    2\" (= (var b) (+ a 2))",
            "      Code \"b--\" (post-- b)",
            "  Line \"p= b\"",
            "    LineData \"p= b\"",
            "      Tag \"p\"",
            "      TagTrailingEq \"=\"",
            "      OutputEscaped \"b\" b",
        ])
    );
}

#[test]
fn test_code_block_with_crlf_continuation() {
    let dump = describe("-\r\n  var x = 1 +\r\n    2\r\n  x++\r\np= x");
    assert!(dump.contains("(= (var x) (+ 1 2))"), "{dump}");
    assert!(dump.contains("(post++ x)"), "{dump}");
    assert!(dump.contains("OutputEscaped \"x\" x"), "{dump}");
}

#[test]
fn test_doctype_include_and_mixins() {
    assert_eq!(
        describe("doctype html\ninclude header.pug\ndoctype\nmixin greet(name, greeting=\"Hi\")\n  p= greeting\n+greet(\"Ann\")"),
        lines(&[
            "Root",
            "  Doctype \"html\"",
            "  Include \"header.pug\"",
            "  Doctype",
            "  ControlMixin \"mixin greet(name, greeting=\\\"Hi\\\")\" (call greet (, name (= greeting \"Hi\")))",
            "    Line \"p= greeting\"",
            "      LineData \"p= greeting\"",
            "        Tag \"p\"",
            "        TagTrailingEq \"=\"",
            "        OutputEscaped \"greeting\" greeting",
            "  Line \"+greet(\\\"Ann\\\")\"",
            "    MixinCall \"greet\"",
            "      MixinArgs \"(\\\"Ann\\\")\" \"Ann\"",
        ])
    );
}

#[test]
fn test_tabs_and_spaces_lex_alike() {
    let tabs = describe("ul\n\tli\n\t\ta one\n\tli two");
    let spaces = describe("ul\n    li\n        a one\n    li two");
    assert_eq!(tabs, spaces);
}

#[test]
fn test_blank_lines_are_skipped() {
    let tree = lex("div\n\n   \n  p\n").unwrap();
    let div = tree.children(TokenId::ROOT).next().unwrap();
    assert_eq!(tree.children(div).count(), 2);
}

#[test]
fn test_indentation_errors() {
    assert_eq!(error("div\n  p\n      span").message(), "Wrong indentation markup");
    assert_eq!(error("  p").message(), "Wrong indentation markup");
    assert_eq!(error("div\n\tp\n  span").message(), "Inconsistent indentation");
    assert_eq!(error("div\n \tp").message(), "Inconsistent indentation");
}

#[test]
fn test_line_errors() {
    assert_eq!(error("div\n  ?x").message(), "Fail to recognize line type");
    assert_eq!(error("else foo").message(), "Invalid 'else' line");
    assert_eq!(error("default x").message(), "Invalid 'default' line");
    assert_eq!(error("br/ text").message(), "Data after endline tag");
    assert_eq!(
        error("= a b").message(),
        "Invalid expression after output expression block"
    );
    assert_eq!(error("each in x").message(), "Invalid 'each' statement");
    assert_eq!(error("mixin 1 + 2").message(), "Invalid mixin definition");
    assert_eq!(error("p #{a").message(), "Invalid interpolation expression");
    assert_eq!(error("a(href=x").message(), "Invalid attribute list");
    assert_eq!(error("a(href x=1").message(), "Invalid attribute list");
}

#[test]
fn test_expression_error_points_into_line() {
    let error = error("div\n  p(class=)\n");
    assert_eq!(error.offset, 14);
    assert_eq!(error.message(), "Invalid attribute value: expected an operand");
    let text = error.to_string();
    assert!(text.starts_with("-> 2:   p(class=)\n"), "{text}");
    assert!(text.ends_with("^\nLexer error: Invalid attribute value: expected an operand"));
}

#[test]
fn test_lex_with_reports_once() {
    let mut reported = Vec::new();
    let result = lex_with("div\n  ?x", &mut |message: &str| reported.push(message.to_owned()));
    assert!(result.is_err());
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains("Lexer error: Fail to recognize line type"));
}
