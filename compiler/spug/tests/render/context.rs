use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use spug::{Context, RenderError, Template, TemplateOptions, Value, VarClass};

use crate::common::{compile, error_comment, render, render_with};

#[test]
fn test_unknown_variable_is_reported_inline() {
    assert_eq!(
        render("p= missing\np after"),
        format!(
            "<p>{}</p><p>after</p>",
            error_comment("Invalid variable name: missing")
        )
    );
}

#[test]
fn test_error_callback_keeps_output_clean() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut ctx = Context::new();
    ctx.set_error_callback(move |message| sink.borrow_mut().push(message.to_owned()));
    assert_eq!(render_with("p= missing", &mut ctx), "<p></p>");
    assert_eq!(
        *seen.borrow(),
        ["Context error: Invalid variable name: missing"]
    );
}

#[test]
fn test_stop_on_error() {
    let template = Template::compile(
        "p before\np= missing\np after",
        &TemplateOptions::new().stop_on_error(true),
    )
    .unwrap();
    let mut out = String::new();
    let error = template.run(&mut Context::new(), &mut out).unwrap_err();
    let RenderError::Stopped(message) = error else {
        panic!("expected a stopped render, got {error:?}");
    };
    assert_eq!(message, "Context error: Invalid variable name: missing");
    assert!(out.starts_with("<p>before</p><p>"));
    assert!(!out.contains("after"));
}

#[test]
fn test_step_limit_is_reported_once() {
    let mut ctx = Context::new();
    ctx.set_step_limit(Some(10));
    let output = render_with("- var i = 0\nwhile true\n  - i++", &mut ctx);
    assert_eq!(output, error_comment("Step limit exceeded"));
}

#[test]
fn test_host_data_is_read_by_reference() {
    let user: Value = [("name", Value::from("Ann")), ("age", Value::from(30))]
        .into_iter()
        .collect();
    let mut ctx = Context::new();
    ctx.set_ref("user", &user);
    assert_eq!(
        render_with("p #{user.name} (#{user.age})", &mut ctx),
        "<p>Ann (30)</p>"
    );
    assert_eq!(
        render_with("- user.name = 'Bob'", &mut ctx),
        error_comment("Assignment to a read-only value")
    );
}

#[test]
fn test_mutable_host_data_is_written_through() {
    let mut data: Value = [("count", Value::from(1))].into_iter().collect();
    {
        let mut ctx = Context::new();
        ctx.set_mut("data", &mut data);
        assert_eq!(
            render_with("- data.count += 1\n- data.label = 'two'", &mut ctx),
            ""
        );
    }
    assert_eq!(data.get("count"), Some(&Value::from(2)));
    assert_eq!(data.get("label"), Some(&Value::from("two")));
}

#[test]
fn test_native_functions_and_classes() {
    let mut ctx = Context::new();
    ctx.set_fn("upper", |call| match call.arg(0) {
        Some(Value::Str(text)) => Ok(Value::from(text.to_uppercase())),
        _ => Err("upper expects a string".to_owned()),
    });
    ctx.set_class(
        "Math",
        VarClass::new("Math").with_static("max", |call| {
            Ok(call
                .args
                .iter()
                .map(Value::as_int)
                .max()
                .map_or(Value::Null, Value::from))
        }),
    );
    assert_eq!(
        render_with("p= upper('a')\np= Math.max(3, 9, 4)", &mut ctx),
        "<p>A</p><p>9</p>"
    );
    assert_eq!(
        render_with("p= upper(1)", &mut ctx),
        format!("<p>{}</p>", error_comment("upper expects a string"))
    );
}

#[test]
fn test_default_functions() {
    let mut ctx = Context::new();
    ctx.load_defaults();
    ctx.set("s", "a b&c");
    assert_eq!(
        render_with("a(href='/q?s=' + encodeURIComponent(s))", &mut ctx),
        r#"<a href="/q?s=a%20b%26c"></a>"#
    );
}

fn include_parts(ctx: &mut Context<'_>, options: TemplateOptions) {
    ctx.set_include_callback(move |name, ctx, out, _| {
        let source = match name {
            "footer" => "p footer",
            "list" => "p a\np b",
            _ => return false,
        };
        Template::compile(source, &options)
            .is_ok_and(|part| part.run(ctx, out).is_ok())
    });
}

#[test]
fn test_includes() {
    let template = compile("div\n  include footer\ninclude nope");
    assert_eq!(template.includes(), ["footer", "nope"]);

    let mut ctx = Context::new();
    include_parts(&mut ctx, TemplateOptions::default());
    assert_eq!(
        template.render(&mut ctx).unwrap(),
        "<div><p>footer</p></div><!-- fail to include nope -->"
    );
}

#[test]
fn test_includes_without_callback_fail() {
    assert_eq!(render("include footer"), "<!-- fail to include footer -->");
}

#[test]
fn test_pretty_includes_are_reindented() {
    let options = TemplateOptions::new().pretty(true);
    let template = Template::compile("div\n  include list", &options).unwrap();
    let mut ctx = Context::new();
    include_parts(&mut ctx, options);
    assert_eq!(
        template.render(&mut ctx).unwrap(),
        "<div>\n\t<p>a</p>\n\t<p>b</p>\n</div>"
    );
}

#[test]
fn test_included_templates_share_the_context() {
    let template = compile("- var title = 'Home'\ninclude footer");
    let mut ctx = Context::new();
    ctx.set_include_callback(|_, ctx, out, _| {
        Template::compile("p= title", &TemplateOptions::default())
            .is_ok_and(|part| part.run(ctx, out).is_ok())
    });
    assert_eq!(template.render(&mut ctx).unwrap(), "<p>Home</p>");
}
