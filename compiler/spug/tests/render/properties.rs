use pretty_assertions::assert_eq;
use proptest::prelude::*;
use spug::{Context, Template, TemplateOptions};

use crate::common::{compile, render, render_with};

fn escaped(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[test]
fn test_tabs_and_spaces_compile_alike() {
    let spaces = "ul\n  each x in items\n    li\n      if x\n        b= x\n      else\n        | none\n";
    let tabs = spaces.replace("  ", "\t");
    assert_eq!(
        compile(spaces).tree().describe(false),
        compile(&tabs).tree().describe(false)
    );
}

#[test]
fn test_lexer_errors_carry_a_location() {
    let error = Template::compile("div\n  p\n      span", &TemplateOptions::default()).unwrap_err();
    assert_eq!(error.message(), "Wrong indentation markup");
    assert_eq!(error.diagnostic().location.as_ref().unwrap().line, 3);
}

proptest! {
    #[test]
    fn prop_folded_constants_render_like_variables(a in -1000_i64..1000, b in -1000_i64..1000) {
        let folded = format!("p= {a} + {b} * 2");
        let template = compile(&folded);
        prop_assert!(!template.describe().contains("Output"));

        let mut ctx = Context::new();
        ctx.set("a", a);
        let dynamic = render_with(&format!("p= a + {b} * 2"), &mut ctx);
        prop_assert_eq!(render(&folded), dynamic);
    }

    #[test]
    fn prop_output_is_escaped(text in "[ -~]{0,40}") {
        let mut ctx = Context::new();
        ctx.set("text", text.as_str());
        prop_assert_eq!(
            render_with("p= text", &mut ctx),
            format!("<p>{}</p>", escaped(&text))
        );
    }
}
