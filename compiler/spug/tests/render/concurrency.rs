use pretty_assertions::assert_eq;
use rayon::prelude::*;
use spug::{Context, Value};

use crate::common::compile;

#[test]
fn test_shared_template_renders_in_parallel() {
    let template = compile("ul\n  each n in items\n    li= n * factor");
    let outputs: Vec<(i64, String)> = (0..64_i64)
        .into_par_iter()
        .map(|factor| {
            let items = Value::from(vec![Value::from(1), Value::from(2)]);
            let mut ctx = Context::new();
            ctx.set_ref("items", &items);
            ctx.set("factor", factor);
            (factor, template.render(&mut ctx).unwrap())
        })
        .collect();

    for (factor, output) in outputs {
        assert_eq!(
            output,
            format!("<ul><li>{}</li><li>{}</li></ul>", factor, factor * 2)
        );
    }
}

#[test]
fn test_clones_share_the_compiled_tree() {
    let template = compile("p= x");
    let copy = template.clone();
    assert!(std::sync::Arc::ptr_eq(template.tree(), copy.tree()));

    let handle = std::thread::spawn(move || {
        let mut ctx = Context::new();
        ctx.set("x", "thread");
        copy.render(&mut ctx).unwrap()
    });
    assert_eq!(handle.join().unwrap(), "<p>thread</p>");
}
