//! Native functions installed by [`Context::load_defaults`].

use spug_ir::Value;

use crate::context::Context;
use crate::var::Call;

/// Characters `encodeURIComponent` leaves alone besides the unreserved set.
const COMPONENT_MARKS: &str = "!*'()";

/// Characters `encodeURI` leaves alone besides the unreserved set.
const URI_MARKS: &str = "!*'()#;,/?:@&=+$";

pub(crate) fn load(ctx: &mut Context<'_>) {
    ctx.set_fn("encodeURI", |call| Ok(encode_arg(call, URI_MARKS)));
    ctx.set_fn("encodeURIComponent", |call| {
        Ok(encode_arg(call, COMPONENT_MARKS))
    });
}

/// Percent-encode the single string argument; anything else is null.
fn encode_arg(call: &Call<'_>, marks: &str) -> Value {
    match call.args {
        [Value::Str(text)] => Value::Str(encode_keeping(text, marks)),
        _ => Value::Null,
    }
}

fn encode_keeping(text: &str, marks: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(|c| marks.contains(c)) {
        out.push_str(&urlencoding::encode(&rest[..at]));
        // Marks are ASCII.
        out.push_str(&rest[at..=at]);
        rest = &rest[at + 1..];
    }
    out.push_str(&urlencoding::encode(rest));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_component() {
        assert_eq!(
            encode_keeping("a b&c=d/é(x)!", COMPONENT_MARKS),
            "a%20b%26c%3Dd%2F%C3%A9(x)!"
        );
    }

    #[test]
    fn test_encode_uri_keeps_reserved() {
        assert_eq!(
            encode_keeping("http://x.org/a b?q=1&r=<2>#top", URI_MARKS),
            "http://x.org/a%20b?q=1&r=%3C2%3E#top"
        );
    }

    #[test]
    fn test_non_string_argument_is_null() {
        let args = [Value::Int(1)];
        let call = Call {
            this: None,
            args: &args,
        };
        assert_eq!(encode_arg(&call, URI_MARKS), Value::Null);
    }
}
