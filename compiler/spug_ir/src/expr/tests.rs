use super::*;
use pretty_assertions::assert_eq;

fn binary(arena: &mut ExprArena, op: Op, left: Expr, right: Expr) -> ExprId {
    let left = arena.alloc(left);
    let right = arena.alloc(right);
    arena.alloc(Expr::node(op, Some(left), Some(right)))
}

#[test]
fn test_priority_table_orders_families() {
    assert!(Op::Dot.priority() < Op::Neg.priority());
    assert!(Op::Mult.priority() < Op::Sum.priority());
    assert!(Op::Sum.priority() < Op::ShiftLeft.priority());
    assert!(Op::Eq.priority() < Op::BitAnd.priority());
    assert!(Op::And.priority() < Op::Or.priority());
    assert!(Op::Or.priority() < Op::Conditional.priority());
    assert!(Op::ConditionalSwitch.priority() < Op::Assignment.priority());
    assert!(Op::Colon.priority() < Op::Comma.priority());
    assert_eq!(Op::Sequence.priority(), 18);
}

#[test]
fn test_all_is_in_declaration_order() {
    for (index, op) in Op::ALL.iter().enumerate() {
        assert_eq!(*op as usize, index);
    }
}

#[test]
fn test_associativity() {
    assert!(Op::Assignment.is_right_assoc());
    assert!(Op::OrAssignment.is_right_assoc());
    assert!(Op::ConditionalSwitch.is_right_assoc());
    assert!(!Op::Sub.is_right_assoc());
    assert!(!Op::Comma.is_right_assoc());
}

#[test]
fn test_literal_arithmetic_is_const() {
    let mut arena = ExprArena::new();
    let id = binary(&mut arena, Op::Sum, Expr::literal(1), Expr::literal("a"));
    assert!(arena.is_const(id));
}

#[test]
fn test_identifier_is_not_const() {
    let mut arena = ExprArena::new();
    let id = binary(&mut arena, Op::Sum, Expr::literal(1), Expr::token("x"));
    assert!(!arena.is_const(id));
}

#[test]
fn test_dictionary_key_is_const() {
    let mut arena = ExprArena::new();
    let pair = binary(&mut arena, Op::Colon, Expr::token("key"), Expr::literal("v"));
    assert!(arena.is_const(pair));

    let mut arena = ExprArena::new();
    let pair = binary(&mut arena, Op::Colon, Expr::token("key"), Expr::token("v"));
    assert!(!arena.is_const(pair));
}

#[test]
fn test_call_is_never_const() {
    let mut arena = ExprArena::new();
    let callee = arena.alloc(Expr::literal("f"));
    let args = arena.alloc(Expr::literal(1));
    let call = arena.alloc(Expr::node(Op::Call, Some(callee), Some(args)));
    assert!(!arena.is_const(call));
}

#[test]
fn test_dump() {
    let mut arena = ExprArena::new();
    let product = binary(&mut arena, Op::Mult, Expr::token("b"), Expr::literal(2.0));
    let a = arena.alloc(Expr::token("a"));
    let sum = arena.alloc(Expr::node(Op::Sum, Some(a), Some(product)));
    assert_eq!(arena.dump(sum), "(+ a (* b 2.0))");

    let text = arena.alloc(Expr::literal("x\"y"));
    assert_eq!(arena.dump(text), r#""x\"y""#);
}

#[test]
fn test_truncate_discards_nodes() {
    let mut arena = ExprArena::new();
    arena.alloc(Expr::literal(1));
    let mark = arena.len();
    arena.alloc(Expr::literal(2));
    arena.truncate(mark);
    assert_eq!(arena.len(), 1);
}
