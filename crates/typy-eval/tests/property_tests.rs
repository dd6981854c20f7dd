//! Property tests for arithmetic and string slicing.

use proptest::prelude::*;
use typy_eval::{execute, FaultKind, Value};
use typy_types::ast::{Expr, Module, TypeKind};
use typy_types::build::*;

/// Evaluate `expr` by printing it from a one-statement module.
fn eval_printed(expr: Expr) -> String {
    let outcome = execute(&module(vec![print(expr).into()]));
    assert!(outcome.is_completed(), "fault: {:?}", outcome.fault());
    outcome.output()[0].clone()
}

fn lit(n: i64) -> Expr {
    if n < 0 {
        neg(int(n.unsigned_abs() as i64))
    } else {
        int(n)
    }
}

fn isqrt_program(n: i64) -> Module {
    module(vec![
        function(
            "isqrt",
            vec![param("n", TypeKind::Int)],
            Some(TypeKind::Int),
            vec![
                declare("x", TypeKind::Int, var("n")),
                declare("y", TypeKind::Int, floordiv(add(var("x"), int(1)), int(2))),
                while_loop(
                    lt(var("y"), var("x")),
                    vec![
                        assign("x", var("y")),
                        assign(
                            "y",
                            floordiv(add(var("x"), floordiv(var("n"), var("x"))), int(2)),
                        ),
                    ],
                ),
                ret(var("x")),
            ],
        )
        .into(),
        declare("r", TypeKind::Int, call("isqrt", vec![int(n)])).into(),
        print(var("r")).into(),
    ])
}

proptest! {
    #[test]
    fn floordiv_rounds_toward_negative_infinity(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        let q: i64 = eval_printed(floordiv(lit(a), lit(b))).parse().unwrap();
        let r: i64 = eval_printed(modulo(lit(a), lit(b))).parse().unwrap();
        prop_assert_eq!(q * b + r, a);
        prop_assert_eq!(q, (a as f64 / b as f64).floor() as i64);
        // the remainder takes the divisor's sign
        prop_assert!(r == 0 || (r < 0) == (b < 0));
        prop_assert!(r.abs() < b.abs());
    }

    #[test]
    fn division_by_zero_always_faults(a in any::<i32>()) {
        let outcome = execute(&module(vec![print(floordiv(lit(a as i64), int(0))).into()]));
        prop_assert_eq!(outcome.fault().map(|f| f.kind), Some(FaultKind::DivisionByZero));
    }

    #[test]
    fn newton_isqrt_brackets_the_root(n in 1i64..10_000_000) {
        let outcome = execute(&isqrt_program(n));
        prop_assert!(outcome.is_completed());
        let r: i64 = outcome.output()[0].parse().unwrap();
        prop_assert!(r * r <= n);
        prop_assert!(n < (r + 1) * (r + 1));
    }

    #[test]
    fn full_slice_round_trips(s in "[a-zA-Z0-9 !é]{0,24}") {
        let printed = eval_printed(slice(
            string(&s),
            Some(int(0)),
            Some(len(string(&s))),
            Some(int(1)),
        ));
        prop_assert_eq!(printed, s);
    }

    #[test]
    fn stride_slicing_keeps_every_second_char(s in "[a-z0-9 ]{0,24}") {
        let explicit = eval_printed(slice(string(&s), Some(int(0)), Some(len(string(&s))), Some(int(2))));
        let implicit = eval_printed(slice(string(&s), None, None, Some(int(2))));
        let expected: String = s.chars().step_by(2).collect();
        prop_assert_eq!(&explicit, &expected);
        prop_assert_eq!(&implicit, &expected);
    }

    #[test]
    fn negative_index_mirrors_positive(s in "[a-z]{1,16}", i in 0usize..16) {
        prop_assume!(i < s.len());
        let from_start = eval_printed(index(string(&s), int(i as i64)));
        let from_end = eval_printed(index(string(&s), lit(i as i64 - s.len() as i64)));
        prop_assert_eq!(from_start, from_end);
    }
}

#[test]
fn value_equality_is_not_identity_for_ints() {
    assert!(Value::int(3).py_eq(&Value::int(3)));
    assert!(!Value::int(3).is_identical(&Value::int(3)));
}
