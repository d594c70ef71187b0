//! Comparison and arithmetic operators
//!
//! Comparisons go through [`SortValue`] so that `=` agrees with grouping and
//! ordering: `1 = 1.0`, `'a' = 'A '` and `TRUE = 1` all hold. Any NULL operand
//! makes the result UNKNOWN.

use std::mem::discriminant;

use tabview_ast::{ArithmeticOperator, ComparisonOperator, Expression};
use tabview_types::{to_float, to_integer_strictly, Ternary, Value};

use crate::{
    compare::SortValue,
    config::ExecutorConfig,
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

pub(super) fn comparison(
    scope: &ReferenceScope<'_>,
    op: ComparisonOperator,
    left: &Expression,
    right: &Expression,
) -> Result<Ternary> {
    match (left, right) {
        (Expression::RowValue(l), Expression::RowValue(r)) => {
            if l.len() != r.len() {
                return Err(ExecutorError::RowValueLengthInComparison { expected: l.len(), actual: r.len() });
            }
            let lv = evaluate_all(scope, l)?;
            let rv = evaluate_all(scope, r)?;
            Ok(compare_rows(&lv, &rv, op, scope.config()))
        }
        (Expression::RowValue(l), _) | (_, Expression::RowValue(l)) => {
            Err(ExecutorError::RowValueLengthInComparison { expected: l.len(), actual: 1 })
        }
        _ => {
            let l = scope.evaluate(left)?;
            let r = scope.evaluate(right)?;
            Ok(compare_values(&l, &r, op, scope.config()))
        }
    }
}

/// `expr IN (list)`: TRUE on any match, UNKNOWN when no match was found but
/// some comparison was UNKNOWN.
pub(super) fn in_list(scope: &ReferenceScope<'_>, expr: &Expression, list: &[Expression]) -> Result<Ternary> {
    let mut result = Ternary::False;
    match expr {
        Expression::RowValue(items) => {
            let lv = evaluate_all(scope, items)?;
            for candidate in list {
                let Expression::RowValue(candidate) = candidate else {
                    return Err(ExecutorError::RowValueLengthInComparison { expected: items.len(), actual: 1 });
                };
                if candidate.len() != items.len() {
                    return Err(ExecutorError::RowValueLengthInComparison {
                        expected: items.len(),
                        actual: candidate.len(),
                    });
                }
                let rv = evaluate_all(scope, candidate)?;
                result = result.or(compare_rows(&lv, &rv, ComparisonOperator::Equal, scope.config()));
                if result == Ternary::True {
                    break;
                }
            }
        }
        _ => {
            let value = scope.evaluate(expr)?;
            for candidate in list {
                let candidate = scope.evaluate(candidate)?;
                result = result.or(compare_values(&value, &candidate, ComparisonOperator::Equal, scope.config()));
                if result == Ternary::True {
                    break;
                }
            }
        }
    }
    Ok(result)
}

fn evaluate_all(scope: &ReferenceScope<'_>, exprs: &[Expression]) -> Result<Vec<Value>> {
    exprs.iter().map(|e| scope.evaluate(e)).collect()
}

/// Compare two primary values.
pub fn compare_values(a: &Value, b: &Value, op: ComparisonOperator, config: &ExecutorConfig) -> Ternary {
    if a.is_null() || b.is_null() {
        return Ternary::Unknown;
    }
    let sa = SortValue::new(a, config);
    let sb = SortValue::new(b, config);
    if sa.is_null() || sb.is_null() {
        return Ternary::Unknown;
    }

    let equal = sa.equivalent_to(&sb);
    match op {
        ComparisonOperator::Equal => equality(&sa, &sb, equal),
        ComparisonOperator::NotEqual => equality(&sa, &sb, equal).not(),
        ComparisonOperator::LessThan => if equal { Ternary::False } else { sa.less(&sb) },
        ComparisonOperator::LessThanOrEqual => if equal { Ternary::True } else { sa.less(&sb) },
        ComparisonOperator::GreaterThan => if equal { Ternary::False } else { sb.less(&sa) },
        ComparisonOperator::GreaterThanOrEqual => if equal { Ternary::True } else { sb.less(&sa) },
    }
}

fn equality(a: &SortValue, b: &SortValue, equal: bool) -> Ternary {
    if equal {
        return Ternary::True;
    }
    let comparable = discriminant(a.kind()) == discriminant(b.kind())
        || a.less(b) != Ternary::Unknown
        || b.less(a) != Ternary::Unknown;
    if comparable {
        Ternary::False
    } else {
        Ternary::Unknown
    }
}

/// Lexicographic row comparison; the first non-equal pair decides.
fn compare_rows(a: &[Value], b: &[Value], op: ComparisonOperator, config: &ExecutorConfig) -> Ternary {
    match op {
        ComparisonOperator::Equal | ComparisonOperator::NotEqual => {
            let all_equal = a
                .iter()
                .zip(b)
                .fold(Ternary::True, |acc, (x, y)| acc.and(compare_values(x, y, ComparisonOperator::Equal, config)));
            if op == ComparisonOperator::Equal {
                all_equal
            } else {
                all_equal.not()
            }
        }
        _ => {
            for (x, y) in a.iter().zip(b) {
                match compare_values(x, y, ComparisonOperator::Equal, config) {
                    Ternary::True => continue,
                    _ => return compare_values(x, y, op, config),
                }
            }
            Ternary::from(matches!(
                op,
                ComparisonOperator::LessThanOrEqual | ComparisonOperator::GreaterThanOrEqual
            ))
        }
    }
}

/// Numeric operation on two values.
///
/// Integer operands stay integers while the result is exact; everything else
/// is computed in floating point. A non-numeric or NULL operand yields NULL.
pub fn arithmetic(op: ArithmeticOperator, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }

    if let (Some(x), Some(y)) = (to_integer_strictly(a), to_integer_strictly(b)) {
        let exact = match op {
            ArithmeticOperator::Plus => x.checked_add(y),
            ArithmeticOperator::Minus => x.checked_sub(y),
            ArithmeticOperator::Multiply => x.checked_mul(y),
            ArithmeticOperator::Divide => {
                if y == 0 {
                    return Err(ExecutorError::IntegerDividedByZero);
                }
                if x.checked_rem(y) == Some(0) {
                    x.checked_div(y)
                } else {
                    return Ok(Value::Float(x as f64 / y as f64));
                }
            }
            ArithmeticOperator::Modulo => {
                if y == 0 {
                    return Err(ExecutorError::IntegerDividedByZero);
                }
                x.checked_rem(y)
            }
        };
        if let Some(i) = exact {
            return Ok(Value::Integer(i));
        }
    }

    let (Some(x), Some(y)) = (to_float(a), to_float(b)) else {
        return Ok(Value::Null);
    };
    let f = match op {
        ArithmeticOperator::Plus => x + y,
        ArithmeticOperator::Minus => x - y,
        ArithmeticOperator::Multiply => x * y,
        ArithmeticOperator::Divide => x / y,
        ArithmeticOperator::Modulo => x % y,
    };
    Ok(Value::Float(f))
}
