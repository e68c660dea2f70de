//! Rewrites shared by every dialect.

use super::temporal;
use super::Result;
use crate::ast::{BinaryOperator, SqlExpression, SqlFunction};
use crate::dialect::{Dialect, Feature};

/// Lowering applied by [`Dialect::lower`] unless a dialect overrides it.
///
/// Rewrites `Square`, `DateTimeConstruct` and `DateTimeToDateTimeOffset`
/// into other canonical functions, folds `IN` over an empty list into a
/// constant predicate, and turns inline arrays into row constructors for
/// engines without array literals.
pub fn standard<D: Dialect + ?Sized>(
    dialect: &D,
    expression: &SqlExpression,
) -> Result<Option<SqlExpression>> {
    Ok(match expression {
        SqlExpression::Function { function, args } => match (function, args.as_slice()) {
            (SqlFunction::Square, [value]) => Some(SqlExpression::function(
                SqlFunction::Power,
                vec![value.clone(), SqlExpression::literal(2)],
            )),
            (SqlFunction::DateTimeConstruct, [year, month, day]) => Some(
                temporal::date_construct(year.clone(), month.clone(), day.clone()),
            ),
            (SqlFunction::DateTimeToDateTimeOffset, [value, offset]) => {
                Some(SqlExpression::function(
                    SqlFunction::DateTimeOffsetConstruct,
                    vec![value.clone(), offset.clone()],
                ))
            }
            _ => None,
        },
        SqlExpression::Binary { op, left, right }
            if matches!(op, BinaryOperator::In | BinaryOperator::NotIn) =>
        {
            in_list(dialect, *op, left, right)
        }
        _ => None,
    })
}

fn in_list<D: Dialect + ?Sized>(
    dialect: &D,
    op: BinaryOperator,
    left: &SqlExpression,
    right: &SqlExpression,
) -> Option<SqlExpression> {
    let empty = match right {
        SqlExpression::Array(items) => items.is_empty(),
        SqlExpression::Row(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        // x IN () is false, x NOT IN () is true
        let rhs = if op == BinaryOperator::In { 0 } else { 1 };
        return Some(SqlExpression::literal(1).eq(SqlExpression::literal(rhs)));
    }
    match right {
        SqlExpression::Array(items) if !dialect.supports(Feature::ArrayLiteral) => {
            Some(SqlExpression::binary(
                op,
                left.clone(),
                SqlExpression::Row(items.iter().cloned().map(SqlExpression::Literal).collect()),
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SqlLiteral;
    use crate::dialect::GenericDialect;

    #[test]
    fn test_square_becomes_power() {
        let dialect = GenericDialect::new();
        let square = SqlExpression::function(SqlFunction::Square, vec![SqlExpression::column("x")]);
        let lowered = standard(&dialect, &square).unwrap().unwrap();
        assert_eq!(
            lowered,
            SqlExpression::function(
                SqlFunction::Power,
                vec![SqlExpression::column("x"), SqlExpression::literal(2)]
            )
        );
    }

    #[test]
    fn test_empty_in_folds() {
        let dialect = GenericDialect::new();
        let empty_in = SqlExpression::column("x").in_array(Vec::new());
        assert_eq!(
            standard(&dialect, &empty_in).unwrap(),
            Some(SqlExpression::literal(1).eq(SqlExpression::literal(0)))
        );
        let empty_not_in = SqlExpression::column("x").not_in_array(Vec::new());
        assert_eq!(
            standard(&dialect, &empty_not_in).unwrap(),
            Some(SqlExpression::literal(1).eq(SqlExpression::literal(1)))
        );
    }

    #[test]
    fn test_array_becomes_row_without_array_literals() {
        let dialect = GenericDialect::new();
        let test = SqlExpression::column("x").in_array(vec![SqlLiteral::Integer(1)]);
        let lowered = standard(&dialect, &test).unwrap().unwrap();
        assert!(matches!(
            lowered,
            SqlExpression::Binary { right, .. } if matches!(*right, SqlExpression::Row(ref items) if items.len() == 1)
        ));
    }

    #[test]
    fn test_plain_nodes_are_untouched() {
        let dialect = GenericDialect::new();
        assert_eq!(standard(&dialect, &SqlExpression::column("x")).unwrap(), None);
    }
}
