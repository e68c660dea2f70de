//! Expression rendering.

use core::fmt::Write as _;
use core::ops::RangeInclusive;

use super::{plain_text, CompileError, CompilerContext, Result};
use crate::ast::{
    Accept, BinaryOperator, SqlCaseBranch, SqlExpression, SqlFunction, SqlLiteral,
};
use crate::model::QualifiedName;

/// Binding strength of an atom: never parenthesized.
const ATOM: u8 = u8::MAX;
/// Comparisons and postfix null tests.
const COMPARISON: u8 = 6;
/// Operands of BETWEEN bind tighter than comparisons.
const BETWEEN_OPERAND: u8 = 7;

fn precedence(expression: &SqlExpression) -> u8 {
    match expression {
        SqlExpression::Binary { op, .. } => op.precedence(),
        SqlExpression::Unary { op, .. } => op.precedence(),
        SqlExpression::Between { .. } => COMPARISON,
        _ => ATOM,
    }
}

fn describe_arity(range: &RangeInclusive<usize>) -> String {
    match (*range.start(), *range.end()) {
        (min, max) if min == max => min.to_string(),
        (min, usize::MAX) => format!("at least {min}"),
        (min, max) => format!("{min} to {max}"),
    }
}

fn wrap(text: String) -> String {
    format!("({text})")
}

impl CompilerContext<'_> {
    pub(super) fn expression(&mut self, expression: &SqlExpression) -> Result<String> {
        if let SqlExpression::Function { function, args } = expression {
            let arity = function.arity();
            if !arity.contains(&args.len()) {
                return Err(CompileError::InvalidArgumentCount {
                    function: function.as_str(),
                    expected: describe_arity(&arity),
                    actual: args.len(),
                });
            }
        }
        if let Some(lowered) = self.dialect.lower(expression)? {
            return self.expression(&lowered);
        }
        match expression {
            SqlExpression::Literal(value) => self.dialect.literal(value),
            SqlExpression::Column(column) => {
                let name = self.dialect.quote_identifier(plain_text(&column.name)?);
                match column.table {
                    None => Ok(name),
                    Some(id) => self.qualifier(id).map_or_else(
                        || {
                            Err(CompileError::UnboundTableReference {
                                column: column.name.clone(),
                            })
                        },
                        |qualifier| Ok(format!("{qualifier}.{name}")),
                    ),
                }
            }
            SqlExpression::Asterisk(None) => Ok("*".to_string()),
            SqlExpression::Asterisk(Some(id)) => self.qualifier(*id).map_or_else(
                || {
                    Err(CompileError::UnboundTableReference {
                        column: "*".to_string(),
                    })
                },
                |qualifier| Ok(format!("{qualifier}.*")),
            ),
            SqlExpression::Parameter(parameter) => Ok(self.parameter(parameter)),
            SqlExpression::Unary { op, operand } => {
                use crate::ast::UnaryOperator as U;
                let parent = op.precedence();
                let text = self.operand(operand, parent, false, None)?;
                Ok(match op {
                    U::Not => format!("NOT {text}"),
                    U::Negate if text.starts_with('-') => format!("-({text})"),
                    U::Negate => format!("-{text}"),
                    U::BitNot => format!("~{text}"),
                    U::IsNull => format!("{text} IS NULL"),
                    U::IsNotNull => format!("{text} IS NOT NULL"),
                })
            }
            SqlExpression::Binary { op, left, right } => self.binary(*op, left, right),
            SqlExpression::Between {
                operand,
                low,
                high,
                negated,
            } => {
                let operand = self.operand(operand, BETWEEN_OPERAND, false, None)?;
                let low = self.operand(low, BETWEEN_OPERAND, false, None)?;
                let high = self.operand(high, BETWEEN_OPERAND, false, None)?;
                let not = if *negated { "NOT " } else { "" };
                Ok(format!("{operand} {not}BETWEEN {low} AND {high}"))
            }
            SqlExpression::Function { function, args } => self.function(*function, args),
            SqlExpression::UserFunction { name, args } => {
                let name = plain_text(name)?;
                let args = self.list(args)?;
                Ok(format!("{name}({})", args.join(", ")))
            }
            SqlExpression::Aggregate {
                function,
                distinct,
                argument,
            } => {
                let argument = match argument {
                    Some(argument) => self.expression(argument)?,
                    None => "*".to_string(),
                };
                let distinct = if *distinct { "DISTINCT " } else { "" };
                Ok(format!("{}({distinct}{argument})", function.as_str()))
            }
            SqlExpression::Cast { operand, target } => {
                let operand = self.expression(operand)?;
                self.dialect.cast(&operand, target)
            }
            SqlExpression::Extract { part, operand } => {
                let operand = self.expression(operand)?;
                self.dialect.extract(*part, &operand)
            }
            SqlExpression::Case {
                operand,
                branches,
                otherwise,
            } => self.case(operand.as_deref(), branches, otherwise.as_deref()),
            SqlExpression::Row(items) => {
                if items.is_empty() {
                    return Err(CompileError::InvalidNode("empty row constructor".to_string()));
                }
                Ok(wrap(self.list(items)?.join(", ")))
            }
            SqlExpression::Array(_) => Err(CompileError::unsupported(
                self.dialect.name(),
                "an array outside of IN",
            )),
            SqlExpression::Subquery(select) => Ok(wrap(select.accept(self)?)),
            SqlExpression::Exists(select) => Ok(format!("EXISTS ({})", select.accept(self)?)),
            SqlExpression::Native(text) => Ok(plain_text(text)?.to_string()),
            SqlExpression::Default => Ok("DEFAULT".to_string()),
        }
    }

    fn list(&mut self, items: &[SqlExpression]) -> Result<Vec<String>> {
        items.iter().map(|item| self.expression(item)).collect()
    }

    /// Renders an operand, parenthesizing it when it binds looser than its
    /// parent. `parent_op` is set for binary parents so that right-hand
    /// operands of non-associative operators keep their grouping.
    fn operand(
        &mut self,
        operand: &SqlExpression,
        parent: u8,
        right_side: bool,
        parent_op: Option<BinaryOperator>,
    ) -> Result<String> {
        let child = precedence(operand);
        let text = self.expression(operand)?;
        let same_associative = match (parent_op, operand) {
            (Some(parent_op), SqlExpression::Binary { op, .. }) => {
                *op == parent_op && parent_op.is_associative()
            }
            _ => false,
        };
        let needs_parens = child < parent
            || (right_side && child == parent && !same_associative)
            || (child == COMPARISON && parent == COMPARISON);
        Ok(if needs_parens { wrap(text) } else { text })
    }

    fn binary(
        &mut self,
        op: BinaryOperator,
        left: &SqlExpression,
        right: &SqlExpression,
    ) -> Result<String> {
        let parent = op.precedence();
        let left_text = self.operand(left, parent, false, Some(op))?;
        if matches!(op, BinaryOperator::In | BinaryOperator::NotIn) {
            let negated = op == BinaryOperator::NotIn;
            return match right {
                SqlExpression::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| self.dialect.literal(item))
                        .collect::<Result<Vec<_>>>()?;
                    self.dialect.in_array(&left_text, &items, negated)
                }
                SqlExpression::Row(_) | SqlExpression::Subquery(_) => {
                    let right_text = self.expression(right)?;
                    Ok(format!("{left_text} {} {right_text}", op.as_str()))
                }
                _ => {
                    let right_text = self.expression(right)?;
                    Ok(format!("{left_text} {} ({right_text})", op.as_str()))
                }
            };
        }
        let right_text = self.operand(right, parent, true, Some(op))?;
        self.dialect.binary(op, &left_text, &right_text)
    }

    fn function(&mut self, function: SqlFunction, args: &[SqlExpression]) -> Result<String> {
        if function == SqlFunction::NextValue {
            let Some(SqlExpression::Literal(SqlLiteral::String(name))) = args.first() else {
                return Err(CompileError::InvalidNode(
                    "NextValue expects the sequence name as a string literal".to_string(),
                ));
            };
            let sequence = match name.split_once('.') {
                Some((schema, name)) => QualifiedName::new(schema, name),
                None => QualifiedName::new("", name.as_str()),
            };
            return self.dialect.next_value(&sequence);
        }
        let args = self.list(args)?;
        self.dialect.function(function, &args)
    }

    fn case(
        &mut self,
        operand: Option<&SqlExpression>,
        branches: &[SqlCaseBranch],
        otherwise: Option<&SqlExpression>,
    ) -> Result<String> {
        if branches.is_empty() {
            return Err(CompileError::InvalidNode("CASE without WHEN".to_string()));
        }
        let mut text = "CASE".to_string();
        if let Some(operand) = operand {
            text.push(' ');
            text.push_str(&self.expression(operand)?);
        }
        for branch in branches {
            let when = self.expression(&branch.when)?;
            let then = self.expression(&branch.then)?;
            let _ = write!(text, " WHEN {when} THEN {then}");
        }
        if let Some(otherwise) = otherwise {
            let otherwise = self.expression(otherwise)?;
            let _ = write!(text, " ELSE {otherwise}");
        }
        text.push_str(" END");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{SqlExpression, SqlFunction, SqlLiteral, SqlSelect, SqlTableRef};
    use crate::compiler::{CompileError, SqlCompiler};
    use crate::dialect::GenericDialect;
    use crate::model::QualifiedName;

    fn render(expression: &SqlExpression) -> String {
        let dialect = GenericDialect::new();
        SqlCompiler::new(&dialect)
            .compile_expression(expression)
            .unwrap()
            .text
    }

    fn col(name: &str) -> SqlExpression {
        SqlExpression::column(name)
    }

    #[test]
    fn test_precedence_parentheses() {
        let sum_times = col("a").add(col("b")).mul(col("c"));
        assert_eq!(render(&sum_times), r#"("a" + "b") * "c""#);

        let times_sum = col("a").mul(col("b")).add(col("c"));
        assert_eq!(render(&times_sum), r#""a" * "b" + "c""#);

        let nested_minus = col("a").sub(col("b").sub(col("c")));
        assert_eq!(render(&nested_minus), r#""a" - ("b" - "c")"#);

        let left_minus = col("a").sub(col("b")).sub(col("c"));
        assert_eq!(render(&left_minus), r#""a" - "b" - "c""#);

        let chained_and = col("a").and(col("b")).and(col("c"));
        assert_eq!(render(&chained_and), r#""a" AND "b" AND "c""#);

        let or_in_and = col("a").or(col("b")).and(col("c"));
        assert_eq!(render(&or_in_and), r#"("a" OR "b") AND "c""#);
    }

    #[test]
    fn test_comparison_of_comparison_is_grouped() {
        let nested = col("a").eq(col("b")).eq(SqlExpression::literal(true));
        assert_eq!(render(&nested), r#"("a" = "b") = TRUE"#);
    }

    #[test]
    fn test_unary_rendering() {
        assert_eq!(render(&col("a").eq(col("b")).not()), r#"NOT "a" = "b""#);
        assert_eq!(render(&col("a").and(col("b")).not()), r#"NOT ("a" AND "b")"#);
        assert_eq!(render(&SqlExpression::literal(-5).neg()), "-(-5)");
        assert_eq!(render(&col("a").add(col("b")).neg()), r#"-("a" + "b")"#);
        assert_eq!(render(&col("a").is_null()), r#""a" IS NULL"#);
        assert_eq!(render(&col("a").is_not_null()), r#""a" IS NOT NULL"#);
    }

    #[test]
    fn test_between_and_case() {
        let between = SqlExpression::Between {
            operand: Box::new(col("a")),
            low: Box::new(SqlExpression::literal(1)),
            high: Box::new(SqlExpression::literal(10)),
            negated: true,
        };
        assert_eq!(render(&between), r#""a" NOT BETWEEN 1 AND 10"#);

        let case = SqlExpression::when(
            col("a").gt(SqlExpression::literal(0)),
            SqlExpression::literal("pos"),
            SqlExpression::literal("neg"),
        );
        assert_eq!(
            render(&case),
            r#"CASE WHEN "a" > 0 THEN 'pos' ELSE 'neg' END"#
        );
    }

    #[test]
    fn test_in_row_and_empty_in() {
        let row = SqlExpression::binary(
            crate::ast::BinaryOperator::In,
            col("a"),
            SqlExpression::Row(vec![SqlExpression::literal(1), SqlExpression::literal(2)]),
        );
        assert_eq!(render(&row), r#""a" IN (1, 2)"#);

        let array = col("a").in_array(vec![SqlLiteral::Integer(1), SqlLiteral::Integer(2)]);
        assert_eq!(render(&array), r#""a" IN (1, 2)"#);

        assert_eq!(render(&col("a").in_array(Vec::new())), "1 = 0");
        assert_eq!(render(&col("a").not_in_array(Vec::new())), "1 = 1");
    }

    #[test]
    fn test_argument_count_is_checked() {
        let dialect = GenericDialect::new();
        let bad = SqlExpression::function(SqlFunction::Power, vec![col("a")]);
        let error = SqlCompiler::new(&dialect).compile_expression(&bad).unwrap_err();
        assert_eq!(
            error,
            CompileError::InvalidArgumentCount {
                function: "Power",
                expected: "2".to_string(),
                actual: 1,
            }
        );
    }

    #[test]
    fn test_unbound_column_fails() {
        let orphan = SqlTableRef::new(QualifiedName::new("s", "t"));
        let dialect = GenericDialect::new();
        let error = SqlCompiler::new(&dialect)
            .compile_expression(&orphan.column("id"))
            .unwrap_err();
        assert!(matches!(error, CompileError::UnboundTableReference { column } if column == "id"));
    }

    #[test]
    fn test_correlated_subquery_resolves_outer_table() {
        let outer = SqlTableRef::new(QualifiedName::new("s", "orders"));
        let inner = SqlTableRef::new(QualifiedName::new("s", "items"));
        let exists = SqlSelect::from_source(inner.clone())
            .filter(inner.column("order_id").eq(outer.column("id")));
        let query = SqlSelect::from_source(outer.clone())
            .column(outer.column("id"))
            .filter(SqlExpression::Exists(Box::new(exists)));
        let dialect = GenericDialect::new();
        let text = SqlCompiler::new(&dialect)
            .compile(&query.into())
            .unwrap()
            .text;
        assert_eq!(
            text,
            r#"SELECT "orders"."id" FROM "s"."orders" WHERE EXISTS (SELECT * FROM "s"."items" WHERE "items"."order_id" = "orders"."id")"#
        );
    }

    #[test]
    fn test_next_value_names_sequence() {
        let next = SqlExpression::function(
            SqlFunction::NextValue,
            vec![SqlExpression::literal("app.order_seq")],
        );
        assert_eq!(render(&next), r#"NEXT VALUE FOR "app"."order_seq""#);
    }

    #[test]
    fn test_empty_case_is_invalid() {
        let dialect = GenericDialect::new();
        let case = SqlExpression::Case {
            operand: None,
            branches: Vec::new(),
            otherwise: None,
        };
        assert!(matches!(
            SqlCompiler::new(&dialect).compile_expression(&case),
            Err(CompileError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_reserved_character_in_caller_text_is_rejected() {
        let dialect = GenericDialect::new();
        let compiler = SqlCompiler::new(&dialect);
        let forged = SqlExpression::native("\u{1}0\u{1}")
            .eq(SqlExpression::parameter(SqlLiteral::Integer(1)));
        let column = SqlExpression::column("a\u{1}b");
        let function = SqlExpression::user_function("f\u{1}", Vec::new());
        for expression in [forged, column, function] {
            assert!(matches!(
                compiler.compile_expression(&expression),
                Err(CompileError::InvalidNode(_))
            ));
        }
        let decimal = SqlExpression::literal(SqlLiteral::Decimal("1;".to_string()));
        assert!(compiler.compile_expression(&decimal).is_err());
    }
}
