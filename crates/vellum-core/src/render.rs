//! Deterministic statement-text rendering.
//!
//! Rendering is a pure function of the tree: a well-formed expression has
//! exactly one canonical text output. Validation happened at construction
//! time, so nothing here can fail.
//!
//! Operators render fully parenthesized around their operands, which makes
//! the output independent of any precedence table.

use crate::expr::{Expr, Literal, Node};

/// Escapes a text literal into Postgres extended-string form.
///
/// NUL maps to `\0`, embedded quotes are doubled, `"` to `\"`, backspace,
/// newline, carriage return and tab to `\b`, `\n`, `\r`, `\t`, and
/// backslashes are doubled.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("E'");
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\'' => out.push_str("''"),
            '"' => out.push_str("\\\""),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn literal_sql(literal: &Literal) -> String {
    match literal {
        Literal::Bool(true) => String::from("TRUE"),
        Literal::Bool(false) => String::from("FALSE"),
        Literal::Int2(v) => v.to_string(),
        Literal::Int4(v) => v.to_string(),
        Literal::Int8(v) => v.to_string(),
        Literal::Float4(v) => v.to_string(),
        Literal::Float8(v) => v.to_string(),
        Literal::Text(v) => escape_text(v),
        Literal::Bytea(v) => {
            let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
            format!("'\\x{hex}'")
        }
        Literal::Null => String::from("NULL"),
    }
}

pub(crate) fn node_sql(node: &Node) -> String {
    match node {
        Node::Literal(literal) => literal_sql(literal),
        Node::Column(r) => format!("{}.{}", r.table, r.column),
        Node::Parameter(index) => format!("${index}"),
        Node::Unary { op, operand } => format!("({} {})", op.as_str(), node_sql(operand)),
        Node::Binary { left, op, right } => {
            format!("({} {} {})", node_sql(left), op.as_str(), node_sql(right))
        }
        Node::Function { name, args } => {
            let args: Vec<String> = args.iter().map(node_sql).collect();
            format!("{name}({})", args.join(", "))
        }
        Node::Case { branches, else_ } => {
            let mut out = String::from("CASE");
            for (cond, value) in branches {
                out.push_str(" WHEN ");
                out.push_str(&node_sql(cond));
                out.push_str(" THEN ");
                out.push_str(&node_sql(value));
            }
            out.push_str(" ELSE ");
            out.push_str(&node_sql(else_));
            out.push_str(" END");
            out
        }
        Node::Cast { expr, ty } => format!("({} :: {})", node_sql(expr), ty.type_name()),
        Node::IsNull { expr, negated } => {
            let test = if *negated { "IS NOT NULL" } else { "IS NULL" };
            format!("({} {test})", node_sql(expr))
        }
        Node::Aggregate {
            func,
            distinct,
            operand,
        } => match operand {
            None => format!("{}(*)", func.as_str()),
            Some(operand) if *distinct => {
                format!("{}(DISTINCT {})", func.as_str(), node_sql(operand))
            }
            Some(operand) => format!("{}({})", func.as_str(), node_sql(operand)),
        },
    }
}

/// Renders an expression to its canonical SQL text.
#[must_use]
pub fn expr_sql(expr: &Expr) -> String {
    node_sql(&expr.node)
}
