use crate::query::{
    ast::expr::{BinaryOp, Expr, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(value) => r.add_param(value.clone()),
            Expr::Boolean(true) => r.sql.push_str("TRUE"),
            Expr::Boolean(false) => r.sql.push_str("FALSE"),
            Expr::BinaryOp(op) => op.render(r),
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                expr.render(r);
                r.sql.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                pattern.render(r);
            }
            Expr::IsNull { expr, negated } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                // `IN ()` is not valid SQL; an empty list matches nothing.
                if list.is_empty() {
                    r.sql.push_str(if *negated { "TRUE" } else { "FALSE" });
                    return;
                }
                expr.render(r);
                r.sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    item.render(r);
                }
                r.sql.push(')');
            }
            Expr::Not(inner) => {
                r.sql.push_str("NOT ");
                if matches!(inner.as_ref(), Expr::BinaryOp(op) if op.op.is_logical()) {
                    inner.render(r);
                } else {
                    r.sql.push('(');
                    inner.render(r);
                    r.sql.push(')');
                }
            }
            Expr::FunctionCall { name, args } => {
                r.sql.push_str(name);
                r.sql.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    arg.render(r);
                }
                r.sql.push(')');
            }
            Expr::Wildcard => r.sql.push('*'),
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        // Logical operators are always parenthesized so that the tree's
        // grouping survives without precedence rules.
        let logical = self.op.is_logical();
        if logical {
            r.sql.push('(');
        }
        self.left.render(r);
        r.sql.push(' ');
        r.sql.push_str(&self.op.to_string());
        r.sql.push(' ');
        self.right.render(r);
        if logical {
            r.sql.push(')');
        }
    }
}
