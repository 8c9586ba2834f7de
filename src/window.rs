//! Window function constructors: rank/row-number family plus the value
//! functions (`lag`/`lead`/`first_value`/...), each wrapped in an `OVER`
//! clause built from [`crate::expr::WindowSpec`].

use crate::expr::{Expr, OrderItem, WindowFrame, WindowSpec};

/// A window function call plus its (still-mutable) `OVER` specification.
#[derive(Clone)]
#[must_use]
pub struct WindowFn {
    function: Expr,
    spec: WindowSpec,
}

impl WindowFn {
    fn new(function: Expr) -> Self {
        Self { function, spec: WindowSpec::default() }
    }

    /// Wrap an aggregate (already reduced to an `Expr` via
    /// [`crate::aggregate::Aggregate::into_expr`]) as a window function.
    pub fn over_aggregate(aggregate_expr: Expr) -> Self {
        Self::new(aggregate_expr)
    }

    pub fn partition_by(mut self, expr: Expr) -> Self {
        self.spec.partition_by.push(expr);
        self
    }

    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.spec.order_by.push(item);
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.spec.frame = Some(frame);
        self
    }

    pub fn build(self) -> Expr {
        Expr::Window { function: Box::new(self.function), spec: self.spec }
    }
}

fn call(name: &'static str, args: Vec<Expr>) -> WindowFn {
    WindowFn::new(Expr::Function { name: name.into(), args, distinct: false })
}

pub fn rank() -> WindowFn {
    call("RANK", vec![])
}

pub fn row_number() -> WindowFn {
    call("ROW_NUMBER", vec![])
}

pub fn dense_rank() -> WindowFn {
    call("DENSE_RANK", vec![])
}

pub fn percent_rank() -> WindowFn {
    call("PERCENT_RANK", vec![])
}

pub fn cume_dist() -> WindowFn {
    call("CUME_DIST", vec![])
}

pub fn ntile(buckets: Expr) -> WindowFn {
    call("NTILE", vec![buckets])
}

pub fn lag(arg: Expr) -> WindowFn {
    call("LAG", vec![arg])
}

pub fn lag_offset(arg: Expr, offset: Expr, default: Expr) -> WindowFn {
    call("LAG", vec![arg, offset, default])
}

pub fn lead(arg: Expr) -> WindowFn {
    call("LEAD", vec![arg])
}

pub fn lead_offset(arg: Expr, offset: Expr, default: Expr) -> WindowFn {
    call("LEAD", vec![arg, offset, default])
}

pub fn first_value(arg: Expr) -> WindowFn {
    call("FIRST_VALUE", vec![arg])
}

pub fn last_value(arg: Expr) -> WindowFn {
    call("LAST_VALUE", vec![arg])
}

pub fn nth_value(arg: Expr, n: Expr) -> WindowFn {
    call("NTH_VALUE", vec![arg, n])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::expr::{col, FrameBound, WindowFrameKind};

    #[test]
    fn row_number_with_partition_and_order() {
        let expr = row_number()
            .partition_by(col("department"))
            .order_by(OrderItem::new(col("salary")).desc())
            .build();
        let mut params = Vec::new();
        let sql = expr.render(Dialect::Postgres, &mut params).unwrap().serialize(Dialect::Postgres);
        assert_eq!(sql, "ROW_NUMBER() OVER (PARTITION BY \"department\" ORDER BY \"salary\" DESC)");
    }

    #[test]
    fn frame_between_rows() {
        let expr = lag(col("x"))
            .order_by(OrderItem::new(col("id")))
            .frame(WindowFrame::between(WindowFrameKind::Rows, FrameBound::Preceding(1), FrameBound::CurrentRow))
            .build();
        let mut params = Vec::new();
        let sql = expr.render(Dialect::Postgres, &mut params).unwrap().serialize(Dialect::Postgres);
        assert_eq!(sql, "LAG(\"x\") OVER (ORDER BY \"id\" ASC ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)");
    }
}
