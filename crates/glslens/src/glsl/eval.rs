//! Constant folding for array sizes, layout values, indices and `if`
//! conditions.

use super::ast::{BinaryOp, Callee, Expr, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ConstValue {
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl ConstValue {
    pub fn as_int(self) -> Option<i64> {
        match self {
            ConstValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            ConstValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            ConstValue::Int(value) => value as f64,
            ConstValue::Float(value) => value,
            ConstValue::Bool(value) => f64::from(u8::from(value)),
        }
    }
}

/// Folds `expr`, resolving identifiers through `lookup`. Returns `None` for
/// anything that is not a compile-time constant.
pub(crate) fn eval(expr: &Expr, lookup: &dyn Fn(&str) -> Option<ConstValue>) -> Option<ConstValue> {
    match expr {
        Expr::Int { value, .. } => i64::try_from(*value).ok().map(ConstValue::Int),
        Expr::Float(value) => Some(ConstValue::Float(*value)),
        Expr::Bool(value) => Some(ConstValue::Bool(*value)),
        Expr::Ident { name, .. } => lookup(name),
        Expr::Unary { op, operand } => unary(*op, eval(operand, lookup)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, lookup)?;
            // Short-circuit so `false && x` folds even when `x` does not.
            match (op, lhs) {
                (BinaryOp::LogicalAnd, ConstValue::Bool(false)) => Some(lhs),
                (BinaryOp::LogicalOr, ConstValue::Bool(true)) => Some(lhs),
                _ => binary(*op, lhs, eval(rhs, lookup)?),
            }
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, lookup)?.as_bool()? {
                eval(then, lookup)
            } else {
                eval(otherwise, lookup)
            }
        }
        Expr::Call {
            callee: Callee::Type(ty),
            args,
        } if ty.dims.is_empty() && args.len() == 1 => convert(&ty.name, eval(&args[0], lookup)?),
        _ => None,
    }
}

fn unary(op: UnaryOp, value: ConstValue) -> Option<ConstValue> {
    match (op, value) {
        (UnaryOp::Plus, _) => Some(value),
        (UnaryOp::Neg, ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int),
        (UnaryOp::Neg, ConstValue::Float(v)) => Some(ConstValue::Float(-v)),
        (UnaryOp::Not, ConstValue::Bool(v)) => Some(ConstValue::Bool(!v)),
        (UnaryOp::BitNot, ConstValue::Int(v)) => Some(ConstValue::Int(!v)),
        _ => None,
    }
}

fn binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Bool, Float, Int};

    match (lhs, rhs) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Int),
            BinaryOp::Sub => a.checked_sub(b).map(Int),
            BinaryOp::Mul => a.checked_mul(b).map(Int),
            BinaryOp::Div => a.checked_div(b).map(Int),
            BinaryOp::Mod => a.checked_rem(b).map(Int),
            BinaryOp::Shl => u32::try_from(b).ok().and_then(|b| a.checked_shl(b)).map(Int),
            BinaryOp::Shr => u32::try_from(b).ok().and_then(|b| a.checked_shr(b)).map(Int),
            BinaryOp::BitAnd => Some(Int(a & b)),
            BinaryOp::BitOr => Some(Int(a | b)),
            BinaryOp::BitXor => Some(Int(a ^ b)),
            _ => compare(op, a.cmp(&b)),
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::LogicalAnd => Some(Bool(a && b)),
            BinaryOp::LogicalOr => Some(Bool(a || b)),
            BinaryOp::LogicalXor | BinaryOp::NotEqual => Some(Bool(a != b)),
            BinaryOp::Equal => Some(Bool(a == b)),
            _ => None,
        },
        (Float(_), _) | (_, Float(_)) => {
            let (a, b) = (lhs.as_float(), rhs.as_float());
            match op {
                BinaryOp::Add => Some(Float(a + b)),
                BinaryOp::Sub => Some(Float(a - b)),
                BinaryOp::Mul => Some(Float(a * b)),
                BinaryOp::Div => Some(Float(a / b)),
                _ => compare(op, a.partial_cmp(&b)?),
            }
        }
        _ => None,
    }
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> Option<ConstValue> {
    let result = match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        BinaryOp::Equal => ordering.is_eq(),
        BinaryOp::NotEqual => ordering.is_ne(),
        _ => return None,
    };
    Some(ConstValue::Bool(result))
}

fn convert(type_name: &str, value: ConstValue) -> Option<ConstValue> {
    match type_name {
        "int" | "uint" => match value {
            ConstValue::Int(v) => Some(ConstValue::Int(v)),
            ConstValue::Float(v) => Some(ConstValue::Int(v as i64)),
            ConstValue::Bool(v) => Some(ConstValue::Int(i64::from(v))),
        },
        "float" | "double" => Some(ConstValue::Float(value.as_float())),
        "bool" => Some(ConstValue::Bool(match value {
            ConstValue::Bool(v) => v,
            ConstValue::Int(v) => v != 0,
            ConstValue::Float(v) => v != 0.0,
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl::ast::TypeSpec;

    fn int(value: u64) -> Expr {
        Expr::Int {
            value,
            unsigned: false,
        }
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident {
            name: name.into(),
            line: 1,
        }
    }

    fn binary_expr(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn constants(name: &str) -> Option<ConstValue> {
        (name == "COUNT").then_some(ConstValue::Int(4))
    }

    #[test]
    fn folds_integer_arithmetic_with_named_constants() {
        let expr = binary_expr(BinaryOp::Mul, ident("COUNT"), int(2));
        assert_eq!(eval(&expr, &constants), Some(ConstValue::Int(8)));
        let shifted = binary_expr(BinaryOp::Shl, int(1), int(3));
        assert_eq!(eval(&shifted, &constants), Some(ConstValue::Int(8)));
    }

    #[test]
    fn unknown_names_and_division_by_zero_do_not_fold() {
        assert_eq!(eval(&ident("n"), &constants), None);
        let expr = binary_expr(BinaryOp::Div, int(1), int(0));
        assert_eq!(eval(&expr, &constants), None);
    }

    #[test]
    fn folds_conditions() {
        let expr = binary_expr(
            BinaryOp::LogicalAnd,
            Expr::Bool(false),
            ident("dynamic"),
        );
        assert_eq!(eval(&expr, &constants), Some(ConstValue::Bool(false)));
        let expr = binary_expr(BinaryOp::Less, ident("COUNT"), int(3));
        assert_eq!(eval(&expr, &constants), Some(ConstValue::Bool(false)));
        let cast = Expr::Call {
            callee: Callee::Type(TypeSpec {
                name: "bool".into(),
                dims: Vec::new(),
                line: 1,
            }),
            args: vec![int(1)],
        };
        assert_eq!(eval(&cast, &constants), Some(ConstValue::Bool(true)));
    }
}
