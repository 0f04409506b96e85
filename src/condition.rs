use crate::environment::Environment;
use crate::value::Value;
use std::cmp::Ordering;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Greater,
    Equal,
    LessEqual,
    GreaterEqual,
}

/// Operator substrings in the order they are tested. `<` and `>` come first,
/// so `<=` and `>=` are never reached for text that contains them.
const OPERATORS: [(&str, Comparison); 5] = [
    ("<", Comparison::Less),
    (">", Comparison::Greater),
    ("==", Comparison::Equal),
    ("<=", Comparison::LessEqual),
    (">=", Comparison::GreaterEqual),
];

impl Comparison {
    pub fn detect(condition: &str) -> Option<Comparison> {
        OPERATORS
            .iter()
            .find(|(symbol, _)| condition.contains(*symbol))
            .map(|(_, comparison)| *comparison)
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Less => ordering.is_lt(),
            Comparison::Greater => ordering.is_gt(),
            Comparison::Equal => ordering.is_eq(),
            Comparison::LessEqual => ordering.is_le(),
            Comparison::GreaterEqual => ordering.is_ge(),
        }
    }
}

fn operand(env: &Environment, name: &str) -> Value {
    env.get(name).cloned().unwrap_or(Value::Int(0))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Evaluates a loop condition.
///
/// With an operator in `condition`, the values bound to `left` and `right`
/// are compared, unbound names reading as `0`. Without one, the result is
/// whether the condition text itself names a bound variable. Operands that
/// cannot be compared make the condition false.
pub fn evaluate(env: &Environment, condition: &str, left: &str, right: &str) -> bool {
    let condition: String = condition.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(comparison) = Comparison::detect(&condition) else {
        return env.contains(&condition);
    };

    let (a, b) = (operand(env, left), operand(env, right));
    match compare(&a, &b) {
        Some(ordering) => comparison.holds(ordering),
        None => {
            trace!(
                left = a.type_name(),
                right = b.type_name(),
                "incomparable operands, condition is false"
            );
            false
        }
    }
}
