use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    /// Reads text the way `input` does: an integer literal becomes `Int`,
    /// anything else is kept verbatim as `Str`.
    pub fn from_input(text: &str) -> Self {
        match parse_int_literal(text) {
            Some(n) => Value::Int(n),
            None => Value::Str(text.to_string()),
        }
    }

    /// Numeric view used by `mult`. Strings holding an integer literal count.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(s) => parse_int_literal(s),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
        }
    }
}

/// An optional leading `-` followed by ASCII digits, within `i64` range.
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}
