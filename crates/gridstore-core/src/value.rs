use serde::{Deserialize, Serialize};

/// A single cell value: text, number, boolean, or null.
///
/// The remote medium stores every cell as UTF-8 text, so `Value` carries the
/// coercion contract in both directions: [`Value::to_cell_text`] for writes
/// and [`Value::from_cell_text`] for reads. Parsing never fails; text that
/// doesn't look like a number or boolean stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Render this value as a wire cell.
    ///
    /// Integral numbers render without a trailing `.0` (a quantity of 5 is
    /// `"5"`, not `"5.0"`), booleans as `TRUE`/`FALSE`, null as the empty
    /// string.
    pub fn to_cell_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }

    /// Parse a wire cell back into its semantic type.
    ///
    /// Empty cells become `Null`, `TRUE`/`FALSE` (case-insensitive) become
    /// booleans, anything parseable as f64 becomes a number, and everything
    /// else is kept as text.
    pub fn from_cell_text(cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        if cell.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if cell.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(n) = cell.parse::<f64>() {
            return Value::Number(n);
        }
        Value::Text(cell.to_string())
    }

    /// Numeric view with a zero fallback for non-numeric values.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Text(s) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Boolean view with a `false` fallback for non-boolean values.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => s.eq_ignore_ascii_case("true"),
            Value::Null => false,
        }
    }

    /// Text view; numbers and booleans render as for the wire.
    pub fn as_text(&self) -> String {
        self.to_cell_text()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
