use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum FilterValue {
    String(String),
    Int(i64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

/// A single `column <op> value` constraint, resolved against an entity's
/// columns by the repository layer.
#[derive(Debug, Clone)]
pub struct FilterParam {
    pub column: String,
    pub operator: CompareOp,
    pub value: FilterValue,
}

pub trait IntoFilterValue {
    fn into_filter_value(self) -> FilterValue;
}

impl IntoFilterValue for String {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::String(self)
    }
}

impl IntoFilterValue for &str {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::String(self.to_string())
    }
}

impl IntoFilterValue for i64 {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::Int(self)
    }
}

impl IntoFilterValue for bool {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::Bool(self)
    }
}

impl IntoFilterValue for DateTime<Utc> {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::DateTime(self)
    }
}

impl FilterParam {
    fn new(column: &str, operator: CompareOp, value: impl IntoFilterValue) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.into_filter_value(),
        }
    }

    pub fn eq(column: &str, value: impl IntoFilterValue) -> Self {
        Self::new(column, CompareOp::Eq, value)
    }

    pub fn gte(column: &str, value: impl IntoFilterValue) -> Self {
        Self::new(column, CompareOp::Gte, value)
    }

    pub fn lte(column: &str, value: impl IntoFilterValue) -> Self {
        Self::new(column, CompareOp::Lte, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_capture_operator_and_value() {
        let f = FilterParam::gte("created_at", Utc::now());
        assert_eq!(f.column, "created_at");
        assert_eq!(f.operator, CompareOp::Gte);
        assert!(matches!(f.value, FilterValue::DateTime(_)));

        let f = FilterParam::eq("status", "completed");
        assert!(matches!(f.value, FilterValue::String(ref s) if s == "completed"));
    }
}
