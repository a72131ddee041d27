use crate::errors::ToolError;
use serde_json::Value;

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        let text = value.and_then(|v| v.as_str()).ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(Some(val), label).map(Some),
        }
    }

    /// Accepts JSON integers and integer strings; rejects zero and negatives.
    pub fn ensure_optional_positive_int(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<u64>, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let numeric = value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ToolError::invalid_params(format!("{} must be a positive integer", label))
            })?;
        Ok(Some(numeric))
    }

    pub fn ensure_optional_string_list(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<Vec<String>>, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let items = value.as_array().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be an array of strings", label))
        })?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.ensure_string(Some(item), label)?);
        }
        if out.is_empty() {
            return Ok(None);
        }
        Ok(Some(out))
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_trimmed_and_required() {
        let v = Validation::new();
        assert_eq!(v.ensure_string(Some(&json!("  ds-1 ")), "dataset_id").unwrap(), "ds-1");
        assert!(v.ensure_string(Some(&json!("   ")), "dataset_id").is_err());
        assert!(v.ensure_string(None, "dataset_id").is_err());
        assert!(v.ensure_string(Some(&json!(5)), "dataset_id").is_err());
    }

    #[test]
    fn positive_ints_accept_numeric_strings() {
        let v = Validation::new();
        assert_eq!(v.ensure_optional_positive_int(Some(&json!("42")), "n").unwrap(), Some(42));
        assert_eq!(v.ensure_optional_positive_int(None, "n").unwrap(), None);
        assert!(v.ensure_optional_positive_int(Some(&json!(0)), "n").is_err());
        assert!(v.ensure_optional_positive_int(Some(&json!(-3)), "n").is_err());
    }

    #[test]
    fn string_lists_reject_non_strings() {
        let v = Validation::new();
        assert_eq!(
            v.ensure_optional_string_list(Some(&json!(["a", "b"])), "ids").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(v.ensure_optional_string_list(Some(&json!(["a", 1])), "ids").is_err());
        assert_eq!(v.ensure_optional_string_list(Some(&json!([])), "ids").unwrap(), None);
    }
}
