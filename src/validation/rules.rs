use super::RecordValidator;
use crate::config::RuleSpec;
use crate::dictionary::value_key;
use crate::error::{SheetError, SheetResult};
use crate::types::Record;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A single field rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Nullable,
    String,
    Numeric,
    Integer,
    Boolean,
    Email,
    Alpha,
    AlphaNum,
    AlphaDash,
    In(Vec<String>),
    NotIn(Vec<String>),
    Min(f64),
    Max(f64),
    Between(f64, f64),
    Size(f64),
    Digits(usize),
    Regex(Regex),
}

impl Rule {
    /// Parse `name` or `name:params`.
    pub fn parse(spec: &str) -> SheetResult<Self> {
        let spec = spec.trim();
        let (name, params) = match spec.split_once(':') {
            Some((name, params)) => (name, Some(params)),
            None => (spec, None),
        };

        let param = |what: &'static str| -> SheetResult<&str> {
            params.ok_or_else(|| {
                SheetError::Config(format!("Rule '{}' requires {}", name, what))
            })
        };
        let number = |raw: &str| -> SheetResult<f64> {
            raw.trim().parse::<f64>().map_err(|_| {
                SheetError::Config(format!("Rule '{}': '{}' is not a number", name, raw))
            })
        };
        let list = |raw: &str| -> Vec<String> {
            raw.split(',').map(|s| s.trim().to_string()).collect()
        };

        let rule = match name {
            "required" => Rule::Required,
            "nullable" => Rule::Nullable,
            "string" => Rule::String,
            "numeric" => Rule::Numeric,
            "integer" => Rule::Integer,
            "boolean" => Rule::Boolean,
            "email" => Rule::Email,
            "alpha" => Rule::Alpha,
            "alpha_num" => Rule::AlphaNum,
            "alpha_dash" => Rule::AlphaDash,
            "in" => Rule::In(list(param("a value list")?)),
            "not_in" => Rule::NotIn(list(param("a value list")?)),
            "min" => Rule::Min(number(param("a minimum")?)?),
            "max" => Rule::Max(number(param("a maximum")?)?),
            "size" => Rule::Size(number(param("a size")?)?),
            "between" => {
                let raw = param("two bounds")?;
                let (lo, hi) = raw.split_once(',').ok_or_else(|| {
                    SheetError::Config(format!("Rule 'between' requires two bounds, got '{}'", raw))
                })?;
                Rule::Between(number(lo)?, number(hi)?)
            }
            "digits" => {
                let raw = param("a digit count")?;
                Rule::Digits(raw.trim().parse().map_err(|_| {
                    SheetError::Config(format!("Rule 'digits': '{}' is not a count", raw))
                })?)
            }
            "regex" => Rule::Regex(compile_pattern(param("a pattern")?)?),
            other => {
                return Err(SheetError::Config(format!(
                    "Unknown validation rule '{}'",
                    other
                )))
            }
        };
        Ok(rule)
    }

    /// Message lookup key (`field.<key>` / `<key>`).
    pub fn key(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Nullable => "nullable",
            Rule::String => "string",
            Rule::Numeric => "numeric",
            Rule::Integer => "integer",
            Rule::Boolean => "boolean",
            Rule::Email => "email",
            Rule::Alpha => "alpha",
            Rule::AlphaNum => "alpha_num",
            Rule::AlphaDash => "alpha_dash",
            Rule::In(_) => "in",
            Rule::NotIn(_) => "not_in",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Between(..) => "between",
            Rule::Size(_) => "size",
            Rule::Digits(_) => "digits",
            Rule::Regex(_) => "regex",
        }
    }
}

/// `/pattern/flags` or a bare pattern.
fn compile_pattern(raw: &str) -> SheetResult<Regex> {
    let pattern = match raw.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((body, flags)) if flags.contains('i') => format!("(?i){}", body),
        Some((body, _)) => body.to_string(),
        None => raw.to_string(),
    };
    Regex::new(&pattern)
        .map_err(|e| SheetError::Config(format!("Invalid regex '{}': {}", raw, e)))
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
    })
}

struct FieldRules {
    field: String,
    rules: Vec<Rule>,
    numeric: bool,
}

/// Field rules plus custom messages, applied per imported record.
pub struct RuleSet {
    fields: Vec<FieldRules>,
    messages: IndexMap<String, String>,
}

impl RuleSet {
    pub fn new(
        roles: &IndexMap<String, RuleSpec>,
        messages: &IndexMap<String, String>,
    ) -> SheetResult<Self> {
        let mut fields = Vec::with_capacity(roles.len());
        for (field, spec) in roles {
            let rules = spec
                .rules()
                .iter()
                .map(|s| {
                    Rule::parse(s)
                        .map_err(|e| SheetError::Config(format!("Field '{}': {}", field, e)))
                })
                .collect::<SheetResult<Vec<Rule>>>()?;
            let numeric = rules
                .iter()
                .any(|rule| matches!(rule, Rule::Numeric | Rule::Integer));
            fields.push(FieldRules {
                field: field.clone(),
                rules,
                numeric,
            });
        }

        Ok(Self {
            fields,
            messages: messages.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn message(&self, field: &FieldRules, rule: &Rule) -> String {
        let template = self
            .messages
            .get(&format!("{}.{}", field.field, rule.key()))
            .or_else(|| self.messages.get(rule.key()))
            .cloned()
            .unwrap_or_else(|| default_message(rule, field.numeric).to_string());

        let mut message = template.replace(":attribute", &field.field.replace('_', " "));
        match rule {
            Rule::Min(n) => message = message.replace(":min", &format_number(*n)),
            Rule::Max(n) => message = message.replace(":max", &format_number(*n)),
            Rule::Size(n) => message = message.replace(":size", &format_number(*n)),
            Rule::Between(lo, hi) => {
                message = message
                    .replace(":min", &format_number(*lo))
                    .replace(":max", &format_number(*hi))
            }
            Rule::Digits(n) => message = message.replace(":digits", &n.to_string()),
            Rule::In(values) | Rule::NotIn(values) => {
                message = message.replace(":values", &values.join(", "))
            }
            _ => {}
        }
        message
    }
}

impl RecordValidator for RuleSet {
    fn validate(&self, record: &Record) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = record.get(&field.field).filter(|v| is_present(v));

            let Some(value) = value else {
                if field.rules.iter().any(|rule| matches!(rule, Rule::Required)) {
                    errors.push(self.message(field, &Rule::Required));
                }
                continue;
            };

            for rule in &field.rules {
                if !passes(rule, value, field.numeric) {
                    errors.push(self.message(field, rule));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn text_of(value: &Value) -> String {
    value_key(value).unwrap_or_else(|| value.to_string())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

/// Numeric value for numeric fields, character count otherwise.
fn size_of(value: &Value, numeric: bool) -> f64 {
    if numeric {
        if let Some(n) = as_number(value) {
            return n;
        }
    }
    text_of(value).chars().count() as f64
}

fn passes(rule: &Rule, value: &Value, numeric: bool) -> bool {
    match rule {
        Rule::Required | Rule::Nullable => true,
        Rule::String => value.is_string(),
        Rule::Numeric => as_number(value).is_some(),
        Rule::Integer => is_integer(value),
        Rule::Boolean => matches!(text_of(value).as_str(), "0" | "1"),
        Rule::Email => email_pattern().is_match(&text_of(value)),
        Rule::Alpha => text_of(value).chars().all(char::is_alphabetic),
        Rule::AlphaNum => text_of(value).chars().all(char::is_alphanumeric),
        Rule::AlphaDash => text_of(value)
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_'),
        Rule::In(values) => values.contains(&text_of(value)),
        Rule::NotIn(values) => !values.contains(&text_of(value)),
        Rule::Min(n) => size_of(value, numeric) >= *n,
        Rule::Max(n) => size_of(value, numeric) <= *n,
        Rule::Between(lo, hi) => {
            let size = size_of(value, numeric);
            size >= *lo && size <= *hi
        }
        Rule::Size(n) => size_of(value, numeric) == *n,
        Rule::Digits(n) => {
            let text = text_of(value);
            text.len() == *n && text.chars().all(|c| c.is_ascii_digit())
        }
        Rule::Regex(re) => re.is_match(&text_of(value)),
    }
}

fn default_message(rule: &Rule, numeric: bool) -> &'static str {
    match (rule, numeric) {
        (Rule::Required, _) => "The :attribute field is required.",
        (Rule::Nullable, _) => "The :attribute field is invalid.",
        (Rule::String, _) => "The :attribute must be a string.",
        (Rule::Numeric, _) => "The :attribute must be a number.",
        (Rule::Integer, _) => "The :attribute must be an integer.",
        (Rule::Boolean, _) => "The :attribute field must be true or false.",
        (Rule::Email, _) => "The :attribute must be a valid email address.",
        (Rule::Alpha, _) => "The :attribute may only contain letters.",
        (Rule::AlphaNum, _) => "The :attribute may only contain letters and numbers.",
        (Rule::AlphaDash, _) => {
            "The :attribute may only contain letters, numbers, dashes and underscores."
        }
        (Rule::In(_), _) | (Rule::NotIn(_), _) => "The selected :attribute is invalid.",
        (Rule::Min(_), true) => "The :attribute must be at least :min.",
        (Rule::Min(_), false) => "The :attribute must be at least :min characters.",
        (Rule::Max(_), true) => "The :attribute may not be greater than :max.",
        (Rule::Max(_), false) => "The :attribute may not be greater than :max characters.",
        (Rule::Between(..), true) => "The :attribute must be between :min and :max.",
        (Rule::Between(..), false) => {
            "The :attribute must be between :min and :max characters."
        }
        (Rule::Size(_), true) => "The :attribute must be :size.",
        (Rule::Size(_), false) => "The :attribute must be :size characters.",
        (Rule::Digits(_), _) => "The :attribute must be :digits digits.",
        (Rule::Regex(_), _) => "The :attribute format is invalid.",
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_set(roles: &[(&str, &str)], messages: &[(&str, &str)]) -> RuleSet {
        let roles = roles
            .iter()
            .map(|(f, r)| (f.to_string(), RuleSpec::Pipe(r.to_string())))
            .collect();
        let messages = messages
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuleSet::new(&roles, &messages).unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_missing_and_blank() {
        let rules = rule_set(&[("user_name", "required")], &[]);
        let errors = rules.validate(&record(json!({}))).unwrap_err();
        assert_eq!(errors, vec!["The user name field is required."]);
        assert!(rules.validate(&record(json!({"user_name": "  "}))).is_err());
        assert!(rules.validate(&record(json!({"user_name": "ann"}))).is_ok());
    }

    #[test]
    fn test_absent_optional_field_is_skipped() {
        let rules = rule_set(&[("age", "integer|min:18")], &[]);
        assert!(rules.validate(&record(json!({}))).is_ok());
    }

    #[test]
    fn test_numeric_size_rules() {
        let rules = rule_set(&[("age", "required|integer|between:18,65")], &[]);
        assert!(rules.validate(&record(json!({"age": "30"}))).is_ok());
        let errors = rules.validate(&record(json!({"age": "70"}))).unwrap_err();
        assert_eq!(errors, vec!["The age must be between 18 and 65."]);
        let errors = rules.validate(&record(json!({"age": "3.5"}))).unwrap_err();
        assert_eq!(errors[0], "The age must be an integer.");
    }

    #[test]
    fn test_string_size_rules() {
        let rules = rule_set(&[("code", "string|max:3")], &[]);
        assert!(rules.validate(&record(json!({"code": "abc"}))).is_ok());
        let errors = rules.validate(&record(json!({"code": "abcd"}))).unwrap_err();
        assert_eq!(errors, vec!["The code may not be greater than 3 characters."]);
    }

    #[test]
    fn test_in_email_regex_digits() {
        let rules = rule_set(
            &[
                ("status", "in:0,1"),
                ("email", "email"),
                ("sku", "regex:/^SKU-\\d+$/i"),
                ("pin", "digits:4"),
            ],
            &[],
        );
        assert!(rules
            .validate(&record(json!({
                "status": 1,
                "email": "a@b.io",
                "sku": "sku-12",
                "pin": "0042"
            })))
            .is_ok());

        let errors = rules
            .validate(&record(json!({
                "status": "2",
                "email": "nope",
                "sku": "X",
                "pin": "42"
            })))
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "The selected status is invalid.",
                "The email must be a valid email address.",
                "The sku format is invalid.",
                "The pin must be 4 digits.",
            ]
        );
    }

    #[test]
    fn test_custom_messages_field_then_rule() {
        let rules = rule_set(
            &[("id", "required"), ("name", "required")],
            &[("id.required", "ID missing"), ("required", ":attribute is mandatory")],
        );
        let errors = rules.validate(&record(json!({}))).unwrap_err();
        assert_eq!(errors, vec!["ID missing", "name is mandatory"]);
    }

    #[test]
    fn test_list_form_allows_pipes_in_regex() {
        let mut roles = IndexMap::new();
        roles.insert(
            "kind".to_string(),
            RuleSpec::List(vec!["required".to_string(), "regex:^(a|b)$".to_string()]),
        );
        let rules = RuleSet::new(&roles, &IndexMap::new()).unwrap();
        assert!(rules.validate(&record(json!({"kind": "b"}))).is_ok());
        assert!(rules.validate(&record(json!({"kind": "c"}))).is_err());
    }

    #[test]
    fn test_unknown_rule_and_bad_params() {
        assert!(Rule::parse("uuid").is_err());
        assert!(Rule::parse("max").is_err());
        assert!(Rule::parse("min:abc").is_err());
        assert!(Rule::parse("between:1").is_err());
        assert!(Rule::parse("regex:(").is_err());
        assert_eq!(Rule::parse("alpha_dash").unwrap().key(), "alpha_dash");
    }

    #[test]
    fn test_boolean_and_alpha() {
        let rules = rule_set(&[("flag", "boolean"), ("word", "alpha")], &[]);
        assert!(rules
            .validate(&record(json!({"flag": "1", "word": "Hello"})))
            .is_ok());
        let errors = rules
            .validate(&record(json!({"flag": "yes", "word": "a1"})))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
