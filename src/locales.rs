//! Built-in English messages
//!
//! Used as the last step of message resolution when no error map yields a
//! message.

use crate::issues::{ErrorMap, IssueCode, RawIssue};
use crate::value::Value;

/// The built-in English locale as an error map
pub fn en() -> ErrorMap {
    ErrorMap::new(|issue| Some(english_message(issue)))
}

fn sizing(origin: &str) -> Option<(&'static str, &'static str)> {
    match origin {
        "string" => Some(("characters", "to have")),
        "array" => Some(("items", "to have")),
        "object" | "record" => Some(("keys", "to have")),
        _ => None,
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

/// English message for a raw issue
pub fn english_message(issue: &RawIssue) -> String {
    match issue.code {
        IssueCode::InvalidType => format!(
            "Invalid input: expected {}, received {}",
            issue.property_str("expected").unwrap_or_else(|| "value".into()),
            issue.property_str("received").unwrap_or_else(|| "unknown".into()),
        ),
        IssueCode::InvalidValue => {
            let values = match issue.property("values") {
                Some(Value::Array(values)) => values.clone(),
                _ => Vec::new(),
            };
            if values.len() == 1 {
                format!("Invalid input: expected {}", values[0])
            } else {
                format!("Invalid option: expected one of {}", join_values(&values))
            }
        }
        IssueCode::TooBig | IssueCode::TooSmall => bound_message(issue),
        IssueCode::InvalidFormat => format_message(issue),
        IssueCode::NotMultipleOf => format!(
            "Invalid number: must be a multiple of {}",
            issue.property_str("divisor").unwrap_or_default()
        ),
        IssueCode::UnrecognizedKeys => {
            let keys = match issue.property("keys") {
                Some(Value::Array(keys)) => keys.iter().map(|k| k.to_string()).collect(),
                _ => Vec::new(),
            };
            let noun = if keys.len() > 1 { "keys" } else { "key" };
            format!("Unrecognized {}: {}", noun, keys.join(", "))
        }
        IssueCode::InvalidKey => format!(
            "Invalid key in {}",
            issue.property_str("origin").unwrap_or_else(|| "record".into())
        ),
        IssueCode::InvalidElement => format!(
            "Invalid value in {}",
            issue.property_str("origin").unwrap_or_else(|| "collection".into())
        ),
        IssueCode::InvalidUnion => "Invalid input".to_string(),
        IssueCode::InvalidDiscriminator => {
            let options = match issue.property("options") {
                Some(Value::Array(options)) => join_values(options),
                _ => String::new(),
            };
            format!(
                "Invalid discriminator value at key \"{}\": expected one of {}",
                issue.property_str("key").unwrap_or_default(),
                options
            )
        }
        IssueCode::IncompatibleTypes => "Intersection results could not be merged".to_string(),
        IssueCode::Custom => "Invalid input".to_string(),
    }
}

fn bound_message(issue: &RawIssue) -> String {
    let big = issue.code == IssueCode::TooBig;
    let inclusive = matches!(issue.property("inclusive"), Some(Value::Bool(true)));
    let exact = matches!(issue.property("exact"), Some(Value::Bool(true)));
    let origin = issue.property_str("origin").unwrap_or_else(|| "value".into());
    let bound = issue
        .property_str(if big { "maximum" } else { "minimum" })
        .unwrap_or_default();
    let head = if big { "Too big" } else { "Too small" };
    let comparator = match (big, inclusive, exact) {
        (_, _, true) => "",
        (true, true, _) => "<=",
        (true, false, _) => "<",
        (false, true, _) => ">=",
        (false, false, _) => ">",
    };

    match sizing(&origin) {
        Some((unit, verb)) => format!(
            "{}: expected {} {} {}{} {}",
            head, origin, verb, comparator, bound, unit
        ),
        None => format!("{}: expected {} to be {}{}", head, origin, comparator, bound),
    }
}

fn format_message(issue: &RawIssue) -> String {
    let format = issue.property_str("format").unwrap_or_else(|| "format".into());
    match format.as_str() {
        "starts_with" => format!(
            "Invalid string: must start with \"{}\"",
            issue.property_str("prefix").unwrap_or_default()
        ),
        "ends_with" => format!(
            "Invalid string: must end with \"{}\"",
            issue.property_str("suffix").unwrap_or_default()
        ),
        "includes" => format!(
            "Invalid string: must include \"{}\"",
            issue.property_str("includes").unwrap_or_default()
        ),
        "regex" => format!(
            "Invalid string: must match pattern /{}/",
            issue.property_str("pattern").unwrap_or_default()
        ),
        "lowercase" => "Invalid string: must be lowercase".to_string(),
        "uppercase" => "Invalid string: must be uppercase".to_string(),
        other => format!("Invalid {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_type_message() {
        let issue = RawIssue::invalid_type("string", &Value::Int(42));
        assert_eq!(
            english_message(&issue),
            "Invalid input: expected string, received number"
        );
    }

    #[test]
    fn test_string_bound_messages() {
        let issue = RawIssue::new(IssueCode::TooSmall)
            .with_property("minimum", 2i64)
            .with_property("inclusive", true)
            .with_property("origin", "string");
        assert_eq!(
            english_message(&issue),
            "Too small: expected string to have >=2 characters"
        );
    }

    #[test]
    fn test_number_bound_messages() {
        let issue = RawIssue::new(IssueCode::TooBig)
            .with_property("maximum", 120i64)
            .with_property("inclusive", false)
            .with_property("origin", "number");
        assert_eq!(english_message(&issue), "Too big: expected number to be <120");
    }

    #[test]
    fn test_invalid_value_messages() {
        let one = RawIssue::new(IssueCode::InvalidValue)
            .with_property("values", vec![Value::from("a")]);
        assert_eq!(english_message(&one), "Invalid input: expected \"a\"");

        let many = RawIssue::new(IssueCode::InvalidValue)
            .with_property("values", vec![Value::from("a"), Value::from("b")]);
        assert_eq!(english_message(&many), "Invalid option: expected one of \"a\"|\"b\"");
    }

    #[test]
    fn test_format_messages() {
        let issue = RawIssue::new(IssueCode::InvalidFormat)
            .with_property("format", "starts_with")
            .with_property("prefix", "ab");
        assert_eq!(english_message(&issue), "Invalid string: must start with \"ab\"");

        let email = RawIssue::new(IssueCode::InvalidFormat).with_property("format", "email");
        assert_eq!(english_message(&email), "Invalid email");
    }

    #[test]
    fn test_unrecognized_keys_message() {
        let issue = RawIssue::new(IssueCode::UnrecognizedKeys)
            .with_property("keys", vec![Value::from("a"), Value::from("b")]);
        assert_eq!(english_message(&issue), "Unrecognized keys: \"a\", \"b\"");
    }

    #[test]
    fn test_en_map_always_answers() {
        let issue = RawIssue::new(IssueCode::Custom);
        assert_eq!(en().resolve(&issue).as_deref(), Some("Invalid input"));
    }
}
