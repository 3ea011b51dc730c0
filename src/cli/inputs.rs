use flowsmith_core_types::Inputs;
use serde_json::Value;

/// Parses `KEY=VALUE`; the value is JSON when it parses as JSON, a string otherwise.
pub fn parse_input(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty input name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn collect_inputs(pairs: Vec<(String, Value)>) -> Inputs {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_are_typed() {
        assert_eq!(parse_input("party_size=2").unwrap(), ("party_size".into(), json!(2)));
        assert_eq!(parse_input("flags=[1,true]").unwrap().1, json!([1, true]));
    }

    #[test]
    fn other_values_stay_strings() {
        assert_eq!(
            parse_input("address=1 Main St").unwrap().1,
            json!("1 Main St")
        );
        assert_eq!(parse_input("time=").unwrap().1, json!(""));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=x").is_err());
    }

    #[test]
    fn later_pairs_win() {
        let inputs = collect_inputs(vec![
            ("a".into(), json!(1)),
            ("a".into(), json!(2)),
        ]);
        assert_eq!(inputs["a"], json!(2));
    }
}
