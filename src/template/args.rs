use super::HydrationRequest;
use crate::{Error, Result};

/// Parses raw command-line words into a [`HydrationRequest`].
///
/// `--key=value` sets a parameter. Every word after a lone `--`, and any bare
/// word before it, is trailing text in the order given. A repeated key or a
/// `--flag` without `=` is rejected.
pub fn parse_args<I, S>(args: I) -> Result<HydrationRequest>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut request = HydrationRequest::new();
    let mut after_separator = false;

    for arg in args {
        let arg = arg.as_ref();
        if after_separator {
            request.trailing_text.push(arg.to_string());
            continue;
        }
        if arg == "--" {
            after_separator = true;
            continue;
        }
        let Some(flag) = arg.strip_prefix("--") else {
            request.trailing_text.push(arg.to_string());
            continue;
        };
        let Some((key, value)) = flag.split_once('=') else {
            return Err(Error::InvalidInput(format!(
                "expected --key=value, got '{arg}'"
            )));
        };
        if key.is_empty() {
            return Err(Error::InvalidInput(format!("empty parameter name in '{arg}'")));
        }
        if request
            .named_params
            .insert(key.to_string(), value.to_string())
            .is_some()
        {
            return Err(Error::InvalidInput(format!("parameter '{key}' given twice")));
        }
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_and_trailing() {
        let request = parse_args(["--name=Ada", "--lang=rust", "--", "be", "--brief"]).unwrap();
        assert_eq!(request.named_params.get("name").map(String::as_str), Some("Ada"));
        assert_eq!(request.named_params.get("lang").map(String::as_str), Some("rust"));
        assert_eq!(request.trailing_text, vec!["be", "--brief"]);
    }

    #[test]
    fn test_bare_words_are_trailing() {
        let request = parse_args(["do", "--x=1", "the", "thing"]).unwrap();
        assert_eq!(request.trailing_text, vec!["do", "the", "thing"]);
        assert_eq!(request.named_params.len(), 1);
    }

    #[test]
    fn test_value_may_contain_equals_or_be_empty() {
        let request = parse_args(["--expr=a=b", "--blank="]).unwrap();
        assert_eq!(request.named_params["expr"], "a=b");
        assert_eq!(request.named_params["blank"], "");
    }

    #[test]
    fn test_rejects_malformed_flags() {
        for args in [vec!["--flag"], vec!["--=v"], vec!["--a=1", "--a=2"]] {
            let err = parse_args(args).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }
}
