/// Upper-cases `input` and appends `default_suffix` unless it already ends
/// with one of `known_suffixes` (compared case-insensitively).
pub fn normalize_ticker(input: &str, default_suffix: &str, known_suffixes: &[String]) -> String {
    let ticker = input.trim().to_uppercase();
    let has_suffix = known_suffixes
        .iter()
        .any(|suffix| ticker.ends_with(&suffix.to_uppercase()));
    if has_suffix {
        ticker
    } else {
        format!("{ticker}{}", default_suffix.to_uppercase())
    }
}

/// Splits whitespace separated user input into tickers.
pub fn parse_ticker_list(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        vec![".TW".to_string(), ".TWO".to_string()]
    }

    #[test]
    fn test_appends_default_suffix() {
        assert_eq!(normalize_ticker("2330", ".TW", &suffixes()), "2330.TW");
        assert_eq!(normalize_ticker(" 0050 ", ".TW", &suffixes()), "0050.TW");
    }

    #[test]
    fn test_keeps_known_suffix() {
        assert_eq!(normalize_ticker("6488.two", ".TW", &suffixes()), "6488.TWO");
        assert_eq!(normalize_ticker("00631l.tw", ".TW", &suffixes()), "00631L.TW");
    }

    #[test]
    fn test_parse_ticker_list() {
        assert_eq!(
            parse_ticker_list("  0050 2330\t0056 \n"),
            vec!["0050", "2330", "0056"]
        );
        assert!(parse_ticker_list("   ").is_empty());
    }
}
