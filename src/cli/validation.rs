use crate::cli::args::CliArgs;
use crate::model::Category;

/// Splits `KEY=VALUE`; the value may be empty, the key may not.
pub fn parse_filter_arg(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| "expected KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("filter key is empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.query.is_some() && (args.category.is_some() || !args.filter.is_empty()) {
        return Err("use either --query or --category/--filter, not both".to_string());
    }
    if let Some(raw) = args.category.as_deref() {
        raw.parse::<Category>()
            .map_err(|e| format!("invalid --category '{raw}': {e}"))?;
    }
    for raw in args.filter.iter() {
        parse_filter_arg(raw).map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
    }
    if let Some(pages) = args.pages {
        if pages == 0 {
            return Err("invalid --pages, expected positive integer".to_string());
        }
    }
    if args.json && args.output_format.is_some() {
        return Err("use either --json or --output-format, not both".to_string());
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if args.interactive && (args.json || args.pages.is_some()) {
        return Err("--json and --pages only apply to batch mode".to_string());
    }
    if let Some(base) = args.api_base.as_deref() {
        reqwest::Url::parse(base).map_err(|e| format!("invalid --api-base '{base}': {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["catalogview"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn filter_arg_splits_on_first_equals() {
        assert_eq!(
            parse_filter_arg("name=a=b").unwrap(),
            ("name".to_string(), "a=b".to_string())
        );
        assert!(parse_filter_arg("name").is_err());
        assert!(parse_filter_arg("=Rick").is_err());
    }

    #[test]
    fn query_conflicts_with_category() {
        assert!(validate(&args(&["-q", "category=Episodes", "--category", "Episodes"])).is_err());
        assert!(validate(&args(&["-q", "category=Episodes"])).is_ok());
    }

    #[test]
    fn rejects_zero_pages_and_bad_category() {
        assert!(validate(&args(&["--pages", "0"])).is_err());
        assert!(validate(&args(&["--category", "planets"])).is_err());
        assert!(validate(&args(&["--category", "locations", "--pages", "2"])).is_ok());
    }

    #[test]
    fn rejects_bad_api_base() {
        assert!(validate(&args(&["--api-base", "not a url"])).is_err());
    }
}
