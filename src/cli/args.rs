use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalogview",
    version,
    about = "browse the Rick and Morty catalog from a terminal",
    long_about = "catalogview browses the characters, locations and episodes of the Rick and Morty REST API, one page at a time.\n\nExamples:\n  catalogview --category Locations --pages 2\n  catalogview -q '?category=Characters&name=Rick&status=Alive'\n  catalogview --category Episodes --filter episode=S01 --json\n  catalogview -I\n\nTip: Use --config to persist settings such as the API base and rate limit."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'j',
        long = "json",
        help_heading = "Output",
        help = "Print the final view as JSON (shorthand for --output-format json)."
    )]
    pub json: bool,

    #[arg(
        short = 'A',
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'q',
        long = "query",
        value_name = "QUERY",
        help_heading = "View",
        help = "View query string, e.g. '?category=Locations&name=Earth'."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'c',
        long = "category",
        value_name = "CATEGORY",
        help_heading = "View",
        help = "Category to open (Characters, Locations or Episodes)."
    )]
    pub category: Option<String>,

    #[arg(
        short = 'f',
        long = "filter",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        help_heading = "View",
        help = "Filter field for the category (repeatable)."
    )]
    pub filter: Vec<String>,

    #[arg(
        short = 'p',
        long = "pages",
        value_name = "N",
        help_heading = "View",
        help = "Number of pages to load in batch mode."
    )]
    pub pages: Option<u32>,

    #[arg(
        short = 'I',
        long = "interactive",
        help_heading = "View",
        help = "Start an interactive session (type 'help' for commands)."
    )]
    pub interactive: bool,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.catalogview/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Config",
        help = "Write a default config file to the config path and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'b',
        long = "api-base",
        value_name = "URL",
        help_heading = "HTTP",
        help = "API base URL (default https://rickandmortyapi.com/api)."
    )]
    pub api_base: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (0 = none)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "HTTP",
        help = "Request rate limit in requests per second (0 = unlimited)."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 'x',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,
}
