pub mod cards;

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

use crate::controller::ViewController;
use crate::model::{Category, Record, CATEGORIES};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render_header(active: Category, no_color: bool) -> String {
    let chips = CATEGORIES
        .iter()
        .map(|c| {
            if *c == active {
                let chip = format!("[{}]", c.as_str());
                if no_color {
                    chip
                } else {
                    chip.bold().green().to_string()
                }
            } else {
                format!(" {} ", c.as_str())
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let title = if no_color {
        "Rick and Morty catalog".to_string()
    } else {
        "Rick and Morty catalog".bold().cyan().to_string()
    };
    format!("{title}\n{chips}\n")
}

/// The fallback page shown for an unrecognised category.
pub fn render_redirect_page(requested: &str, recovery: &str, no_color: bool) -> String {
    let heading = "Oops... something went wrong :(";
    let heading = if no_color {
        heading.to_string()
    } else {
        heading.bold().red().to_string()
    };
    format!("{heading}\nunknown category '{requested}'\n{recovery}\n")
}

/// Cards for every record plus a one-line status footer.
pub fn render_view(view: &ViewController, no_color: bool) -> String {
    let mut out = String::new();
    for (idx, record) in view.records().iter().enumerate() {
        out.push_str(&cards::render_card(idx + 1, record, no_color));
        out.push('\n');
    }
    out.push_str(&render_status(view, no_color));
    out
}

pub fn render_status(view: &ViewController, no_color: bool) -> String {
    let state = view.page_state(view.category());
    let mut line = format!(
        ":: {} :: {} shown :: page {}/{}",
        view.category(),
        state.records().len(),
        state.current_page(),
        state.max_pages()
    );
    if view.has_filters() {
        line.push_str(&format!(" :: filtered by {}", view.filters().summary(view.category())));
    } else if !view.can_load_more() && !view.is_loading() && state.current_page() > 0 {
        line.push_str(" :: end of list");
    }
    line.push('\n');
    if no_color {
        line
    } else {
        line.dimmed().to_string()
    }
}

#[derive(Serialize)]
struct JsonView<'a> {
    location: String,
    category: Category,
    page: u32,
    max_pages: u32,
    filtered: bool,
    records: &'a [Record],
}

pub fn render_json(view: &ViewController) -> Vec<u8> {
    let state = view.page_state(view.category());
    let payload = JsonView {
        location: view.location(),
        category: view.category(),
        page: state.current_page(),
        max_pages: state.max_pages(),
        filtered: view.has_filters(),
        records: state.records(),
    };
    serde_json::to_vec_pretty(&payload).unwrap_or_else(|_| b"{}".to_vec())
}

/// Spinner shown while a page request is in flight.
pub struct Loader {
    pb: ProgressBar,
}

impl Loader {
    pub fn start(message: String, hidden: bool) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        });
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterTables;
    use crate::model::{EpisodeRecord, ListPage};

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse(" txt "), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn header_marks_active_category() {
        let header = render_header(Category::Locations, true);
        assert!(header.contains("[Locations]"));
        assert!(header.contains(" Characters "));
    }

    #[test]
    fn json_view_lists_records() {
        let (mut view, request) =
            ViewController::mount("category=Episodes", FilterTables::default()).unwrap();
        view.complete(
            &request,
            Ok(ListPage {
                records: vec![Record::Episode(EpisodeRecord {
                    air_date: "December 2, 2013".to_string(),
                    name: "Pilot".to_string(),
                    episode: "S01E01".to_string(),
                })],
                total_pages: 3,
            }),
        );
        let json: serde_json::Value = serde_json::from_slice(&render_json(&view)).unwrap();
        assert_eq!(json["category"], "Episodes");
        assert_eq!(json["page"], 1);
        assert_eq!(json["max_pages"], 3);
        assert_eq!(json["records"][0]["episode"], "S01E01");
        assert_eq!(json["location"], "category=Episodes");

        let text = render_view(&view, true);
        assert!(text.contains("S01E01"));
        assert!(text.contains("page 1/3"));
    }
}
