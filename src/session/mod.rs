use std::io::Write;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::controller::{Completion, PageRequest, ViewController};
use crate::fetcher::{FetchError, ListFetcher};
use crate::filters::{FieldKind, FilterTables};
use crate::model::{Category, ListPage};
use crate::output::{self, cards, Loader};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    More,
    Go(Category),
    Open(String),
    Set { field: String, value: String },
    Unset(String),
    Search,
    Clear,
    Filters,
    Show,
    Url,
    Home,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let cmd = match word.to_ascii_lowercase().as_str() {
        "" | "m" | "more" | "next" => Command::More,
        "go" | "category" | "cat" => {
            if rest.is_empty() {
                return Err("usage: go <Characters|Locations|Episodes>".to_string());
            }
            Command::Go(rest.parse::<Category>()?)
        }
        "open" => {
            if rest.is_empty() {
                return Err("usage: open <query>".to_string());
            }
            Command::Open(rest.to_string())
        }
        "set" => {
            let (field, value) = match rest.split_once('=') {
                Some((field, value)) => (field.trim(), value.trim()),
                None => match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field.trim(), value.trim()),
                    None => (rest, ""),
                },
            };
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            Command::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "unset" => {
            if rest.is_empty() {
                return Err("usage: unset <field>".to_string());
            }
            Command::Unset(rest.to_string())
        }
        "search" | "s" => Command::Search,
        "clear" => Command::Clear,
        "filters" | "f" => Command::Filters,
        "show" | "ls" => Command::Show,
        "url" => Command::Url,
        "home" => Command::Home,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}', type 'help'")),
    };
    Ok(cmd)
}

const HELP: &str = "\
commands:
  more | <enter>        load the next page (scroll to the end of the list)
  go <category>         switch to Characters, Locations or Episodes
  open <query>          follow a view query, e.g. open ?category=Episodes&name=Pilot
  set <field> <value>   set a filter field for the current category
  unset <field>         clear one filter field
  search                run the filtered query
  clear                 reset every filter and reload the first page
  filters               show the filter fields of the current category
  show                  print the current list again
  url                   print the view query for the current state
  home                  back to the main view
  quit                  leave
";

type Pending = BoxFuture<'static, (PageRequest, Result<ListPage, FetchError>)>;

enum Screen {
    Main(ViewController),
    Redirect { requested: String },
}

struct Session {
    fetcher: Arc<dyn ListFetcher>,
    pending: FuturesUnordered<Pending>,
    loader: Option<Loader>,
    no_color: bool,
}

impl Session {
    fn issue(&mut self, request: Option<PageRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        debug!(category = %request.query.category, page = request.query.page, "request issued");
        let fetcher = self.fetcher.clone();
        self.pending.push(
            async move {
                let result = fetcher.fetch(&request.query).await;
                (request, result)
            }
            .boxed(),
        );
        if self.loader.is_none() {
            self.loader = Some(Loader::start("loading...".to_string(), false));
        }
        true
    }

    fn stop_loader(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.finish();
        }
    }

    // results owed to a replaced screen are never applied
    fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "dropping requests of the previous view");
        }
        self.pending = FuturesUnordered::new();
        self.stop_loader();
    }

    fn mount(&mut self, query: &str) -> Screen {
        self.discard_pending();
        match ViewController::mount(query, FilterTables::default()) {
            Ok((view, request)) => {
                print!("{}", output::render_header(view.category(), self.no_color));
                self.issue(Some(request));
                Screen::Main(view)
            }
            Err(redirect) => {
                print!(
                    "{}",
                    output::render_redirect_page(
                        &redirect.requested,
                        "type 'home' to go back to the main view",
                        self.no_color
                    )
                );
                Screen::Redirect {
                    requested: redirect.requested,
                }
            }
        }
    }

    fn render_completion(&self, view: &mut ViewController, completion: Completion) {
        match completion {
            Completion::Appended { page: 1, .. } | Completion::Replaced { .. } => {
                print!("{}", output::render_header(view.category(), self.no_color));
                print!("{}", output::render_view(view, self.no_color));
            }
            Completion::Appended { added, .. } => {
                let records = view.records();
                let start = records.len().saturating_sub(added);
                for (idx, record) in records.iter().enumerate().skip(start) {
                    println!("{}", cards::render_card(idx + 1, record, self.no_color));
                }
                print!("{}", output::render_status(view, self.no_color));
            }
            Completion::Empty | Completion::Failed => {
                print!("{}", output::render_status(view, self.no_color));
            }
            Completion::Stale => {}
        }
        view.sync_sentinel();
    }
}

fn print_filters(view: &ViewController) {
    let filters = view.filters().filters(view.category());
    for (spec, (name, value)) in filters.specs().iter().zip(filters.entries()) {
        match spec.kind {
            FieldKind::Text => println!("  {name:<10} {value:?}"),
            FieldKind::Choice(options) => {
                println!("  {name:<10} {value}  (one of {})", options.join(", "))
            }
        }
    }
}

/// Handles one command; returns `false` when the session should end.
fn handle(session: &mut Session, screen: &mut Screen, cmd: Command) -> bool {
    if cmd == Command::Quit {
        return false;
    }
    if cmd == Command::Help {
        print!("{HELP}");
        return true;
    }

    let view = match screen {
        Screen::Main(view) => view,
        Screen::Redirect { requested } => {
            let requested = requested.clone();
            match cmd {
                Command::Home => *screen = session.mount(""),
                Command::Open(query) => *screen = session.mount(&query),
                _ => println!("unknown category '{requested}'; type 'home' to recover"),
            }
            return true;
        }
    };

    match cmd {
        Command::More => {
            if view.is_loading() {
                println!("still loading, try again in a moment");
            } else if view.has_filters() {
                println!("paging is off while filters are applied; 'clear' to resume");
            } else if !session.issue(view.load_more()) {
                println!("no more pages");
            }
        }
        Command::Go(category) => {
            if !session.issue(view.switch_category(category)) {
                println!("already on {category}");
            }
        }
        Command::Open(query) => match view.navigate(&query) {
            Ok(request) => {
                session.issue(request);
            }
            Err(redirect) => {
                view.teardown();
                session.discard_pending();
                print!(
                    "{}",
                    output::render_redirect_page(
                        &redirect.requested,
                        "type 'home' to go back to the main view",
                        session.no_color
                    )
                );
                *screen = Screen::Redirect {
                    requested: redirect.requested,
                };
            }
        },
        Command::Home => {
            if !session.issue(view.switch_category(Category::default())) {
                println!("already on {}; 'clear' resets the filters", Category::default());
            }
        }
        Command::Set { field, value } => match view.set_filter(&field, &value) {
            Ok(()) => println!("  {field} = {value:?}"),
            Err(e) => println!("{e}"),
        },
        Command::Unset(field) => {
            if let Err(e) = view.set_filter(&field, "") {
                println!("{e}");
            }
        }
        Command::Search => {
            if view.is_loading() {
                println!("still loading, try again in a moment");
            } else if !session.issue(view.search()) {
                println!("set at least one filter first");
            }
        }
        Command::Clear => {
            session.issue(view.clear_filters());
        }
        Command::Filters => print_filters(view),
        Command::Show => {
            print!("{}", output::render_header(view.category(), session.no_color));
            print!("{}", output::render_view(view, session.no_color));
        }
        Command::Url => println!("?{}", view.location()),
        Command::Help | Command::Quit => {}
    }
    true
}

pub async fn run_session(
    fetcher: Arc<dyn ListFetcher>,
    query: &str,
    no_color: bool,
) -> Result<(), String> {
    let mut session = Session {
        fetcher,
        pending: FuturesUnordered::new(),
        loader: None,
        no_color,
    };
    let mut screen = session.mount(query);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Err(e) = std::io::stdout().flush() {
            debug!(error = %e, "stdout flush failed");
        }
        tokio::select! {
            Some((request, result)) = session.pending.next(), if !session.pending.is_empty() => {
                if let Screen::Main(view) = &mut screen {
                    let completion = view.complete(&request, result);
                    if !view.is_loading() {
                        session.stop_loader();
                    }
                    session.render_completion(view, completion);
                }
                if session.pending.is_empty() {
                    session.stop_loader();
                }
            }
            line = lines.next_line() => {
                let line = line.map_err(|e| format!("failed to read stdin: {e}"))?;
                let Some(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    Ok(cmd) => {
                        if !handle(&mut session, &mut screen, cmd) {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    session.stop_loader();
    if let Screen::Main(view) = &mut screen {
        view.teardown();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct NoPages;

    #[async_trait]
    impl ListFetcher for NoPages {
        async fn fetch(&self, _query: &crate::fetcher::PageQuery) -> Result<ListPage, FetchError> {
            Ok(ListPage::empty())
        }
    }

    fn session() -> Session {
        Session {
            fetcher: Arc::new(NoPages),
            pending: FuturesUnordered::new(),
            loader: None,
            no_color: true,
        }
    }

    #[test]
    fn redirect_drops_requests_of_the_torn_down_view() {
        let mut session = session();
        let mut screen = session.mount("category=Characters&name=Rick");
        assert_eq!(session.pending.len(), 1);

        assert!(handle(
            &mut session,
            &mut screen,
            Command::Open("category=Bogus".to_string())
        ));
        assert!(matches!(screen, Screen::Redirect { .. }));
        assert!(session.pending.is_empty());

        assert!(handle(&mut session, &mut screen, Command::Home));
        assert!(matches!(screen, Screen::Main(_)));
        assert_eq!(session.pending.len(), 1);
        session.stop_loader();
    }

    #[test]
    fn home_on_the_default_category_issues_nothing() {
        let mut session = session();
        let mut screen = session.mount("");
        session.discard_pending();
        assert!(handle(&mut session, &mut screen, Command::Home));
        assert!(session.pending.is_empty());
    }

    #[test]
    fn empty_line_loads_more() {
        assert_eq!(parse_command(""), Ok(Command::More));
        assert_eq!(parse_command("  more "), Ok(Command::More));
    }

    #[test]
    fn go_takes_a_category() {
        assert_eq!(parse_command("go episodes"), Ok(Command::Go(Category::Episodes)));
        assert!(parse_command("go").is_err());
        assert!(parse_command("go planets").is_err());
    }

    #[test]
    fn set_accepts_space_or_equals() {
        let expected = Command::Set {
            field: "name".to_string(),
            value: "Summer Smith".to_string(),
        };
        assert_eq!(parse_command("set name Summer Smith"), Ok(expected.clone()));
        assert_eq!(parse_command("set name=Summer Smith"), Ok(expected));
        assert!(parse_command("set").is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_command("dance").is_err());
        assert_eq!(parse_command("Q"), Ok(Command::Quit));
    }
}
