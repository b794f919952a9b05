use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::controller::{Completion, ViewController};
use crate::fetcher::{FetcherOptions, HttpListFetcher, ListFetcher, PageQuery};
use crate::filters::FilterTables;
use crate::model::{Category, Record};

const CHARACTERS_PAGE_1: &str = r#"{"info":{"count":3,"pages":2,"next":"x","prev":null},"results":[
    {"id":1,"name":"Rick Sanchez","status":"Alive","species":"Human","gender":"Male","origin":{"name":"Earth (C-137)","url":""},"image":"https://rickandmortyapi.com/api/character/avatar/1.jpeg"},
    {"id":2,"name":"Morty Smith","status":"Alive","species":"Human","gender":"Male","origin":{"name":"unknown","url":""},"image":"https://rickandmortyapi.com/api/character/avatar/2.jpeg"}
]}"#;

const CHARACTERS_PAGE_2: &str = r#"{"info":{"count":3,"pages":2,"next":null,"prev":"x"},"results":[
    {"id":3,"name":"Summer Smith","status":"Alive","species":"Human","gender":"Female","origin":{"name":"Earth (Replacement Dimension)","url":""},"image":"https://rickandmortyapi.com/api/character/avatar/3.jpeg"}
]}"#;

const NOT_FOUND: &str = r#"{"error":"There is nothing here"}"#;

/// Serves canned responses keyed by request target and reports every request
/// line it sees. Returns the api base url.
async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf).to_string();
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("")
                    .to_string();
                let _ = seen_tx.send(target.clone());

                let (status, body) = routes
                    .iter()
                    .find(|(path, _, _)| target.ends_with(path))
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, NOT_FOUND));
                let reason = if status == 200 { "OK" } else { "Not Found" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}/api"), seen_rx)
}

fn fetcher(api_base: &str) -> HttpListFetcher {
    HttpListFetcher::new(&FetcherOptions {
        api_base: api_base.to_string(),
        timeout_seconds: 5,
        ..FetcherOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn http_fetcher_decodes_a_valid_page() {
    let (base, mut seen) = serve(vec![("/character?page=1", 200, CHARACTERS_PAGE_1)]).await;
    let page = fetcher(&base)
        .fetch(&PageQuery {
            category: Category::Characters,
            page: 1,
            params: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(page.total_pages, 2);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].name(), "Rick Sanchez");
    assert_eq!(seen.recv().await.unwrap(), "/api/character?page=1");
}

#[tokio::test]
async fn http_fetcher_turns_error_body_into_empty_page() {
    let (base, _seen) = serve(vec![]).await;
    let page = fetcher(&base)
        .fetch(&PageQuery {
            category: Category::Episodes,
            page: 1,
            params: "name=Nope".to_string(),
        })
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn http_fetcher_sends_filter_params() {
    let (base, mut seen) = serve(vec![]).await;
    let _ = fetcher(&base)
        .fetch(&PageQuery {
            category: Category::Characters,
            page: 1,
            params: "name=Rick&status=alive".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        seen.recv().await.unwrap(),
        "/api/character?page=1&name=Rick&status=alive"
    );
}

#[tokio::test]
async fn http_fetcher_reports_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = fetcher(&format!("http://{addr}/api"))
        .fetch(&PageQuery {
            category: Category::Locations,
            page: 1,
            params: String::new(),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn view_pages_through_http_until_the_last_page() {
    let (base, mut seen) = serve(vec![
        ("/character?page=1", 200, CHARACTERS_PAGE_1),
        ("/character?page=2", 200, CHARACTERS_PAGE_2),
    ])
    .await;
    let fetcher = fetcher(&base);

    let (mut view, request) = ViewController::mount("category=Characters", FilterTables::default()).unwrap();
    assert_eq!(
        view.run(&fetcher, request).await,
        Completion::Appended { page: 1, added: 2 }
    );

    let request = view.load_more().unwrap();
    assert_eq!(
        view.run(&fetcher, request).await,
        Completion::Appended { page: 2, added: 1 }
    );
    assert!(view.load_more().is_none());

    let names: Vec<&str> = view.records().iter().map(Record::name).collect();
    assert_eq!(names, vec!["Rick Sanchez", "Morty Smith", "Summer Smith"]);

    assert_eq!(seen.recv().await.unwrap(), "/api/character?page=1");
    assert_eq!(seen.recv().await.unwrap(), "/api/character?page=2");
}

#[tokio::test]
async fn view_search_with_no_match_keeps_the_list() {
    let (base, _seen) = serve(vec![("/character?page=1", 200, CHARACTERS_PAGE_1)]).await;
    let fetcher = fetcher(&base);

    let (mut view, request) = ViewController::mount("", FilterTables::default()).unwrap();
    view.run(&fetcher, request).await;
    view.set_filter("name", "Nobody").unwrap();

    let request = view.search().unwrap();
    assert_eq!(view.run(&fetcher, request).await, Completion::Empty);
    assert_eq!(view.records().len(), 2);
    assert!(!view.has_filters());
}
