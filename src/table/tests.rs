use super::*;
use crate::error::Result;
use crate::spinner::Skeleton;
use crossterm::event::KeyModifiers;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Row {
    id: u32,
}

/// Answers requests from a queue and records every URL asked for.
#[derive(Clone, Default)]
struct Script {
    responses: Arc<Mutex<VecDeque<Result<Value>>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl Script {
    fn push(&self, response: Result<Value>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

fn ok(ids: &[u32], total: Option<usize>) -> Result<Value> {
    let rows: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    let mut body = json!({ "response": "success", "results": rows });
    if let Some(total) = total {
        body["total"] = json!(total);
    }
    Ok(body)
}

fn failed() -> Result<Value> {
    Ok(json!({ "response": "failed" }))
}

fn plain_styles() -> Styles {
    Styles {
        empty: Style::new(),
        hint: Style::new(),
        pagination: Style::new(),
        skeleton: Style::new(),
    }
}

fn table(script: &Script, config: TableConfig) -> Model<Row> {
    let responses = Arc::clone(&script.responses);
    let urls = Arc::clone(&script.urls);
    let source = move |url: &str| -> Result<Value> {
        urls.lock().unwrap().push(url.to_string());
        responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport { status: 599 }))
    };
    let mut t = Model::new(
        source,
        |page, text: &str| format!("mem://rows?page={page}&text={text}"),
        |row: &Row, i| format!("{i}:{}", row.id),
    )
    .with_config(config);
    t.styles = plain_styles();
    t
}

fn limit(n: usize) -> TableConfig {
    TableConfig {
        limit: n,
        ..TableConfig::default()
    }
}

async fn settle(t: &mut Model<Row>, cmd: Cmd) {
    let msg = cmd.await.expect("request yields a message");
    t.update(msg);
}

fn key(code: KeyCode) -> Msg {
    Box::new(KeyMsg {
        key: code,
        modifiers: KeyModifiers::NONE,
    })
}

#[tokio::test]
async fn test_first_request_waits_for_sign_in_state() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(2)));
    let mut t = table(&script, limit(10));

    assert!(t.set_signed_in(None).is_none());
    assert_eq!(t.load_phase(), LoadPhase::Idle);

    let cmd = t.set_signed_in(Some(false)).expect("state is known");
    assert_eq!(t.load_phase(), LoadPhase::Loading);
    settle(&mut t, cmd).await;

    assert_eq!(script.urls(), vec!["mem://rows?page=1&text="]);
    assert_eq!(t.items(), &[Row { id: 1 }, Row { id: 2 }]);
    assert_eq!(t.load_phase(), LoadPhase::Loaded);

    // Same state again does nothing; a change refetches.
    assert!(t.set_signed_in(Some(false)).is_none());
    assert!(t.set_signed_in(Some(true)).is_some());
}

#[tokio::test]
async fn test_fetch_page_replaces_rows_and_total() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(37)));
    script.push(ok(&[3, 4], Some(38)));
    let mut t = table(&script, limit(2));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    let cmd = t.fetch_page(2);
    settle(&mut t, cmd).await;

    assert_eq!(t.items(), &[Row { id: 3 }, Row { id: 4 }]);
    assert_eq!(t.current_page(), 2);
    assert_eq!(t.total_count(), 38);
    assert!(t.pagination_visible());
    assert!(t.view().contains("[2]"));
}

#[tokio::test]
async fn test_failed_page_keeps_rows() {
    let script = Script::default();
    script.push(ok(&[7], Some(1)));
    script.push(failed());
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    let cmd = t.fetch_page(2);
    settle(&mut t, cmd).await;

    assert_eq!(t.load_phase(), LoadPhase::Error);
    assert_eq!(t.items(), &[Row { id: 7 }]);
    assert_eq!(t.current_page(), 1);
    assert_eq!(t.view(), "0:7");
}

#[tokio::test]
async fn test_load_more_appends_while_pages_are_full() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(3)));
    script.push(ok(&[3], Some(3)));
    let config = TableConfig {
        limit: 2,
        pagination: PaginationMode::LoadMore,
        ..TableConfig::default()
    };
    let mut t = table(&script, config);

    assert!(t.load_more().is_none(), "nothing loaded yet");

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    assert!(t.load_more_visible());
    assert!(t.view().contains("[m] Load more"));

    let cmd = t.load_more().expect("first page was full");
    assert!(t.load_more().is_none(), "already in flight");
    settle(&mut t, cmd).await;

    assert_eq!(t.items(), &[Row { id: 1 }, Row { id: 2 }, Row { id: 3 }]);
    assert_eq!(t.current_page(), 2);
    assert_eq!(t.append_phase(), LoadPhase::Loaded);
    assert!(!t.load_more_visible());
    assert!(t.load_more().is_none());
    assert_eq!(script.urls()[1], "mem://rows?page=2&text=");
}

#[tokio::test]
async fn test_failed_search_clears_rows_and_notifies() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(2)));
    script.push(failed());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut t = table(&script, limit(10))
        .with_items_callback(move |rows: &[Row]| sink.lock().unwrap().push(rows.len()));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    let cmd = t.search("zzz");
    settle(&mut t, cmd).await;

    assert!(t.items().is_empty());
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
    assert_eq!(*seen.lock().unwrap(), vec![2, 0]);
    assert!(t.view().contains("No results."));
    assert!(t.view().contains("[r] Refresh"));
}

#[tokio::test]
async fn test_search_resets_to_first_page() {
    let script = Script::default();
    script.push(ok(&[1], Some(30)));
    script.push(ok(&[9], Some(1)));
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(3);
    settle(&mut t, cmd).await;
    assert_eq!(t.current_page(), 3);

    let cmd = t.search("ab");
    settle(&mut t, cmd).await;
    assert_eq!(t.current_page(), 1);
    assert_eq!(t.total_count(), 1);
    assert_eq!(t.search_text(), "ab");
    assert_eq!(script.urls()[1], "mem://rows?page=1&text=ab");
    assert!(!t.pagination_visible());
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let script = Script::default();
    // Responses are handed out in the order requests complete.
    script.push(ok(&[3], Some(50)));
    script.push(ok(&[2], Some(50)));
    let mut t = table(&script, limit(1));

    let slow = t.fetch_page(2);
    let fast = t.fetch_page(3);
    settle(&mut t, fast).await;
    settle(&mut t, slow).await;

    assert_eq!(t.current_page(), 3);
    assert_eq!(t.items(), &[Row { id: 3 }]);
    assert_eq!(t.generation(), 2);
}

fn both(n: usize) -> TableConfig {
    TableConfig {
        limit: n,
        pagination: PaginationMode::Both,
        ..TableConfig::default()
    }
}

#[tokio::test]
async fn test_page_request_abandons_load_more_in_flight() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(6)));
    script.push(ok(&[3, 4], Some(6)));
    script.push(ok(&[1, 2], Some(6)));
    script.push(ok(&[3, 4], Some(6)));
    let mut t = table(&script, both(2));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;

    let append = t.load_more().expect("first page was full");
    let reload = t.fetch_page(1);
    assert_eq!(t.append_phase(), LoadPhase::Idle);
    settle(&mut t, append).await;
    assert_eq!(t.items(), &[Row { id: 1 }, Row { id: 2 }]);
    settle(&mut t, reload).await;
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
    assert_eq!(t.append_phase(), LoadPhase::Idle);

    let cmd = t.load_more().expect("load more works again");
    settle(&mut t, cmd).await;
    assert_eq!(t.items().len(), 4);
    assert_eq!(t.append_phase(), LoadPhase::Loaded);
}

#[tokio::test]
async fn test_load_more_waits_for_page_in_flight() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(6)));
    script.push(ok(&[1, 2], Some(6)));
    script.push(ok(&[3, 4], Some(6)));
    let mut t = table(&script, both(2));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;

    let reload = t.refresh();
    assert!(t.load_more().is_none(), "rows are being replaced");
    assert!(t.update(key(KeyCode::Char('m'))).is_none());
    assert_eq!(t.append_phase(), LoadPhase::Idle);
    settle(&mut t, reload).await;
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
    assert!(t.view().contains("0:1"));

    let cmd = t.load_more().expect("first page was full");
    settle(&mut t, cmd).await;
    assert_eq!(script.urls()[2], "mem://rows?page=2&text=");
    assert_eq!(
        t.items(),
        &[Row { id: 1 }, Row { id: 2 }, Row { id: 3 }, Row { id: 4 }]
    );
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
    assert_eq!(t.append_phase(), LoadPhase::Loaded);
}

#[tokio::test]
async fn test_search_abandons_load_more_in_flight() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(6)));
    script.push(ok(&[3, 4], Some(6)));
    script.push(ok(&[7, 8], Some(3)));
    script.push(ok(&[9], Some(3)));
    let mut t = table(&script, both(2));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;

    let append = t.load_more().expect("first page was full");
    let search = t.search("x");
    settle(&mut t, append).await;
    settle(&mut t, search).await;
    assert_eq!(t.items(), &[Row { id: 7 }, Row { id: 8 }]);
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
    assert_eq!(t.append_phase(), LoadPhase::Idle);
    assert!(t.view().contains("[m] Load more"));

    let cmd = t.load_more().expect("search page was full");
    settle(&mut t, cmd).await;
    assert_eq!(script.urls()[3], "mem://rows?page=2&text=x");
    assert_eq!(t.items(), &[Row { id: 7 }, Row { id: 8 }, Row { id: 9 }]);
}

#[tokio::test]
async fn test_limit_changed_in_place_reaches_page_count() {
    let script = Script::default();
    script.push(ok(&[1], Some(30)));
    let mut t = table(&script, limit(10));
    t.config.limit = 5;

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    assert!(t.pagination_visible());
    assert_eq!(t.paginator.total_pages, 6);
}

#[tokio::test]
async fn test_other_tables_messages_are_ignored() {
    let script = Script::default();
    script.push(ok(&[1], None));
    let mut a = table(&script, limit(10));
    let mut b = table(&Script::default(), limit(10));

    let cmd = a.fetch_page(1);
    let msg = cmd.await.unwrap();
    assert!(b.update(msg).is_none());
    assert!(b.items().is_empty());
    assert_eq!(b.load_phase(), LoadPhase::Idle);
}

#[tokio::test]
async fn test_missing_total_key_keeps_previous_total() {
    let script = Script::default();
    script.push(ok(&[1], Some(25)));
    script.push(ok(&[2], None));
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    let cmd = t.fetch_page(2);
    settle(&mut t, cmd).await;
    assert_eq!(t.total_count(), 25);
}

#[tokio::test]
async fn test_empty_state_refresh_key() {
    let script = Script::default();
    script.push(ok(&[], Some(0)));
    script.push(ok(&[5], Some(1)));
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    assert_eq!(t.view(), "No results.\n[r] Refresh");

    let cmd = t.update(key(KeyCode::Char('r'))).expect("refresh requested");
    settle(&mut t, cmd).await;
    assert_eq!(t.items(), &[Row { id: 5 }]);
}

#[tokio::test]
async fn test_search_bar_submits_through_keys() {
    let script = Script::default();
    script.push(ok(&[4], Some(1)));
    let config = TableConfig {
        searchable: true,
        ..TableConfig::default()
    };
    let mut t = table(&script, config);

    assert!(t.update(key(KeyCode::Char('/'))).is_none());
    assert!(t.update(key(KeyCode::Char('q'))).is_none());
    let cmd = t.update(key(KeyCode::Enter)).expect("search submitted");
    assert!(!t.search_bar.focused());
    settle(&mut t, cmd).await;

    assert_eq!(script.urls(), vec!["mem://rows?page=1&text=q"]);
    assert_eq!(t.items(), &[Row { id: 4 }]);
}

#[tokio::test]
async fn test_page_keys_request_neighbours() {
    let script = Script::default();
    script.push(ok(&[1], Some(30)));
    let mut t = table(&script, limit(10));

    assert!(t.update(key(KeyCode::Right)).is_none(), "nothing to page yet");

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    assert!(t.update(key(KeyCode::Left)).is_none());
    let cmd = t.update(key(KeyCode::Right)).expect("next page requested");
    assert_eq!(t.load_phase(), LoadPhase::Loading);
    settle(&mut t, cmd).await;
    assert_eq!(script.urls().last().unwrap(), "mem://rows?page=2&text=");
    // The script ran dry, so the request failed and page 1 stays.
    assert_eq!(t.load_phase(), LoadPhase::Error);
    assert_eq!(t.current_page(), 1);
}

#[test]
fn test_skeleton_while_loading() {
    let config = TableConfig {
        limit: 3,
        loading: LoadingStyle::Skeleton(Skeleton::Lines),
        ..TableConfig::default()
    };
    let t = table(&Script::default(), config);
    assert_eq!(t.view().lines().count(), 3);
    assert!(t.view().contains('░'));
}

#[test]
fn test_double_pagination_renders_twice() {
    let config = TableConfig {
        limit: 1,
        double_paginated: true,
        ..TableConfig::default()
    };
    let mut t = table(&Script::default(), config);
    t.total_count = 3;
    t.paginator.set_total_items(3);
    t.load_phase = LoadPhase::Loaded;
    t.items = vec![Row { id: 1 }];
    let view = t.view();
    assert_eq!(view.matches("[1]").count(), 2);
    assert!(view.contains("0:1"));
}

#[tokio::test]
async fn test_server_error_keeps_rows_and_refresh_requests_first_page() {
    let script = Script::default();
    script.push(ok(&[1, 2], Some(2)));
    script.push(Err(FetchError::Transport { status: 500 }));
    script.push(ok(&[3], Some(1)));
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(1);
    settle(&mut t, cmd).await;
    let cmd = t.fetch_page(2);
    settle(&mut t, cmd).await;
    assert_eq!(t.load_phase(), LoadPhase::Error);
    assert_eq!(t.items(), &[Row { id: 1 }, Row { id: 2 }]);

    let cmd = t.refresh();
    settle(&mut t, cmd).await;
    assert_eq!(script.urls()[2], "mem://rows?page=1&text=");
    assert_eq!(t.items(), &[Row { id: 3 }]);
    assert_eq!(t.load_phase(), LoadPhase::Loaded);
}

#[tokio::test]
async fn test_empty_search_requests_empty_text() {
    let script = Script::default();
    script.push(ok(&[1], Some(40)));
    script.push(ok(&[8, 9], Some(2)));
    let mut t = table(&script, limit(10));

    let cmd = t.fetch_page(4);
    settle(&mut t, cmd).await;
    let cmd = t.search("");
    settle(&mut t, cmd).await;

    assert_eq!(script.urls()[1], "mem://rows?page=1&text=");
    assert_eq!(t.items(), &[Row { id: 8 }, Row { id: 9 }]);
    assert_eq!(t.current_page(), 1);
}
