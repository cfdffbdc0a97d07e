use std::time::Duration;

use deck_core::debounce::{Debouncer, RequestTokens};
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn keystrokes_within_window_issue_one_query_with_final_text() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut debouncer = Debouncer::new(Duration::from_millis(280), tx);

    debouncer.push("r".to_string());
    tokio::time::sleep(Duration::from_millis(40)).await;
    debouncer.push("ra".to_string());
    tokio::time::sleep(Duration::from_millis(40)).await;
    debouncer.push("rad".to_string());

    tokio::time::sleep(Duration::from_millis(279)).await;
    assert!(rx.try_recv().is_err(), "fired before the window elapsed");

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(rx.recv().await.as_deref(), Some("rad"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(rx.try_recv().is_err(), "more than one query was issued");
}

#[tokio::test(start_paused = true)]
async fn pauses_longer_than_window_issue_separate_queries() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut debouncer = Debouncer::new(Duration::from_millis(280), tx);
    let mut tokens = RequestTokens::default();

    debouncer.push("one");
    let first = rx.recv().await.map(|q| (q, tokens.issue()));
    debouncer.push("two");
    let second = rx.recv().await.map(|q| (q, tokens.issue()));

    let (q1, t1) = first.unwrap();
    let (q2, t2) = second.unwrap();
    assert_eq!((q1, q2), ("one", "two"));
    assert!(!tokens.is_current(t1));
    assert!(tokens.is_current(t2));
}
