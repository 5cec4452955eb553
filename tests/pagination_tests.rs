use std::future::{Ready, ready};

use adreport::{Page, Paginator, collect_all, for_each_item};
use anyhow::{Result, anyhow};

fn page(items: &[u32], next: Option<&str>) -> Page<u32> {
    Page::new(Some(items.to_vec()), next.map(String::from))
}

/// Serves `pages` in order and records the cursor each call received.
fn serve(
    pages: Vec<Page<u32>>,
    seen: &mut Vec<Option<String>>,
) -> impl FnMut(Option<String>) -> Ready<Result<Page<u32>>> + '_ {
    let mut pages = pages.into_iter();
    move |cursor| {
        seen.push(cursor);
        ready(pages.next().ok_or_else(|| anyhow!("called past the last page")))
    }
}

#[tokio::test]
async fn follows_cursor_until_absent() {
    let mut seen = Vec::new();
    let pages = vec![
        page(&[1, 2], Some("t1")),
        page(&[3], Some("t2")),
        page(&[4, 5], None),
    ];
    let items = collect_all(serve(pages, &mut seen)).await.unwrap();
    assert_eq!(items, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        seen,
        vec![None, Some("t1".to_string()), Some("t2".to_string())]
    );
}

#[tokio::test]
async fn empty_and_absent_pages_do_not_stop_enumeration() {
    let mut seen = Vec::new();
    let pages = vec![
        page(&[], Some("t1")),
        Page::new(None, Some("t2".into())),
        page(&[7], None),
    ];
    let items = collect_all(serve(pages, &mut seen)).await.unwrap();
    assert_eq!(items, vec![7]);
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn single_call_when_first_page_has_no_cursor() {
    let mut seen = Vec::new();
    let items = collect_all(serve(vec![Page::empty()], &mut seen))
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(seen, vec![None]);
}

#[tokio::test]
async fn empty_token_ends_enumeration() {
    let mut seen = Vec::new();
    let pages = vec![page(&[1], Some(""))];
    let items = collect_all(serve(pages, &mut seen)).await.unwrap();
    assert_eq!(items, vec![1]);
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn for_each_item_preserves_order_and_counts() {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    let pages = vec![page(&[9, 8], Some("a")), page(&[7], None)];
    let count = for_each_item(serve(pages, &mut seen), |i| out.push(i))
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(out, vec![9, 8, 7]);
}

#[tokio::test]
async fn error_propagates_and_cursor_is_kept() {
    let mut calls: Vec<Option<String>> = Vec::new();
    let mut fail_next = false;
    let mut pager = Paginator::new(|cursor: Option<String>| {
        calls.push(cursor.clone());
        let result = match cursor.as_deref() {
            None => Ok(page(&[1], Some("t1"))),
            Some("t1") if !fail_next => {
                fail_next = true;
                Err(anyhow!("quota exceeded"))
            }
            Some(_) => Ok(page(&[2], None)),
        };
        ready(result)
    });

    assert_eq!(pager.next_page().await.unwrap(), Some(vec![1]));
    let err = pager.next_page().await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(pager.next_page().await.unwrap(), Some(vec![2]));
    assert_eq!(pager.next_page().await.unwrap(), None);
    assert!(pager.is_exhausted());
    assert_eq!(pager.pages_fetched(), 2);
    drop(pager);

    assert_eq!(
        calls,
        vec![None, Some("t1".to_string()), Some("t1".to_string())]
    );
}

#[tokio::test]
async fn restart_begins_again_from_first_page() {
    let mut calls = 0;
    let mut pager = Paginator::new(|cursor: Option<String>| {
        calls += 1;
        ready(Ok::<_, anyhow::Error>(match cursor {
            None => page(&[1], Some("next")),
            Some(_) => page(&[2], None),
        }))
    });

    while pager.next_page().await.unwrap().is_some() {}
    pager.restart();
    assert_eq!(pager.pages_fetched(), 0);
    assert_eq!(pager.next_page().await.unwrap(), Some(vec![1]));
    drop(pager);
    assert_eq!(calls, 3);
}

#[test]
fn page_accessors() {
    let p = page(&[1, 2], Some("tok"));
    assert_eq!(p.items(), &[1, 2]);
    assert_eq!(p.next_page_token(), Some("tok"));
    assert!(!p.is_last());
    assert!(Page::<u32>::empty().is_last());
}
