// tests/source_twitter.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use social_pipeline::error::{PipelineError, Result};
use social_pipeline::source::dataset::collect;
use social_pipeline::source::twitter::translate::{translate_messages, translate_query, SOURCE_NAME};
use social_pipeline::source::twitter::wire::{SearchResponse, Status, TwitterQuery};
use social_pipeline::config::OAuthCredentials;
use social_pipeline::source::twitter::{HttpTwitterApi, SearchApi, TwitterSource};
use social_pipeline::source::types::NO_MAX_ID;
use social_pipeline::{SocialQuery, SocialSource};

fn status(id: i64, text: &str, retweet: bool) -> Status {
    Status {
        id,
        text: text.to_string(),
        created_at: Utc.with_ymd_and_hms(2018, 5, 1, 12, 0, 0).unwrap(),
        retweet_count: 5,
        favorite_count: 9,
        lang: Some("en".into()),
        retweeted_status: retweet.then(|| serde_json::json!({"id": 1})),
    }
}

fn page(ids: &[i64], more: bool) -> SearchResponse {
    let mut resp = SearchResponse {
        statuses: Some(ids.iter().map(|id| status(*id, &format!("tweet {id}"), false)).collect()),
        ..SearchResponse::default()
    };
    resp.search_metadata.query = Some("rust".into());
    if more {
        let min = ids.iter().min().copied().unwrap_or(0);
        resp.search_metadata.next_results = Some(format!("?max_id={}&q=rust", min - 1));
    }
    resp
}

#[derive(Default)]
struct FakeApi {
    pages: Mutex<VecDeque<Result<SearchResponse>>>,
    seen: Mutex<Vec<TwitterQuery>>,
    calls: Arc<AtomicUsize>,
    consumer: Mutex<Option<(String, String)>>,
    token: Mutex<Option<(String, String)>>,
}

impl FakeApi {
    fn with_pages(pages: Vec<Result<SearchResponse>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SearchApi for FakeApi {
    async fn search(&self, query: &TwitterQuery) -> Result<SearchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(query.clone());
        self.pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    fn set_oauth_consumer(&mut self, key: &str, secret: &str) {
        *self.consumer.lock() = Some((key.into(), secret.into()));
    }

    fn set_oauth_access_token(&mut self, token: &str, token_secret: &str) {
        *self.token.lock() = Some((token.into(), token_secret.into()));
    }
}

#[test]
fn translated_message_preserves_provider_fields() {
    let statuses = vec![status(42, "hello world", true), status(43, "second", false)];
    let msgs = translate_messages(Some(&statuses));
    assert_eq!(msgs.len(), 2);
    let m = &msgs[0];
    assert_eq!(m.id, 42);
    assert_eq!(m.text, "hello world");
    assert_eq!(m.num_of_shares, 5);
    assert_eq!(m.num_of_likes, 9);
    assert!(m.is_share_or_retweet);
    assert!(!msgs[1].is_share_or_retweet);
    assert_eq!(m.source, SOURCE_NAME);
    assert_eq!(m.lang.as_deref(), Some("en"));
    assert_eq!(m.timestamp, statuses[0].created_at.timestamp_millis());
    assert_eq!(m.sentiment, 0.0);
}

#[test]
fn provider_query_translates_to_canonical_query() {
    let q = TwitterQuery {
        query: "rust".into(),
        lang: Some("de".into()),
        count: 15,
        max_id: NO_MAX_ID,
    };
    let s = translate_query(&q);
    assert_eq!(s, SocialQuery::new("rust").with_lang("de").with_count(15));
}

#[tokio::test]
async fn search_applies_lang_count_and_keeps_order() {
    let api = FakeApi::with_pages(vec![Ok(page(&[30, 20, 25], false))]);
    let source = TwitterSource::new(api);

    let q = SocialQuery::new("rust").with_lang("en").with_count(3);
    let result = source.search(&q).await.unwrap();

    let ids: Vec<i64> = result.messages().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![30, 20, 25]);
    assert_eq!(result.query(), Some("rust"));
    assert!(!result.has_next());
    assert!(result.next_query().is_none());

    let sent = source.api().seen.lock()[0].clone();
    assert_eq!(sent.lang.as_deref(), Some("en"));
    assert_eq!(sent.count, 3);
    assert_eq!(sent.max_id, NO_MAX_ID);
}

#[tokio::test]
async fn next_query_strictly_advances_cursor() {
    let api = FakeApi::with_pages(vec![Ok(page(&[100, 90], true))]);
    let source = TwitterSource::new(api);
    let q = SocialQuery::new("rust").with_count(2);

    let result = source.search(&q).await.unwrap();
    assert!(result.has_next());
    let next = result.next_query().expect("has_next implies a next query");
    assert_eq!(next.max_id, 89);
    assert_ne!(next.max_id, q.max_id);
    assert_eq!(next.query, "rust");
    assert_eq!(next.count, 2);
}

#[tokio::test]
async fn stalled_provider_cursor_ends_pagination() {
    let mut stalled = page(&[100], true);
    stalled.search_metadata.next_results = Some("?max_id=150&q=rust".into());
    let api = FakeApi::with_pages(vec![Ok(stalled)]);
    let source = TwitterSource::new(api);

    let result = source
        .search(&SocialQuery::new("rust").with_max_id(120))
        .await
        .unwrap();
    assert!(!result.has_next());
    assert!(result.next_query().is_none());
}

#[tokio::test]
async fn provider_error_is_surfaced_not_emptied() {
    let api = FakeApi::with_pages(vec![Err(PipelineError::provider(SOURCE_NAME, "401 unauthorized"))]);
    let source = TwitterSource::new(api);
    let err = source.search(&SocialQuery::new("rust")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Provider { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn empty_query_text_is_rejected_without_a_call() {
    let api = FakeApi::default();
    let calls = api.calls.clone();
    let source = TwitterSource::new(api);
    let err = source.search(&SocialQuery::new("  ")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Provider { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_statuses_yield_empty_page() {
    let api = FakeApi::with_pages(vec![Ok(SearchResponse::default())]);
    let source = TwitterSource::new(api);
    let result = source.search(&SocialQuery::new("rust")).await.unwrap();
    assert!(result.messages().is_empty());
    assert!(!result.has_next());
}

#[tokio::test]
async fn credentials_are_forwarded_to_client() {
    let mut source = TwitterSource::new(FakeApi::default());
    source.set_credential("ck", "cs");
    source.set_access_token("at", "ats");
    assert_eq!(*source.api().consumer.lock(), Some(("ck".into(), "cs".into())));
    assert_eq!(*source.api().token.lock(), Some(("at".into(), "ats".into())));
}

#[tokio::test]
async fn collect_pages_until_limit() {
    let api = FakeApi::with_pages(vec![
        Ok(page(&[100, 99], true)),
        Ok(page(&[97, 96], true)),
        Ok(page(&[94, 93], true)),
    ]);
    let source = TwitterSource::new(api);

    let msgs = collect(&source, SocialQuery::new("rust").with_count(2), 5)
        .await
        .unwrap();
    assert_eq!(msgs.iter().map(|m| m.id).collect::<Vec<_>>(), vec![100, 99, 97, 96, 94]);

    let cursors: Vec<i64> = source.api().seen.lock().iter().map(|q| q.max_id).collect();
    assert_eq!(cursors, vec![NO_MAX_ID, 98, 95]);
}

#[tokio::test]
async fn collect_stops_when_provider_has_no_more() {
    let api = FakeApi::with_pages(vec![Ok(page(&[10, 9], true)), Ok(page(&[7], false))]);
    let source = TwitterSource::new(api);
    let msgs = collect(&source, SocialQuery::new("rust"), 100).await.unwrap();
    assert_eq!(msgs.len(), 3);
    assert_eq!(source.api().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn access_token_is_stored_without_touching_consumer_pair() {
    let mut api = HttpTwitterApi::new(OAuthCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: String::new(),
        access_token_secret: String::new(),
    })
    .unwrap();
    api.set_oauth_access_token("at", "ats");
    let creds = api.credentials();
    assert_eq!(creds.access_token, "at");
    assert_eq!(creds.access_token_secret, "ats");
    assert_eq!(creds.consumer_key, "ck");
    assert_eq!(creds.consumer_secret, "cs");
}
