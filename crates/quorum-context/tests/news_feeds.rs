//! Live RSS headlines against a local mock server: per-feed limit, headline
//! format, and skipping of feeds that fail.

use quorum_context::{NewsFeed, RssNews};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, description)| {
            format!("<item><title>{title}</title><description>{description}</description></item>")
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Markets</title><link>http://example.com</link><description>Top stories</description>{items}</channel></rss>"#
    )
}

async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

fn news(server: &MockServer, routes: &[&str], per_feed: usize) -> RssNews {
    let feeds = routes.iter().map(|r| format!("{}{r}", server.uri())).collect();
    RssNews::new(reqwest::Client::new(), feeds, per_feed)
}

#[tokio::test]
async fn takes_first_items_of_each_feed() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/top",
        200,
        channel(&[
            ("Fed holds rates", "Policy unchanged at 5.5%"),
            ("ECB signals cut", "Lagarde points to June"),
            ("Oil jumps 3%", "Supply worries"),
            ("Yen slides", "BoJ stays dovish"),
        ]),
    )
    .await;
    serve(&server, "/fx", 200, channel(&[("Cable firm", "GBP holds 1.27")])).await;

    let items = news(&server, &["/top", "/fx"], 3).fetch_news().await.unwrap();
    assert_eq!(
        items,
        vec![
            "Title: Fed holds rates | Summary: Policy unchanged at 5.5%...",
            "Title: ECB signals cut | Summary: Lagarde points to June...",
            "Title: Oil jumps 3% | Summary: Supply worries...",
            "Title: Cable firm | Summary: GBP holds 1.27...",
        ]
    );
}

#[tokio::test]
async fn long_summaries_are_cut_and_untitled_items_skipped() {
    let server = MockServer::start().await;
    let long = "a".repeat(250);
    serve(&server, "/top", 200, channel(&[("", "no title"), ("Dollar rallies", &long)])).await;

    let items = news(&server, &["/top"], 3).fetch_news().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], format!("Title: Dollar rallies | Summary: {}...", "a".repeat(200)));
}

#[tokio::test]
async fn failing_feeds_are_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/down", 500, "internal".to_string()).await;
    serve(&server, "/garbage", 200, "not a feed".to_string()).await;
    serve(&server, "/fx", 200, channel(&[("Cable firm", "GBP holds 1.27")])).await;

    let items = news(&server, &["/down", "/garbage", "/fx"], 3)
        .fetch_news()
        .await
        .unwrap();
    assert_eq!(items, vec!["Title: Cable firm | Summary: GBP holds 1.27..."]);
}

#[tokio::test]
async fn all_feeds_failing_yields_no_headlines() {
    let server = MockServer::start().await;
    serve(&server, "/down", 503, String::new()).await;

    let items = news(&server, &["/down", "/missing"], 3).fetch_news().await.unwrap();
    assert!(items.is_empty());
}
