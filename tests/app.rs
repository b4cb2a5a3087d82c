//! Boots the real application with a stub snapshot source and scrapes the
//! live `/metrics` endpoint over HTTP.

mod helpers;

use std::sync::Arc;

use gridwatch::app::App;
use gridwatch::config::Config;
use helpers::{sample_report, FailingSource, StaticSource};

fn test_config() -> Config {
    let mut config = Config::default();
    // Ephemeral port so parallel tests never collide.
    config.listen_address = "127.0.0.1:0".parse().unwrap();
    config
}

#[tokio::test]
async fn serves_the_full_metric_set_over_http() {
    let app = App::builder(test_config())
        .source_override(Arc::new(StaticSource::new(sample_report())))
        .build()
        .await
        .expect("app should start");

    let body = reqwest::get(format!("http://{}/metrics", app.metrics_addr()))
        .await
        .expect("scrape should succeed")
        .error_for_status()
        .expect("scrape should be a 200")
        .text()
        .await
        .unwrap();

    assert!(body.contains("# HELP total_slots_count"));
    assert!(body.contains(r#"total_slots_count{hostname="hostA",queue="all.q"} 10"#));
    assert!(body.contains(r#"free_memory_bytes{hostname="hostA",queue="all.q"} 536870912"#));
    assert!(body.contains("job_state_value{"));
    assert!(body.contains(r#"owner="bob""#));

    app.shutdown().await;
}

#[tokio::test]
async fn scheduler_outage_is_a_normal_empty_scrape() {
    let app = App::builder(test_config())
        .source_override(Arc::new(FailingSource))
        .build()
        .await
        .expect("app should start");

    let response = reqwest::get(format!("http://{}/metrics", app.metrics_addr()))
        .await
        .expect("scrape should succeed");
    assert!(response.status().is_success());

    let body = response.text().await.unwrap();
    assert!(
        !body.contains("total_slots_count"),
        "an unavailable scheduler must not produce samples, got:\n{body}"
    );

    app.shutdown().await;
}

#[tokio::test]
async fn consecutive_scrapes_recompute_from_the_source() {
    let app = App::builder(test_config())
        .source_override(Arc::new(StaticSource::new(sample_report())))
        .build()
        .await
        .expect("app should start");

    let url = format!("http://{}/metrics", app.metrics_addr());
    let first = reqwest::get(&url).await.unwrap().text().await.unwrap();
    let second = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(first, second);

    app.shutdown().await;
}
