use std::fs;
use std::sync::Arc;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Midnight Asia/Taipei on 2024-01-02, 03 and 04.
    pub const TIMESTAMPS: &str = "[1704124800, 1704211200, 1704297600]";

    pub fn chart_body(adjclose: &str) -> String {
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "TWD", "gmtoffset": 28800 }},
                        "timestamp": {TIMESTAMPS},
                        "indicators": {{
                            "quote": [{{ "close": {adjclose} }}],
                            "adjclose": [{{ "adjclose": {adjclose} }}]
                        }}
                    }}],
                    "error": null
                }}
            }}"#
        )
    }

    pub async fn mount_chart(
        mock_server: &MockServer,
        symbol: &str,
        status: u16,
        body: String,
        expected_calls: impl Into<wiremock::Times>,
    ) {
        let url_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(mock_server)
            .await;
    }

    /// 0050.TW misses 01-03, 00631L.TW misses 01-04.
    pub async fn create_mock_server(expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        mount_chart(
            &mock_server,
            "0050.TW",
            200,
            chart_body("[100.0, null, 101.004]"),
            expected_calls,
        )
        .await;
        mount_chart(
            &mock_server,
            "00631L.TW",
            200,
            chart_body("[50.0, 51.0, null]"),
            expected_calls,
        )
        .await;
        mock_server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str, extra: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
providers:
  yahoo:
    base_url: {base_url}
series:
  benchmark:
    symbol: "0050.TW"
    label: "price1x"
  comparisons:
    - symbol: "00631L.TW"
      label: "price2x_631"
  start_date: "2024-01-01"
{extra}
"#
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

async fn spawn_server(base_url: &str) -> String {
    use etfseries::core::config::SeriesConfig;
    use etfseries::providers::yahoo_finance::YahooFinanceProvider;
    use etfseries::server::{self, state::AppState};

    let series: SeriesConfig = serde_yaml::from_str(
        r#"
benchmark:
  symbol: "0050.TW"
  label: "price1x"
comparisons:
  - symbol: "00631L.TW"
    label: "price2x_631"
start_date: "2024-01-01"
"#,
    )
    .unwrap();
    let provider = Arc::new(YahooFinanceProvider::new(base_url));
    let state = AppState::new(provider, series, chrono::Duration::hours(12));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[test_log::test(tokio::test)]
async fn test_liveness_route() {
    let mock_server = test_utils::create_mock_server(0).await;
    let base = spawn_server(&mock_server.uri()).await;

    let response = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        etfseries::server::routes::LIVENESS_MESSAGE
    );
}

#[test_log::test(tokio::test)]
async fn test_history_route_serves_cached_alignment() {
    // Second request must come from the cache
    let mock_server = test_utils::create_mock_server(1).await;
    let base = spawn_server(&mock_server.uri()).await;

    let expected = serde_json::json!([
        {"date": "2024-01-02", "benchmarkPrice": 100.0, "comparisonPrices": {"price2x_631": 50.0}},
        {"date": "2024-01-04", "benchmarkPrice": 101.0, "comparisonPrices": {"price2x_631": null}},
    ]);

    let client = reqwest::Client::new();
    for _ in 0..2 {
        let response = client
            .get(format!("{base}/api/history"))
            .header("Origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
        let body: serde_json::Value = response.json().await.unwrap();
        info!(?body, "History response");
        assert_eq!(body, expected);
    }
}

#[test_log::test(tokio::test)]
async fn test_history_route_without_upstream_data_is_empty() {
    let mock_server = wiremock::MockServer::start().await;
    for symbol in ["0050.TW", "00631L.TW"] {
        test_utils::mount_chart(
            &mock_server,
            symbol,
            200,
            r#"{"chart":{"result":[]}}"#.to_string(),
            1,
        )
        .await;
    }
    let base = spawn_server(&mock_server.uri()).await;

    let response = reqwest::get(format!("{base}/api/history")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[test_log::test(tokio::test)]
async fn test_history_route_reports_upstream_failure() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_chart(&mock_server, "0050.TW", 503, String::new(), 1).await;
    // The sibling request may be dropped once the benchmark fails
    test_utils::mount_chart(
        &mock_server,
        "00631L.TW",
        200,
        test_utils::chart_body("[1.0, 2.0, 3.0]"),
        0..=1,
    )
    .await;
    let base = spawn_server(&mock_server.uri()).await;

    let response = reqwest::get(format!("{base}/api/history")).await.unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Provider unavailable: HTTP error: 503 Service Unavailable for symbol: 0050.TW"
    );
}

#[test_log::test(tokio::test)]
async fn test_history_route_reports_missing_benchmark() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_chart(&mock_server, "0050.TW", 404, String::new(), 1).await;
    test_utils::mount_chart(
        &mock_server,
        "00631L.TW",
        200,
        test_utils::chart_body("[1.0, 2.0, 3.0]"),
        1,
    )
    .await;
    let base = spawn_server(&mock_server.uri()).await;

    let response = reqwest::get(format!("{base}/api/history")).await.unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Benchmark column 0050.TW not found in price table"
    );
}

#[test_log::test(tokio::test)]
async fn test_generate_writes_flat_static_file() {
    let mock_server = test_utils::create_mock_server(1).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("public/data.json");
    let config_path = test_utils::write_config(
        dir.path(),
        &mock_server.uri(),
        &format!(
            "  layout: flat\nexport:\n  output_path: \"{}\"",
            output.display()
        ),
    );

    let result = etfseries::run_command(
        etfseries::AppCommand::Generate { output: None },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Generate failed with: {:?}",
        result.err()
    );

    let content = fs::read_to_string(&output).expect("Static file missing");
    let body: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(
        body,
        serde_json::json!([
            {"date": "2024-01-02", "price1x": 100.0, "price2x_631": 50.0},
            {"date": "2024-01-04", "price1x": 101.0, "price2x_631": null},
        ])
    );
}

#[test_log::test(tokio::test)]
async fn test_download_writes_csv_for_given_tickers() {
    let mock_server = test_utils::create_mock_server(1).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri(), "");
    let output = dir.path().join("compare.csv");

    let options = etfseries::cli::download::DownloadOptions {
        tickers: vec!["0050".to_string(), "00631l.tw".to_string()],
        start: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
        output: Some(output.clone()),
    };
    let result = etfseries::run_command(
        etfseries::AppCommand::Download(options),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Download failed with: {:?}",
        result.err()
    );

    let csv = fs::read_to_string(&output).expect("CSV missing");
    assert_eq!(
        csv.trim_start_matches('\u{feff}'),
        "Date,0050.TW,00631L.TW\n\
         2024-01-02,100.00,50.00\n\
         2024-01-03,,51.00\n\
         2024-01-04,101.00,\n"
    );
}

#[test_log::test(tokio::test)]
#[ignore = "requires network access to Yahoo Finance"]
async fn test_real_yahoo_finance_api() {
    use etfseries::core::price::DailyPriceProvider;
    use etfseries::providers::yahoo_finance::YahooFinanceProvider;

    let provider = YahooFinanceProvider::new("https://query1.finance.yahoo.com");
    let tickers = vec!["0050.TW".to_string()];
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let table = provider
        .fetch_daily_prices(&tickers, start, true)
        .await
        .expect("Yahoo request failed");
    info!(rows = table.len(), "Received real price table");
    assert!(table.has_column("0050.TW"));
    assert!(!table.is_empty());
}
