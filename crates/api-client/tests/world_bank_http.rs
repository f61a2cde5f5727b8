//! World Bank adapter requests against a local HTTP server.

use api_client::{SourceAdapter, Throttle, WorldBankClient};
use configuration::WorldBankConfig;
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDICATOR: &str = "SL.UEM.TOTL.ZS";

fn page_body(page: u32, pages: u32, year: &str, value: f64) -> String {
    format!(
        r#"[{{"page": {page}, "pages": {pages}, "per_page": 1000, "total": 2}},
            [{{"indicator": {{"id": "{INDICATOR}", "value": "Unemployment"}},
               "country": {{"id": "DE", "value": "Germany"}}, "countryiso3code": "DEU",
               "date": "{year}", "value": {value}, "unit": ""}}]]"#
    )
}

fn client(server: &MockServer, interval_ms: u64) -> WorldBankClient {
    let config = WorldBankConfig {
        base_url: server.uri(),
        indicators: vec![INDICATOR.to_string()],
        request_interval_ms: interval_ms,
        ..WorldBankConfig::default()
    };
    WorldBankClient::new(&config, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn pages_are_spaced_by_the_request_interval() {
    let server = MockServer::start().await;
    let indicator_path = format!("/country/DEU/indicator/{INDICATOR}");
    Mock::given(method("GET"))
        .and(path(indicator_path.as_str()))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(1, 2, "2022", 3.1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(indicator_path.as_str()))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(2, 2, "2023", 3.0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 300);
    let throttle = Throttle::new(client.min_request_interval());

    let start = Instant::now();
    let observations = client
        .fetch_indicator_data(INDICATOR, &["DEU".to_string()], &throttle)
        .await
        .unwrap();

    assert_eq!(observations.len(), 2);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn no_countries_requests_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/country/all/indicator/{INDICATOR}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(1, 1, "2023", 5.5)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let throttle = Throttle::new(client.min_request_interval());
    let observations = client.fetch_indicator_data(INDICATOR, &[], &throttle).await.unwrap();

    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].country_code, "DEU");
}
