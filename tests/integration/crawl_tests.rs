//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the report site and run whole
//! crawls end-to-end, through to the CSV file.

use sha2::{Digest, Sha256};
use shootings_crawler::config::{finalize_config, Config};
use shootings_crawler::crawler::{Coordinator, CrawlPhase};
use shootings_crawler::incident::CSV_HEADER;
use shootings_crawler::{CrawlError, CsvSink, ExtractError, Incident};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fast, robots-free configuration pointed at the mock server
fn create_test_config(server: &MockServer, year: i32, output: &str) -> Config {
    let mut config = Config::default();
    config.crawl.year = year;
    config.crawl.delay_seconds = 0.0;
    config.crawl.max_retries = 1;
    config.crawl.respect_robots = false;
    config.crawl.timeout_seconds = 5;
    config.site.base_url = server.uri();
    config.output.path = output.to_string();
    finalize_config(config).expect("test config is valid")
}

struct Row<'a> {
    date: &'a str,
    state: &'a str,
    city: &'a str,
    killed: &'a str,
    injured: &'a str,
    link: &'a str,
}

fn listing_page(rows: &[Row<'_>], pager_href: Option<&str>) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            format!(
                r#"<tr class="odd">
                    <td>{}</td><td>{}</td><td>{}</td><td>Main St</td><td>{}</td><td>{}</td>
                    <td><ul class="links"><li class="0 first"><a href="{}">View Incident</a></li>
                        <li class="1 last"><a href="https://news.example.com/x">View Source</a></li></ul></td>
                </tr>"#,
                row.date, row.state, row.city, row.killed, row.injured, row.link
            )
        })
        .collect();

    let pager = pager_href
        .map(|href| {
            format!(
                r#"<ul class="pager"><li class="pager-current first">1</li>
                   <li class="pager-last last"><a href="{href}">last »</a></li></ul>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><body><div id="block-system-main">
            <table class="responsive sticky-enabled"><thead><tr><th>Incident Date</th></tr></thead>
            <tbody>{rows}</tbody></table>{pager}</div></body></html>"#
    )
}

fn detail_page(note: &str) -> String {
    format!(
        r#"<html><body>
        <div><h2>Location</h2><span>Geolocation: 39.7589, -84.1916</span></div>
        <div><h2>Participants</h2>
            <ul><li>Type: Victim</li><li>Age: 22</li></ul>
            <ul><li>Type: Subject-Suspect</li><li>Status: Killed</li></ul>
        </div>
        <div><h2>Incident Characteristics</h2><ul><li>Mass Shooting</li></ul></div>
        <div><h2>Notes</h2><p>{note}</p></div>
        </body></html>"#
    )
}

async fn mount_detail(server: &MockServer, link: &str, note: &str) {
    Mock::given(method("GET"))
        .and(path(link))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(note)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_pre_2016_writes_csv_in_order() {
    let server = MockServer::start().await;
    let report = "/reports/mass-shootings/2015";
    let last = "/reports/mass-shootings/2015?page=2";

    let pages = [
        vec![
            Row { date: "December 2, 2015", state: "California", city: "San Bernardino", killed: "16", injured: "19", link: "/incident/461553" },
            Row { date: "November 27, 2015", state: "Colorado", city: "Colorado Springs", killed: "3", injured: "9", link: "/incident/456894" },
        ],
        vec![Row { date: "June 17, 2015", state: "South Carolina", city: "Charleston", killed: "9", injured: "1", link: "/incident/366391" }],
        vec![Row { date: "January 4, 2015", state: "Ohio", city: "Dayton", killed: "0", injured: "4", link: "/incident/269998" }],
    ];

    for (page, rows) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(report))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(rows, Some(last))))
            .expect(1)
            .mount(&server)
            .await;
        for row in rows {
            mount_detail(&server, row.link, &format!("note for {}", row.city)).await;
        }
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("shootings-2015.csv");
    let config = create_test_config(&server, 2015, output.to_str().unwrap());

    let sink = CsvSink::create(&output).unwrap();
    let mut coordinator = Coordinator::new(&config, sink).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(stats.last_page, 2);
    assert_eq!(stats.listing_pages_fetched, 3);
    assert_eq!(stats.detail_pages_fetched, 4);
    assert_eq!(stats.incidents_written, 4);
    assert_eq!(stats.retries, 0);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, CSV_HEADER);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    let cities: Vec<&str> = records.iter().map(|r| &r[5]).collect();
    assert_eq!(
        cities,
        vec!["San Bernardino", "Colorado Springs", "Charleston", "Dayton"]
    );

    let first = &records[0];
    assert_eq!(&first[1], "2015");
    assert_eq!(&first[2], "12");
    assert_eq!(&first[3], "2");
    assert_eq!(&first[9], format!("{}/incident/461553", server.uri()));
    assert_eq!(&first[10], "39.7589");
    assert_eq!(&first[11], "-84.1916");
    assert_eq!(&first[13], r#"["Mass Shooting"]"#);
    assert_eq!(&first[14], "note for San Bernardino");
    assert_eq!(&first[15], "[]");
    assert!(first[12].contains(r#""Type":"Subject-Suspect""#));
}

#[tokio::test]
async fn test_fetch_failure_mid_run_keeps_partial_output() {
    let server = MockServer::start().await;
    let report = "/reports/mass-shooting";
    let last = "/reports/mass-shooting?year=2019&page=1";

    Mock::given(method("GET"))
        .and(path(report))
        .and(query_param("year", "2019"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[Row { date: "August 4, 2019", state: "Ohio", city: "Dayton", killed: "9", injured: "27", link: "/incident/1" }],
            Some(last),
        )))
        .mount(&server)
        .await;
    mount_detail(&server, "/incident/1", "first").await;

    // One initial attempt plus one retry
    Mock::given(method("GET"))
        .and(path(report))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("partial.csv");
    let config = create_test_config(&server, 2019, output.to_str().unwrap());

    let mut coordinator = Coordinator::new(&config, CsvSink::create(&output).unwrap()).unwrap();
    let err = coordinator.run().await.unwrap_err();

    match err {
        CrawlError::FetchFailed { url, status, attempts } => {
            assert!(url.ends_with("year=2019&page=1"));
            assert_eq!(status, 503);
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(coordinator.phase(), CrawlPhase::Failed);
    assert_eq!(coordinator.sink().rows(), 1);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.lines().nth(1).unwrap().contains("Dayton"));
}

#[tokio::test]
async fn test_missing_pager_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/mass-shooting"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[Row { date: "August 4, 2019", state: "Ohio", city: "Dayton", killed: "9", injured: "27", link: "/incident/1" }],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2019, "unused.csv");
    let mut coordinator = Coordinator::new(&config, Vec::<Incident>::new()).unwrap();
    let err = coordinator.run().await.unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Extract {
            source: ExtractError::MissingElement(_),
            ..
        }
    ));
    assert!(coordinator.sink().is_empty());
}

#[tokio::test]
async fn test_robots_disallow_stops_before_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /reports/\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/mass-shooting"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, 2019, "unused.csv");
    config.crawl.respect_robots = true;

    let mut coordinator = Coordinator::new(&config, Vec::<Incident>::new()).unwrap();
    let err = coordinator.run().await.unwrap_err();

    assert!(matches!(err, CrawlError::RobotsDenied { .. }));
    assert_eq!(coordinator.phase(), CrawlPhase::Failed);
}

#[tokio::test]
async fn test_missing_robots_does_not_block_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/mass-shooting"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[],
            Some("/reports/mass-shooting?year=2019&page=0"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, 2019, "unused.csv");
    config.crawl.respect_robots = true;

    let mut coordinator = Coordinator::new(&config, Vec::<Incident>::new()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.last_page, 0);
    assert_eq!(stats.incidents_written, 0);
}

#[tokio::test]
async fn test_las_vegas_row_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/mass-shooting"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[Row { date: "October 1, 2017", state: "Nevada", city: "Las Vegas", killed: "58", injured: "489", link: "/incident/946229" }],
            Some("/reports/mass-shooting?year=2017&page=0"),
        )))
        .mount(&server)
        .await;
    mount_detail(&server, "/incident/946229", "Mandalay Bay").await;

    let config = create_test_config(&server, 2017, "unused.csv");
    let mut coordinator = Coordinator::new(&config, Vec::<Incident>::new()).unwrap();
    coordinator.run().await.unwrap();

    let incidents = coordinator.into_sink();
    assert_eq!(incidents.len(), 1);
    let incident = &incidents[0];
    let core = incident.core();
    assert_eq!((core.year, core.month, core.day), (2017, 10, 1));
    assert_eq!((core.num_killed, core.num_injured), (58, 489));

    let link = format!("{}/incident/946229", server.uri());
    let expected_input = format!("2017101NevadaLas VegasMain St58489{link}");
    let expected = hex::encode(Sha256::digest(expected_input.as_bytes()));
    assert_eq!(incident.sha256(), expected);
    assert_eq!(incident.incident_link(), link);
}
