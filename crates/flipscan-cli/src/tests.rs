use std::collections::HashMap;
use std::env::temp_dir;

use clap::Parser;
use flipscan_core::{
    AppConfig, Environment, FeeSchedule, FilterCriteria, FulfillmentMethod, MarketplaceProduct,
};
use flipscan_engine::{apply_filters, calculate_batch, summarize, RankKey};

use super::*;
use crate::scan::{
    build_criteria, load_listings, load_sources, rank_distribution, render_summary, render_table,
    OutputFormat,
};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: None,
        env: Environment::Test,
        log_level: "info".to_string(),
        fees_path: None,
        fulfillment: FulfillmentMethod::Marketplace,
        min_roi: Some(40.0),
        min_profit: None,
        max_reviews: Some(20),
        sales_rank_percentile: Some(5.0),
        top_n: 25,
        db_max_connections: 10,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
    }
}

fn scan_args(cli: Cli) -> ScanArgs {
    match cli.command {
        Commands::Scan(args) => args,
        other => panic!("expected scan command, got {other:?}"),
    }
}

const SOURCES_JSON: &str = r#"[
  {
    "id": "wm-1001",
    "title": "LEGO Classic Bricks",
    "store": "walmart",
    "category": "Toys & Games",
    "price": 12.0,
    "upc": "673419301947",
    "url": "https://www.walmart.com/ip/1001"
  },
  {
    "id": "tg-77",
    "title": "Board Game",
    "store": "target",
    "category": null,
    "price": null,
    "url": "https://www.target.com/p/77"
  }
]"#;

const LISTINGS_JSON: &str = r#"{
  "673419301947": {
    "id": "B00NHQFA1I",
    "title": "LEGO Classic Bricks",
    "category": "Toys & Games",
    "price": 34.99,
    "sales_rank": 120,
    "review_count": 8,
    "url": "https://marketplace.example/dp/B00NHQFA1I"
  },
  "tg-77": {
    "id": "B07BOARD01",
    "title": "Board Game",
    "category": "Toys & Games",
    "price": 19.99,
    "url": "https://marketplace.example/dp/B07BOARD01"
  }
}"#;

fn ranked_listing(rank: u64, category: &str) -> MarketplaceProduct {
    MarketplaceProduct {
        id: format!("B{rank}"),
        title: "x".to_string(),
        category: Some(category.to_string()),
        price: Some(10.0),
        sales_rank: Some(rank),
        review_count: None,
        rating: None,
        features: vec![],
        url: "https://marketplace.example".to_string(),
    }
}

fn write_fixture(name: &str, body: &str) -> std::path::PathBuf {
    let path = temp_dir().join(format!("flipscan-cli-{}-{name}", std::process::id()));
    std::fs::write(&path, body).expect("write fixture");
    path
}

// -----------------------------------------------------------------------
// argument parsing
// -----------------------------------------------------------------------

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["flipscan", "db", "ping"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Ping
        }
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["flipscan", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Migrate
        }
    ));
}

#[test]
fn command_is_required() {
    assert!(Cli::try_parse_from(["flipscan"]).is_err());
}

#[test]
fn scan_requires_input_files() {
    assert!(Cli::try_parse_from(["flipscan", "scan", "--sources", "s.json"]).is_err());
}

#[test]
fn scan_defaults() {
    let cli = Cli::try_parse_from([
        "flipscan",
        "scan",
        "--sources",
        "s.json",
        "--listings",
        "l.json",
    ])
    .unwrap();
    let args = scan_args(cli);
    assert_eq!(args.sources, std::path::PathBuf::from("s.json"));
    assert!(args.fulfillment.is_none());
    assert_eq!(args.sort, RankKey::Profit);
    assert_eq!(args.format, OutputFormat::Table);
    assert!(args.top.is_none());
    assert!(!args.persist);
    assert!(!args.allow_missing_reviews);
}

#[test]
fn scan_with_every_option() {
    let cli = Cli::try_parse_from([
        "flipscan",
        "scan",
        "--sources",
        "s.json",
        "--listings",
        "l.json",
        "--fulfillment",
        "fbm",
        "--min-roi",
        "25",
        "--max-reviews",
        "50",
        "--min-profit",
        "3.5",
        "--percentile",
        "10",
        "--allow-missing-reviews",
        "--sort",
        "roi",
        "--top",
        "5",
        "--format",
        "json",
        "--persist",
    ])
    .unwrap();
    let args = scan_args(cli);
    assert_eq!(args.fulfillment, Some(FulfillmentMethod::SelfFulfilled));
    assert_eq!(args.min_roi, Some(25.0));
    assert_eq!(args.max_reviews, Some(50));
    assert_eq!(args.min_profit, Some(3.5));
    assert_eq!(args.percentile, Some(10.0));
    assert!(args.allow_missing_reviews);
    assert_eq!(args.sort, RankKey::Roi);
    assert_eq!(args.top, Some(5));
    assert_eq!(args.format, OutputFormat::Json);
    assert!(args.persist);
}

#[test]
fn scan_rejects_unknown_sort_key() {
    let result = Cli::try_parse_from([
        "flipscan",
        "scan",
        "--sources",
        "s.json",
        "--listings",
        "l.json",
        "--sort",
        "margin",
    ]);
    assert!(result.is_err());
}

#[test]
fn scan_rejects_out_of_range_thresholds() {
    for bad in [
        ["--percentile", "150"],
        ["--percentile=-5", "--top=1"],
        ["--min-roi", "NaN"],
        ["--min-profit", "inf"],
    ] {
        let mut argv = vec!["flipscan", "scan", "--sources", "s.json", "--listings", "l.json"];
        argv.extend(bad);
        assert!(Cli::try_parse_from(argv).is_err(), "accepted {bad:?}");
    }
}

#[test]
fn parses_report_with_filters() {
    let cli =
        Cli::try_parse_from(["flipscan", "report", "--min-roi", "40", "--limit", "10"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Report {
            min_roi: Some(r),
            limit: 10
        } if (r - 40.0).abs() < f64::EPSILON
    ));
}

#[test]
fn report_defaults() {
    let cli = Cli::try_parse_from(["flipscan", "report"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Report {
            min_roi: None,
            limit: 50
        }
    ));
}

// -----------------------------------------------------------------------
// scan helpers
// -----------------------------------------------------------------------

#[test]
fn build_criteria_applies_overrides_on_top_of_config() {
    let cli = Cli::try_parse_from([
        "flipscan",
        "scan",
        "--sources",
        "s.json",
        "--listings",
        "l.json",
        "--min-profit",
        "2",
        "--percentile",
        "1",
    ])
    .unwrap();
    let criteria = build_criteria(&app_config(), &scan_args(cli));
    assert_eq!(criteria.min_roi, Some(40.0));
    assert_eq!(criteria.max_reviews, Some(20));
    assert_eq!(criteria.min_profit, Some(2.0));
    assert_eq!(criteria.sales_rank_percentile, Some(1.0));
}

#[test]
fn load_inputs_and_price_batch() {
    let sources_path = write_fixture("sources.json", SOURCES_JSON);
    let listings_path = write_fixture("listings.json", LISTINGS_JSON);

    let sources = load_sources(&sources_path).unwrap();
    let listings = load_listings(&listings_path).unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(listings.len(), 2);

    let outcome = calculate_batch(
        &FeeSchedule::default(),
        &sources,
        &listings,
        FulfillmentMethod::Marketplace,
    )
    .unwrap();
    assert_eq!(outcome.opportunities.len(), 1);
    assert_eq!(outcome.skipped.len(), 1, "null source price is skipped");
    assert_eq!(outcome.unmatched, 0);

    let table = render_table(&outcome.opportunities);
    assert!(table.contains("LEGO Classic Bricks"));
    assert!(table.contains("walmart"));

    let summary = render_summary(&summarize(&outcome.opportunities));
    assert!(summary.contains("walmart: 1 opportunities"));

    let _ = std::fs::remove_file(sources_path);
    let _ = std::fs::remove_file(listings_path);
}

#[test]
fn load_sources_reports_bad_json() {
    let path = write_fixture("broken.json", "{ not json");
    let err = load_sources(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse sources file"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn load_listings_reports_missing_file() {
    let err = load_listings(std::path::Path::new("/nonexistent/listings.json")).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read listings file"));
}

#[test]
fn rank_distribution_uses_observed_ranks_then_sizes() {
    let listings: HashMap<_, _> = [100_u64, 200, 300, 400]
        .into_iter()
        .map(|rank| (format!("k{rank}"), ranked_listing(rank, "Toys & Games")))
        .collect();
    let dist = rank_distribution(&listings);
    assert_eq!(dist.boundary("Toys & Games", 50.0), Some(200));
    assert_eq!(dist.boundary("Books", 5.0), Some(100_000));
    assert_eq!(dist.boundary("Pet Supplies", 5.0), Some(25_000));
}

#[test]
fn lone_listing_is_judged_against_category_size() {
    let listings: HashMap<_, _> = [("k".to_string(), ranked_listing(1_900_000, "Books"))]
        .into_iter()
        .collect();
    let dist = rank_distribution(&listings);
    assert_eq!(dist.boundary("Books", 5.0), Some(100_000));

    let source = flipscan_core::SourceProduct {
        id: "k".to_string(),
        title: "Paperback".to_string(),
        store: "walmart".to_string(),
        category: Some("Books".to_string()),
        price: Some(2.0),
        original_price: None,
        upc: None,
        sku: None,
        brand: None,
        url: "https://www.walmart.com/ip/k".to_string(),
        image_url: None,
        weight_lb: None,
        dimensions: None,
    };
    let outcome = calculate_batch(
        &FeeSchedule::default(),
        &[source],
        &listings,
        FulfillmentMethod::SelfFulfilled,
    )
    .unwrap();
    assert_eq!(outcome.opportunities.len(), 1);

    let criteria = FilterCriteria {
        sales_rank_percentile: Some(5.0),
        ..FilterCriteria::permissive()
    };
    assert!(apply_filters(outcome.opportunities, &criteria, &dist).is_empty());
}

#[test]
fn empty_table_says_so() {
    assert!(render_table(&[]).contains("no opportunities"));
}
