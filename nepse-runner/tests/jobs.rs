//! End-to-end job runs against fixture pages, a temporary data directory and
//! a recording git fake.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use nepse_core::data::{CalendarStore, PriceStore, RawRow};
use nepse_core::reconcile::reconcile_month;
use nepse_core::{CalendarEntry, TradingCalendar, YearMonth};
use nepse_runner::jobs::JobError;
use nepse_runner::progress::ProgressEvent;
use nepse_runner::publish::VcsCall;
use nepse_runner::{
    run_holidays, run_listing, run_prices, run_scrape, Config, Credentials, FixtureSources,
    JobContext, PublishOutcome, Publisher, PushStatus, RecordingProgress, RecordingVcs,
    SectorMapping,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn price(date: &str) -> RawRow {
    ["1", date, "500.00", "510.00", "495.00", "505.00", "1.00", "1,200", "606,000.00"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn cells(values: &[&str]) -> RawRow {
    values.iter().map(|s| s.to_string()).collect()
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.repo_dir = dir.to_path_buf();
    config
}

fn write_listing(config: &Config, content: &str) {
    let path = config.listing_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn context<'a>(
    config: &'a Config,
    sources: &'a FixtureSources,
    progress: &'a RecordingProgress,
    vcs: Option<&'a RecordingVcs>,
) -> JobContext<'a> {
    JobContext {
        config,
        sources,
        progress,
        publisher: vcs.map(|vcs| Publisher {
            vcs,
            credentials: Credentials::default(),
        }),
    }
}

// ── prices ───────────────────────────────────────────────────────────

#[test]
fn price_run_merges_new_rows_and_commits_per_sector() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_listing(&config, "Commercial_Banks,Finance\nADBL,GFCL\nNABIL,\n");

    let store = PriceStore::new(config.price_dir());
    let stored = nepse_core::merge::scrape_full(&mut nepse_core::data::MemoryPages::new(
        "seed",
        vec![vec![price("2024-01-10")]],
    ))
    .unwrap()
    .rows;
    store.save("Commercial_Banks", "ADBL", &stored).unwrap();
    store.save("Finance", "GFCL", &stored).unwrap();

    let sources = FixtureSources::new()
        .with_prices(
            "ADBL",
            vec![
                vec![price("2024-01-12"), price("2024-01-11")],
                vec![price("2024-01-10"), price("2024-01-09")],
            ],
        )
        .with_prices("GFCL", vec![vec![price("2024-01-10")]]);
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true);
    let ctx = context(&config, &sources, &progress, Some(&vcs));

    let summary = run_prices(&ctx, &[]).unwrap();

    let banks = &summary.sectors[0];
    assert_eq!(banks.updated, vec!["ADBL"]);
    // NABIL has no pages to serve and fails on its own
    assert_eq!(banks.failed, vec!["NABIL"]);
    assert_eq!(banks.latest, Some(d("2024-01-12")));
    assert_eq!(
        banks.published,
        Some(PublishOutcome::Committed {
            push: PushStatus::Skipped
        })
    );

    let finance = &summary.sectors[1];
    assert!(finance.updated.is_empty());
    assert_eq!(finance.published, None);

    assert_eq!(vcs.commits(), vec!["Updated Commercial Banks data up to 2024-01-12"]);
    assert!(vcs.calls().contains(&VcsCall::Add(vec![store.category_dir("Commercial_Banks")])));

    let adbl = store.load("Commercial_Banks", "ADBL").unwrap().unwrap();
    let dates: Vec<NaiveDate> = adbl.iter().map(|r| r.date).collect();
    assert_eq!(dates, [d("2024-01-12"), d("2024-01-11"), d("2024-01-10")]);
    assert_eq!(adbl.iter().map(|r| r.sn).collect::<Vec<_>>(), [1, 2, 3]);

    assert_eq!(progress.failures(), vec!["NABIL"]);
    assert_eq!(
        progress.events().last(),
        Some(&ProgressEvent::JobComplete {
            succeeded: 1,
            failed: 1
        })
    );
}

#[test]
fn unreadable_stored_file_fails_symbol_and_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_listing(&config, "Finance\nGFCL\n");

    let path = PriceStore::new(config.price_dir()).path_for("Finance", "GFCL");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let content = "S.N.,Date,Open,High,Low,Ltp,% Change,Qty,Turnover\n\
                   1,2024-01-10,500,510,495,505,1.00,1200,606000\n\
                   2,garbled,500,500,500,500,0,0,0\n";
    fs::write(&path, content).unwrap();

    let sources = FixtureSources::new().with_prices("GFCL", vec![vec![price("2024-01-11")]]);
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true);
    let summary = run_prices(&context(&config, &sources, &progress, Some(&vcs)), &[]).unwrap();

    assert_eq!(summary.sectors[0].failed, vec!["GFCL"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
    assert!(vcs.commits().is_empty());
}

#[test]
fn price_run_can_be_limited_to_sectors() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_listing(&config, "Commercial_Banks,Finance\nADBL,GFCL\n");

    let sources = FixtureSources::new().with_prices("GFCL", vec![vec![price("2024-01-10")]]);
    let progress = RecordingProgress::new();
    let ctx = context(&config, &sources, &progress, None);

    let summary = run_prices(&ctx, &["Finance".to_string()]).unwrap();
    assert_eq!(summary.sectors.len(), 1);
    assert_eq!(summary.sectors[0].updated, vec!["GFCL"]);
    assert_eq!(sources.requests(), vec!["prices:GFCL"]);
    // absent file: everything fetched is kept
    assert!(PriceStore::new(config.price_dir())
        .path_for("Finance", "GFCL")
        .exists());
}

#[test]
fn missing_listing_is_downloaded_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let sources = FixtureSources::new()
        .with_download(&config.remote.listing_url, "Finance\nGFCL\n")
        .with_prices("GFCL", vec![vec![price("2024-01-10")]]);
    let progress = RecordingProgress::new();
    let ctx = context(&config, &sources, &progress, None);

    run_prices(&ctx, &[]).unwrap();
    assert_eq!(fs::read_to_string(config.listing_path()).unwrap(), "Finance\nGFCL\n");
}

#[test]
fn failed_listing_download_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let sources = FixtureSources::new();
    let progress = RecordingProgress::new();
    let ctx = context(&config, &sources, &progress, None);

    assert!(matches!(run_prices(&ctx, &[]), Err(JobError::Store(_))));
}

// ── scrape ───────────────────────────────────────────────────────────

#[test]
fn scrape_rewrites_known_symbols_and_reports_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_listing(&config, "Commercial_Banks\nADBL\n");

    let store = PriceStore::new(config.price_dir());
    let sources = FixtureSources::new().with_prices(
        "ADBL",
        vec![
            vec![price("2024-01-12"), price("2024-01-11")],
            vec![price("2024-01-10")],
        ],
    );
    let progress = RecordingProgress::new();
    let ctx = context(&config, &sources, &progress, None);

    let summary = run_scrape(&ctx, &["adbl".to_string(), "ZZZ".to_string()]).unwrap();
    assert_eq!(
        summary.scraped,
        vec![("ADBL".to_string(), "Commercial_Banks".to_string(), 3)]
    );
    assert_eq!(summary.unknown, vec!["ZZZ"]);
    assert_eq!(store.load("Commercial_Banks", "ADBL").unwrap().unwrap().len(), 3);
}

// ── holidays ─────────────────────────────────────────────────────────

fn seed_calendar(config: &Config) -> CalendarStore {
    let store = config.calendar_store();
    let mut cal = TradingCalendar::new();
    reconcile_month(&mut cal, YearMonth::new(2025, 11).unwrap());
    store.save(&cal).unwrap();
    store
}

fn holiday_sources() -> FixtureSources {
    FixtureSources::new()
        .with_holidays(
            2025,
            vec![vec![
                cells(&["1", "2025-12-25", "Christmas Day"]),
                cells(&["2", "2025-11-08", "Festival"]),
            ]],
        )
        .with_holidays(2024, vec![])
}

#[test]
fn holiday_run_extends_calendar_and_commits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = seed_calendar(&config);
    let sources = holiday_sources();
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true);
    let ctx = context(&config, &sources, &progress, Some(&vcs));

    let summary = run_holidays(&ctx, d("2025-11-20")).unwrap();

    assert_eq!(summary.new_holidays.len(), 2);
    assert_eq!(summary.years.len(), 2);
    assert!(summary.written.any_written());
    assert_eq!(vcs.commits(), vec!["Updated holiday lists"]);

    let cal = store.load().unwrap();
    assert_eq!(cal.max_date(), Some(d("2025-12-31")));
    assert_eq!(cal.get(d("2025-12-25")), Some(&CalendarEntry::holiday("Christmas Day")));
    assert_eq!(cal.get(d("2025-11-08")), Some(&CalendarEntry::holiday("Festival")));
    assert_eq!(cal.get(d("2025-12-26")), Some(&CalendarEntry::weekend()));

    assert_eq!(
        fs::read_to_string(&store.public_holidays).unwrap(),
        "Date,HolidayName\n2025-12-25,Christmas Day\n2025-11-08,Festival\n"
    );
}

#[test]
fn unchanged_calendar_is_not_committed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    seed_calendar(&config);
    let sources = holiday_sources();
    let progress = RecordingProgress::new();

    let first = RecordingVcs::new(true);
    run_holidays(&context(&config, &sources, &progress, Some(&first)), d("2025-11-20")).unwrap();

    let second = RecordingVcs::new(false);
    let summary =
        run_holidays(&context(&config, &sources, &progress, Some(&second)), d("2025-11-20")).unwrap();

    assert!(summary.new_holidays.is_empty());
    assert!(!summary.written.any_written());
    assert_eq!(summary.published, Some(PublishOutcome::NothingToCommit));
    assert!(second.commits().is_empty());
}

#[test]
fn holiday_commit_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    seed_calendar(&config);
    let sources = holiday_sources();
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true).failing_commit();

    let result = run_holidays(&context(&config, &sources, &progress, Some(&vcs)), d("2025-11-20"));
    assert!(matches!(result, Err(JobError::Publish(_))));
}

// ── listing ──────────────────────────────────────────────────────────

fn listing_config(dir: &Path) -> Config {
    let mut config = config_in(dir);
    config.sectors = [("Hydropower", "Hydro_Power"), ("Finance", "Finance"), ("Broken", "Broken")]
        .into_iter()
        .map(|(site, folder)| SectorMapping {
            site_name: site.into(),
            folder: folder.into(),
        })
        .collect();
    config
}

#[test]
fn listing_run_rebuilds_file_in_configured_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = listing_config(dir.path());
    let sources = FixtureSources::new()
        .with_listing(
            "Hydropower",
            vec![
                vec![
                    cells(&["1", "UPPER", "Upper Tamakoshi"]),
                    cells(&["2", "AHPC", "Arun Valley"]),
                ],
                vec![cells(&["3", "NHPC", "National Hydro"])],
            ],
        )
        .with_listing("Finance", vec![vec![cells(&["1", "GFCL", "Goodwill Finance"])]]);
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true);

    let summary = run_listing(&context(&config, &sources, &progress, Some(&vcs))).unwrap();

    assert_eq!(summary.failed, vec!["Broken"]);
    assert_eq!(
        fs::read_to_string(config.listing_path()).unwrap(),
        "Hydro_Power,Finance\nAHPC,GFCL\nNHPC,\nUPPER,\n"
    );
    assert_eq!(vcs.commits(), vec!["Updated listed company data"]);
    assert!(vcs.calls().contains(&VcsCall::Commit {
        message: "Updated listed company data".into(),
        allow_empty: true
    }));
}

#[test]
fn listing_run_with_no_symbols_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = listing_config(dir.path());
    let sources = FixtureSources::new();
    let progress = RecordingProgress::new();
    let vcs = RecordingVcs::new(true);

    let result = run_listing(&context(&config, &sources, &progress, Some(&vcs)));
    assert!(matches!(result, Err(JobError::Nothing(_))));
    assert!(!config.listing_path().exists());
    assert!(vcs.calls().is_empty());
}
