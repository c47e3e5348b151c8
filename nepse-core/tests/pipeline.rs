//! Page HTML through table scanning, merge and the on-disk price store.

use chrono::NaiveDate;
use nepse_core::data::html::table_rows;
use nepse_core::data::{MemoryPages, PriceStore, WriteOutcome};
use nepse_core::merge::update_symbol;

const PAGE_ONE: &str = r#"
<div class="tab-content">
  <table id="cpricehistory" class="table table-bordered">
    <thead>
      <tr><th>S.N.</th><th>Date</th><th>Open</th><th>High</th><th>Low</th>
          <th>Ltp</th><th>% Change</th><th>Qty</th><th>Turnover</th></tr>
    </thead>
    <tbody>
      <tr><td>1</td><td>2024-01-12</td><td>1,050.00</td><td>1,060.00</td><td>1,040.00</td>
          <td>1,055.00</td><td>0.48 %</td><td>3,100</td><td>3,270,500.00</td></tr>
      <tr><td>2</td><td>2024-01-11</td><td>1,045.00</td><td>1,052.00</td><td>1,041.00</td>
          <td>1,050.00</td><td>0.96 %</td><td>2,800</td><td>2,940,000.00</td></tr>
    </tbody>
  </table>
</div>
"#;

const PAGE_TWO: &str = r#"
<table id="cpricehistory">
  <tr><td>3</td><td>2024-01-10</td><td>1,030.00</td><td>1,041.00</td><td>1,028.00</td>
      <td>1,040.00</td><td>1.46 %</td><td>2,000</td><td>2,080,000.00</td></tr>
  <tr><td>4</td><td>2024-01-09</td><td>1,020.00</td><td>1,026.00</td><td>1,015.00</td>
      <td>1,025.00</td><td>-0.10 %</td><td>1,500</td><td>1,537,500.00</td></tr>
</table>
"#;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn pages(html: &[&str]) -> MemoryPages {
    let pages = html
        .iter()
        .map(|page| table_rows(page, Some("#cpricehistory")).unwrap())
        .collect();
    MemoryPages::new("ADBL", pages)
}

#[test]
fn scraped_pages_merge_into_stored_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = PriceStore::new(dir.path());

    // first run: no file, both pages kept
    let first = update_symbol(store.load("Commercial_Banks", "ADBL").unwrap(), &mut pages(&[PAGE_TWO])).unwrap();
    assert_eq!(first.added, 2);
    store.save("Commercial_Banks", "ADBL", &first.rows).unwrap();

    // second run: stops at 2024-01-10 on the second page
    let mut src = pages(&[PAGE_ONE, PAGE_TWO]);
    let stored = store.load("Commercial_Banks", "ADBL").unwrap();
    let second = update_symbol(stored, &mut src).unwrap();
    assert_eq!(second.added, 2);
    assert_eq!(second.stop_date, Some(d("2024-01-10")));
    assert_eq!(src.served(), 2);
    assert_eq!(
        store.save("Commercial_Banks", "ADBL", &second.rows).unwrap(),
        WriteOutcome::Written
    );

    let content = std::fs::read_to_string(store.path_for("Commercial_Banks", "ADBL")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "1,2024-01-12,1050.00,1060.00,1040.00,1055.00,0.48,3100,3270500.00");
    assert_eq!(lines[4], "4,2024-01-09,1020.00,1026.00,1015.00,1025.00,-0.10,1500,1537500.00");

    // third run: already current, file untouched
    let third = update_symbol(store.load("Commercial_Banks", "ADBL").unwrap(), &mut pages(&[PAGE_ONE])).unwrap();
    assert!(!third.has_new_rows());
    assert_eq!(
        store.save("Commercial_Banks", "ADBL", &third.rows).unwrap(),
        WriteOutcome::Unchanged
    );
}
