use crate::cli::ui;
use crate::core::currency::CurrencyCode;
use crate::core::rates::{RateEntry, RateTable, round_rate};
use crate::refresh::RefreshReport;
use chrono::Duration;
use comfy_table::Cell;

fn age_text(entry: &RateEntry) -> String {
    let age = entry.age();
    if age.num_hours() > 0 {
        format!("{}h {}m", age.num_hours(), age.num_minutes() % 60)
    } else if age.num_minutes() > 0 {
        format!("{}m", age.num_minutes())
    } else {
        format!("{}s", age.num_seconds().max(0))
    }
}

/// Renders one resolved rate with its reverse and provenance.
pub fn render_rate(
    from: &CurrencyCode,
    to: &CurrencyCode,
    entry: &RateEntry,
    max_age: Duration,
) -> String {
    let mut out = format!(
        "1 {} = {} {}\n1 {} = {} {}\nUpdated: {} ({} ago, source: {})",
        from,
        entry.rate,
        to,
        to,
        round_rate(1.0 / entry.rate),
        from,
        entry.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age_text(entry),
        entry.source,
    );
    if entry.is_stale(max_age) {
        out.push('\n');
        out.push_str(&ui::style_text(
            "Warning: this rate is stale; run `update-rates`",
            ui::StyleType::Warning,
        ));
    }
    out
}

/// Tabulates the stored rate table, optionally filtered to pairs that
/// involve `filter`.
pub fn render_table(
    rates: &RateTable,
    filter: Option<&CurrencyCode>,
    max_age: Duration,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Updated"),
        ui::header_cell("Age"),
        ui::header_cell("Source"),
    ]);

    let mut shown = 0;
    for (key, entry) in rates.entries() {
        if let Some(code) = filter {
            let involves = key
                .split('_')
                .any(|part| part == code.as_str());
            if !involves {
                continue;
            }
        }
        shown += 1;
        let age = if entry.is_stale(max_age) {
            ui::style_text(&age_text(entry), ui::StyleType::Warning)
        } else {
            age_text(entry)
        };
        table.add_row(vec![
            Cell::new(key.replace('_', "/")),
            ui::value_cell(format!("{}", entry.rate)),
            Cell::new(entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ui::value_cell(age),
            Cell::new(&entry.source),
        ]);
    }

    if shown == 0 {
        return ui::style_text(
            "No cached rates. Run `update-rates` first.",
            ui::StyleType::Subtle,
        );
    }

    let last_refresh = rates
        .last_refresh
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!("{table}\n\nLast refresh: {last_refresh}")
}

/// Renders the per-source outcome of one refresh run.
pub fn render_refresh_report(report: &RefreshReport) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Source"),
        ui::header_cell("Written"),
        ui::header_cell("Rejected"),
        ui::header_cell("Status"),
    ]);

    for outcome in &report.outcomes {
        let status = match &outcome.error {
            Some(error) => ui::style_text(error, ui::StyleType::Error),
            None => ui::style_text("ok", ui::StyleType::TotalValue),
        };
        table.add_row(vec![
            Cell::new(&outcome.source),
            ui::value_cell(outcome.written.to_string()),
            ui::value_cell(outcome.rejected.to_string()),
            Cell::new(status),
        ]);
    }

    let mut out = format!("{table}\n\nTotal rates written: {}", report.total_written);
    if let Some(error) = &report.persist_error {
        out.push('\n');
        out.push_str(&ui::style_text(
            &format!("Warning: rates were not persisted: {error}"),
            ui::StyleType::Warning,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::SourceOutcome;
    use chrono::Utc;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn sample_table() -> RateTable {
        let mut table = RateTable::new(code("USD"));
        table
            .upsert(&code("BTC"), &code("USD"), 59337.21, Utc::now(), "CoinGecko")
            .unwrap();
        table
            .upsert(
                &code("USD"),
                &code("EUR"),
                0.927,
                Utc::now(),
                "ExchangeRate-API",
            )
            .unwrap();
        table.last_refresh = Some(Utc::now());
        table
    }

    #[test]
    fn test_render_table_filter() {
        let rates = sample_table();
        let all = render_table(&rates, None, Duration::minutes(5));
        assert!(all.contains("BTC/USD"));
        assert!(all.contains("USD/EUR"));

        let filtered = render_table(&rates, Some(&code("BTC")), Duration::minutes(5));
        assert!(filtered.contains("BTC/USD"));
        assert!(!filtered.contains("USD/EUR"));
    }

    #[test]
    fn test_render_empty_table() {
        let rates = RateTable::new(code("USD"));
        let out = render_table(&rates, None, Duration::minutes(5));
        assert!(out.contains("update-rates"));
    }

    #[test]
    fn test_render_rate_includes_reverse() {
        let rates = sample_table();
        let entry = rates.lookup(&code("EUR"), &code("USD")).unwrap();
        let out = render_rate(&code("EUR"), &code("USD"), &entry, Duration::minutes(5));
        assert!(out.contains("1 EUR ="));
        assert!(out.contains("1 USD ="));
        assert!(out.contains("derived"));
    }

    #[test]
    fn test_render_refresh_report() {
        let report = RefreshReport {
            outcomes: vec![
                SourceOutcome {
                    source: "CoinGecko".to_string(),
                    written: 3,
                    rejected: 1,
                    error: None,
                },
                SourceOutcome {
                    source: "ExchangeRate-API".to_string(),
                    written: 0,
                    rejected: 0,
                    error: Some("timeout".to_string()),
                },
            ],
            total_written: 3,
            persist_error: None,
        };
        let out = render_refresh_report(&report);
        assert!(out.contains("CoinGecko"));
        assert!(out.contains("timeout"));
        assert!(out.contains("Total rates written: 3"));
    }
}
