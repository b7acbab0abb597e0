use crate::cli::ui;
use crate::core::currency::CurrencyRegistry;
use crate::core::valuation::Valuation;
use comfy_table::Cell;

/// Renders a user's holdings with per-line converted values and the total.
/// Lines that could not be valued show N/A with the reason; the total is
/// omitted when any line failed.
pub fn render(username: &str, valuation: &Valuation, registry: &CurrencyRegistry) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Balance"),
        ui::header_cell(&format!("Value ({})", valuation.base)),
        ui::header_cell("Details"),
    ]);

    for line in &valuation.lines {
        let is_crypto = registry
            .resolve(line.currency.as_str())
            .map(|c| c.is_crypto())
            .unwrap_or(false);
        let balance = if is_crypto {
            format!("{:.8}", line.amount)
        } else {
            format!("{:.2}", line.amount)
        };
        let details = match (&line.error, registry.resolve(line.currency.as_str())) {
            (Some(error), _) => ui::style_text(error, ui::StyleType::Error),
            (None, Ok(currency)) => ui::style_text(&currency.display_info(), ui::StyleType::Subtle),
            (None, Err(_)) => String::new(),
        };

        table.add_row(vec![
            Cell::new(line.currency.as_str()),
            ui::value_cell(balance),
            ui::format_optional_cell(line.converted, |v| format!("{v:.2}")),
            Cell::new(details),
        ]);
    }

    let total = match valuation.total {
        Some(total) => ui::style_text(&format!("{total:.2}"), ui::StyleType::TotalValue),
        None => ui::style_text("incomplete (missing rates)", ui::StyleType::Error),
    };

    format!(
        "Portfolio: {}\n\n{}\n\nTotal Value ({}): {}",
        ui::style_text(username, ui::StyleType::Title),
        table,
        ui::style_text(valuation.base.as_str(), ui::StyleType::TotalLabel),
        total
    )
}
