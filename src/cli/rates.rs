use super::ui;
use crate::aggregator::RateAggregator;
use crate::core::rates::RateSet;
use anyhow::Result;
use comfy_table::{Cell, Table};
use std::sync::Arc;
use tracing::warn;

pub async fn run(aggregator: &RateAggregator, refresh: bool, base: Option<&str>) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let rates = aggregator.get_rates(refresh).await;
    pb.finish_and_clear();

    let view = match base {
        Some(code) => match rates.rebased(code) {
            Some(rebased) => Arc::new(rebased),
            None => {
                warn!(base = %code, "No rate for requested base, showing {}", rates.base);
                println!(
                    "{}",
                    ui::style_text(
                        &format!("No rate for {}, showing {} base", code.to_uppercase(), rates.base),
                        ui::StyleType::Error
                    )
                );
                rates
            }
        },
        None => rates,
    };

    print_header(&view);
    println!("{}", rates_table(&view));
    Ok(())
}

fn print_header(rates: &RateSet) {
    println!(
        "\n{} {}",
        ui::style_text("Source:", ui::StyleType::TotalLabel),
        ui::style_text(&rates.source, ui::StyleType::Title)
    );
    println!(
        "{} {}  {} {}",
        ui::style_text("Quality:", ui::StyleType::TotalLabel),
        ui::quality_text(rates.data_quality),
        ui::style_text("Reliability:", ui::StyleType::TotalLabel),
        rates.reliability
    );
    println!(
        "{}",
        ui::style_text(
            &format!("Base {} | last update {}", rates.base, rates.last_update),
            ui::StyleType::Subtle
        )
    );
}

/// One row per currency, in code order.
pub fn rates_table(rates: &RateSet) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Buying"),
        ui::header_cell("Selling"),
        ui::header_cell("Rate"),
        ui::header_cell("Change"),
    ]);

    for entry in rates.entries.values() {
        table.add_row(vec![
            Cell::new(&entry.code),
            Cell::new(&entry.name),
            ui::price_cell(entry.buying),
            ui::price_cell(entry.selling),
            ui::price_cell(entry.rate),
            ui::change_cell(entry.change_percent),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::StaticFallback;

    #[test]
    fn test_rates_table_lists_every_entry() {
        let rates = StaticFallback::new("TRY").rates();
        let rendered = rates_table(&rates).to_string();

        for code in rates.entries.keys() {
            assert!(rendered.contains(code.as_str()), "{code} missing");
        }
        assert!(rendered.contains("42.7000"));
        assert!(rendered.contains("Amerikan Doları"));
        assert!(rendered.contains("N/A"));
    }
}
