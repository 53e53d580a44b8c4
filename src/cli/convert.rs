use super::ui;
use crate::aggregator::RateAggregator;
use crate::core::convert::Conversion;
use anyhow::Result;

pub async fn run(aggregator: &RateAggregator, from: &str, to: &str, amount: f64) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let outcome = aggregator.convert(from, to, amount).await;
    pb.finish_and_clear();

    let (conversion, rates) = outcome?;
    println!(
        "{}",
        ui::style_text(
            &format_conversion(amount, from, to, &conversion),
            ui::StyleType::TotalValue
        )
    );
    println!(
        "{}",
        ui::style_text(
            &format!(
                "1 {} = {:.6} {} | {} ({})",
                from.to_uppercase(),
                conversion.rate,
                to.to_uppercase(),
                rates.source,
                rates.data_quality
            ),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub fn format_conversion(amount: f64, from: &str, to: &str, conversion: &Conversion) -> String {
    format!(
        "{amount:.2} {} = {:.2} {}",
        from.to_uppercase(),
        conversion.result,
        to.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversion() {
        let conversion = Conversion {
            result: 3420.0,
            rate: 34.2,
        };
        assert_eq!(
            format_conversion(100.0, "usd", "try", &conversion),
            "100.00 USD = 3420.00 TRY"
        );
    }
}
