use financial_dashboard_data::*;
use std::error::Error;

fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "↑",
        Trend::Down => "↓",
        Trend::Neutral => "→",
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    println!("📊 Financial Dashboard Snapshot");
    println!("═══════════════════════════════════════════════\n");

    // 1. One service backs every chart on the dashboard.
    let service = MockDataService::new();

    // 2. Cash flow across all supported windows.
    println!("💰 Cash flow by time range:");
    for time_range in [
        TimeRange::SevenDays,
        TimeRange::ThirtyDays,
        TimeRange::ThreeMonths,
        TimeRange::YearToDate,
    ] {
        let response = service.get_cash_flow_data(time_range).await?;
        let projected = response.data.iter().filter(|p| p.is_projected).count();
        let historical = response.data.len() - projected;
        let closing = response
            .data
            .last()
            .map(|p| p.balance)
            .unwrap_or_default();

        println!(
            "  {:>6}: {:>2} buckets + {} projected, projected closing balance ${:>12.2}",
            time_range.to_string(),
            historical,
            projected,
            closing
        );
    }

    // 3. A week of profit, day by day.
    println!("\n📈 Profit, last seven days:");
    let request = ChartDataRequest::new(TimeRange::SevenDays, ChartType::Profit);
    let profit = service.get_chart_data(&request).await?;
    for point in &profit.data {
        println!("  {}: ${:>10.2}", point.date, point.value);
    }

    // 4. Period-over-period comparisons for the default window.
    println!("\n🔄 30D versus the previous 30 days:");
    let deltas = service.delta_comparisons(TimeRange::ThirtyDays)?;
    for (name, delta) in [
        ("Cash flow", &deltas.cash_flow),
        ("Profit", &deltas.profit),
        ("Expenses", &deltas.expenses),
        ("Revenue", &deltas.revenue),
    ] {
        println!(
            "  {:<9} {} {:>7} (${:.0} from ${:.0})",
            name,
            trend_arrow(delta.trend),
            delta.signed_label(),
            delta.current,
            delta.previous
        );
    }

    // 5. Responses round-trip through the TTL cache.
    println!("\n♻️  Cache round trip:");
    let cache = CacheStore::new(Box::new(MemoryStorage::new()));
    cache.save_chart_data(MetricKind::Profit, &profit.data, TimeRange::SevenDays)?;
    match cache.load_chart_data(MetricKind::Profit)? {
        CacheLookup::Fresh { data, time_range } => {
            println!("  Fresh {} entry with {} points", time_range, data.len());
        }
        CacheLookup::Expired { .. } => println!("  Entry outlived its TTL"),
        CacheLookup::Miss => println!("  Nothing cached"),
    }
    println!(
        "  A file-backed store defaults to {}",
        FileStorage::default_root().display()
    );

    println!("\n✅ Snapshot complete");
    Ok(())
}
