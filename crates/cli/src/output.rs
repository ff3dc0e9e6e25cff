//! Plain-text rendering for stdout.

use std::fmt::Write as _;

use clinicstock_client::{BatchReport, FilterOptions};
use clinicstock_inventory::{InventoryItem, LookupOption, ReasonCode, TransactionRecord};

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("—")
}

pub fn item_table(items: &[InventoryItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<32}  {:<12}  {:>6}  {:>5}  {:<16}  {:<16}",
        "ID", "NAME", "SKU", "QTY", "PAR", "CATEGORY", "LOCATION"
    );
    for item in items {
        let par = item
            .par_level_min
            .map_or_else(|| "—".to_string(), |p| p.to_string());
        let _ = writeln!(
            out,
            "{:<36}  {:<32}  {:<12}  {:>6}  {:>5}  {:<16}  {:<16}{}",
            item.id,
            item.name,
            or_dash(item.sku.as_deref()),
            item.qty_on_hand,
            par,
            or_dash(item.category_name()),
            or_dash(item.location_name()),
            if item.is_low_stock() { "  LOW" } else { "" },
        );
    }
    out
}

pub fn item_detail(item: &InventoryItem, history: &[TransactionRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", item.name);
    let _ = writeln!(out, "  id:        {}", item.id);
    let _ = writeln!(out, "  sku:       {}", or_dash(item.sku.as_deref()));
    let _ = write!(out, "  on hand:   {}", item.qty_on_hand);
    if item.is_low_stock() {
        let _ = write!(out, " (low)");
    }
    let _ = writeln!(out);
    if let Some(par) = item.par_level_min {
        let _ = writeln!(out, "  par:       {par}");
    }
    if item.is_controlled() {
        let _ = writeln!(out, "  controlled");
    }
    let _ = writeln!(out, "  category:  {}", or_dash(item.category_name()));
    let _ = writeln!(out, "  location:  {}", or_dash(item.location_name()));
    if let Some(notes) = item.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out, "  notes:     {notes}");
    }

    let _ = writeln!(out);
    out.push_str(&history_table(history));
    out
}

pub fn history_table(records: &[TransactionRecord]) -> String {
    if records.is_empty() {
        return "No transactions yet.\n".to_string();
    }
    let mut out = String::new();
    for rec in records {
        let _ = writeln!(
            out,
            "{}  {:>6}  {:<18}  {}",
            rec.created_at.format("%Y-%m-%d %H:%M:%S"),
            rec.display_change(),
            rec.reason_label(),
            rec.item_id.map(|id| id.to_string()).unwrap_or_default(),
        );
    }
    out
}

fn lookup_section<I: std::fmt::Display>(out: &mut String, title: &str, options: &[LookupOption<I>]) {
    let _ = writeln!(out, "{title}:");
    if options.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for option in options {
        let _ = writeln!(out, "  {}  {}", option.id, option.name);
    }
}

pub fn filter_options(options: &FilterOptions) -> String {
    let mut out = String::new();
    lookup_section(&mut out, "Categories", &options.categories);
    lookup_section(&mut out, "Vendors", &options.vendors);
    lookup_section(&mut out, "Locations", &options.locations);
    out
}

pub fn reasons() -> String {
    let mut out = String::new();
    for reason in ReasonCode::ALL {
        let _ = writeln!(out, "{:<18}  {}", reason.code(), reason.label());
    }
    out
}

pub fn batch_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for done in &report.completed {
        let now = done
            .refreshed
            .map_or_else(|| "?".to_string(), |q| q.to_string());
        let _ = writeln!(
            out,
            "ok      {}  {} -> {} ({:+})",
            done.item_id,
            done.baseline,
            now,
            done.adjustment.signed_delta()
        );
    }
    for failed in &report.failed {
        let _ = writeln!(
            out,
            "failed  {}  {}",
            failed.item_id,
            failed.error.user_message()
        );
    }
    let _ = writeln!(
        out,
        "{} adjusted, {} unchanged, {} failed",
        report.dispatched(),
        report.completed.len() - report.dispatched(),
        report.failed.len()
    );
    out
}
