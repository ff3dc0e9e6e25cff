use clap::{ArgGroup, Parser, Subcommand};

use clinicstock_core::{CategoryId, ItemId, LocationId, VendorId};
use clinicstock_inventory::{ItemSort, ReasonCode};

/// Clinic inventory client.
///
/// Connection settings come from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and
/// `SUPABASE_ACCESS_TOKEN`.
#[derive(Debug, Parser)]
#[command(name = "clinicstock", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List items with search, filters and sort.
    List(ListArgs),

    /// Show one item with its recent history.
    Show {
        item: ItemId,
    },

    /// Add or deduct stock for one item.
    Adjust(AdjustArgs),

    /// Submit cycle counts as `<item-id>=<qty>` pairs.
    Count {
        #[arg(required = true, value_parser = parse_count_entry)]
        entries: Vec<(ItemId, String)>,
    },

    /// Show the transaction log, newest first.
    History {
        #[arg(long)]
        item: Option<ItemId>,

        #[arg(long, default_value_t = 200)]
        limit: u64,
    },

    /// List categories, vendors and storage locations usable as filters.
    Filters,

    /// List reason codes accepted by `adjust`.
    Reasons,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Case-insensitive match on name or SKU.
    #[arg(long, short)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<CategoryId>,

    #[arg(long)]
    pub vendor: Option<VendorId>,

    #[arg(long)]
    pub location: Option<LocationId>,

    /// Only items at or below their par level.
    #[arg(long, default_value_t = false)]
    pub low_stock: bool,

    /// `key:dir`, e.g. `qty_on_hand:desc`.
    #[arg(long)]
    pub sort: Option<ItemSort>,

    /// Number of 30-item pages to load.
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

#[derive(Debug, clap::Args)]
#[command(group(ArgGroup::new("direction").required(true).args(["add", "deduct"])))]
pub struct AdjustArgs {
    pub item: ItemId,

    #[arg(long)]
    pub add: Option<i64>,

    #[arg(long)]
    pub deduct: Option<i64>,

    /// Reason code, see `clinicstock reasons`.
    #[arg(long, short)]
    pub reason: ReasonCode,
}

/// `<item-id>=<qty>`; the quantity is validated later by the count sheet.
fn parse_count_entry(raw: &str) -> Result<(ItemId, String), String> {
    let (id, qty) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <item-id>=<qty>, got {raw:?}"))?;
    let id = id.parse::<ItemId>().map_err(|e| e.to_string())?;
    Ok((id, qty.to_string()))
}
