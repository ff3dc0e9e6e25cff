use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;

use clinicstock_client::{
    ClientError, CycleCount, FilterOptions, ItemDetail, ItemListing, Reconciler,
    TransactionHistory,
};
use clinicstock_core::ItemId;
use clinicstock_gateway::{GatewayConfig, RestGateway, Session};
use clinicstock_inventory::ItemFilters;

mod args;
mod output;

use args::{AdjustArgs, Cli, Command, ListArgs};

type Shared = Arc<Reconciler<RestGateway>>;

#[tokio::main]
async fn main() -> ExitCode {
    clinicstock_observability::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Command::Reasons = cli.command {
        print!("{}", output::reasons());
        return Ok(ExitCode::SUCCESS);
    }

    let config = GatewayConfig::from_env().context("loading gateway configuration")?;
    Session::require(config.session().as_ref())
        .context("set SUPABASE_ACCESS_TOKEN to a signed-in user's token")?;
    let gateway = Arc::new(RestGateway::new(&config)?);
    tracing::debug!(url = %config.url, "gateway ready");

    let reconciler = Arc::new(Reconciler::new(gateway));

    match cli.command {
        Command::List(args) => list(reconciler, args).await,
        Command::Show { item } => show(reconciler, item).await,
        Command::Adjust(args) => adjust(reconciler, args).await,
        Command::Count { entries } => count(reconciler, entries).await,
        Command::History { item, limit } => history(reconciler, item, limit).await,
        Command::Filters => filters(reconciler).await,
        Command::Reasons => Ok(ExitCode::SUCCESS),
    }
}

/// Keep backend messages as-is for the user.
fn surfaced(e: ClientError) -> anyhow::Error {
    anyhow!(e.user_message())
}

async fn list(reconciler: Shared, args: ListArgs) -> anyhow::Result<ExitCode> {
    let filters = ItemFilters {
        search: args.search,
        category_id: args.category,
        vendor_id: args.vendor,
        location_id: args.location,
        low_stock_only: args.low_stock,
    };
    let mut listing = ItemListing::new(reconciler);
    listing
        .set_query(filters, args.sort.unwrap_or_default())
        .await
        .map_err(surfaced)?;

    for _ in 1..args.pages {
        if !listing.has_more() {
            break;
        }
        listing.load_more().await.map_err(surfaced)?;
    }

    print!("{}", output::item_table(listing.visible_items()));
    println!(
        "{} shown{}, low stock in view: {}",
        listing.visible_items().len(),
        listing
            .total()
            .map(|t| format!(" of {t}"))
            .unwrap_or_default(),
        listing.low_stock_in_view()
    );
    Ok(ExitCode::SUCCESS)
}

async fn filters(reconciler: Shared) -> anyhow::Result<ExitCode> {
    let options = FilterOptions::load(reconciler.gateway())
        .await
        .map_err(surfaced)?;
    print!("{}", output::filter_options(&options));
    Ok(ExitCode::SUCCESS)
}

async fn show(reconciler: Shared, item: ItemId) -> anyhow::Result<ExitCode> {
    let mut detail = ItemDetail::new(reconciler);
    detail.load(item).await.map_err(surfaced)?;
    if let Some(loaded) = detail.item() {
        print!("{}", output::item_detail(loaded, detail.history()));
    }
    Ok(ExitCode::SUCCESS)
}

async fn adjust(reconciler: Shared, args: AdjustArgs) -> anyhow::Result<ExitCode> {
    let mut detail = ItemDetail::new(reconciler);
    detail.load(args.item).await.map_err(surfaced)?;
    detail.select_reason(args.reason);

    match (args.add, args.deduct) {
        (Some(n), _) => {
            detail.set_amount(&n.to_string()).map_err(surfaced)?;
            detail.add().await.map_err(surfaced)?;
        }
        (None, Some(n)) => {
            detail.set_amount(&n.to_string()).map_err(surfaced)?;
            detail.deduct().await.map_err(surfaced)?;
        }
        (None, None) => return Err(anyhow!("pass --add or --deduct")),
    }

    if let Some(item) = detail.item() {
        println!("{}: {} on hand", item.name, item.qty_on_hand);
    }
    Ok(ExitCode::SUCCESS)
}

async fn count(
    reconciler: Shared,
    entries: Vec<(ItemId, String)>,
) -> anyhow::Result<ExitCode> {
    let mut counts = CycleCount::new(reconciler);
    for (item, raw) in &entries {
        counts
            .enter(*item, raw)
            .map_err(surfaced)
            .with_context(|| format!("count for {item}"))?;
    }

    let report = counts.submit().await.map_err(surfaced)?;
    print!("{}", output::batch_report(&report));

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn history(
    reconciler: Shared,
    item: Option<ItemId>,
    limit: u64,
) -> anyhow::Result<ExitCode> {
    let mut history = TransactionHistory::new(reconciler.gateway().clone()).with_limit(limit);
    if let Some(id) = item {
        history = history.for_item(id);
    }
    history.load().await.map_err(surfaced)?;
    print!("{}", output::history_table(history.records()));
    Ok(ExitCode::SUCCESS)
}
