use api_client::{ApiClient, BinanceClient};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use configuration::{ApiCredentials, Config};
use core_types::PortfolioSnapshot;
use executor::{PortfolioReporter, SellAmount, Trader};
use rust_decimal::Decimal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian trading toolkit.
#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file, if one exists.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command. Diagnostics report their own result;
    // everything else prints a single failure line on error.
    let result = match cli.command {
        Commands::CheckSetup => return handle_check_setup().await,
        Commands::CheckConfig(args) => return handle_check_config(args),
        Commands::Price(args) => handle_price(args).await,
        Commands::Stats(args) => handle_stats(args).await,
        Commands::Klines(args) => handle_klines(args).await,
        Commands::Balances => handle_balances().await,
        Commands::Buy(args) => handle_buy(args).await,
        Commands::Sell(args) => handle_sell(args).await,
        Commands::LimitBuy(args) => handle_limit_buy(args).await,
        Commands::LimitSell(args) => handle_limit_sell(args).await,
        Commands::Cancel(args) => handle_cancel(args).await,
        Commands::Orders(args) => handle_orders(args).await,
        Commands::History(args) => handle_history(args).await,
        Commands::Portfolio => handle_portfolio().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A typed command-line wrapper over the Binance spot trading API.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify credentials, connectivity and account access.
    CheckSetup,
    /// Verify that the config file loads and its values are sane.
    CheckConfig(CheckConfigArgs),
    /// Print the latest traded price for a symbol.
    Price(SymbolArgs),
    /// Print 24-hour ticker statistics for a symbol.
    Stats(SymbolArgs),
    /// Fetch recent candlesticks for a symbol.
    Klines(KlinesArgs),
    /// List all non-zero account balances.
    Balances,
    /// Market-buy a quote-currency amount of a symbol.
    Buy(BuyArgs),
    /// Market-sell a quantity (or percentage of balance) of a symbol.
    Sell(SellArgs),
    /// Place a limit buy order sized from a quote-currency amount.
    LimitBuy(LimitBuyArgs),
    /// Place a limit sell order for an explicit quantity.
    LimitSell(LimitSellArgs),
    /// Cancel an open order by id.
    Cancel(CancelArgs),
    /// List open orders, optionally for one symbol.
    Orders(OrdersArgs),
    /// Show the most recent orders for a symbol, newest first.
    History(HistoryArgs),
    /// Value the whole account in the configured quote currency.
    Portfolio,
}

#[derive(Parser)]
struct CheckConfigArgs {
    /// Path of the configuration file to check.
    #[arg(long, default_value = "config.toml")]
    path: String,
}

#[derive(Parser)]
struct SymbolArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,
}

#[derive(Parser)]
struct KlinesArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// The candle interval (e.g. "1m", "1h", "1d").
    #[arg(long, default_value = "1h")]
    interval: String,

    /// Number of candles to fetch.
    #[arg(long, default_value_t = 100)]
    limit: u32,
}

#[derive(Parser)]
struct BuyArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// Quote-currency amount to spend (e.g. 100 for 100 USDT).
    amount: Decimal,
}

#[derive(Parser)]
struct SellArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// A value in (0, 100] sells that percentage of the free balance;
    /// anything larger is an absolute base-asset quantity.
    amount: Decimal,
}

#[derive(Parser)]
struct LimitBuyArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// Quote-currency amount to spend.
    amount: Decimal,

    /// Limit price.
    price: Decimal,
}

#[derive(Parser)]
struct LimitSellArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// Base-asset quantity to sell.
    quantity: Decimal,

    /// Limit price.
    price: Decimal,
}

#[derive(Parser)]
struct CancelArgs {
    /// The trading pair the order belongs to.
    symbol: String,

    /// The exchange-assigned order id.
    order_id: i64,
}

#[derive(Parser)]
struct OrdersArgs {
    /// Restrict the listing to one trading pair.
    #[arg(long)]
    symbol: Option<String>,
}

#[derive(Parser)]
struct HistoryArgs {
    /// The trading pair (e.g. "BTCUSDT").
    symbol: String,

    /// Number of orders to show.
    #[arg(long, default_value_t = 10)]
    limit: u32,
}

// ==============================================================================
// Shared construction
// ==============================================================================

fn build_client() -> anyhow::Result<Arc<dyn ApiClient>> {
    let credentials = ApiCredentials::from_env()?;
    if credentials.testnet {
        println!("Note: using Binance TESTNET");
    }
    Ok(Arc::new(BinanceClient::new(&credentials)?))
}

fn build_trader() -> anyhow::Result<Trader> {
    Ok(Trader::new(build_client()?))
}

fn load_config() -> anyhow::Result<Config> {
    Ok(configuration::load_config()?)
}

// ==============================================================================
// Diagnostics
// ==============================================================================

/// Runs the three-step setup check: environment, connectivity, account
/// access. Exits 0 only when every step passes.
async fn handle_check_setup() -> ExitCode {
    println!("Binance setup check");
    println!("===================");

    // Step 1: credentials in the environment.
    println!("Step 1: environment variables");
    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => {
            println!(
                "  [PASS] BINANCE_API_KEY found: {}",
                ApiCredentials::masked(&credentials.api_key)
            );
            println!(
                "  [PASS] BINANCE_SECRET_KEY found: {}",
                ApiCredentials::masked(&credentials.api_secret)
            );
            if credentials.testnet {
                println!("  [NOTE] TESTNET mode (safe for testing)");
            } else {
                println!("  [WARN] MAINNET mode (real money)");
            }
            credentials
        }
        Err(e) => {
            println!("  [FAIL] {e}");
            println!("         Add the missing variable to your environment or .env file.");
            return ExitCode::FAILURE;
        }
    };

    // Step 2: REST connectivity.
    println!("Step 2: connectivity");
    let client = match BinanceClient::new(&credentials) {
        Ok(client) => client,
        Err(e) => {
            println!("  [FAIL] Could not build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = client.ping().await {
        println!("  [FAIL] Ping failed: {e}");
        return ExitCode::FAILURE;
    }
    println!("  [PASS] Ping succeeded");
    match client.server_time().await {
        Ok(time) => println!("  [PASS] Server time: {}", time.format("%Y-%m-%d %H:%M:%S UTC")),
        Err(e) => {
            println!("  [FAIL] Server time failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    // Step 3: authenticated account access.
    println!("Step 3: account access");
    match client.balances().await {
        Ok(balances) => {
            println!("  [PASS] Account accessible ({} non-zero balances)", balances.len());
            for balance in balances.iter().take(5) {
                println!("         {:<8} {}", balance.asset, balance.total());
            }
        }
        Err(e) => {
            println!("  [FAIL] Account query failed: {e}");
            println!("         Check the key's permissions and the testnet flag.");
            return ExitCode::FAILURE;
        }
    }

    println!("All checks passed.");
    ExitCode::SUCCESS
}

/// Validates the configuration file and reports its contents.
fn handle_check_config(args: CheckConfigArgs) -> ExitCode {
    println!("Configuration check: {}", args.path);
    println!("====================");

    let config = match configuration::load_config_from(&args.path) {
        Ok(config) => config,
        Err(e) => {
            println!("  [FAIL] {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("  [PASS] File loads and validates");
    println!("         venue:       {}", config.trading.venue);
    println!("         quote asset: {}", config.trading.quote_asset);
    println!(
        "         symbols:     {} ({})",
        config.trading.symbols.len(),
        config.trading.symbols.join(", ")
    );
    println!("         max order:   {}", config.risk_limits.max_order_size);
    println!("         max loss:    {}", config.risk_limits.max_loss);
    println!("         max gain:    {}", config.risk_limits.max_gain);
    println!("         min balance: {}", config.risk_limits.min_balance);

    match std::env::var("BINANCE_TESTNET") {
        Ok(v) if v.eq_ignore_ascii_case("true") => {
            println!("  [PASS] BINANCE_TESTNET is enabled");
        }
        _ => println!("  [WARN] BINANCE_TESTNET is not enabled; orders will hit mainnet"),
    }

    println!("Configuration OK.");
    ExitCode::SUCCESS
}

// ==============================================================================
// Market data commands
// ==============================================================================

async fn handle_price(args: SymbolArgs) -> anyhow::Result<()> {
    let client = build_client()?;
    let price = client.price(&args.symbol).await?;
    println!("{}: {}", args.symbol, price);
    Ok(())
}

async fn handle_stats(args: SymbolArgs) -> anyhow::Result<()> {
    let client = build_client()?;
    let stats = client.ticker_24h(&args.symbol).await?;
    println!("{} 24h statistics", args.symbol);
    println!("  price:  {}", stats.price);
    println!("  change: {}%", stats.change_percent);
    println!("  high:   {}", stats.high);
    println!("  low:    {}", stats.low);
    println!("  volume: {}", stats.volume);
    Ok(())
}

async fn handle_klines(args: KlinesArgs) -> anyhow::Result<()> {
    let client = build_client()?;
    let klines = client
        .klines(&args.symbol, &args.interval, args.limit)
        .await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["time", "open", "high", "low", "close", "volume"]);
    for kline in &klines {
        table.add_row(vec![
            Cell::new(kline.open_time.format("%Y-%m-%d %H:%M")),
            Cell::new(kline.open),
            Cell::new(kline.high),
            Cell::new(kline.low),
            Cell::new(kline.close),
            Cell::new(kline.volume),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_balances() -> anyhow::Result<()> {
    let client = build_client()?;
    let balances = client.balances().await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["asset", "free", "locked", "total"]);
    for balance in &balances {
        table.add_row(vec![
            Cell::new(&balance.asset),
            Cell::new(balance.free),
            Cell::new(balance.locked),
            Cell::new(balance.total()),
        ]);
    }
    println!("{table}");
    Ok(())
}

// ==============================================================================
// Trading commands
// ==============================================================================

fn print_receipt(receipt: &core_types::OrderReceipt) {
    println!(
        "{} {} {} executed: id {}, qty {}, status {}",
        receipt.symbol,
        receipt.order_type.as_str(),
        receipt.side.as_str(),
        receipt.order_id,
        receipt.quantity,
        receipt.status
    );
    for fill in &receipt.fills {
        println!(
            "  fill: {} @ {} (fee {} {})",
            fill.quantity, fill.price, fill.commission, fill.commission_asset
        );
    }
}

async fn handle_buy(args: BuyArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    println!("Market BUY {} for {}", args.symbol, args.amount);
    let receipt = trader.market_buy(&args.symbol, args.amount).await?;
    print_receipt(&receipt);
    Ok(())
}

async fn handle_sell(args: SellArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    println!("Market SELL {} amount {}", args.symbol, args.amount);
    let receipt = trader
        .market_sell(&args.symbol, SellAmount::from_scalar(args.amount))
        .await?;
    print_receipt(&receipt);
    Ok(())
}

async fn handle_limit_buy(args: LimitBuyArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    let receipt = trader
        .limit_buy(&args.symbol, args.amount, args.price)
        .await?;
    println!("Limit buy order placed at {}", args.price);
    print_receipt(&receipt);
    Ok(())
}

async fn handle_limit_sell(args: LimitSellArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    let receipt = trader
        .limit_sell(&args.symbol, args.quantity, args.price)
        .await?;
    println!("Limit sell order placed at {}", args.price);
    print_receipt(&receipt);
    Ok(())
}

async fn handle_cancel(args: CancelArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    let ack = trader.cancel_order(&args.symbol, args.order_id).await?;
    println!("Order {} cancelled (status {})", ack.order_id, ack.status);
    Ok(())
}

fn print_order_table(orders: &[api_client::OrderSummary]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "time", "symbol", "id", "side", "type", "price", "qty", "filled", "status",
    ]);
    for order in orders {
        let time = Utc
            .timestamp_millis_opt(order.time)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| order.time.to_string());
        table.add_row(vec![
            Cell::new(time),
            Cell::new(&order.symbol),
            Cell::new(order.order_id),
            Cell::new(order.side.as_str()),
            Cell::new(&order.order_type),
            Cell::new(order.price),
            Cell::new(order.orig_qty),
            Cell::new(order.executed_qty),
            Cell::new(&order.status),
        ]);
    }
    println!("{table}");
}

async fn handle_orders(args: OrdersArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    let orders = trader.open_orders(args.symbol.as_deref()).await?;
    if orders.is_empty() {
        println!("No open orders.");
    } else {
        print_order_table(&orders);
    }
    Ok(())
}

async fn handle_history(args: HistoryArgs) -> anyhow::Result<()> {
    let trader = build_trader()?;
    let orders = trader.order_history(&args.symbol, args.limit).await?;
    print_order_table(&orders);
    Ok(())
}

// ==============================================================================
// Portfolio
// ==============================================================================

fn print_portfolio(snapshot: &PortfolioSnapshot) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "asset".to_string(),
        "balance".to_string(),
        format!("value ({})", snapshot.quote_asset),
    ]);
    for (asset, entry) in &snapshot.breakdown {
        table.add_row(vec![
            Cell::new(asset),
            Cell::new(entry.balance),
            Cell::new(entry.value.round_dp(2)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL"),
        Cell::new(""),
        Cell::new(snapshot.total_value.round_dp(2)),
    ]);
    println!("{table}");
}

async fn handle_portfolio() -> anyhow::Result<()> {
    let config = load_config()?;
    let client = build_client()?;
    let reporter = PortfolioReporter::new(
        client,
        config.trading.quote_asset.clone(),
        config.trading.dust_threshold,
    );
    let snapshot = reporter.snapshot().await?;
    print_portfolio(&snapshot);
    Ok(())
}
