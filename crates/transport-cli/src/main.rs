//! Transport Dashboard CLI
//!
//! The `transportctl` command manages the transport fleet against the
//! remote collection endpoint.
//!
//! ## Commands
//!
//! - `list`: Filter, sort and page through transports (`--watch` keeps
//!   reprinting the page as the fleet changes)
//! - `add`: Register a new transport
//! - `update`: Edit a transport (asks for confirmation unless `--yes`)
//! - `delete`: Remove a transport (admins only, asks for confirmation)
//! - `summary`: Fleet totals by type
//! - `order`: Show or change the dashboard panel order
//! - `intent`: Interpret a free-text query
//! - `simulate`: Project capacity growth over the coming days

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};

use transport_core::{
    AppContext, CapacityScenario, Config, Confirmed, Field, FleetSummary, Query, QueryIntent,
    SortKey, SubmitOutcome, View,
};
use transport_gateway::{HttpGateway, Record, RecordId, TransportType};

#[derive(Parser)]
#[command(name = "transportctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage the transport fleet", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Transport collection endpoint
    #[arg(long, global = true, env = "TRANSPORT_API_URL")]
    api_url: Option<String>,

    /// Sign in with this email
    #[arg(long, global = true, env = "TRANSPORT_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "TRANSPORT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List transports
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,

        /// Only show this type (land, air, sea)
        #[arg(short = 't', long = "type")]
        kind: Option<TransportType>,

        /// Sort key (name, capacity, type)
        #[arg(long, default_value = "name")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        page_size: Option<usize>,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,

        /// Keep polling and print the page whenever it changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Register a new transport
    Add {
        name: String,

        /// Capacity in kilograms
        capacity: String,

        /// Transport type (land, air, sea)
        #[arg(short = 't', long = "type")]
        kind: String,
    },

    /// Edit a transport
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        capacity: Option<String>,

        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove a transport
    Delete {
        id: String,

        /// Delete without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Fleet totals by type
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Dashboard panel order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// Interpret a free-text query such as "capacity last 7 days"
    Intent { text: String },

    /// Project capacity growth from a base of 100
    Simulate {
        /// Number of days to project
        #[arg(short, long, default_value_t = 5)]
        days: u32,

        /// Capacity added per day
        #[arg(short, long, default_value_t = 5.0, allow_negative_numbers = true)]
        increment: f64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Show the current order
    Show,
    /// Move the panel at FROM to position TO (zero-based)
    Move { from: usize, to: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    transport_core::init_tracing(cli.json_logs, level);

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    if let Commands::List {
        page_size: Some(size),
        ..
    } = cli.command
    {
        config = config.with_page_size(size);
    }

    let gateway = HttpGateway::new(config.gateway_config()).context("Failed to build HTTP client")?;
    let mut ctx = AppContext::new(config, Arc::new(gateway));

    if let Some(email) = cli.email.as_deref() {
        let user = ctx
            .login(email, cli.password.as_deref().unwrap_or_default())
            .context("Sign-in failed")?;
        debug!(email = %user.email, role = %user.role, "Signed in");
    }

    match cli.command {
        Commands::List {
            search,
            kind,
            sort,
            desc,
            page,
            json,
            watch,
            ..
        } => {
            let query = Query::with_page_size(ctx.config().page_size)
                .text(search.unwrap_or_default())
                .of_type(kind)
                .sorted_by(sort, !desc)
                .page(page);
            cmd_list(&mut ctx, query, json).await?;
            if watch {
                cmd_watch(&mut ctx, json).await?;
            }
            Ok(())
        }
        Commands::Add {
            name,
            capacity,
            kind,
        } => cmd_add(&mut ctx, name, capacity, kind).await,
        Commands::Update {
            id,
            name,
            capacity,
            kind,
            yes,
        } => cmd_update(&mut ctx, RecordId::new(id), name, capacity, kind, yes).await,
        Commands::Delete { id, yes } => cmd_delete(&mut ctx, RecordId::new(id), yes).await,
        Commands::Summary { json } => cmd_summary(&mut ctx, json).await,
        Commands::Order { action } => match action {
            OrderAction::Show => cmd_order_show(&ctx),
            OrderAction::Move { from, to } => cmd_order_move(&mut ctx, from, to),
        },
        Commands::Intent { text } => cmd_intent(&text),
        Commands::Simulate {
            days,
            increment,
            json,
        } => cmd_simulate(CapacityScenario::new(days, increment), json),
    }
}

async fn load(ctx: &mut AppContext) -> Result<()> {
    let url = ctx.config().api_url.clone();
    ctx.load()
        .await
        .with_context(|| format!("Failed to load transports from {url}"))?;
    Ok(())
}

fn ask(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_record(record: &Record) {
    println!(
        "{:<8} {:<24} {:>12} {}",
        record.id.as_str(),
        record.name,
        record.capacity,
        record.kind.label()
    );
}

fn print_view(view: &View) {
    if view.items.is_empty() {
        println!("No transports found.");
        return;
    }
    println!("{:<8} {:<24} {:>12} TYPE", "ID", "NAME", "CAPACITY");
    for record in &view.items {
        print_record(record);
    }
    println!();
    println!(
        "Page {}/{} ({} matching)",
        view.page,
        view.total_pages.max(1),
        view.total_matches
    );
}

fn show_view(view: &View, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print_view(view);
    }
    Ok(())
}

async fn cmd_list(ctx: &mut AppContext, query: Query, json: bool) -> Result<()> {
    load(ctx).await?;
    ctx.set_query(query);
    let view = ctx.render_now();
    show_view(&view, json)
}

/// Reprint the page after every change until interrupted.
async fn cmd_watch(ctx: &mut AppContext, json: bool) -> Result<()> {
    let every = ctx.config().poll_interval;
    let mut views = ctx.subscribe_view();
    let mut shown = views.borrow_and_update().clone();
    ctx.start_polling(every);
    eprintln!("Watching for changes every {}s, Ctrl-C to stop.", every.as_secs());

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view != shown {
                    println!();
                    show_view(&view, json)?;
                    shown = view;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ctx.detach();
    Ok(())
}

async fn cmd_add(ctx: &mut AppContext, name: String, capacity: String, kind: String) -> Result<()> {
    ctx.start_create();
    ctx.set_field(Field::Name, name);
    ctx.set_field(Field::Capacity, capacity);
    ctx.set_field(Field::Type, kind);

    if let SubmitOutcome::Created(record) = ctx.submit().await.context("Transport not added")? {
        println!("Added transport {}", record.id);
        print_record(&record);
    }
    Ok(())
}

async fn cmd_update(
    ctx: &mut AppContext,
    id: RecordId,
    name: Option<String>,
    capacity: Option<String>,
    kind: Option<String>,
    yes: bool,
) -> Result<()> {
    load(ctx).await?;
    ctx.start_edit(&id)?;
    for (field, value) in [(Field::Name, name), (Field::Capacity, capacity), (Field::Type, kind)] {
        if let Some(value) = value {
            ctx.set_field(field, value);
        }
    }

    let updated = match ctx.submit().await.context("Transport not updated")? {
        SubmitOutcome::Updated(record) => record,
        SubmitOutcome::AwaitingConfirmation => {
            if !yes && !ask(&format!("Apply changes to transport {id}?"))? {
                ctx.cancel_edit();
                println!("Update cancelled.");
                return Ok(());
            }
            match ctx.confirm().await.context("Transport not updated")? {
                Confirmed::Updated(record) => record,
                Confirmed::Deleted(_) => None,
            }
        }
        SubmitOutcome::Created(record) => Some(record),
    };

    println!("Updated transport {id}");
    if let Some(record) = updated {
        print_record(&record);
    }
    Ok(())
}

async fn cmd_delete(ctx: &mut AppContext, id: RecordId, yes: bool) -> Result<()> {
    load(ctx).await?;
    ctx.request_delete(&id)?;

    let name = ctx
        .store()
        .get(&id)
        .map(|r| r.name)
        .unwrap_or_else(|| id.to_string());
    if !yes && !ask(&format!("Delete transport \"{name}\"?"))? {
        ctx.cancel_confirmation();
        println!("Delete cancelled.");
        return Ok(());
    }

    ctx.confirm().await.context("Transport not deleted")?;
    println!("Deleted transport {id}");
    Ok(())
}

async fn cmd_summary(ctx: &mut AppContext, json: bool) -> Result<()> {
    load(ctx).await?;
    let summary: FleetSummary = ctx.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Total transports: {}", summary.total);
    for (kind, count) in &summary.by_type {
        println!("  {:<10} {}", kind.label(), count);
    }
    println!("Total capacity:   {} kg", summary.total_capacity);
    Ok(())
}

fn cmd_order_show(ctx: &AppContext) -> Result<()> {
    for (index, panel) in ctx.display_order().items().iter().enumerate() {
        println!("{index}: {panel}");
    }
    Ok(())
}

fn cmd_order_move(ctx: &mut AppContext, from: usize, to: usize) -> Result<()> {
    ctx.move_panel(from, to)
        .with_context(|| format!("Failed to save preferences to {}", ctx.config().prefs_path.display()))?;
    cmd_order_show(ctx)
}

fn cmd_simulate(scenario: CapacityScenario, json: bool) -> Result<()> {
    let points = scenario.simulate_from_today();

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }
    println!("{:<12} {:>12}", "DATE", "CAPACITY");
    for point in &points {
        println!("{:<12} {:>12}", point.date, point.capacity);
    }
    Ok(())
}

fn cmd_intent(text: &str) -> Result<()> {
    let intent = QueryIntent::parse(text);
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}
