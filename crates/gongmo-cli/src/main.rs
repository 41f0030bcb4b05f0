use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use gongmo_catalog::{Catalog, Settings};
use gongmo_core::{CategoryFilter, DateField, ListTab, SortOrder};
use gongmo_query::{project, ListingFilter, ListingQuery, Pager};
use gongmo_web::{AppState, WebConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gongmo")]
#[command(about = "Gongmo grant-listing dashboard")]
struct Cli {
    /// Directory holding gongmo.yaml, fixtures/ and assets/.
    #[arg(long, env = "GONGMO_ROOT", default_value = ".", global = true)]
    root: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the main web app.
    Serve,
    /// Run the admin shell on its own port.
    ServeAdmin,
    /// Print one page of listings.
    List(ListArgs),
    /// Print the category filter options.
    Categories,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_parser = parse_date_field, default_value = "infoCollectedAt")]
    date_field: DateField,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    #[arg(long, value_parser = parse_tab, default_value = "recruiting")]
    tab: ListTab,
    #[arg(long, value_parser = parse_date_field, default_value = "infoCollectedAt")]
    sort: DateField,
    #[arg(long, value_parser = parse_order, default_value = "desc")]
    order: SortOrder,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// YYYY-MM-DD; defaults to the local date.
    #[arg(long)]
    today: Option<NaiveDate>,
}

fn parse_date_field(value: &str) -> Result<DateField, String> {
    DateField::from_param(value)
        .ok_or_else(|| "expected one of infoCollectedAt, startDate, deadline".to_string())
}

fn parse_tab(value: &str) -> Result<ListTab, String> {
    ListTab::from_param(value).ok_or_else(|| "expected recruiting or closed".to_string())
}

fn parse_order(value: &str) -> Result<SortOrder, String> {
    SortOrder::from_param(value).ok_or_else(|| "expected asc or desc".to_string())
}

fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gongmo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn listing_query(args: &ListArgs) -> ListingQuery {
    ListingQuery {
        filter: ListingFilter {
            search_text: args.search.clone(),
            date_field: args.date_field,
            date_from: ListingFilter::date_bound(args.from.as_deref()),
            date_to: ListingFilter::date_bound(args.to.as_deref()),
            category: CategoryFilter::from_label(args.category.as_deref().unwrap_or_default()),
        },
        tab: args.tab,
        sort_field: args.sort,
        sort_order: args.order,
        page: args.page,
    }
}

fn print_listings(root: &Path, args: ListArgs) -> Result<()> {
    let settings = Settings::load(root).context("loading settings")?;
    let catalog = Catalog::load(&settings, root).context("loading catalog")?;
    let query = listing_query(&args);
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let projection = project(catalog.listings(), &query, settings.page_size, today);

    if projection.items.is_empty() {
        println!("검색 결과가 없습니다");
    }
    for listing in &projection.items {
        println!(
            "{:>3}  [{}] {}  {}  {} ~ {}  {}  ({})",
            listing.id,
            listing.source_badge(),
            listing.title,
            listing.category,
            listing.start_date,
            listing.deadline,
            listing.amount,
            listing.status.label(),
        );
    }

    let pager = Pager::for_projection(&projection);
    if pager.is_visible() {
        let pages = pager
            .pages()
            .map(|p| {
                if p == pager.current {
                    format!("[{p}]")
                } else {
                    p.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("pages: {pages}");
    }
    println!(
        "{} / page {} of {} / {} listings",
        query.tab.label(),
        projection.page,
        projection.total_pages,
        projection.total_items
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState::load(&cli.root, WebConfig::from_env())?;
            info!(
                listings = state.catalog.listings().len(),
                page_size = state.settings.page_size,
                "catalog loaded"
            );
            gongmo_web::serve(state).await?;
        }
        Commands::ServeAdmin => {
            gongmo_web::serve_admin(WebConfig::from_env()).await?;
        }
        Commands::List(args) => print_listings(&cli.root, args)?,
        Commands::Categories => {
            let settings = Settings::load(&cli.root).context("loading settings")?;
            for category in settings.categories {
                println!("{category}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(argv: &[&str]) -> ListArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::List(args)) => args,
            other => panic!("expected list command, got {other:?}"),
        }
    }

    #[test]
    fn blank_date_flags_are_ignored() {
        let args = list_args(&["gongmo", "list", "--from", "", "--to", "  "]);
        let query = listing_query(&args);
        assert_eq!(query.filter.date_from, None);
        assert_eq!(query.filter.date_to, None);
    }

    #[test]
    fn list_flags_map_onto_the_query() {
        let args = list_args(&[
            "gongmo", "list", "--search", "AI", "--category", "AI/ICT", "--to", "2026-03-01",
            "--tab", "closed", "--sort", "deadline", "--order", "asc", "--page", "2",
        ]);
        let query = listing_query(&args);
        assert_eq!(query.filter.search_text, "AI");
        assert_eq!(query.filter.category, CategoryFilter::Only("AI/ICT".into()));
        assert_eq!(query.filter.date_to.as_deref(), Some("2026-03-01"));
        assert_eq!(query.tab, ListTab::Closed);
        assert_eq!(query.sort_field, DateField::Deadline);
        assert_eq!(query.sort_order, SortOrder::Ascending);
        assert_eq!(query.page, 2);
    }
}
