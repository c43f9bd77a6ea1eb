use clap::{Parser, Subcommand};
use facetq::{
    url_parser, CompilerConfig, ContextProvider, Controller, DefaultFieldNames, FilterData,
    FilterStruct, MultiMatchTextQuery, QueryCompiler, SortWay, StaticContextProvider,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "facetq", version, about = "Compile listing filters into search queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Compiler settings (JSON). A missing file means defaults.
    #[arg(long, env = "FACETQ_CONFIG", default_value = "facetq.json", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Print the result query and facet aggregations for one listing request
    Compile(CompileArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Listing type: category, manufacturer, prices-drop, best-sales,
    /// new-products or module-brad-search
    #[arg(long, default_value = "category")]
    controller: String,
    /// Category or manufacturer id of the listing
    #[arg(long, default_value_t = 0)]
    id: i64,
    /// Raw URL query string holding the selected filters
    #[arg(long, default_value = "")]
    params: String,
    /// JSON array of declared facets: [{"inputName": .., "criteria": [..]}]
    #[arg(long)]
    facets: Option<PathBuf>,
    /// Emit the count query (no sort, no pagination)
    #[arg(long)]
    count_only: bool,
    #[arg(long, default_value = "_score")]
    order_by: String,
    #[arg(long, default_value = "desc")]
    order_way: String,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long, default_value_t = facetq::types::DEFAULT_PAGE_SIZE)]
    per_page: usize,
    /// Free text for the text-search listing
    #[arg(long)]
    search_query: Option<String>,
    #[arg(long, env = "FACETQ_CUSTOMER_GROUP", default_value_t = 1)]
    customer_group: u32,
    #[arg(long, env = "FACETQ_COUNTRY", default_value_t = 1)]
    country: u32,
    #[arg(long, env = "FACETQ_CURRENCY", default_value_t = 1)]
    currency: u32,
}

fn load_facets(path: Option<&Path>) -> Result<Vec<FilterStruct>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read facets file {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn run_compile(config_path: &Path, args: CompileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = CompilerConfig::load(config_path)?;
    let fields = DefaultFieldNames::from_config(&config);
    let text = MultiMatchTextQuery::from_config(&config);
    let context = StaticContextProvider::new(&config)
        .with_ids(args.customer_group, args.country, args.currency)
        .request_context()?;

    let parsed = url_parser::parse_query_string(&args.params);
    let controller = Controller::from_name(&args.controller);
    let mut data = FilterData::new(controller, args.id)
        .with_filters(load_facets(args.facets.as_deref())?)
        .with_selected(parsed.selected.clone())
        .with_order(args.order_by, SortWay::parse(&args.order_way))
        .with_page(args.page, args.per_page);
    if let Some(q) = args.search_query {
        data = data.with_search_query(q);
    }

    let compiler = QueryCompiler::new(&fields)
        .with_config(&config)
        .with_text_provider(&text)
        .with_context(context);
    let query = compiler.build_result_query(&data, args.count_only)?;
    let aggregations = compiler.build_aggregation_query(&data)?;
    tracing::info!(
        controller = controller.as_str(),
        facets = data.filters.len(),
        aggregations = aggregations.len(),
        "compiled listing request"
    );

    let out = json!({
        "queryString": parsed.query_string,
        "selectedFilters": serde_json::to_value(&parsed.selected)?,
        "query": query.to_json(),
        "aggregations": aggregations.to_json(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Compile(args) => run_compile(&cli.config, args),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
