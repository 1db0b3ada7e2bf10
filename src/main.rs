use std::{sync::Arc, time::Duration};

use clap::Parser;
use notesearch::{
    AnalyticsTracker,
    DataDir,
    EngineConfig,
    MemoryStore,
    SearchEngine,
    SearchQuery,
    StateDb,
    StateStore,
    debounce::Debouncer,
    error,
    format,
    ingestion,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

pub mod cli;

use cli::{Cli, Command, SourceArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("NOTESEARCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let store = open_store(&cli)?;

    match cli.command {
        Command::Search(args) => {
            let engine = build_engine(&store, &args.source)?;
            let query = SearchQuery::new(args.query.as_str())
                .with_filters(args.query_args.filters())
                .with_options(args.query_args.options());
            let response = engine.search(&query)?;
            engine.flush();

            if args.json {
                println!("{}", format::to_json(&response)?);
            } else {
                print!(
                    "{}",
                    format::format_human(&response, query.options.offset)
                );
            }
        }
        Command::Suggest(args) => {
            let engine = build_engine(&store, &args.source)?;
            let suggestions = engine.suggest(&args.partial)?;
            if args.json {
                println!("{}", format::to_json(&suggestions)?);
            } else {
                print!("{}", format::format_suggestions(&suggestions));
            }
        }
        Command::Diagnostics(args) => {
            let engine = build_engine(&store, &args.source)?;
            let report = engine.run_diagnostics();
            if args.json {
                println!("{}", format::to_json(&report)?);
            } else {
                print!("{}", format::format_diagnostics(&report));
            }
        }
        Command::Analytics(args) => {
            cmd_analytics(store.as_ref(), args.trending, args.json)?;
        }
        Command::Interactive(args) => {
            let engine = build_engine(&store, &args.source)?;
            cmd_interactive(engine, &args)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn open_store(cli: &Cli) -> error::Result<Arc<dyn StateStore>> {
    if cli.no_persist {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    tracing::debug!(
        path = %data_dir.root().display(),
        source = %data_dir.source(),
        "using data directory"
    );
    Ok(Arc::new(StateDb::open(&data_dir.state_db())?))
}

fn build_engine(
    store: &Arc<dyn StateStore>,
    source: &SourceArgs,
) -> error::Result<Arc<SearchEngine>> {
    let documents =
        ingestion::load_source(&source.source, source.glob.as_deref())?;
    let engine =
        SearchEngine::new(EngineConfig::default()).with_store(Arc::clone(store));
    engine.initialize(documents);
    Ok(Arc::new(engine))
}

fn cmd_analytics(
    store: &dyn StateStore,
    trending: usize,
    json: bool,
) -> error::Result<()> {
    let state = store.load_state()?.unwrap_or_default();
    let mut tracker = AnalyticsTracker::default();
    tracker.hydrate(state.clone());
    let trending = tracker.trending(trending);

    if json {
        let value = serde_json::json!({
            "analytics": state,
            "trending": trending
                .iter()
                .map(|(query, count)| {
                    serde_json::json!({ "query": query, "count": count })
                })
                .collect::<Vec<_>>(),
        });
        println!("{}", format::to_json(&value)?);
    } else {
        print!("{}", format::format_analytics(&state, &trending));
    }
    Ok(())
}

fn cmd_interactive(
    engine: Arc<SearchEngine>,
    args: &cli::InteractiveArgs,
) -> error::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    let filters = args.query_args.filters();
    let options = args.query_args.options();
    let delay = Duration::from_millis(args.debounce_ms);
    let json = args.json;

    runtime.block_on(async {
        let (debouncer, mut results, worker) =
            Debouncer::spawn(Arc::clone(&engine), delay);

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let query = SearchQuery::new(line.trim())
                            .with_filters(filters.clone())
                            .with_options(options.clone());
                        if !debouncer.submit(query) {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("failed to read query: {e}");
                        break;
                    }
                }
            }
        });

        while let Some(outcome) = results.recv().await {
            match outcome.response {
                Ok(response) if json => match serde_json::to_string(&response) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!("failed to encode response: {e}"),
                },
                Ok(response) => {
                    let offset = outcome.query.options.offset;
                    println!("> {}", outcome.query.text);
                    print!("{}", format::format_human(&response, offset));
                }
                Err(e) => tracing::error!("search failed: {e}"),
            }
        }

        if let Err(e) = reader.await {
            tracing::warn!("input task failed: {e}");
        }
        if let Err(e) = worker.await {
            tracing::warn!("search worker failed: {e}");
        }
    });

    engine.flush();
    Ok(())
}
