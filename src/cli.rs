use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use notesearch::{
    DateRange,
    DocumentType,
    Filters,
    Priority,
    SearchOptions,
    SortKey,
    SortOrder,
    query::DEFAULT_LIMIT,
};

#[derive(Debug, Parser)]
#[command(
    name = "notesearch",
    about = "Ranked full-text search over a collection of notes"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep analytics in memory only
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search a notes directory or JSON corpus
    Search(SearchArgs),
    /// Suggest completions, corrections and trending queries
    Suggest(SuggestArgs),
    /// Report index size, timings and recommendations
    Diagnostics(DiagnosticsArgs),
    /// Show persisted search analytics
    Analytics(AnalyticsArgs),
    /// Read queries from stdin, one per line, and search as you type
    Interactive(InteractiveArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

/// Where documents come from.
#[derive(Debug, Clone, clap::Args)]
pub struct SourceArgs {
    /// Notes directory, or a JSON file holding an array of documents
    #[arg(short = 's', long)]
    pub source: PathBuf,

    /// Only index files whose relative path matches this glob
    #[arg(long)]
    pub glob: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Document,
    Note,
    Template,
    Database,
    Page,
}

impl From<TypeArg> for DocumentType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Document => DocumentType::Document,
            TypeArg::Note => DocumentType::Note,
            TypeArg::Template => DocumentType::Template,
            TypeArg::Database => DocumentType::Database,
            TypeArg::Page => DocumentType::Page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Relevance,
    Date,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

/// Filters and options shared by `search` and `interactive`.
#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    /// Only these document types (repeatable)
    #[arg(long = "type", value_enum)]
    pub types: Vec<TypeArg>,

    /// Only documents with one of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Only documents by one of these authors (repeatable)
    #[arg(long = "author")]
    pub authors: Vec<String>,

    /// Only documents in one of these categories (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Only documents with one of these priorities (repeatable)
    #[arg(long = "priority", value_enum)]
    pub priorities: Vec<PriorityArg>,

    /// Modified at or after this Unix timestamp
    #[arg(long)]
    pub since: Option<u64>,

    /// Modified at or before this Unix timestamp
    #[arg(long)]
    pub until: Option<u64>,

    /// Sort key
    #[arg(long, value_enum, default_value = "relevance")]
    pub sort: SortArg,

    /// Sort direction
    #[arg(long, value_enum, default_value = "desc")]
    pub order: OrderArg,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Skip this many results
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Disable typo-tolerant term expansion
    #[arg(long)]
    pub no_fuzzy: bool,

    /// Disable the vector-similarity factor
    #[arg(long)]
    pub no_semantic: bool,

    /// Ignore author, category and collaborators when scoring
    #[arg(long)]
    pub no_contextual: bool,

    /// Return snippets instead of full content
    #[arg(long)]
    pub snippets: bool,
}

impl QueryArgs {
    pub fn filters(&self) -> Filters {
        let date_range = (self.since.is_some() || self.until.is_some())
            .then_some(DateRange {
                start: self.since,
                end: self.until,
            });
        Filters {
            types: self.types.iter().copied().map(Into::into).collect(),
            tags: self.tags.clone(),
            authors: self.authors.clone(),
            categories: self.categories.clone(),
            priorities: self
                .priorities
                .iter()
                .copied()
                .map(Into::into)
                .collect(),
            date_range,
        }
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            fuzzy: !self.no_fuzzy,
            semantic: !self.no_semantic,
            contextual: !self.no_contextual,
            include_content: !self.snippets,
            limit: self.limit,
            offset: self.offset,
            sort_by: match self.sort {
                SortArg::Relevance => SortKey::Relevance,
                SortArg::Date => SortKey::Date,
                SortArg::Title => SortKey::Title,
            },
            sort_order: match self.order {
                OrderArg::Asc => SortOrder::Asc,
                OrderArg::Desc => SortOrder::Desc,
            },
        }
    }
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query_args: QueryArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct SuggestArgs {
    /// Partial query text (may be empty)
    #[arg(default_value = "")]
    pub partial: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct DiagnosticsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct AnalyticsArgs {
    /// Number of trending queries to show
    #[arg(short = 'n', long, default_value = "10")]
    pub trending: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query_args: QueryArgs,

    /// Quiet period before a typed query is searched
    #[arg(long, default_value = "150")]
    pub debounce_ms: u64,

    /// Output each response as a JSON line
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "notesearch",
            &mut std::io::stdout(),
        );
    }
}
