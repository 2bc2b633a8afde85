use clap::{Parser, Subcommand, ValueHint};
use sparql_facets_model::FacetSort;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparql-facets")]
/// Faceted search over SPARQL endpoints
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search for entities and print the documents and facets as JSON
    Search {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        params: SearchParams,
    },
    /// Print a single entity with the detail fields
    Show {
        /// IRI of the entity
        #[arg(value_hint = ValueHint::Url)]
        iri: String,
        #[command(flatten)]
        target: Target,
        /// Language of language-filtered fields
        ///
        /// By default the language of the configuration is used.
        #[arg(long)]
        lang: Option<String>,
        /// Print the labels and the formatted values of the detail fields instead of the document
        #[arg(long)]
        fields: bool,
    },
    /// Page through the values of a single facet
    Facet {
        /// Name of the facet
        name: String,
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        params: SearchParams,
        /// Page of facet values, starting at 1
        #[arg(long, default_value_t = 1)]
        facet_page: u64,
        /// Order of the facet values: "count" or "index"
        ///
        /// By default the order of the configuration is used.
        #[arg(long)]
        facet_sort: Option<FacetSort>,
        /// Only show facet values starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print the generated SPARQL queries without executing them
    Explain {
        /// Search configuration file (JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        #[command(flatten)]
        params: SearchParams,
        /// Explain the lookup of a single entity instead of a search
        #[arg(long, value_hint = ValueHint::Url)]
        id: Option<String>,
    },
}

/// Where the configuration and the data come from.
#[derive(clap::Args)]
pub struct Target {
    /// Search configuration file (JSON)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    #[command(flatten)]
    pub source: Source,
    /// Timeout of a single SPARQL query in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct Source {
    /// URL of the SPARQL query endpoint
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    /// RDF file that is loaded into an in-memory store instead of querying an endpoint
    ///
    /// The format is guessed from the file extension.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub data: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SearchParams {
    /// Free-text query
    #[arg(short, long)]
    pub q: Option<String>,
    /// Search field the query is matched against
    #[arg(long)]
    pub search_field: Option<String>,
    /// Restrict a facet to a value. May be repeated
    #[arg(long = "facet", value_name = "NAME=VALUE", value_parser = parse_facet_filter)]
    pub facets: Vec<(String, String)>,
    /// Page of entities, starting at 1
    #[arg(long)]
    pub page: Option<u64>,
    /// Number of entities per page
    #[arg(long)]
    pub per_page: Option<u64>,
    /// Name of a sort option of the configuration
    #[arg(long)]
    pub sort: Option<String>,
    /// Language of language-filtered fields
    #[arg(long)]
    pub lang: Option<String>,
}

fn parse_facet_filter(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE but found '{value}'"))?;
    if name.is_empty() {
        return Err("the facet name must not be empty".to_owned());
    }
    Ok((name.to_owned(), value.to_owned()))
}
