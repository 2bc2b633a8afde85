use crate::cli::{Args, Command, SearchParams, Source, Target};
use anyhow::{bail, Context};
use clap::Parser;
use oxigraph::io::RdfFormat;
use oxigraph::store::Store;
use serde::Serialize;
use sparql_facets::transport::{HttpTransport, StoreTransport};
use sparql_facets::{Repository, TransportConfig};
use sparql_facets_model::{SearchConfig, SearchRequest, SearchRequestBuilder};
use sparql_facets_query::{
    build_count, build_entity_construct, build_facet_aggregate, build_id_page, CountPlan,
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_tracing();
    match matches.command {
        Command::Search { target, params } => {
            let config = load_config(&target.config)?;
            let request = apply_params(SearchRequest::builder(&config), params).build()?;
            let response = repository(&target)?
                .search(&request)
                .await
                .context("The search failed")?;
            write_json(&response)
        }
        Command::Show {
            iri,
            target,
            lang,
            fields,
        } => {
            let config = load_config(&target.config)?;
            let document = repository(&target)?
                .find(&config, &iri, lang.as_deref())
                .await
                .with_context(|| format!("Unable to show {iri}"))?;
            if fields {
                write_json(&document.render_fields(&config.show_fields))
            } else {
                write_json(&document)
            }
        }
        Command::Facet {
            name,
            target,
            params,
            facet_page,
            facet_sort,
            prefix,
        } => {
            let config = load_config(&target.config)?;
            let builder = apply_params(SearchRequest::builder(&config), params);
            let aggregation = repository(&target)?
                .facet_page(builder, &name, facet_page, facet_sort, prefix)
                .await
                .with_context(|| format!("Unable to aggregate the facet {name}"))?;
            write_json(&aggregation)
        }
        Command::Explain { config, params, id } => {
            let config = load_config(&config)?;
            let mut builder = apply_params(SearchRequest::builder(&config), params);
            if let Some(id) = id {
                builder = builder.id(id);
            }
            explain(&builder.build()?)
        }
    }
}

/// Logs to stderr. The filter can be overridden with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sparql_facets=info,sparql_facets_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<SearchConfig> {
    SearchConfig::from_path(path)
        .with_context(|| format!("Invalid search configuration {}", path.display()))
}

fn apply_params(
    mut builder: SearchRequestBuilder<'_>,
    params: SearchParams,
) -> SearchRequestBuilder<'_> {
    if let Some(q) = params.q {
        builder = builder.query(q);
    }
    if let Some(search_field) = params.search_field {
        builder = builder.search_field(search_field);
    }
    for (name, value) in params.facets {
        builder = builder.facet_filter(name, [value]);
    }
    if let Some(page) = params.page {
        builder = builder.page(page);
    }
    if let Some(rows) = params.per_page {
        builder = builder.rows(rows);
    }
    if let Some(sort) = params.sort {
        builder = builder.sort(sort);
    }
    if let Some(lang) = params.lang {
        builder = builder.language(lang);
    }
    builder
}

fn repository(target: &Target) -> anyhow::Result<Repository> {
    let timeout = Duration::from_secs(target.timeout);
    let repository = match &target.source {
        Source {
            endpoint: Some(endpoint),
            ..
        } => Repository::new(HttpTransport::with_timeout(endpoint.as_str(), timeout)?),
        Source {
            data: Some(data), ..
        } => Repository::new(StoreTransport::new(load_store(data)?)),
        Source { .. } => bail!("Either --endpoint or --data must be set"),
    };
    Ok(repository.with_config(TransportConfig {
        timeout,
        ..TransportConfig::default()
    }))
}

fn load_store(path: &Path) -> anyhow::Result<Store> {
    let format = rdf_format_from_path(path)?;
    let file = File::open(path).with_context(|| format!("Unable to open {}", path.display()))?;
    let store = Store::new()?;
    store
        .load_from_reader(format, BufReader::new(file))
        .with_context(|| format!("Unable to load {}", path.display()))?;
    info!(path = %path.display(), triples = store.len()?, "Loaded data");
    Ok(store)
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    };
    RdfFormat::from_extension(ext).with_context(|| {
        format!("Not able to guess the file format from file name extension '{ext}'")
    })
}

fn write_json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Writes the queries that a search would issue, each preceded by a comment.
fn explain(request: &SearchRequest) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match build_count(request) {
        CountPlan::Known(total) => writeln!(stdout, "# count: {total} (not queried)\n")?,
        CountPlan::Query(query) => writeln!(stdout, "# count\n{query}\n")?,
    }
    if let Some(id) = &request.id {
        let query = build_entity_construct(request, std::slice::from_ref(id))?;
        writeln!(stdout, "# entity\n{query}\n")?;
    } else if request.page.rows > 0 {
        writeln!(stdout, "# ids\n{}\n", build_id_page(request)?)?;
    }
    for facet in &request.facets {
        let query = build_facet_aggregate(request, facet);
        writeln!(stdout, "# facet {}\n{query}\n", facet.name)?;
    }
    Ok(())
}
