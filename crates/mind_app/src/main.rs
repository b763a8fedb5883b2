mod cli;
mod config_file;
mod effects;
mod keyword_engine;
mod logging;
mod render;
mod session;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use mind_core::{AppViewModel, Msg, UploadStatus};
use mind_logging::mind_info;
use mind_worker::{FsCache, WorkerHandle, WorkerServices};

use cli::{Cli, Command};
use effects::EffectRunner;
use keyword_engine::KeywordEngine;
use render::Renderer;
use session::Session;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let config = config_file::load_worker_config(&cli.config);
    let cache = Arc::new(FsCache::new(&cli.cache_dir));
    let services = WorkerServices::new(config, cache);
    let worker = WorkerHandle::spawn(KeywordEngine::new(), services);
    mind_info!("worker started, cache at {:?}", cli.cache_dir);

    let mut session = Session::new(EffectRunner::new(worker), Renderer::new());
    let result = run(&mut session, cli.command);
    session.shutdown();
    result
}

fn run(session: &mut Session, command: Command) -> anyhow::Result<()> {
    let view = session.initialize()?;
    if let Some(err) = view.init_error {
        bail!("initialization failed: {err}");
    }

    match command {
        Command::Index { files } => index(session, &files),
        Command::Search { query, only } => search(session, query, &only),
        Command::Docs => {
            print_documents(&view);
            Ok(())
        }
    }
}

fn index(session: &mut Session, files: &[PathBuf]) -> anyhow::Result<()> {
    for path in files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        session.dispatch(Msg::FileSubmitted {
            filename: document_id(path)?,
            content,
        });
    }

    let view = session.run_until(AppViewModel::uploads_settled)?;
    let failed: Vec<_> = view
        .uploads
        .iter()
        .filter(|u| u.status == UploadStatus::Error)
        .collect();
    println!(
        "indexed {} of {} files ({} chunks total)",
        view.uploads.len() - failed.len(),
        view.uploads.len(),
        view.chunk_count
    );
    for upload in &failed {
        eprintln!(
            "{}: {}",
            upload.filename,
            upload.error.as_deref().unwrap_or("unknown error")
        );
    }
    if !failed.is_empty() {
        bail!("{} file(s) failed to index", failed.len());
    }
    Ok(())
}

fn search(session: &mut Session, query: String, only: &[String]) -> anyhow::Result<()> {
    let known = session.view().documents;
    for id in only {
        if !known.iter().any(|doc| &doc.id == id) {
            bail!("unknown document {id:?}; run `docs` to list indexed documents");
        }
        session.dispatch(Msg::DocumentFilterToggled(id.clone()));
    }
    session.dispatch(Msg::QueryChanged(query));
    if !session.view().can_search {
        bail!("query is empty");
    }
    session.dispatch(Msg::SearchSubmitted);

    let view = session.run_until(|view| !view.searching)?;
    if let Some(err) = view.last_error.as_deref().filter(|_| view.results.is_empty()) {
        bail!("search failed: {err}");
    }
    if view.results.is_empty() {
        println!("no matches");
    }
    for (rank, hit) in view.results.iter().enumerate() {
        println!("{}. {} (score {:.4})", rank + 1, hit.doc_id, hit.score);
        for line in hit.content.lines() {
            println!("   {line}");
        }
    }
    Ok(())
}

fn print_documents(view: &AppViewModel) {
    if view.documents.is_empty() {
        println!("no documents indexed");
    }
    for doc in &view.documents {
        println!("{}", doc.id);
    }
}

fn document_id(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("{} has no usable file name", path.display()))
}
