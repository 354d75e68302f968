use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use resultgrid_api::JobClient;
use resultgrid_engine::{ResultSession, json_file_name};
use resultgrid_types::{
    CreateJobPayload, JobStatus, PAGE_SIZE_CHOICES, PriceCheckPayload, SortDirection, StructureCheckPayload, ViewState,
};
use resultgrid_util::{AppConfig, RecentJobs};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cli::{Cli, Command, ExportArgs, ExportFormat, RecentArgs, ShowArgs, SourceArgs, SubmitCommand, ViewArgs};
use crate::render;

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).context("load configuration")?;
    match cli.command {
        Command::Health => health(&config).await,
        Command::Files => files(&config).await,
        Command::Submit(submit) => submit_job(&config, submit).await,
        Command::Status { id } => status(&config, &id).await,
        Command::Show(args) => show(&config, args).await,
        Command::Export(args) => export(&config, args).await,
        Command::Recent(args) => recent(args),
    }
}

fn client(config: &AppConfig) -> Result<JobClient> {
    let client = JobClient::from_env(config.api_base_url.as_deref()).context("configure job service client")?;
    debug!(base_url = client.base_url(), "job service client ready");
    Ok(client)
}

fn recent_jobs() -> RecentJobs {
    match RecentJobs::with_defaults() {
        Ok(store) => store,
        Err(error) => {
            warn!(%error, "recent jobs file unavailable; using an in-memory list");
            RecentJobs::ephemeral()
        }
    }
}

fn remember(id: &str) {
    if let Err(error) = recent_jobs().push(id) {
        warn!(id, %error, "failed to record recent job");
    }
}

async fn health(config: &AppConfig) -> Result<()> {
    let status = client(config)?.health().await.context("health check")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn files(config: &AppConfig) -> Result<()> {
    let listing = client(config)?.list_files().await.context("list output files")?;
    print!("{}", render::files(&listing));
    Ok(())
}

async fn status(config: &AppConfig, id: &str) -> Result<()> {
    let job = client(config)?
        .get_job(id)
        .await
        .with_context(|| format!("fetch status of job {id}"))?;
    println!("{}\t{}", job.id, job.status);
    Ok(())
}

async fn submit_job(config: &AppConfig, command: SubmitCommand) -> Result<()> {
    let (payload, wait) = match command {
        SubmitCommand::Prices(args) => (
            CreateJobPayload::PriceCheck(PriceCheckPayload {
                budget: args.inputs.budget,
                sudecap: args.inputs.sudecap,
                sinapi: args.inputs.sinapi,
                tolerance: args.tolerance,
                compare_descriptions: args.no_compare_descriptions.then_some(false),
                out_dir: args.inputs.out_dir,
            }),
            args.inputs.wait,
        ),
        SubmitCommand::Structure(args) => (
            CreateJobPayload::StructureCheck(StructureCheckPayload {
                budget: args.inputs.budget,
                sudecap: args.inputs.sudecap,
                sinapi: args.inputs.sinapi,
                out_dir: args.inputs.out_dir,
            }),
            args.inputs.wait,
        ),
    };

    let client = client(config)?;
    let job = client
        .create_job(&payload)
        .await
        .with_context(|| format!("submit {} job", payload.op()))?;
    println!("{}\t{}", job.id, job.status);
    remember(&job.id);

    if wait {
        let (document, _) = wait_with_progress(&client, &job.id, config.poll_interval()).await?;
        let session = ResultSession::new(document, config.tabular.clone());
        if session.has_tabular_data() {
            print!("{}", render::dataset_list(session.datasets(), session.active_index()));
        } else {
            println!("Result has no tabular data.");
        }
        println!("Browse with: resultgrid show --job {}", job.id);
    }
    Ok(())
}

/// Polls until `id` finishes; returns the result and the last status seen.
async fn wait_with_progress(client: &JobClient, id: &str, interval: Duration) -> Result<(Value, JobStatus)> {
    let mut last_status: Option<JobStatus> = None;
    let document = client
        .wait_for_result_with(id, interval, |job| {
            if !job.status.is_terminal() && last_status.as_ref() != Some(&job.status) {
                eprintln!("job {} is {}; waiting...", job.id, job.status);
            }
            last_status = Some(job.status.clone());
        })
        .await
        .with_context(|| format!("fetch result of job {id}"))?;
    Ok((document, last_status.unwrap_or(JobStatus::Finished)))
}

struct LoadedDocument {
    document: Value,
    /// Name used for default JSON export files.
    name: String,
    /// Final status and service URL when the document came from a job.
    job: Option<(JobStatus, String)>,
}

async fn load_document(config: &AppConfig, source: &SourceArgs) -> Result<LoadedDocument> {
    if let Some(id) = source.job.as_deref() {
        remember(id);
        let client = client(config)?;
        let (document, status) = wait_with_progress(&client, id, config.poll_interval()).await?;
        return Ok(LoadedDocument {
            document,
            name: id.to_string(),
            job: Some((status, client.base_url().to_string())),
        });
    }

    let Some(path) = source.file.as_deref() else {
        bail!("either --job or --file is required");
    };
    let content = fs::read_to_string(path).with_context(|| format!("read result file {}", path.display()))?;
    let document = serde_json::from_str(&content).with_context(|| format!("parse result file {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resultado".to_string());
    Ok(LoadedDocument {
        document,
        name: stem,
        job: None,
    })
}

fn build_session(config: &AppConfig, document: Value, view: &ViewArgs, state: ViewState) -> Result<ResultSession> {
    let mut session = ResultSession::new(document, config.tabular.clone()).with_state(state);

    if let Some(name) = view.dataset.as_deref()
        && !session.select_dataset_by_name(name)
    {
        let available: Vec<&str> = session.datasets().iter().map(|dataset| dataset.name.as_str()).collect();
        bail!("dataset '{name}' not found; available: {}", available.join(", "));
    }
    if let Some(query) = view.query.as_deref() {
        session.set_query(query);
    }
    if let Some(column) = view.sort.as_deref() {
        if !session.columns().iter().any(|known| known == column) {
            warn!(column, "sort column is not displayed; rows without it sort first");
        }
        let direction = if view.desc { SortDirection::Desc } else { SortDirection::Asc };
        session.set_sort(Some(column.to_string()), direction);
    }
    Ok(session)
}

async fn show(config: &AppConfig, args: ShowArgs) -> Result<()> {
    let loaded = load_document(config, &args.source).await?;
    if let (Some(id), Some((status, base_url))) = (args.source.job.as_deref(), loaded.job.as_ref()) {
        println!("{}", render::job_header(id, status, base_url));
    }
    let discovery = &config.tabular.discovery;
    let summaries = render::summaries(&loaded.document, &discovery.ignored_keys, &discovery.fallback_key);
    let page_size = args.page_size.unwrap_or(config.page_size);
    if !PAGE_SIZE_CHOICES.contains(&page_size) {
        debug!(page_size, choices = ?PAGE_SIZE_CHOICES, "non-standard page size");
    }
    let mut session = build_session(config, loaded.document, &args.view, ViewState::with_page_size_default(page_size))?;
    session.set_page(args.page);

    if !session.has_tabular_data() {
        println!("{}", session.export_json()?);
        return Ok(());
    }

    print!("{summaries}");
    print!("{}", render::dataset_list(session.datasets(), session.active_index()));
    println!();
    print!("{}", render::page(&session.current_page(), args.max_width));
    Ok(())
}

async fn export(config: &AppConfig, args: ExportArgs) -> Result<()> {
    let loaded = load_document(config, &args.source).await?;
    let source_name = loaded.name;
    let session = build_session(config, loaded.document, &args.view, ViewState::default())?;

    let (text, default_name) = match args.format {
        ExportFormat::Csv => {
            if !session.has_tabular_data() {
                bail!("result has no tabular data; use --format json");
            }
            (session.export_csv().context("render CSV export")?, session.csv_file_name())
        }
        ExportFormat::Json => (session.export_json().context("render JSON export")?, json_file_name(&source_name)),
    };

    if args.clipboard {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text))
            .context("copy export to clipboard")?;
        eprintln!("Copied to clipboard.");
        return Ok(());
    }

    let destination = args.output.unwrap_or_else(|| PathBuf::from(default_name));
    write_output(&destination, &text)
}

fn write_output(destination: &Path, text: &str) -> Result<()> {
    if destination == Path::new("-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes()).context("write export to stdout")?;
        return stdout.flush().context("flush stdout");
    }
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(destination, text).with_context(|| format!("write export to {}", destination.display()))?;
    eprintln!("Wrote {}", destination.display());
    Ok(())
}

fn recent(args: RecentArgs) -> Result<()> {
    let store = RecentJobs::with_defaults().context("open recent jobs")?;

    if let Some(id) = args.remove.as_deref() {
        if store.remove(id).context("update recent jobs")? {
            println!("Removed {id}.");
        } else {
            println!("{id} is not in the recent list.");
        }
        return Ok(());
    }
    if args.clear {
        store.clear().context("clear recent jobs")?;
        println!("Recent jobs cleared.");
        return Ok(());
    }

    let entries = store.list();
    if entries.is_empty() {
        println!("No recent jobs.");
        return Ok(());
    }
    let header = vec!["id".to_string(), "viewed".to_string()];
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.id.clone(),
                entry.ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();
    print!("{}", render::text_table(&header, &rows, 60));
    Ok(())
}
