mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{AppClient, HttpImageUploader, ImageFile, StoreError};
use command_center::{
    CommandCenter, CreationDialog, EditorError, EditorEvent, ImageField, NotificationLevel,
    SaveOutcome, Stores,
};
use serde_json::Value;
use shared::{
    domain::{CatalogId, CatalogPurpose, ProjectId},
    protocol::{CatalogRecord, FunnelProjectSummary, SalesPage},
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "command_center", about = "Edit catalog showcase settings")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    app_id: Option<String>,
    #[arg(long)]
    access_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every catalog in backend order.
    List,
    /// Print the resolved settings and raw fields of a catalog.
    Show {
        #[arg(long)]
        id: Option<String>,
    },
    /// Set one or more fields (`key=value`, value parsed as JSON when it can be) and save.
    Set {
        #[arg(long)]
        id: Option<String>,
        #[arg(required = true, value_parser = parse_assignment)]
        fields: Vec<(String, Value)>,
    },
    /// Show or hide a funnel project in the catalog and save.
    ToggleProject {
        #[arg(long)]
        id: Option<String>,
        project: String,
        #[arg(long)]
        hide: bool,
    },
    /// Copy a saved catalog under a new name.
    Duplicate {
        #[arg(long)]
        id: Option<String>,
    },
    /// Create a new catalog.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_purpose)]
        purpose: Option<CatalogPurpose>,
    },
    /// Upload an image into the hero or logo slot and save.
    Upload {
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_enum)]
        field: UploadTarget,
        path: PathBuf,
    },
    /// Print the public URL of a saved catalog.
    Link {
        #[arg(long)]
        id: Option<String>,
    },
    /// List lesson videos usable as hero CTA targets.
    Targets,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UploadTarget {
    Hero,
    Logo,
}

impl From<UploadTarget> for ImageField {
    fn from(target: UploadTarget) -> Self {
        match target {
            UploadTarget::Hero => ImageField::HeroImage,
            UploadTarget::Logo => ImageField::Logo,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_purpose(raw: &str) -> Result<CatalogPurpose, String> {
    CatalogPurpose::parse(raw)
        .ok_or_else(|| format!("unknown purpose '{raw}' (general, university, campaign_specific)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(app_id) = args.app_id {
        settings.app_id = app_id;
    }
    if let Some(token) = args.access_token {
        settings.access_token = Some(token);
    }

    let client = AppClient::connect(settings.app_config()?).map_err(|err| {
        let err = anyhow::Error::from(err);
        if let Some(hint) = auth_hint(&err) {
            eprintln!("{hint}");
        }
        err
    })?;
    info!(app_id = client.app_id(), "connected");
    let stores = Stores {
        catalogs: Arc::new(client.entity::<CatalogRecord>()),
        projects: Arc::new(client.entity::<FunnelProjectSummary>()),
        sales_pages: Arc::new(client.entity::<SalesPage>()),
    };
    let editor = CommandCenter::new(stores, settings.defaults.clone(), settings.public_links()?);
    let mut events = editor.subscribe_events();

    let result = run(&editor, &client, args.command).await;
    print_notifications(&mut events);
    if let Some(hint) = result.as_ref().err().and_then(auth_hint) {
        eprintln!("{hint}");
    }
    result
}

async fn run(editor: &CommandCenter, client: &AppClient, command: Command) -> Result<()> {
    editor.initialize().await?;

    match command {
        Command::List => {
            let active = editor.draft().await.and_then(|draft| draft.id.clone());
            for catalog in editor.catalogs().await {
                let marker = if catalog.id.is_some() && catalog.id == active { "*" } else { " " };
                let id = catalog.id.as_ref().map(CatalogId::as_str).unwrap_or("-");
                let purpose = catalog.purpose().unwrap_or_default();
                println!(
                    "{marker} {id}\t{purpose}\t{}\t{}",
                    updated_column(&catalog),
                    catalog.label()
                );
            }
        }
        Command::Show { id } => {
            select(editor, id).await?;
            let resolved = editor
                .resolved()
                .await
                .ok_or_else(|| anyhow!("no catalog is active"))?;
            println!("{resolved:#?}");
            let projects = editor.projects().await;
            let visible: Vec<_> = resolved
                .visible_projects(&projects)
                .into_iter()
                .map(|project| project.name.as_str())
                .collect();
            println!("visible projects: {}", visible.join(", "));
            if let Some(draft) = editor.draft().await {
                println!("updated: {}", updated_column(&draft));
                println!("{}", serde_json::to_string_pretty(draft.as_ref())?);
            }
        }
        Command::Set { id, fields } => {
            select(editor, id).await?;
            for (key, value) in fields {
                editor
                    .set_field(&key, value)
                    .await
                    .with_context(|| format!("cannot set '{key}'"))?;
            }
            report_save(editor.save().await?);
        }
        Command::ToggleProject { id, project, hide } => {
            select(editor, id).await?;
            editor
                .toggle_visible_project(&ProjectId::new(project), !hide)
                .await?;
            report_save(editor.save().await?);
        }
        Command::Duplicate { id } => {
            select(editor, id).await?;
            let created = editor.duplicate().await?;
            print_created(created.id.as_ref(), &created.label());
        }
        Command::Create { name, purpose } => {
            let mut dialog = CreationDialog::new(name, purpose);
            let created = editor.create_catalog(&mut dialog).await?;
            print_created(created.id.as_ref(), &created.label());
        }
        Command::Upload { id, field, path } => {
            select(editor, id).await?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload")
                .to_string();
            let image = ImageFile {
                filename,
                mime_type: mime_guess::from_path(&path)
                    .first()
                    .map(|mime| mime.essence_str().to_string()),
                bytes,
            };
            let uploader = HttpImageUploader::new(client.clone());
            let field = ImageField::from(field);
            let draft = editor.apply_upload(field, &uploader, image).await?;
            if let Some(url) = draft.field(field.key()).and_then(Value::as_str) {
                println!("{} = {url}", field.key());
            }
            report_save(editor.save().await?);
        }
        Command::Link { id } => {
            select(editor, id).await?;
            match editor.public_url().await {
                Some(url) => println!("{url}"),
                None => println!("catalog is not saved yet"),
            }
        }
        Command::Targets => {
            for group in editor.cta_targets().await {
                println!("{}", group.page_name);
                for target in group.targets {
                    println!("  {}\t{}", target.label, target.url);
                }
            }
        }
    }
    Ok(())
}

async fn select(editor: &CommandCenter, id: Option<String>) -> Result<()> {
    if let Some(id) = id {
        editor.select(&CatalogId::new(id)).await?;
    }
    Ok(())
}

fn report_save(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Updated { catalog_id, .. } => info!(%catalog_id, "catalog updated"),
        SaveOutcome::Created { record } => print_created(record.id.as_ref(), &record.label()),
    }
}

fn print_created(id: Option<&CatalogId>, label: &str) {
    match id {
        Some(id) => println!("{id}\t{label}"),
        None => println!("-\t{label}"),
    }
}

fn updated_column(record: &CatalogRecord) -> String {
    record
        .updated_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

const AUTH_HINT: &str =
    "hint: check access_token in the config file or APP__ACCESS_TOKEN";

fn auth_hint(err: &anyhow::Error) -> Option<&'static str> {
    let needs_reauth = err.chain().any(|cause| {
        if let Some(store) = cause.downcast_ref::<StoreError>() {
            return store.requires_reauth();
        }
        matches!(
            cause.downcast_ref::<EditorError>(),
            Some(EditorError::Store(store)) if store.requires_reauth()
        )
    });
    needs_reauth.then_some(AUTH_HINT)
}

fn print_notifications(events: &mut broadcast::Receiver<EditorEvent>) {
    while let Ok(event) = events.try_recv() {
        if let EditorEvent::Notification(notification) = event {
            match notification.level {
                NotificationLevel::Success => println!("{}", notification.message),
                NotificationLevel::Error => eprintln!("error: {}", notification.message),
            }
        }
    }
}
