use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use catalog_admin::api::SubmitOutcome;
use catalog_admin::auth;
use catalog_admin::codec::IdentifierCodec;
use catalog_admin::config::{self, Config};
use catalog_admin::model::{Category, Notification, PendingFile, Resource, ResourceId, ResourceKind, Slider};
use catalog_admin::{ConsoleContext, EditPhase, ResourceEditController, ResourceListController};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch and print a collection
    List { kind: ResourceKind },
    /// Fetch and print one record by its edit token
    Show { kind: ResourceKind, token: String },
    /// Edit one record and submit the update
    Edit {
        kind: ResourceKind,
        token: String,
        /// Field assignment, e.g. `--set category_status=Inactive`
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// New image to upload with the update
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Turn a numeric id into an edit token
    Encode { id: u64 },
    /// Turn an edit token back into its numeric id
    Decode { token: String },
    /// Print a sample configuration
    ConfigExample,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ConfigExample = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    match args.command {
        Command::Encode { id } => {
            let id = ResourceId::new(id).ok_or_else(|| anyhow!("id must be positive"))?;
            println!("{}", IdentifierCodec::new(&cfg.codec.secret).encode(id));
            Ok(())
        }
        Command::Decode { token } => {
            let id = IdentifierCodec::new(&cfg.codec.secret).decode(&token)?;
            println!("{id}");
            Ok(())
        }
        Command::List { kind } => {
            let ctx = context(&cfg)?;
            match kind {
                ResourceKind::Category => list::<Category>(ctx).await,
                ResourceKind::Notification => list::<Notification>(ctx).await,
                ResourceKind::Slider => list::<Slider>(ctx).await,
            }
        }
        Command::Show { kind, token } => {
            let ctx = context(&cfg)?;
            match kind {
                ResourceKind::Category => show::<Category>(ctx, token).await,
                ResourceKind::Notification => show::<Notification>(ctx, token).await,
                ResourceKind::Slider => show::<Slider>(ctx, token).await,
            }
        }
        Command::Edit {
            kind,
            token,
            set,
            image,
        } => {
            let ctx = context(&cfg)?;
            let file = match image {
                Some(path) => Some(PendingFile::from_path(&path).await?),
                None => None,
            };
            match kind {
                ResourceKind::Category => edit::<Category>(ctx, token, set, file).await,
                ResourceKind::Notification => edit::<Notification>(ctx, token, set, file).await,
                ResourceKind::Slider => edit::<Slider>(ctx, token, set, file).await,
            }
        }
        Command::ConfigExample => Ok(()),
    }
}

fn context(cfg: &Config) -> Result<ConsoleContext> {
    let token = auth::load_token(&cfg.api.token_file);
    ConsoleContext::headless(cfg, token).context("failed to build catalog client")
}

async fn list<R: Resource>(ctx: ConsoleContext) -> Result<()> {
    let controller = ResourceListController::<R>::new(ctx);
    controller.activate().await;
    if let Some(err) = controller.error() {
        bail!(err);
    }
    for row in controller.rows() {
        let token = match &row.edit {
            Some(catalog_admin::routes::Route::Edit(_, token)) => token.as_str(),
            _ => "-",
        };
        let fields: Vec<String> = row
            .record
            .text_fields()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "{:>4}  {:<20}  {}  {}",
            row.serial,
            token,
            fields.join("  "),
            row.thumbnail.display_url()
        );
    }
    Ok(())
}

async fn mounted<R: Resource>(ctx: ConsoleContext, token: String) -> Result<ResourceEditController<R>> {
    let controller = ResourceEditController::<R>::new(ctx, token);
    controller.mount().await;
    if controller.phase() != EditPhase::Ready {
        return Err(match controller.error() {
            Some(err) => anyhow!(err),
            None => anyhow!("{} record is not editable", R::KIND),
        });
    }
    Ok(controller)
}

fn print_form<R: Resource>(controller: &ResourceEditController<R>) {
    if let Some(id) = controller.id() {
        println!("id: {id}");
    }
    if let Some(form) = controller.form() {
        for (name, value) in form.text_fields() {
            println!("{name}: {value}");
        }
    }
    if let Some(image) = controller.image() {
        println!("{}: {}", R::KIND.image_field(), image.display_url());
    }
}

async fn show<R: Resource>(ctx: ConsoleContext, token: String) -> Result<()> {
    let controller = mounted::<R>(ctx, token).await?;
    print_form(&controller);
    Ok(())
}

async fn edit<R: Resource>(
    ctx: ConsoleContext,
    token: String,
    set: Vec<(String, String)>,
    file: Option<PendingFile>,
) -> Result<()> {
    let controller = mounted::<R>(ctx, token).await?;
    for (field, value) in &set {
        controller
            .set_field(field, value)
            .with_context(|| format!("cannot set {field}"))?;
    }
    if let Some(file) = file {
        controller.select_file(file)?;
    }

    match controller.submit().await {
        Some(SubmitOutcome::Success(msg)) => {
            info!(kind = R::KIND.as_str(), "update accepted");
            println!("{msg}");
            Ok(())
        }
        Some(SubmitOutcome::BusinessConflict(msg)) => bail!("update rejected: {msg}"),
        Some(SubmitOutcome::TransportFailure(err)) => Err(anyhow!(err).context("update failed")),
        None => bail!("update was not submitted"),
    }
}
