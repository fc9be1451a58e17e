use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stencil::{
    DataPayload, FilesystemTemplateStore, GenerationError, GenerationRequest, StencilConfig, TemplateKind,
    TemplateRecord, TemplateService,
};

/// Generate PDFs from placeholder templates and fillable PDF forms.
#[derive(Parser, Debug)]
#[command(name = "stencil", version, about)]
struct Cli {
    /// JSON config file; command line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the variables, loops and sample data a template needs, as JSON.
    Analyze {
        template: PathBuf,
        /// Template kind (markup or form-pdf); inferred from the extension when omitted.
        #[arg(long)]
        kind: Option<TemplateKind>,
    },
    /// Fill a template with JSON data and write the PDF.
    Generate {
        template: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
        /// Protect the output with this password (printing only).
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        kind: Option<TemplateKind>,
        /// Fail on malformed loops and scalar loop values.
        #[arg(long)]
        strict: bool,
    },
}

/// Serves a single template file in place: the store is rooted at its
/// directory and the record points at its file name.
fn open_template(
    path: &Path,
    kind: Option<TemplateKind>,
    config: StencilConfig,
) -> Result<(TemplateService, TemplateRecord), GenerationError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| GenerationError::SourceUnavailable(format!("not a file: {}", path.display())))?;
    let kind = match kind {
        Some(kind) => kind,
        None => {
            let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
            TemplateKind::from_extension(extension)?
        }
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let service = TemplateService::with_store(Arc::new(FilesystemTemplateStore::new(directory)), config);
    Ok((service, TemplateRecord::new(file_name, kind, file_name)))
}

#[tokio::main]
async fn main() -> Result<(), GenerationError> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StencilConfig::from_file(path)?,
        None => StencilConfig::default(),
    };

    match cli.command {
        Command::Analyze { template, kind } => {
            let (service, record) = open_template(&template, kind, config)?;
            let analysis = service.analyze(&record)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::Generate { template, data, output, password, kind, strict } => {
            let config = if strict { config.with_strict(true) } else { config };
            let (service, record) = open_template(&template, kind, config)?;

            log::info!("Loading data from {}", data.display());
            let payload = DataPayload::from_json_str(&std::fs::read_to_string(&data)?)?;
            let mut request = GenerationRequest::new(record, payload);
            if let Some(password) = password {
                request = request.with_password(password);
            }

            let document = service.generate_with_timeout(request).await?;
            for diagnostic in &document.diagnostics {
                eprintln!("warning: {}", diagnostic);
            }
            document.write_to(&output)?;
            println!("Successfully generated {}", output.display());
        }
    }
    Ok(())
}
