mod config;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use stackgen_components::{assemble, registry};
use stackgen_core::{FileRenderer, ResourceKind, Template};
use stackgen_provider_aws::{describe_schema, schema_registry};

use config::{DEFAULT_CONFIG_FILE, StackConfig};

#[derive(Parser)]
#[command(name = "stackgen")]
#[command(about = "Generate CloudFormation templates from stack components", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the CloudFormation template
    Generate {
        /// Path to the stack configuration
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Write the template to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Check the output file is up to date (don't modify)
        #[arg(long, requires = "output")]
        check: bool,

        /// Show diff against the existing output file
        #[arg(long, requires = "output")]
        diff: bool,
    },
    /// Build the template and validate every resource without writing it
    Validate {
        /// Path to the stack configuration
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// List available components
    Components,
    /// Describe the resource schemas templates are validated against
    Schemas,
}

fn log_level(verbose: u8) -> &'static str {
    if verbose > 0 { "debug" } else { "warn" }
}

fn init_logger(verbose: u8) {
    let level = log_level(verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            format,
            output,
            check,
            diff,
        } => run_generate(&config, format, output.as_deref(), check, diff),
        Commands::Validate { config } => run_validate(&config),
        Commands::Components => run_components(),
        Commands::Schemas => run_schemas(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Load the configuration and build a schema-checked template
fn build_template(config_path: &Path) -> Result<Template, String> {
    let config = StackConfig::load(config_path).map_err(|e| e.to_string())?;
    let renderer = FileRenderer::new(config.template_dir.clone());

    let template = assemble(&config.context, &renderer, &config.components)
        .map_err(|e| format!("Build error: {}", e))?;

    if let Err(errors) = stackgen_provider_aws::validate_template(&template) {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(format!("Validation failed:\n{}", messages.join("\n")));
    }
    Ok(template)
}

fn render(template: &Template, format: Format) -> Result<String, String> {
    let rendered = match format {
        Format::Json => template.to_json_string(),
        Format::Yaml => template.to_yaml_string(),
    };
    rendered.map_err(|e| e.to_string())
}

fn run_generate(
    config_path: &Path,
    format: Format,
    output: Option<&Path>,
    check: bool,
    show_diff: bool,
) -> Result<(), String> {
    let template = build_template(config_path)?;
    let rendered = render(&template, format)?;

    let Some(output) = output else {
        print!("{}", rendered);
        return Ok(());
    };

    let existing = match fs::read_to_string(output) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(format!("Failed to read {}: {}", output.display(), e)),
    };

    if existing == rendered {
        println!("{} {}", "Up to date:".green(), output.display());
        return Ok(());
    }

    if show_diff {
        print_diff(output, &existing, &rendered);
    }

    if check {
        return Err(format!("{} is out of date", output.display()));
    }

    fs::write(output, &rendered)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
    println!(
        "{} {} ({} resources)",
        "Generated:".green().bold(),
        output.display(),
        template.len()
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());
    let template = build_template(config_path)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", template.len())
            .green()
            .bold()
    );
    for resource in template.resources() {
        println!("  • {}", resource.id);
    }
    Ok(())
}

fn run_components() -> Result<(), String> {
    for component in registry() {
        println!(
            "{} {}",
            format!("{:<12}", component.name()).bold(),
            component.description()
        );
    }
    Ok(())
}

fn run_schemas() -> Result<(), String> {
    let registry = schema_registry();
    for kind in ResourceKind::all() {
        if let Some(schema) = registry.get(kind) {
            println!("{}", describe_schema(schema));
        }
    }
    Ok(())
}

fn print_diff(file: &Path, original: &str, generated: &str) {
    println!("\n{} {}:", "Diff for".cyan().bold(), file.display());

    let diff = TextDiff::from_lines(original, generated);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}
