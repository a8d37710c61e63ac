//! Delivery Time Prediction CLI
//!
//! Collects delivery-order attributes and predicts the delivery time with a
//! pre-trained regression model.

use clap::{Parser, Subcommand};
use eta::{Config, Result};

#[derive(Parser)]
#[command(name = "eta")]
#[command(about = "Delivery time prediction from order attributes", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the delivery time for one order
    Predict {
        /// Field value as name=value (repeatable)
        #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
        values: Vec<String>,
        /// JSON file with an object of field values
        #[arg(long)]
        input: Option<String>,
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Fill in the prediction form interactively
    Form,
    /// List the model features, their kinds and valid values
    Schema {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Write a default config file
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information and schema compatibility
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Predict {
            values,
            input,
            format,
        } => commands::predict(&config, values, input, format),
        Commands::Form => commands::form(&config),
        Commands::Schema { format } => commands::schema(&config, format),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = if e.is_request_error() { 2 } else { 1 };
        std::process::exit(code);
    }
}

mod commands {
    use super::*;
    use eta::data::ReferenceDataset;
    use eta::features::{FeatureKind, RawValues, SchemaRegistry, DELIVERY_FEATURES};
    use eta::model::{InferenceBackend, ModelArtifact};
    use eta::predict::{format_prediction, run_form, Predictor};

    /// Startup state shared read-only by every request
    struct Runtime {
        registry: SchemaRegistry,
        model: ModelArtifact<InferenceBackend>,
    }

    fn load_registry(config: &Config) -> Result<SchemaRegistry> {
        let dataset = ReferenceDataset::from_path(&config.data.dataset_path)?;
        SchemaRegistry::from_dataset(
            DELIVERY_FEATURES,
            &dataset,
            Some(config.data.label_column.as_str()),
        )
    }

    fn load_runtime(config: &Config) -> Result<Runtime> {
        let registry = load_registry(config)?;
        let model = ModelArtifact::<InferenceBackend>::load(
            &config.model.artifact_dir,
            Default::default(),
        )?;
        model.check_compatibility(&registry)?;
        Ok(Runtime { registry, model })
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Place the reference dataset at {}", config.data.dataset_path);
        println!(
            "  2. Place the model artifact (manifest.json, weights.mpk) in {}/",
            config.model.artifact_dir
        );
        println!("  3. Run 'eta schema' to list the expected fields");
        println!("  4. Run 'eta form' or 'eta predict --set age=30 ...' to predict");

        Ok(())
    }

    pub fn predict(
        config: &Config,
        values: Vec<String>,
        input: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let runtime = load_runtime(config)?;
        let predictor = Predictor::new(&runtime.registry, &runtime.model);

        let mut raw = match input {
            Some(path) => RawValues::from_json_file(&path)?,
            None => RawValues::new(),
        };
        // --set overrides values from the input file
        for assignment in &values {
            let (name, value) = RawValues::parse_assignment(assignment)?;
            raw.insert(name, value);
        }

        let request = predictor.build(&raw)?;
        let prediction = predictor.predict_request(&request)?;

        match format {
            OutputFormat::Text => {
                for violation in request.bound_violations() {
                    println!("Warning: {}", violation);
                }
                println!("{}", format_prediction(&prediction));
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "minutes": prediction.minutes,
                    "warnings": request
                        .bound_violations()
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }

        Ok(())
    }

    pub fn form(config: &Config) -> Result<()> {
        let runtime = load_runtime(config)?;
        let predictor = Predictor::new(&runtime.registry, &runtime.model);

        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let summary = run_form(&predictor, stdin.lock(), stdout.lock())?;

        log::info!(
            "Form closed: {} predictions, {} rejected submissions",
            summary.predicted,
            summary.rejected
        );
        Ok(())
    }

    pub fn schema(config: &Config, format: OutputFormat) -> Result<()> {
        let registry = load_registry(config)?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(registry.list_features())?);
            }
            OutputFormat::Text => {
                println!("Model Features ({})", registry.len());
                println!("───────────────────────────────");
                for (i, spec) in registry.list_features().iter().enumerate() {
                    let detail = match &spec.kind {
                        FeatureKind::Numeric { bounds: Some(b) } => format!("range {}", b),
                        FeatureKind::Numeric { bounds: None } => "any number".to_string(),
                        FeatureKind::Categorical { domain } | FeatureKind::BooleanLike { domain } => {
                            domain.join(", ")
                        }
                    };
                    println!(
                        "  {:>2}. {:<22} {:<13} {}",
                        i + 1,
                        spec.name,
                        spec.kind.label(),
                        detail
                    );
                }
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let registry = load_registry(config)?;
        let model = ModelArtifact::<InferenceBackend>::load(
            &config.model.artifact_dir,
            Default::default(),
        )?;
        let manifest = model.manifest();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Name:     {}", manifest.name);
        println!("  Target:   {}", manifest.target);
        println!("  Columns:  {}", manifest.columns.columns().len());
        println!("  Inputs:   {} (encoded)", manifest.regressor.input_dim);
        println!("  Hidden:   {:?}", manifest.regressor.hidden_dims);
        println!();
        for column in manifest.columns.columns() {
            println!(
                "  {:<22} {}",
                column.name,
                serde_json::to_string(&column.encoding)?
            );
        }

        println!();
        match model.check_compatibility(&registry) {
            Ok(warnings) if warnings.is_empty() => println!("Schema: compatible"),
            Ok(warnings) => {
                println!("Schema: compatible with {} warnings", warnings.len());
                for w in warnings {
                    println!("  - {}", w);
                }
            }
            Err(e) => println!("Schema: INCOMPATIBLE ({})", e),
        }

        Ok(())
    }
}
