use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cfgflow")]
#[command(about = "cfgflow - instruction-level dataflow analysis over textual IR")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging on stderr. RUST_LOG takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one analysis and print its edge facts
    Analyze {
        input: PathBuf,

        #[arg(short, long, value_enum)]
        analysis: Analysis,

        #[arg(short, long)]
        function: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        #[arg(long, value_enum, default_value = "fifo")]
        order: Order,

        #[arg(long)]
        stats: bool,

        #[arg(long)]
        annotate: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Static opcode counts
    Count {
        input: PathBuf,

        #[arg(short, long)]
        function: Option<String>,
    },

    /// Parse and check a file, or every .cfg file under a directory
    Validate { input: PathBuf },

    /// Parse and print the IR back
    Print { input: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Analysis {
    Liveness,
    Pointer,
    Reaching,
}

impl From<Analysis> for cfgflow_core::AnalysisKind {
    fn from(analysis: Analysis) -> Self {
        match analysis {
            Analysis::Liveness => cfgflow_core::AnalysisKind::Liveness,
            Analysis::Pointer => cfgflow_core::AnalysisKind::PointsTo,
            Analysis::Reaching => cfgflow_core::AnalysisKind::ReachingDefinitions,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for cfgflow_emit::OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => cfgflow_emit::OutputFormat::Text,
            Format::Json => cfgflow_emit::OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Order {
    Fifo,
    Lifo,
}

impl From<Order> for cfgflow_core::analysis::WorklistOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Fifo => cfgflow_core::analysis::WorklistOrder::Fifo,
            Order::Lifo => cfgflow_core::analysis::WorklistOrder::Lifo,
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Analyze {
            input,
            analysis,
            function,
            format,
            order,
            stats,
            annotate,
            output,
        } => cmd_analyze(
            input,
            analysis,
            function,
            format,
            order,
            stats,
            annotate,
            output,
            !cli.no_color,
        ),
        Commands::Count { input, function } => cmd_count(input, function),
        Commands::Validate { input } => cmd_validate(input, cli.verbose),
        Commands::Print { input } => cmd_print(input),
    }
}

fn load(input: &Path) -> Result<cfgflow_core::Module> {
    cfgflow_parser::parse_file(input).with_context(|| format!("failed to load {}", input.display()))
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    input: PathBuf,
    analysis: Analysis,
    function: Option<String>,
    format: Format,
    order: Order,
    stats: bool,
    annotate: bool,
    output: Option<PathBuf>,
    colors: bool,
) -> Result<()> {
    use cfgflow_core::analysis::{AnalysisKind, PassManager, SolverConfig};
    use cfgflow_emit::{ReportConfig, ReportEmitter};
    use std::fs;
    use tracing::debug;

    let module = load(&input)?;
    let kind: AnalysisKind = analysis.into();

    let mut manager = PassManager::new(SolverConfig {
        order: order.into(),
        record_history: false,
    });
    manager.register(kind);
    if stats {
        manager.enable_statistics();
    }

    let reports = match &function {
        Some(name) => {
            let target = module
                .get_function(name)
                .ok_or_else(|| anyhow!("function @{} not found in {}", name, input.display()))?;
            vec![manager.run_on_function(kind, target)?.clone()]
        }
        None => manager.run_on_module(&module)?,
    };

    for stat in manager.statistics() {
        debug!(
            analysis = %stat.analysis,
            function = %stat.function,
            micros = stat.duration.as_micros() as u64,
            visits = stat.stats.visits,
            "pass timing"
        );
    }

    let emitter = ReportEmitter::new(ReportConfig {
        format: format.into(),
        use_colors: colors && output.is_none(),
        show_stats: stats,
        show_instructions: annotate,
    });

    // Render fully before writing so a failure never leaves half a report behind.
    let mut rendered = Vec::new();
    emitter.emit_all(&reports, &mut rendered)?;

    match output {
        Some(path) => {
            fs::write(&path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&rendered)?;
        }
    }
    Ok(())
}

fn cmd_count(input: PathBuf, function: Option<String>) -> Result<()> {
    use cfgflow_core::profile::{count_static, count_static_module};

    let module = load(&input)?;
    let counts = match &function {
        Some(name) => {
            let target = module
                .get_function(name)
                .ok_or_else(|| anyhow!("function @{} not found in {}", name, input.display()))?;
            count_static(target)
        }
        None => count_static_module(&module),
    };

    for (opcode, count) in counts {
        println!("{}\t{}", opcode, count);
    }
    Ok(())
}

fn cmd_validate(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;

    if verbose {
        println!("{}", " Validating IR".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let result = if input.is_dir() {
        cfgflow_parser::parse_dir(&input)
    } else {
        cfgflow_parser::parse_file(&input).map(|module| vec![(input.clone(), module)])
    };

    match result {
        Ok(modules) => {
            println!("{}", " VALID".bright_green().bold());
            if verbose {
                for (path, module) in &modules {
                    let instructions: usize = module
                        .functions
                        .values()
                        .map(|f| f.instruction_count())
                        .sum();
                    println!(
                        "   {}: {} function(s), {} instruction(s)",
                        path.display(),
                        module.functions.len(),
                        instructions
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", " INVALID".bright_red().bold());
            println!("\n{}", "Parse Error:".bright_red());
            println!("{}", e);
            Err(anyhow!("Validation failed"))
        }
    }
}

fn cmd_print(input: PathBuf) -> Result<()> {
    let module = load(&input)?;
    print!("{}", cfgflow_core::format::format_module(&module));
    Ok(())
}
