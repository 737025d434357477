use whence::diagnostic::DiagnosticRenderer;
use whence::{evaluate_expression, to_postfix, tokenize};
use whence::{ExpressionError, KeyValueContext, Token};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::{Path, PathBuf};
use std::io::{self, Write};
use owo_colors::OwoColorize;

#[derive(Parser, Debug)]
#[command(name = "whence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate when-clause boolean expressions against key/value state", long_about = None)]
struct Args {
    #[arg(value_name = "EXPRESSION")]
    expression: Option<String>,

    #[arg(short = 's', long = "state", value_name = "JSON", conflicts_with = "state_file")]
    state: Option<String>,

    #[arg(short = 'f', long = "state-file", value_name = "FILE")]
    state_file: Option<PathBuf>,

    #[arg(long = "tokens")]
    tokens: bool,

    #[arg(long = "postfix")]
    postfix: bool,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorChoice,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!("Invalid color choice: {}. Must be 'auto', 'always', or 'never'", s)),
        }
    }
}

struct AppConfig {
    color_enabled: bool,
    verbose: bool,
    show_tokens: bool,
    show_postfix: bool,
}

impl AppConfig {
    fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            show_tokens: args.tokens,
            show_postfix: args.postfix,
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    verbose_log(&config, "Starting whence");

    let context = match load_state(&args, &config) {
        Ok(context) => context,
        Err(e) => {
            error_message(&config, &e);
            std::process::exit(2);
        }
    };

    match &args.expression {
        Some(expression) => {
            let result = evaluate_one(expression, &context, &config);
            std::process::exit(if result { 0 } else { 1 });
        }
        None => run_interactive_mode(&context, &config),
    }
}

/// Builds the evaluation context from `--state` / `--state-file`, or an
/// empty one when neither is given (every identifier then resolves to
/// the falsy sentinel).
fn load_state(args: &Args, config: &AppConfig) -> Result<KeyValueContext, String> {
    let json_str = if let Some(file) = &args.state_file {
        verbose_log(config, &format!("Reading state from file: {}", file.display()));
        read_file(file)?
    } else if let Some(state) = &args.state {
        verbose_log(config, "Reading state from command-line argument");
        state.clone()
    } else {
        verbose_log(config, "No state given, starting empty");
        return Ok(KeyValueContext::new());
    };

    KeyValueContext::from_json(&json_str).map_err(|e| format!("Invalid state: {}", e))
}

/// Runs the pipeline on one expression, printing dumps and the result.
/// Returns the boolean outcome; any error renders and exits with code 2.
fn evaluate_one(expression: &str, context: &KeyValueContext, config: &AppConfig) -> bool {
    verbose_log(config, &format!("Evaluating: {}", expression));

    if config.show_tokens || config.show_postfix {
        match dump_stages(expression, config) {
            Ok(()) => {}
            Err(err) => {
                report_error(expression, &err, config);
                std::process::exit(2);
            }
        }
    }

    match evaluate_expression(expression, context) {
        Ok(result) => {
            println!("{}", result);
            result
        }
        Err(err) => {
            report_error(expression, &err, config);
            std::process::exit(2);
        }
    }
}

/// `--tokens` / `--postfix` output, written before the result so a
/// failing stage still shows the stages it passed.
fn dump_stages(
    expression: &str,
    config: &AppConfig,
) -> Result<(), ExpressionError<whence::ContextError>> {
    let tokens = tokenize(expression)?;
    if config.show_tokens {
        println!("tokens:  {}", render_tokens(&tokens));
    }
    if config.show_postfix {
        let postfix = to_postfix(tokens)?;
        println!("postfix: {}", render_tokens(&postfix));
    }
    Ok(())
}

fn render_tokens(tokens: &[Token]) -> String {
    let parts: Vec<String> = tokens
        .iter()
        .map(|t| format!("{:?}({})", t.kind, t))
        .collect();
    parts.join(" ")
}

fn run_interactive_mode(context: &KeyValueContext, config: &AppConfig) {
    if !config.verbose {
        println!("whence interactive evaluator");
        println!("One expression per line. Exit with Ctrl+D or type 'exit'.");
        println!();
    } else {
        verbose_log(config, "Entering interactive mode");
    }

    loop {
        print!("whence> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let expression = line.trim();
                if expression.is_empty() {
                    continue;
                }
                if expression == "exit" || expression == "quit" {
                    break;
                }

                if config.show_tokens || config.show_postfix {
                    if let Err(err) = dump_stages(expression, config) {
                        report_error(expression, &err, config);
                        continue;
                    }
                }

                match evaluate_expression(expression, context) {
                    Ok(result) => println!("{}", result),
                    Err(err) => report_error(expression, &err, config),
                }
            }
            Err(e) => {
                error_message(config, &format!("Error reading input: {}", e));
                break;
            }
        }
    }
}

/// Pipeline errors render as caret diagnostics; context errors carry no
/// span and print as plain messages.
fn report_error(
    expression: &str,
    err: &ExpressionError<whence::ContextError>,
    config: &AppConfig,
) {
    match err.to_diagnostic() {
        Some(diagnostic) => {
            let renderer = DiagnosticRenderer::new(expression, config.color_enabled);
            eprint!("{}", renderer.render(&diagnostic));
        }
        None => error_message(config, &err.to_string()),
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[whence:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
