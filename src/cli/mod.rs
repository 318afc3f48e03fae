//! CLI argument parsing for docfill.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Docfill: fill HTML templates from XML data, with generated rules for
/// placeholders the data does not cover.
///
/// Placeholders are written as `/*Name*/` in the template:
/// - a tag found in the XML data is substituted directly
/// - any other tag is resolved by a stored rule, generated once from a prompt
#[derive(Parser, Debug)]
#[command(name = "docfill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML config file (default: ./docfill.yaml if present).
    #[arg(long, global = true, env = "DOCFILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the data directory from the config.
    #[arg(long, global = true, env = "DOCFILL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for docfill.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),

    /// Store a template and its XML data file.
    Upload(UploadArgs),

    /// List the placeholders of an uploaded template.
    ///
    /// Each placeholder is classified as static (found in the data) or
    /// dynamic (needs a rule).
    Tags(TagsArgs),

    /// Generate the rule for a placeholder from a prompt.
    ///
    /// Sends the prompt and a sample of the uploaded data to the text
    /// generation service and stores the returned function.
    Generate(GenerateArgs),

    /// Run a stored rule against the uploaded data and print its output.
    TestRule(TestRuleArgs),

    /// Rule management commands.
    Rules(RulesCommand),

    /// Fill the uploaded template.
    Render(RenderArgs),

    /// Convert an HTML file to PDF.
    Pdf(PdfArgs),

    /// Show recent entries of the audit log.
    Events(EventsArgs),
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port).
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Document selection shared by several commands.
#[derive(Parser, Debug)]
pub struct DocumentArg {
    /// Document id (letters, digits, '_' or '-').
    #[arg(short, long, default_value = "default")]
    pub document: String,
}

/// Arguments for the `upload` command.
#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// HTML template file.
    #[arg(long)]
    pub html: PathBuf,

    /// XML data file.
    #[arg(long)]
    pub xml: PathBuf,

    #[command(flatten)]
    pub document: DocumentArg,
}

/// Arguments for the `tags` command.
#[derive(Parser, Debug)]
pub struct TagsArgs {
    #[command(flatten)]
    pub document: DocumentArg,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Placeholder tag to generate the rule for.
    #[arg(short, long)]
    pub tag: String,

    /// How the value should be computed.
    #[arg(long)]
    pub prompt: String,

    /// Number of data entries sent as the sample (default from config).
    #[arg(long)]
    pub example_limit: Option<usize>,

    #[command(flatten)]
    pub document: DocumentArg,
}

/// Arguments for the `test-rule` command.
#[derive(Parser, Debug)]
pub struct TestRuleArgs {
    /// Placeholder tag whose rule should run.
    #[arg(short, long)]
    pub tag: String,

    #[command(flatten)]
    pub document: DocumentArg,
}

/// Rule subcommands.
#[derive(Parser, Debug)]
pub struct RulesCommand {
    #[command(subcommand)]
    pub action: RulesAction,
}

/// Available rule actions.
#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List stored rules.
    List(RulesListArgs),

    /// Delete the rule for a tag.
    Remove(RulesRemoveArgs),
}

/// Arguments for the `rules list` command.
#[derive(Parser, Debug)]
pub struct RulesListArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `rules remove` command.
#[derive(Parser, Debug)]
pub struct RulesRemoveArgs {
    /// Placeholder tag whose rule should be deleted.
    #[arg(short, long)]
    pub tag: String,
}

/// Arguments for the `render` command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub document: DocumentArg,

    /// Write the HTML to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also print how each placeholder was resolved (to stderr).
    #[arg(long)]
    pub report: bool,
}

/// Arguments for the `pdf` command.
#[derive(Parser, Debug)]
pub struct PdfArgs {
    /// HTML file to convert.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the PDF.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `events` command.
#[derive(Parser, Debug)]
pub struct EventsArgs {
    /// Show the last N events (0 shows all).
    #[arg(long, default_value_t = 20)]
    pub tail: usize,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
