//! SheetJoin CLI - join, merge and clean CSV / spreadsheet tables
//!
//! # Main Commands
//!
//! ```bash
//! sheetjoin join a.csv b.xlsx -k id -t left -o out.xlsx   # Join two tables
//! sheetjoin merge book.xlsx --sheets q1,q2,q3              # Stack or join sheets
//! sheetjoin transform data.csv -s "filter:age:gt:18" -s "sort:age:desc"
//! sheetjoin batch a.csv b.csv c.csv -o pairs.xlsx          # Pairwise joins
//! ```
//!
//! # Stored State
//!
//! ```bash
//! sheetjoin template list          # Saved join templates
//! sheetjoin history                # Recent join runs
//! sheetjoin inspect data.csv       # Column profile and warnings
//! ```

use clap::{Args, Parser, Subcommand};
use sheetjoin::export::{to_csv_string, to_json_records, write_xlsx, ExportFormat};
use sheetjoin::logs::{log_warning, set_echo};
use sheetjoin::parser::{decode_file, DecodeOptions, DecodedFile};
use sheetjoin::session::CLEAR_FILTER_LABEL;
use sheetjoin::store::{JoinRunRecord, JoinTemplate, Settings, Store};
use sheetjoin::transform::profile_table;
use sheetjoin::validation::table_warnings;
use sheetjoin::{
    batch_join, Cell, CleanupOp, EngineConfig, EngineResult, FilterCondition, FilterSpec,
    JoinSpec, JoinType, NamedTable, Session, SharedSession, SortDirection, SortSpec, Table,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "sheetjoin")]
#[command(about = "Join, merge, filter and clean CSV and spreadsheet tables", long_about = None)]
struct Cli {
    /// Do not echo progress logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// First row is data; generate col_1..col_N headers
    #[arg(long)]
    no_header: bool,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,
}

impl InputArgs {
    fn options(&self) -> DecodeOptions {
        DecodeOptions {
            has_header: !self.no_header,
            delimiter: self.delimiter,
        }
    }
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv, json or xlsx (default: from extension, else csv)
    #[arg(short, long)]
    format: Option<ExportFormat>,
}

#[derive(Args, Clone)]
struct JoinArgs {
    /// Key columns of the left table (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    keys: Vec<String>,

    /// Key columns of the right table (default: same as --keys)
    #[arg(long, value_delimiter = ',')]
    right_keys: Vec<String>,

    /// Join type: inner, left, right, full
    #[arg(short = 't', long = "type")]
    join_type: Option<JoinType>,

    /// Value for cells of the side without a match
    #[arg(long)]
    fill: Option<String>,
}

impl JoinArgs {
    fn explicit_spec(&self) -> Option<JoinSpec> {
        if self.keys.is_empty() {
            return None;
        }
        let right = if self.right_keys.is_empty() {
            self.keys.clone()
        } else {
            self.right_keys.clone()
        };
        Some(JoinSpec::new(self.keys.clone(), right, JoinType::Inner))
    }

    fn apply_overrides(&self, spec: &mut JoinSpec) {
        if let Some(join_type) = self.join_type {
            spec.join_type = join_type;
        }
        if let Some(ref fill) = self.fill {
            spec.fill_value = Cell::text(fill.as_str());
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Join two tables on key columns
    Join {
        /// Left input (csv, xlsx, json)
        left: PathBuf,
        /// Right input (csv, xlsx, json)
        right: PathBuf,

        /// Sheet of the left workbook (default: first)
        #[arg(long)]
        left_sheet: Option<String>,

        /// Sheet of the right workbook (default: first)
        #[arg(long)]
        right_sheet: Option<String>,

        #[command(flatten)]
        join: JoinArgs,

        /// Take keys and type from a saved template
        #[arg(long)]
        template: Option<String>,

        /// Transform steps to run on the result
        #[arg(short = 's', long = "step")]
        steps: Vec<Step>,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Merge the sheets of a workbook: two sheets with keys are joined,
    /// anything else is stacked
    Merge {
        /// Input workbook
        input: PathBuf,

        /// Sheets to merge (default: all)
        #[arg(long, value_delimiter = ',')]
        sheets: Vec<String>,

        #[command(flatten)]
        join: JoinArgs,

        #[command(flatten)]
        input_args: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run filter / sort / cleanup steps over a table
    Transform {
        /// Input file
        input: PathBuf,

        /// Sheet of a workbook input (default: first)
        #[arg(long)]
        sheet: Option<String>,

        /// Steps, in order: filter:<col>:<cond>[:<value>], sort:<col>[:desc],
        /// cleanup:<op>, clear-filter, undo, redo
        #[arg(short = 's', long = "step", required = true)]
        steps: Vec<Step>,

        /// Print the history after the last step
        #[arg(long)]
        show_history: bool,

        #[command(flatten)]
        input_args: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show column types and data-quality warnings
    Inspect {
        /// Input file
        input: PathBuf,

        /// Print the profile as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        input_args: InputArgs,
    },

    /// Inner-join every pair of tables on their first column
    Batch {
        /// Input files (at least two)
        #[arg(num_args = 2.., required = true)]
        inputs: Vec<PathBuf>,

        /// Workbook with one sheet per pair
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        input_args: InputArgs,
    },

    /// Manage saved join templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Show recent join runs
    History {
        /// Forget all recorded runs
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List saved templates
    List,

    /// Save a template
    Save {
        /// Template name
        name: String,

        #[command(flatten)]
        join: JoinArgs,

        /// Inputs have no header row
        #[arg(long)]
        no_header: bool,
    },

    /// Show details of a template
    Show {
        /// Template ID or name
        id: String,
    },

    /// Delete a template
    Delete {
        /// Template ID or name
        id: String,
    },
}

/// One transform step given on the command line.
#[derive(Debug, Clone)]
enum Step {
    Filter(FilterSpec),
    ClearFilter,
    Sort(SortSpec),
    Cleanup(CleanupOp),
    Undo,
    Redo,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once(':').unwrap_or((s, ""));
        match kind.trim() {
            "filter" => {
                let mut parts = rest.splitn(3, ':');
                let column = parts.next().filter(|c| !c.is_empty()).ok_or("filter needs a column")?;
                let condition: FilterCondition = parts.next().ok_or("filter needs a condition")?.parse()?;
                let value = parts.next().unwrap_or("");
                if condition != FilterCondition::NotEmpty && value.is_empty() {
                    return Err(format!("filter '{}' needs a value", condition));
                }
                Ok(Step::Filter(FilterSpec::new(column, condition, value)))
            }
            "sort" => {
                let (column, direction) = match rest.rsplit_once(':') {
                    Some((column, dir)) => (column, dir.parse()?),
                    None => (rest, SortDirection::Asc),
                };
                if column.is_empty() {
                    return Err("sort needs a column".to_string());
                }
                Ok(Step::Sort(SortSpec::new(column, direction)))
            }
            "cleanup" => Ok(Step::Cleanup(CleanupOp::parse(rest)?)),
            "clear-filter" | "clear_filter" => Ok(Step::ClearFilter),
            "undo" => Ok(Step::Undo),
            "redo" => Ok(Step::Redo),
            other => Err(format!("unknown step '{}'", other)),
        }
    }
}

impl Step {
    fn apply(&self, session: &mut Session) -> EngineResult<String> {
        match self {
            Step::Filter(spec) => {
                let outcome = session.apply_filter(spec)?;
                Ok(format!(
                    "{} ({} of {} rows)",
                    spec.label(),
                    outcome.kept,
                    outcome.baseline_rows
                ))
            }
            Step::ClearFilter => {
                session.clear_filter()?;
                Ok(CLEAR_FILTER_LABEL.to_string())
            }
            Step::Sort(spec) => {
                session.apply_sort(spec)?;
                Ok(spec.label())
            }
            Step::Cleanup(op) => {
                let removed = session.apply_cleanup(op)?;
                Ok(format!("{} ({} rows removed)", op.label(), removed))
            }
            Step::Undo => session.undo().map(|label| format!("undo {}", label)),
            Step::Redo => session.redo().map(|label| format!("redo {}", label)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    set_echo(!cli.quiet);

    // Loads .env (if present) before reading SHEETJOIN_* variables
    let config = EngineConfig::from_env();

    let result = match cli.command {
        Commands::Join {
            left,
            right,
            left_sheet,
            right_sheet,
            join,
            template,
            steps,
            input,
            output,
        } => {
            cmd_join(
                &config,
                (left.as_path(), left_sheet.as_deref()),
                (right.as_path(), right_sheet.as_deref()),
                &join,
                template.as_deref(),
                &steps,
                &input,
                &output,
            )
            .await
        }

        Commands::Merge {
            input,
            sheets,
            join,
            input_args,
            output,
        } => cmd_merge(&config, &input, &sheets, &join, &input_args, &output),

        Commands::Transform {
            input,
            sheet,
            steps,
            show_history,
            input_args,
            output,
        } => cmd_transform(
            &config,
            &input,
            sheet.as_deref(),
            &steps,
            show_history,
            &input_args,
            &output,
        ),

        Commands::Inspect {
            input,
            json,
            input_args,
        } => cmd_inspect(&config, &input, json, &input_args),

        Commands::Batch {
            inputs,
            output,
            input_args,
        } => cmd_batch(&config, &inputs, output.as_deref(), &input_args),

        Commands::Template { action } => cmd_template(&config, action),

        Commands::History { clear } => cmd_history(&config, clear),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// Commands
// =============================================================================

#[allow(clippy::too_many_arguments)]
async fn cmd_join(
    config: &EngineConfig,
    left: (&Path, Option<&str>),
    right: (&Path, Option<&str>),
    join: &JoinArgs,
    template: Option<&str>,
    steps: &[Step],
    input: &InputArgs,
    output: &OutputArgs,
) -> CliResult {
    let store = Store::from_config(config);
    let options = input.options();

    let (left_name, left_table) = load_input(left.0, left.1, &options)?;
    let (right_name, right_table) = load_input(right.0, right.1, &options)?;

    let mut settings = Settings::load(&store);
    let mut spec = match (join.explicit_spec(), template) {
        (Some(spec), _) => spec,
        (None, Some(id)) => {
            let template = store.templates(config.template_limit).get(id)?;
            eprintln!("📋 Using template: {} ({})", template.name, template.id);
            template
                .apply(left_table.header(), right_table.header())
                .ok_or_else(|| format!("Template '{}' has no keys present in both tables", template.name))?
        }
        (None, None) => {
            if settings.retain_known_keys(left_table.header(), right_table.header()) {
                log_warning("Dropped saved join keys that are missing from these tables");
            }
            settings.join.clone()
        }
    };
    join.apply_overrides(&mut spec);

    let shared = SharedSession::new(Session::new(config.clone()));
    let stats = shared
        .run_join(left_table, right_table, spec.clone())
        .await?;
    eprintln!("✅ {} join: {}", spec.join_type, stats);

    store
        .runs(config.run_history_limit)
        .record(JoinRunRecord::new(&spec, left_name, right_name, stats.total_count))?;
    settings.join = spec;
    settings.has_header = options.has_header;
    settings.save(&store)?;

    for step in steps {
        let step = step.clone();
        let done = shared.run("step", move |session| step.apply(session)).await?;
        eprintln!("⚙️  {}", done);
    }

    let table = shared
        .snapshot()
        .await
        .ok_or("join produced no table")?;
    emit(&table, output, "joined")
}

fn cmd_merge(
    config: &EngineConfig,
    input: &Path,
    sheets: &[String],
    join: &JoinArgs,
    input_args: &InputArgs,
    output: &OutputArgs,
) -> CliResult {
    let decoded = decode_file(input, &input_args.options())?;
    eprintln!("📄 {}: {} sheets", input.display(), decoded.sheets.len());

    let selected: Vec<NamedTable> = if sheets.is_empty() {
        decoded.sheets
    } else {
        sheets
            .iter()
            .map(|name| decoded.sheet(Some(name.as_str())).cloned())
            .collect::<Result<_, _>>()?
    };

    let spec = join.explicit_spec().map(|mut spec| {
        join.apply_overrides(&mut spec);
        spec
    });

    let mut session = Session::new(config.clone());
    let summary = session.merge_sheets(&selected, spec.as_ref())?;
    if let Some(stats) = summary.join_stats {
        eprintln!("   {}", stats);
    }

    let table = session.current().ok_or("merge produced no table")?;
    emit(table, output, "merged")
}

fn cmd_transform(
    config: &EngineConfig,
    input: &Path,
    sheet: Option<&str>,
    steps: &[Step],
    show_history: bool,
    input_args: &InputArgs,
    output: &OutputArgs,
) -> CliResult {
    let (name, table) = load_input(input, sheet, &input_args.options())?;

    let mut session = Session::new(config.clone());
    session.load_table(table, &name);
    for step in steps {
        let done = step.apply(&mut session)?;
        eprintln!("⚙️  {}", done);
    }

    if show_history {
        eprintln!("\n🕘 History:");
        for entry in session.history().entries() {
            let marker = if entry.current { "▶" } else { " " };
            eprintln!("  {} {} ({} rows)", marker, entry.label, entry.rows);
        }
    }

    let table = session.current().ok_or("no table loaded")?;
    emit(table, output, "transformed")
}

fn cmd_inspect(config: &EngineConfig, input: &Path, json: bool, input_args: &InputArgs) -> CliResult {
    let decoded = decode_file(input, &input_args.options())?;
    print_detection(input, &decoded);

    for sheet in &decoded.sheets {
        let profile = profile_table(&sheet.table, config.profile_sample_rows);
        if json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            continue;
        }

        println!("📄 {} ({} rows, {} columns)", sheet.name, profile.rows, profile.columns);
        for column in &profile.column_profiles {
            println!(
                "  {:<24} {:<8} {} blank",
                column.name,
                format!("{:?}", column.kind).to_lowercase(),
                column.blank_count
            );
        }
        for warning in table_warnings(&sheet.table, &sheet.name).warnings {
            println!("  ⚠️  {}", warning);
        }
        println!();
    }
    Ok(())
}

fn cmd_batch(config: &EngineConfig, inputs: &[PathBuf], output: Option<&Path>, input_args: &InputArgs) -> CliResult {
    let options = input_args.options();
    let tables = inputs
        .iter()
        .map(|path| load_input(path, None, &options).map(|(name, table)| NamedTable::new(name, table)))
        .collect::<Result<Vec<_>, _>>()?;

    let results = batch_join(&tables, &config.collision_suffix)?;
    eprintln!("📦 {} pairs", results.len());
    for r in &results {
        println!(
            "  {} ⋈ {}: {} matched, {} rows",
            r.left_name, r.right_name, r.result.stats.matched_count, r.result.stats.total_count
        );
    }

    if let Some(path) = output {
        let sheets: Vec<NamedTable> = results
            .into_iter()
            .map(|r| NamedTable::new(format!("{}+{}", r.left_name, r.right_name), r.result.table))
            .collect();
        write_xlsx(&sheets, path)?;
        eprintln!("💾 Output written to: {}", path.display());
    }
    Ok(())
}

fn cmd_template(config: &EngineConfig, action: TemplateAction) -> CliResult {
    let store = Store::from_config(config);
    let templates = store.templates(config.template_limit);

    match action {
        TemplateAction::List => {
            let list = templates.list();
            if list.is_empty() {
                eprintln!("📋 No templates stored yet.");
                eprintln!("   Use 'sheetjoin template save <name> -k <keys>' to add one.");
                return Ok(());
            }

            eprintln!("📋 Stored templates ({}):\n", list.len());
            for t in list {
                println!("  📄 {} ({})", t.name, t.id);
                println!(
                    "     {} join on [{}] = [{}]",
                    t.join.join_type,
                    t.join.keys_left.join(", "),
                    t.join.keys_right.join(", ")
                );
                println!("     Created: {}", t.created_at);
                println!();
            }
        }

        TemplateAction::Save { name, join, no_header } => {
            let mut spec = join
                .explicit_spec()
                .ok_or("a template needs at least one key column (-k)")?;
            join.apply_overrides(&mut spec);
            let saved = templates.save(JoinTemplate::new(name, spec, !no_header))?;
            eprintln!("✅ Template saved with ID: {}", saved.id);
        }

        TemplateAction::Show { id } => {
            let t = templates.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&t)?);
        }

        TemplateAction::Delete { id } => {
            let removed = templates.delete(&id)?;
            eprintln!("🗑️  Template deleted: {} ({})", removed.name, removed.id);
        }
    }

    Ok(())
}

fn cmd_history(config: &EngineConfig, clear: bool) -> CliResult {
    let store = Store::from_config(config);
    let runs = store.runs(config.run_history_limit);

    if clear {
        runs.clear()?;
        eprintln!("🗑️  Join history cleared");
        return Ok(());
    }

    let list = runs.list();
    if list.is_empty() {
        eprintln!("🕘 No joins recorded yet.");
        return Ok(());
    }
    for run in list {
        println!(
            "  {}  {} join  {} [{}] ⋈ {} [{}]  → {} rows",
            run.timestamp.format("%Y-%m-%d %H:%M"),
            run.join_type,
            run.left_source,
            run.keys_left.join(", "),
            run.right_source,
            run.keys_right.join(", "),
            run.result_rows
        );
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Decode a file and pick one sheet. Returns a display name and the table.
fn load_input(path: &Path, sheet: Option<&str>, options: &DecodeOptions) -> Result<(String, Table), Box<dyn std::error::Error>> {
    let decoded = decode_file(path, options)?;
    print_detection(path, &decoded);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let name = match sheet {
        Some(sheet) => format!("{}#{}", file_name, sheet),
        None => file_name,
    };

    let table = decoded.into_table(sheet)?;
    eprintln!("   {} rows, {} columns", table.len(), table.width());
    Ok((name, table))
}

fn print_detection(path: &Path, decoded: &DecodedFile) {
    eprintln!("📄 Reading: {} ({})", path.display(), decoded.format);
    if let Some(ref encoding) = decoded.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = decoded.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

/// Write a table in the requested format.
fn emit(table: &Table, output: &OutputArgs, sheet_name: &str) -> CliResult {
    let format = output
        .format
        .or_else(|| output.output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or(ExportFormat::Csv);

    match format {
        ExportFormat::Xlsx => {
            let path = output
                .output
                .as_deref()
                .ok_or("xlsx output needs --output <file>")?;
            write_xlsx(&[NamedTable::new(sheet_name, table.clone())], path)?;
            eprintln!("💾 Output written to: {}", path.display());
            Ok(())
        }
        ExportFormat::Json => write_output(&to_json_records(table, true)?, output.output.as_deref()),
        ExportFormat::Csv => write_output(&to_csv_string(table, b',')?, output.output.as_deref()),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
