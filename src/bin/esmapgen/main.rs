mod output;
mod theme;

use anyhow::{Context, Result};
use clap::{
    builder::{
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
        Styles,
    },
    error::ErrorKind,
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser,
};
use colored::{control::ShouldColorize, Color as ThemeColor, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;
use std::fmt::Write;
use std::io::{self, Write as IoWrite};
use std::path::PathBuf;

use esmapgen::{Generator, DEFAULT_SUFFIX};
use output::{GlobalOptions, OutputFormat, OutputManager, TableDisplay};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("ESMAPGEN_SUFFIX", "Output filename suffix (same as --suffix)"),
    ("RUST_LOG", "Log filter for diagnostic output, e.g. esmapgen=debug"),
];

struct ExampleGroup {
    title: &'static str,
    commands: &'static [&'static str],
}

const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Generate mappings next to the sources",
        commands: &[
            "esmapgen src/data/users.rs",
            "esmapgen src/data/users.rs src/data/posts.rs",
        ],
    },
    ExampleGroup {
        title: "Customize the output filename",
        commands: &["esmapgen --suffix index src/data/users.rs"],
    },
    ExampleGroup {
        title: "Script-friendly output",
        commands: &["esmapgen --output json -q src/data/users.rs"],
    },
];

#[derive(Parser)]
#[command(name = "esmapgen")]
#[command(version = "0.1.0")]
#[command(
    about = "Elasticsearch mapping generator for annotated Rust structs",
    long_about = r#"Generates Elasticsearch index-mapping JSON documents from Rust sources:

• Structs whose doc comment contains `elastic:mappings` are selected
• #[json("...")] renames a field; `-` skips it entirely
• #[es("key:value,...")] adds attributes to the field's mapping
• #[serde(flatten)] merges an embedded struct's fields into its parent

Each document is written next to its source file as <stem>_<suffix>.json."#
)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Source files to generate mapping documents for
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Output filename suffix
    #[arg(short, long, env = "ESMAPGEN_SUFFIX", default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn parse_with_styles() -> Self {
        let command = build_cli_command();
        match command.styles(help_styles()).try_get_matches() {
            Ok(matches) => Cli::from_arg_matches(&matches).expect("Failed to parse CLI arguments"),
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = print_blank_line_stdout();
                    if let Err(print_err) = err.print()
                        && print_err.kind() != io::ErrorKind::BrokenPipe
                    {
                        eprintln!("Failed to display help: {print_err}");
                    }
                    let _ = print_blank_line_stdout();
                    std::process::exit(0);
                }
                _ => {
                    let exit_code = err.exit_code();
                    let _ = print_blank_line_stderr();
                    if let Err(print_err) = err.print()
                        && print_err.kind() != io::ErrorKind::BrokenPipe
                    {
                        eprintln!("Failed to display error: {print_err}");
                    }
                    let _ = print_blank_line_stderr();
                    std::process::exit(exit_code);
                }
            },
        }
    }
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let appendix = render_appendix(use_color);
    let mut command = Cli::command().after_long_help(appendix);
    command = command.color(if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    });
    command
}

fn render_appendix(use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let heading = stylize("Examples:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");

    for (index, group) in EXAMPLES.iter().enumerate() {
        let title = stylize(group.title, theme.primary, true, use_color);
        let _ = writeln!(buffer, "  {title}");

        for command in group.commands {
            let arrow = stylize(ICONS.arrow, theme.secondary, false, use_color);
            let command_text = stylize(command, theme.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {command_text}");
        }

        if index + 1 < EXAMPLES.len() {
            buffer.push('\n');
        }
    }

    buffer.push('\n');

    let env_heading = stylize("Environment Variables:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{env_heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, theme.key, true, use_color);
        let value_text = stylize(description, theme.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }

    if !buffer.ends_with('\n') {
        buffer.push('\n');
    }

    buffer
}

fn print_blank_line_stdout() -> io::Result<()> {
    let mut stdout = io::stdout();
    IoWrite::write_all(&mut stdout, b"\n")?;
    IoWrite::flush(&mut stdout)
}

fn print_blank_line_stderr() -> io::Result<()> {
    let mut stderr = io::stderr();
    IoWrite::write_all(&mut stderr, b"\n")?;
    IoWrite::flush(&mut stderr)
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if use_color {
        let styled = text.color(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    } else {
        text.to_string()
    }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    match color {
        ThemeColor::Black => ClapColor::Ansi(AnsiColor::Black),
        ThemeColor::Red => ClapColor::Ansi(AnsiColor::Red),
        ThemeColor::Green => ClapColor::Ansi(AnsiColor::Green),
        ThemeColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        ThemeColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        ThemeColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        ThemeColor::Cyan => ClapColor::Ansi(AnsiColor::Cyan),
        ThemeColor::White => ClapColor::Ansi(AnsiColor::White),
        ThemeColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        ThemeColor::BrightRed => ClapColor::Ansi(AnsiColor::BrightRed),
        ThemeColor::BrightGreen => ClapColor::Ansi(AnsiColor::BrightGreen),
        ThemeColor::BrightYellow => ClapColor::Ansi(AnsiColor::BrightYellow),
        ThemeColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        ThemeColor::BrightMagenta => ClapColor::Ansi(AnsiColor::BrightMagenta),
        ThemeColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        ThemeColor::BrightWhite => ClapColor::Ansi(AnsiColor::BrightWhite),
        ThemeColor::TrueColor { r, g, b } => ClapColor::Rgb(RgbColor(r, g, b)),
    }
}

/// One generated document, for the summary table.
#[derive(Serialize)]
struct FileReport {
    source: PathBuf,
    declaration: String,
    output: PathBuf,
}

impl TableDisplay for Vec<FileReport> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = Table::new();

        if !options.no_color {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        } else {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        }

        let headers = ["Source", "Declaration", "Output"];
        let header_cells: Vec<Cell> = if options.no_color {
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect()
        } else {
            headers
                .iter()
                .map(|h| {
                    Cell::new(h)
                        .add_attribute(Attribute::Bold)
                        .fg(TableColor::Cyan)
                })
                .collect()
        };
        table.set_header(header_cells);

        for report in self {
            table.add_row(vec![
                Cell::new(report.source.display()),
                Cell::new(&report.declaration),
                Cell::new(report.output.display()),
            ]);
        }

        table
    }

    fn to_compact(&self) -> String {
        self.iter()
            .map(|report| format!("{} -> {}", report.declaration, report.output.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();

    let _ = print_blank_line_stdout();

    match execute(cli).await {
        Ok(()) => {
            let _ = print_blank_line_stdout();
        }
        Err(err) => {
            eprintln!("Error: {err}");
            let _ = print_blank_line_stdout();
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    let output = OutputManager::new(global_options);

    output.heading(&format!(
        "Generating mappings for {} file(s)",
        cli.files.len()
    ));

    // One blocking task per file; a failed file never stops the others.
    let mut handles = Vec::with_capacity(cli.files.len());
    for file in &cli.files {
        let path = std::path::absolute(file)
            .with_context(|| format!("Failed to resolve path: {}", file.display()))?;
        let generator = Generator::new().suffix(cli.suffix.clone());
        let task_path = path.clone();
        let handle = tokio::task::spawn_blocking(move || generator.generate(&task_path));
        handles.push((path, handle));
    }

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for (path, handle) in handles {
        match handle.await? {
            Ok(generated) => {
                if generated.is_empty() {
                    output.warning(&format!(
                        "{}: no `elastic:mappings` declarations found",
                        path.display()
                    ));
                    continue;
                }
                for mapping in generated {
                    output.verbose(&format!(
                        "{} {} -> {}",
                        path.display(),
                        mapping.declaration,
                        mapping.output_path.display()
                    ));
                    reports.push(FileReport {
                        source: path.clone(),
                        declaration: mapping.declaration,
                        output: mapping.output_path,
                    });
                }
            }
            Err(err) => {
                failures += 1;
                output.error(&format!("{}: {err}", path.display()));
            }
        }
    }

    if !reports.is_empty() {
        output.display(&reports)?;
        output.success(&format!(
            "Generated {} mapping document(s)",
            reports.len()
        ));
    }

    if failures > 0 {
        anyhow::bail!("{failures} file(s) failed");
    }

    Ok(())
}
