//! Sift command-line front end.
//!
//! Parses markup from files or an inline string and prints the corrected
//! tree, a JSON snapshot of it, the raw tokens, or the markup written back
//! out. Streaming mode writes the corrected markup without keeping a tree.

use std::fs;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as _;
use log::LevelFilter;
use owo_colors::OwoColorize;
use sift_common::warning::clear_warnings;
use sift_markup::{
    Correction, Grammar, GrammarOptions, HtmlGrammar, ParseError, Parser, ParserInstance,
    ReaderSource, Step, Tokenizer, WriterReceiver, XmlGrammar, print_tree, snapshot, to_code,
};
use simple_logger::SimpleLogger;

/// Sift: error-tolerant markup parser
#[derive(clap::Parser, Debug)]
#[command(name = "sift")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the corrected tree of a file
    sift page.html

    # Write the corrected markup back out, one token per line
    sift --code --indent page.html

    # Stream a large file without building a tree
    sift --stream big.html > fixed.html

    # Reject malformed input instead of correcting it
    sift --strict --markup '<a><b>x</a>'

    # Parse as XML and print a JSON snapshot
    sift --xml --json feed.xml
"#)]
struct Cli {
    /// Files to parse
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Parse this markup string instead of files
    #[arg(long, value_name = "MARKUP", conflicts_with = "files")]
    markup: Option<String>,

    /// Use the XML grammar instead of the HTML grammar
    #[arg(long)]
    xml: bool,

    /// Fail on the first malformed construct instead of correcting it
    #[arg(long)]
    strict: bool,

    /// Load grammar options from a JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the corrected markup
    #[arg(long, conflicts_with_all = ["json", "tokens"])]
    code: bool,

    /// Print a JSON snapshot of the tree
    #[arg(long, conflicts_with = "tokens")]
    json: bool,

    /// Print raw tokens without parsing
    #[arg(long)]
    tokens: bool,

    /// Stream the corrected markup without building a tree
    #[arg(long, conflicts_with_all = ["json", "tokens"])]
    stream: bool,

    /// Put each token on its own line, indented by depth (with --code or --stream)
    #[arg(long)]
    indent: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Where one document comes from.
enum Input {
    File(PathBuf),
    Inline(String),
}

impl Input {
    fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline(_) => "<markup>".to_string(),
        }
    }

    fn read_to_string(&self) -> Result<String> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            Self::Inline(markup) => Ok(markup.clone()),
        }
    }

    fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Self::File(path) => {
                let file = fs::File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Inline(markup) => Ok(Box::new(Cursor::new(markup.clone().into_bytes()))),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(log_level(cli.verbose))
        .init()?;

    let options = load_options(&cli)?;
    let grammar: Box<dyn Grammar> = if cli.xml {
        Box::new(XmlGrammar::new(options))
    } else {
        Box::new(HtmlGrammar::new(options))
    };

    let inputs: Vec<Input> = match &cli.markup {
        Some(markup) => vec![Input::Inline(markup.clone())],
        None => cli.files.iter().cloned().map(Input::File).collect(),
    };
    if inputs.is_empty() {
        anyhow::bail!("nothing to parse: give one or more files, or --markup");
    }

    let mut failures = 0;
    for input in &inputs {
        clear_warnings();
        if inputs.len() > 1 {
            println!("=== {} ===", input.name());
        }
        if let Err(err) = process(&cli, grammar.as_ref(), input) {
            eprintln!("{} {}: {err:#}", "error:".red().bold(), input.name());
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} inputs failed", inputs.len());
    }
    Ok(())
}

const fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Grammar options from `--config`, or the preset for the chosen grammar.
fn load_options(cli: &Cli) -> Result<GrammarOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid grammar options in {}", path.display()))?
        }
        None if cli.xml => GrammarOptions::xml(),
        None => GrammarOptions::html(),
    };
    if cli.strict {
        options = options.with_correct_errors(false);
    }
    log::debug!("grammar options: {options:?}");
    Ok(options)
}

fn process(cli: &Cli, grammar: &dyn Grammar, input: &Input) -> Result<()> {
    if cli.stream {
        return stream(cli, grammar, input);
    }

    let text = input.read_to_string()?;
    if cli.tokens {
        print_tokens(grammar, &text);
        return Ok(());
    }

    let (tree, corrections) = match Parser::new(grammar).parse_str_with_corrections(&text) {
        Ok(parsed) => parsed,
        Err(err) => {
            display_snippet(&text, &err);
            return Err(err.into());
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot(&tree, tree.root()))?);
    } else if cli.code {
        println!("{}", to_code(&tree, tree.root(), grammar, cli.indent));
    } else {
        print_tree(&tree, tree.root());
    }
    report_corrections(&corrections);
    Ok(())
}

fn stream(cli: &Cli, grammar: &dyn Grammar, input: &Input) -> Result<()> {
    let stdout = io::stdout().lock();
    let receiver = if cli.indent {
        WriterReceiver::indented(stdout, grammar.standard_indent())
    } else {
        WriterReceiver::new(stdout)
    };
    let source = ReaderSource::new(grammar, input.open()?);
    let mut instance = ParserInstance::streaming(grammar, source, receiver);
    if instance.run()? == Step::Pending {
        instance.conclude()?;
    }
    let corrections = instance.take_corrections();

    let mut stdout = instance.into_receiver().into_inner();
    if !cli.indent {
        writeln!(stdout)?;
    }
    drop(stdout);
    report_corrections(&corrections);
    Ok(())
}

fn print_tokens(grammar: &dyn Grammar, text: &str) {
    for token in Tokenizer::with_input(grammar, text) {
        println!(
            "{:>8}  {:<24} {:?}",
            token.offset,
            token.kind.to_string(),
            token.text
        );
    }
}

fn report_corrections(corrections: &[Correction]) {
    for correction in corrections {
        let cause = correction
            .context
            .as_deref()
            .map(|tag| format!(" (by <{tag}>)"))
            .unwrap_or_default();
        eprintln!(
            "{} {} <{}> at offset {}{cause}",
            "corrected:".yellow(),
            correction.kind,
            correction.tag,
            correction.offset
        );
    }
    if !corrections.is_empty() {
        eprintln!("{} corrections", corrections.len());
    }
}

/// Line number, line text and column of a byte offset.
fn locate(text: &str, offset: usize) -> Option<(usize, &str, usize)> {
    let offset = offset.min(text.len());
    if !text.is_char_boundary(offset) {
        return None;
    }
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    let line_number = text[..line_start].matches('\n').count() + 1;
    let column = text[line_start..offset].chars().count();
    Some((line_number, &text[line_start..line_end], column))
}

/// Print the line an error points into, with a caret under the offset.
fn display_snippet(text: &str, err: &ParseError) {
    let Some((line_number, line, column)) = err.offset().and_then(|offset| locate(text, offset))
    else {
        return;
    };
    eprintln!("{line_number:>5} | {line}");
    eprintln!("      | {}{}", " ".repeat(column), "^".red());
}
