use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::Parser;
use miette::GraphicalReportHandler;
use nom::IResult;
use nom_locate::LocatedSpan;
use nom_supreme::{
    error::{BaseErrorKind, ErrorTree, GenericErrorTree},
    final_parser::final_parser,
};

// Thanks to FasterThanLime! https://fasterthanli.me/series/advent-of-code-2022/part-11

pub type Span<'a> = LocatedSpan<&'a str>;

type ErrorKind = BaseErrorKind<&'static str, Box<dyn std::error::Error + Send + Sync>>;

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
#[error("bad input")]
struct BadInput<'a> {
    #[source_code]
    src: &'a str,

    #[label("{kind}")]
    bad_bit: miette::SourceSpan,

    kind: ErrorKind,
}

/// A line that a parser rejected. `report` is the rendered miette diagnostic
/// pointing at `offset`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected input at column {}", .offset + 1)]
pub struct ParseFailure {
    pub offset: usize,
    pub report: String,
}

/// Picks the deepest base error out of a tree, following alternatives to
/// whichever got furthest into the input.
fn innermost(tree: ErrorTree<Span<'_>>) -> Option<(Span<'_>, ErrorKind)> {
    match tree {
        GenericErrorTree::Base { location, kind } => Some((location, kind)),
        GenericErrorTree::Stack { base, .. } => innermost(*base),
        GenericErrorTree::Alt(alts) => alts
            .into_iter()
            .filter_map(innermost)
            .max_by_key(|(location, _)| location.location_offset()),
    }
}

pub fn parse_nice<'a, T, F>(l: &'a str, parse_fun: F) -> Result<T, ParseFailure>
where
    F: FnMut(Span<'a>) -> IResult<Span<'a>, T, ErrorTree<Span<'a>>>,
{
    let line_span = Span::new(l);
    let line: Result<_, ErrorTree<Span>> = final_parser(parse_fun)(line_span);

    line.map_err(|e| {
        let Some((location, kind)) = innermost(e) else {
            return ParseFailure {
                offset: 0,
                report: "bad input".to_string(),
            };
        };

        let offset = location.location_offset();
        let err = BadInput {
            src: l,
            bad_bit: miette::SourceSpan::new(offset.into(), 0.into()),
            kind,
        };

        let mut report = String::new();
        if GraphicalReportHandler::new()
            .render_report(&mut report, &err)
            .is_err()
        {
            report = format!("{err}: {}", err.kind);
        }
        log::warn!("{report}");

        ParseFailure { offset, report }
    })
}

/// Where the puzzle input comes from.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct InputArgs {
    /// Puzzle input file, `-` reads standard input
    #[arg(short, long, default_value = "input.txt")]
    pub input: PathBuf,
}

impl InputArgs {
    pub fn is_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    pub fn read_lines(&self) -> io::Result<Vec<String>> {
        if self.is_stdin() {
            io::stdin().lock().lines().collect()
        } else {
            read_lines(&self.input)
        }
    }
}

pub fn read_lines(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let file = File::open(path)?;

    BufReader::new(file).lines().collect()
}

/// Logs go to stderr, filtered by `RUST_LOG` (warnings and up by default).
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}
