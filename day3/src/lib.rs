use std::{
    fmt,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{debug, trace};
use nom::{
    bytes::complete::take_while1,
    combinator::{map_res, verify},
    IResult,
};
use nom_supreme::error::ErrorTree;
use strum_macros::Display;
use util::{parse_nice, InputArgs, ParseFailure, Span};

/// Widest record that still fits a `u64`.
pub const MAX_WIDTH: usize = u64::BITS as usize;

#[derive(thiserror::Error, Debug)]
pub enum DiagnosticError {
    #[error("could not read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {content:?} is not a binary number")]
    Parse {
        line: usize,
        content: String,
        #[source]
        source: ParseFailure,
    },

    #[error("line {line}: {content:?} has {found} bits, expected {expected}")]
    InconsistentWidth {
        line: usize,
        content: String,
        found: usize,
        expected: usize,
    },

    #[error("record width must be between 1 and {max} bits, got {0}", max = MAX_WIDTH)]
    InvalidWidth(usize),

    #[error("record {value:#b} does not fit in {width} bits")]
    RecordTooWide { value: u64, width: usize },

    #[error("no diagnostic records to work with")]
    EmptyRecordSet,

    #[error("{rating} filter left no records at bit {bit}")]
    FilterEmptied { rating: Rating, bit: usize },

    #[error("{rating} filter went through every bit with {remaining} records still left")]
    BitsExhausted { rating: Rating, remaining: usize },
}

pub type Result<T, E = DiagnosticError> = std::result::Result<T, E>;

/// One line of the diagnostic report. Bit `0` is the least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record(u64);

impl Record {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn bit(self, bit: usize) -> bool {
        u32::try_from(bit)
            .ok()
            .and_then(|bit| self.0.checked_shr(bit))
            .map_or(false, |v| v & 1 == 1)
    }

    fn significant_bits(self) -> usize {
        (u64::BITS - self.0.leading_zeros()) as usize
    }

    /// Zero-padded to `width` characters, the way it appeared in the input.
    pub fn to_binary_string(self, width: usize) -> String {
        format!("{:0width$b}", self.0)
    }
}

impl fmt::Binary for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

fn parse_record(i: Span) -> IResult<Span, (Record, usize), ErrorTree<Span>> {
    map_res(
        verify(
            take_while1(|c: char| c == '0' || c == '1'),
            |digits: &Span| digits.fragment().len() <= MAX_WIDTH,
        ),
        |digits: Span| {
            u64::from_str_radix(digits.fragment(), 2)
                .map(|value| (Record(value), digits.fragment().len()))
        },
    )(i)
}

fn parse_line(i: usize, line: &str) -> Result<(Record, usize)> {
    parse_nice(line, parse_record).map_err(|source| DiagnosticError::Parse {
        line: i + 1,
        content: line.to_string(),
        source,
    })
}

/// The parsed puzzle input: every record in input order plus their shared
/// bit width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    width: usize,
    records: Vec<Record>,
}

impl Report {
    pub fn new(width: usize, records: Vec<Record>) -> Result<Self> {
        if !(1..=MAX_WIDTH).contains(&width) {
            return Err(DiagnosticError::InvalidWidth(width));
        }

        if let Some(record) = records.iter().find(|r| r.significant_bits() > width) {
            return Err(DiagnosticError::RecordTooWide {
                value: record.value(),
                width,
            });
        }

        Ok(Self { width, records })
    }

    /// The width is taken from the first line, every other line has to match
    /// it. Only blank lines at the very end are ignored.
    pub fn parse<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut width = None;
        let mut records = Vec::new();
        let mut first_blank = None;

        for (i, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim_end();
            if line.is_empty() {
                first_blank.get_or_insert(i);
                continue;
            }

            // a blank line followed by more records is malformed
            if let Some(blank) = first_blank.take() {
                parse_line(blank, "")?;
            }

            let (record, found) = parse_line(i, line)?;

            let expected = *width.get_or_insert(found);
            if found != expected {
                return Err(DiagnosticError::InconsistentWidth {
                    line: i + 1,
                    content: line.to_string(),
                    found,
                    expected,
                });
            }

            records.push(record);
        }

        let Some(width) = width else {
            return Ok(Self { width: 0, records });
        };

        debug!("parsed {} records of width {width}", records.len());

        Self::new(width, records)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lines = util::read_lines(path).map_err(|source| DiagnosticError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(lines)
    }

    /// Reads whatever `--input` points at, standard input included.
    pub fn from_args(args: &InputArgs) -> Result<Self> {
        if !args.is_stdin() {
            return Self::from_path(&args.input);
        }

        let lines = args.read_lines().map_err(|source| DiagnosticError::Read {
            path: args.input.clone(),
            source,
        })?;

        Self::parse(lines)
    }

    /// Zero for a report parsed from empty input.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.records
                .iter()
                .map(|r| r.to_binary_string(self.width))
                .join("\n")
        )
    }
}

/// How many records have each bit set.
///
/// Always built from scratch over the records it is given. The life support
/// filter recounts after every step instead of updating the table, which at
/// puzzle sizes costs nothing and keeps the tie rules obviously right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitCounts {
    total: usize,
    ones: Vec<usize>,
}

impl BitCounts {
    pub fn count(records: &[Record], width: usize) -> Result<Self> {
        if records.is_empty() {
            return Err(DiagnosticError::EmptyRecordSet);
        }

        let ones = (0..width)
            .map(|bit| records.iter().filter(|r| r.bit(bit)).count())
            .collect::<Vec<_>>();

        trace!("bit counts (lsb first) over {}: {ones:?}", records.len());

        Ok(Self {
            total: records.len(),
            ones,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn width(&self) -> usize {
        self.ones.len()
    }

    /// # Panics
    ///
    /// If `bit` is not below [`BitCounts::width`].
    pub fn ones(&self, bit: usize) -> usize {
        self.ones[bit]
    }

    pub fn zeros(&self, bit: usize) -> usize {
        self.total - self.ones(bit)
    }
}

fn mask(width: usize) -> u64 {
    u32::try_from(MAX_WIDTH.saturating_sub(width))
        .ok()
        .and_then(|shift| u64::MAX.checked_shr(shift))
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReading {
    pub gamma: u64,
    pub epsilon: u64,
}

impl PowerReading {
    /// Gamma takes the bit set by strictly more than half of the records, so
    /// a tie leaves a zero. Epsilon is its complement within the report width.
    pub fn from_report(report: &Report) -> Result<Self> {
        let counts = BitCounts::count(report.records(), report.width())?;

        let gamma = (0..counts.width())
            .filter(|&bit| counts.ones(bit) > counts.zeros(bit))
            .fold(0u64, |gamma, bit| gamma | 1 << bit);
        let epsilon = !gamma & mask(report.width());

        debug!("gamma {gamma}, epsilon {epsilon}");

        Ok(Self { gamma, epsilon })
    }

    pub fn power_consumption(&self) -> u128 {
        u128::from(self.gamma) * u128::from(self.epsilon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rating {
    #[strum(to_string = "oxygen generator")]
    OxygenGenerator,
    #[strum(to_string = "CO2 scrubber")]
    Co2Scrubber,
}

impl Rating {
    /// Which bit value survives a filter step, given how many of the
    /// remaining records have a one and a zero at the current position.
    pub fn keep_bit(self, ones: usize, zeros: usize) -> bool {
        match self {
            Rating::OxygenGenerator => ones >= zeros,
            Rating::Co2Scrubber => ones < zeros,
        }
    }

    /// Narrows a copy of the records down, most significant bit first, until
    /// one is left.
    pub fn resolve(self, report: &Report) -> Result<Record> {
        let mut remaining = report.records().to_vec();
        let mut bits = (0..report.width()).rev();

        loop {
            match remaining.as_slice() {
                [] => return Err(DiagnosticError::EmptyRecordSet),
                [record] => {
                    debug!("{self} rating is {record:b}");
                    return Ok(*record);
                }
                _ => {}
            }

            let bit = bits.next().ok_or(DiagnosticError::BitsExhausted {
                rating: self,
                remaining: remaining.len(),
            })?;

            let counts = BitCounts::count(&remaining, report.width())?;
            let keep = self.keep_bit(counts.ones(bit), counts.zeros(bit));

            remaining.retain(|r| r.bit(bit) == keep);
            debug!(
                "{self}: kept {} at bit {bit}, {} left",
                u8::from(keep),
                remaining.len()
            );

            if remaining.is_empty() {
                return Err(DiagnosticError::FilterEmptied { rating: self, bit });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifeSupport {
    pub oxygen_generator: Record,
    pub co2_scrubber: Record,
}

impl LifeSupport {
    pub fn from_report(report: &Report) -> Result<Self> {
        Ok(Self {
            oxygen_generator: Rating::OxygenGenerator.resolve(report)?,
            co2_scrubber: Rating::Co2Scrubber.resolve(report)?,
        })
    }

    pub fn life_support_rating(&self) -> u128 {
        u128::from(self.oxygen_generator.value()) * u128::from(self.co2_scrubber.value())
    }
}
