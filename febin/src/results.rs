//! This module implements the result parser. A result file carries a
//! solution summary listing every available (result kind, load step) set and
//! the section holding it; callers pick the sets they want and only those get
//! decoded.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::decoder::*;
use crate::error::{FebinError, Result};
use crate::fields::*;
use crate::flavour::FileKind;

/// Payload size of a summary record.
pub const SUMMARY_RECORD_BYTES: usize = 5 * 4 + 8;

/// This specifies a value or sets thereof.
#[derive(
  Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub enum Specifier<A> {
  /// Use all in the file.
  All,
  /// Use a list. Every item must exist.
  List(Vec<A>),
  /// Use an exclusion list.
  AllExcept(Vec<A>)
}

impl<A: PartialEq> Specifier<A> {
  /// Use this as a filter for an iterator.
  pub fn filter_fn(&self, item: &A) -> bool {
    return match self {
      Self::All => true,
      Self::List(l) => l.contains(item),
      Self::AllExcept(l) => !l.contains(item),
    };
  }
}

/// One available result set, as listed in the solution summary.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SummaryEntry {
  /// The result kind.
  pub kind: ResultKind,
  /// The load step.
  pub step: LoadStep,
  /// Components per row.
  pub width: usize,
  /// The section holding the data.
  pub section: SectionId,
  /// Solution time (or frequency) of the step.
  pub time: f64
}

/// Everything a result file says it holds.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SolutionSummary {
  /// The entries, in file order.
  entries: Vec<SummaryEntry>
}

impl SolutionSummary {
  /// Returns all entries.
  pub fn entries(&self) -> &[SummaryEntry] {
    return &self.entries;
  }

  /// Returns the entry for a kind and step.
  pub fn find(
    &self,
    kind: ResultKind,
    step: LoadStep
  ) -> Option<&SummaryEntry> {
    return self.entries.iter().find(|e| e.kind == kind && e.step == step);
  }

  /// Returns the kinds present at any step.
  pub fn kinds(&self) -> BTreeSet<ResultKind> {
    return self.entries.iter().map(|e| e.kind).collect();
  }

  /// Returns every load step present for any kind.
  pub fn steps(&self) -> BTreeSet<LoadStep> {
    return self.entries.iter().map(|e| e.step).collect();
  }

  /// Returns the steps a kind is available at.
  pub fn steps_of(&self, kind: ResultKind) -> BTreeSet<LoadStep> {
    return self.entries.iter()
      .filter(|e| e.kind == kind)
      .map(|e| e.step)
      .collect();
  }

  /// Returns the solution time of every step.
  pub fn time_values(&self) -> BTreeMap<LoadStep, f64> {
    return self.entries.iter().map(|e| (e.step, e.time)).collect();
  }
}

/// Decodes a summary section.
pub(crate) struct SummaryDecoder {
  /// The entries so far.
  entries: Vec<SummaryEntry>
}

impl SectionDecoder for SummaryDecoder {
  type Output = SolutionSummary;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    record.expect_len(SUMMARY_RECORD_BYTES)?;
    let mut cur = record.cursor();
    let kind = ResultKind::try_from(cur.read_u32()?)?;
    let step = LoadStep::new(cur.read_u32()?, cur.read_u32()?);
    let width = cur.read_u32()? as usize;
    let section = SectionId::from(cur.read_u32()?);
    let time = cur.read_f64()?;
    if width == 0 {
      return Err(record.corrupt(format!("{} set has zero width", kind)));
    }
    if self.entries.iter().any(|e| e.kind == kind && e.step == step) {
      return Err(record.corrupt(format!(
        "{} listed twice for {}",
        kind,
        step
      )));
    }
    self.entries.push(SummaryEntry { kind, step, width, section, time });
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    return Ok(SolutionSummary { entries: self.entries });
  }
}

/// Decodes one result data section.
pub(crate) struct FieldDecoder {
  /// The summary entry we're decoding.
  entry: SummaryEntry,
  /// Row ids so far.
  ids: Vec<i32>,
  /// Row-major values so far.
  values: Vec<f64>
}

impl FieldDecoder {
  /// Creates a decoder for a summary entry, with room for `n` rows.
  pub(crate) fn new(entry: SummaryEntry, n: usize) -> Self {
    return Self {
      entry,
      ids: Vec::with_capacity(n),
      values: Vec::with_capacity(n * entry.width)
    };
  }
}

impl SectionDecoder for FieldDecoder {
  type Output = FieldResult;

  fn consume(&mut self, record: Record<'_>) -> Result<()> {
    record.expect_len(4 + 8 * self.entry.width)?;
    let mut cur = record.cursor();
    self.ids.push(cur.read_i32()?);
    for _ in 0..self.entry.width {
      self.values.push(cur.read_f64()?);
    }
    return Ok(());
  }

  fn finalise(self) -> Result<Self::Output> {
    let e = self.entry;
    return FieldResult::from_rows(
      e.kind,
      e.step,
      e.time,
      self.ids,
      e.width,
      &self.values
    );
  }
}

/// A request for one result kind at some steps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRequest {
  /// The kind wanted.
  pub kind: ResultKind,
  /// The steps wanted.
  pub steps: Specifier<LoadStep>
}

impl ResultRequest {
  /// Requests a kind at every step it's available at.
  pub fn all(kind: ResultKind) -> Self {
    return Self { kind, steps: Specifier::All };
  }

  /// Requests a kind at a single step.
  pub fn at(kind: ResultKind, step: LoadStep) -> Self {
    return Self { kind, steps: Specifier::List(vec![step]) };
  }
}

/// The decoded field results of a result file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MeshResults {
  /// What the file said it held.
  pub summary: SolutionSummary,
  /// The decoded results.
  pub fields: BTreeMap<(ResultKind, LoadStep), FieldResult>
}

impl MeshResults {
  /// Returns a decoded result.
  pub fn get(&self, kind: ResultKind, step: LoadStep) -> Option<&FieldResult> {
    return self.fields.get(&(kind, step));
  }

  /// Returns the number of decoded results.
  pub fn len(&self) -> usize {
    return self.fields.len();
  }

  /// Checks whether nothing was decoded.
  pub fn is_empty(&self) -> bool {
    return self.fields.is_empty();
  }

  /// Returns the steps with at least one decoded result.
  pub fn steps(&self) -> BTreeSet<LoadStep> {
    return self.fields.keys().map(|(_, s)| *s).collect();
  }

  /// Returns the solution time of every step in the summary.
  pub fn time_values(&self) -> BTreeMap<LoadStep, f64> {
    return self.summary.time_values();
  }
}

/// Decodes the solution summary of an open result file.
pub fn read_summary(decoder: &Decoder<'_>) -> Result<SolutionSummary> {
  decoder.expect_kind(FileKind::Result)?;
  let section = decoder.section(SectionId::Summary)?;
  let n = section.capacity_hint(SUMMARY_RECORD_BYTES);
  let summary = decode_section(
    SummaryDecoder { entries: Vec::with_capacity(n) },
    section
  )?;
  debug!(
    "Summary lists {} sets over {} steps.",
    summary.entries.len(),
    summary.steps().len()
  );
  return Ok(summary);
}

/// Works out which summary entries satisfy the requests. Fails on the first
/// request that can't be satisfied, before anything gets decoded.
fn select<'s>(
  summary: &'s SolutionSummary,
  requests: &[ResultRequest]
) -> Result<BTreeMap<(ResultKind, LoadStep), &'s SummaryEntry>> {
  let mut selected = BTreeMap::new();
  for req in requests {
    let available = summary.steps_of(req.kind);
    if available.is_empty() {
      return Err(FebinError::ResultNotAvailable {
        kind: req.kind,
        step: None
      });
    }
    if let Specifier::List(steps) = &req.steps {
      if let Some(missing) = steps.iter().find(|s| !available.contains(*s)) {
        return Err(FebinError::ResultNotAvailable {
          kind: req.kind,
          step: Some(*missing)
        });
      }
    }
    for entry in summary.entries().iter().filter(|e| e.kind == req.kind) {
      if req.steps.filter_fn(&entry.step) {
        selected.insert((entry.kind, entry.step), entry);
      }
    }
  }
  return Ok(selected);
}

/// Decodes one result set.
fn read_field(
  decoder: &Decoder<'_>,
  entry: &SummaryEntry
) -> Result<FieldResult> {
  let section = decoder.section(entry.section)?;
  let n = section.capacity_hint(4 + 8 * entry.width);
  let field = decode_section(FieldDecoder::new(*entry, n), section)?;
  debug!("Decoded {} rows of {} at {}.", field.len(), entry.kind, entry.step);
  return Ok(field);
}

/// Decodes the selected sets of a summary in parallel, each worker with its
/// own section cursor.
fn decode_requests(
  decoder: &Decoder<'_>,
  summary: SolutionSummary,
  requests: &[ResultRequest]
) -> Result<MeshResults> {
  let selected = select(&summary, requests)?;
  let fields = selected
    .into_par_iter()
    .map(|(key, entry)| read_field(decoder, entry).map(|f| (key, f)))
    .collect::<Result<BTreeMap<_, _>>>()?;
  info!("Read {} field results.", fields.len());
  return Ok(MeshResults { summary, fields });
}

/// Decodes the requested results of an open result file. Every request is
/// checked against the summary before any data section is touched, so a
/// missing set never leaves partial results behind.
pub fn read_results(
  decoder: &Decoder<'_>,
  requests: &[ResultRequest]
) -> Result<MeshResults> {
  let summary = read_summary(decoder)?;
  return decode_requests(decoder, summary, requests);
}

/// Decodes every result set of an open result file.
pub fn read_all_results(decoder: &Decoder<'_>) -> Result<MeshResults> {
  let summary = read_summary(decoder)?;
  let requests = summary.kinds()
    .into_iter()
    .map(ResultRequest::all)
    .collect::<Vec<_>>();
  return decode_requests(decoder, summary, &requests);
}
