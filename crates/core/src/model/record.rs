use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::instrument::Instrument;
use crate::model::quiz::{ChoiceQuestion, YesNo};
use crate::stats::DerivedStatistics;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A field the progress sheet requires but the session never filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MissingField {
    Name,
    Answer(ChoiceQuestion),
    MistakesAcknowledged,
    Statistics(Instrument),
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Name => f.write_str("learner name"),
            MissingField::Answer(question) => write!(f, "answer to {question:?}"),
            MissingField::MistakesAcknowledged => f.write_str("mistakes acknowledgement"),
            MissingField::Statistics(instrument) => write!(f, "{instrument} measurements"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("progress record is missing: {}", join_missing(.0))]
    MissingData(Vec<MissingField>),

    #[error("reflection {index} does not exist (the sheet has 2)")]
    ReflectionOutOfRange { index: usize },
}

fn join_missing(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//
// ─── COLUMNS ───────────────────────────────────────────────────────────────────
//

/// Number of reflection columns on the progress sheet.
pub const REFLECTION_COLUMNS: usize = 2;

/// Progress sheet columns, in the order they are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Partner,
    SetVolumeAnswer,
    DrawLiquidAnswer,
    DispenseAnswer,
    ViscousAnswer,
    MistakesAcknowledged,
    P20Mean,
    P20StdDev,
    P200Mean,
    P200StdDev,
    P1000Mean,
    P1000StdDev,
    Reflection1,
    Reflection2,
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::Name,
        Column::Partner,
        Column::SetVolumeAnswer,
        Column::DrawLiquidAnswer,
        Column::DispenseAnswer,
        Column::ViscousAnswer,
        Column::MistakesAcknowledged,
        Column::P20Mean,
        Column::P20StdDev,
        Column::P200Mean,
        Column::P200StdDev,
        Column::P1000Mean,
        Column::P1000StdDev,
        Column::Reflection1,
        Column::Reflection2,
    ];

    /// Header text as it appears in the sheet's first row.
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Partner => "Partner",
            Column::SetVolumeAnswer => "SetVolumeAnswer",
            Column::DrawLiquidAnswer => "DrawLiquidAnswer",
            Column::DispenseAnswer => "DispenseAnswer",
            Column::ViscousAnswer => "ViscousAnswer",
            Column::MistakesAcknowledged => "MistakesAcknowledged",
            Column::P20Mean => "P20Mean",
            Column::P20StdDev => "P20StdDev",
            Column::P200Mean => "P200Mean",
            Column::P200StdDev => "P200StdDev",
            Column::P1000Mean => "P1000Mean",
            Column::P1000StdDev => "P1000StdDev",
            Column::Reflection1 => "Reflection1",
            Column::Reflection2 => "Reflection2",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    fn for_answer(question: ChoiceQuestion) -> Option<Self> {
        match question {
            ChoiceQuestion::SetVolume => Some(Column::SetVolumeAnswer),
            ChoiceQuestion::DrawLiquid => Some(Column::DrawLiquidAnswer),
            ChoiceQuestion::Dispense => Some(Column::DispenseAnswer),
            ChoiceQuestion::Viscous => Some(Column::ViscousAnswer),
            _ => None,
        }
    }

    fn for_statistics(instrument: Instrument) -> (Self, Self) {
        match instrument {
            Instrument::P20 => (Column::P20Mean, Column::P20StdDev),
            Instrument::P200 => (Column::P200Mean, Column::P200StdDev),
            Instrument::P1000 => (Column::P1000Mean, Column::P1000StdDev),
        }
    }
}

//
// ─── CELLS ─────────────────────────────────────────────────────────────────────
//

/// A single scalar written to the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Number(_) => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One learner's finished session, laid out as a sheet row.
///
/// Only `ProgressRecordBuilder::build` creates one, so every required cell is
/// present and the cell order always matches `Column::ALL`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    cells: Vec<CellValue>,
}

impl ProgressRecord {
    #[must_use]
    pub fn builder() -> ProgressRecordBuilder {
        ProgressRecordBuilder::default()
    }

    #[must_use]
    pub fn get(&self, column: Column) -> &CellValue {
        &self.cells[column.index()]
    }

    /// Cells in sheet column order.
    #[must_use]
    pub fn values(&self) -> &[CellValue] {
        &self.cells
    }

    /// Column header paired with its value.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &CellValue)> {
        Column::ALL
            .into_iter()
            .map(Column::header)
            .zip(self.cells.iter())
    }
}

/// Collects progress fields and checks completeness in one place.
#[derive(Debug, Clone, Default)]
pub struct ProgressRecordBuilder {
    name: Option<String>,
    partner: String,
    answers: [Option<&'static str>; 4],
    mistakes_acknowledged: Option<YesNo>,
    statistics: [Option<DerivedStatistics>; 3],
    reflections: [String; REFLECTION_COLUMNS],
}

impl ProgressRecordBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = partner.into();
        self
    }

    /// Answers to questions that have no progress column are ignored.
    #[must_use]
    pub fn answer(mut self, question: ChoiceQuestion, option: &'static str) -> Self {
        if let Some(column) = Column::for_answer(question) {
            self.answers[column.index() - Column::SetVolumeAnswer.index()] = Some(option);
        }
        self
    }

    #[must_use]
    pub fn mistakes_acknowledged(mut self, answer: YesNo) -> Self {
        self.mistakes_acknowledged = Some(answer);
        self
    }

    #[must_use]
    pub fn statistics(mut self, instrument: Instrument, stats: DerivedStatistics) -> Self {
        self.statistics[instrument_slot(instrument)] = Some(stats);
        self
    }

    /// # Errors
    ///
    /// Returns `RecordError::ReflectionOutOfRange` past the last reflection column.
    pub fn reflection(
        mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let slot = self
            .reflections
            .get_mut(index)
            .ok_or(RecordError::ReflectionOutOfRange { index })?;
        *slot = text.into();
        Ok(self)
    }

    /// Fill reflection columns in order; text beyond the last column is dropped.
    #[must_use]
    pub fn reflections(mut self, texts: impl IntoIterator<Item = String>) -> Self {
        for (slot, text) in self.reflections.iter_mut().zip(texts) {
            *slot = text;
        }
        self
    }

    /// Lay the fields out as a row.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::MissingData` naming every required field that is
    /// absent. A name that is only whitespace counts as absent.
    pub fn build(self) -> Result<ProgressRecord, RecordError> {
        let mut missing = Vec::new();

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if name.is_none() {
            missing.push(MissingField::Name);
        }

        let questions = [
            ChoiceQuestion::SetVolume,
            ChoiceQuestion::DrawLiquid,
            ChoiceQuestion::Dispense,
            ChoiceQuestion::Viscous,
        ];
        for (question, answer) in questions.iter().zip(self.answers.iter()) {
            if answer.is_none() {
                missing.push(MissingField::Answer(*question));
            }
        }
        if self.mistakes_acknowledged.is_none() {
            missing.push(MissingField::MistakesAcknowledged);
        }
        for instrument in Instrument::ALL {
            if self.statistics[instrument_slot(instrument)].is_none() {
                missing.push(MissingField::Statistics(instrument));
            }
        }

        if !missing.is_empty() {
            return Err(RecordError::MissingData(missing));
        }

        let mut cells = Vec::with_capacity(Column::ALL.len());
        cells.push(CellValue::Text(name.unwrap_or_default()));
        cells.push(CellValue::Text(self.partner.trim().to_string()));
        for answer in self.answers {
            cells.push(CellValue::Text(answer.unwrap_or_default().to_string()));
        }
        cells.push(CellValue::Text(
            self.mistakes_acknowledged
                .map(YesNo::label)
                .unwrap_or_default()
                .to_string(),
        ));
        for instrument in Instrument::ALL {
            let (mean_col, std_col) = Column::for_statistics(instrument);
            debug_assert_eq!(cells.len(), mean_col.index());
            debug_assert_eq!(cells.len() + 1, std_col.index());
            let stats = self.statistics[instrument_slot(instrument)].unwrap_or(DerivedStatistics {
                mean: 0.0,
                std_dev: 0.0,
            });
            cells.push(CellValue::Number(stats.mean));
            cells.push(CellValue::Number(stats.std_dev));
        }
        for reflection in self.reflections {
            cells.push(CellValue::Text(reflection));
        }

        Ok(ProgressRecord { cells })
    }
}

fn instrument_slot(instrument: Instrument) -> usize {
    match instrument {
        Instrument::P20 => 0,
        Instrument::P200 => 1,
        Instrument::P1000 => 2,
    }
}
