use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("{option:?} is not an option for {question:?}")]
    UnknownOption {
        question: ChoiceQuestion,
        option: String,
    },

    #[error("unknown answer {raw:?}, expected Yes or No")]
    InvalidYesNo { raw: String },
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Single-choice questions across both worksheet variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChoiceQuestion {
    // progress-tracking worksheet
    SetVolume,
    DrawLiquid,
    Dispense,
    Viscous,
    // practice worksheet concept check
    WrongPipette,
    ErrorCauses,
    Bubble,
}

impl ChoiceQuestion {
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            ChoiceQuestion::SetVolume => "How do you set the volume on a micropipette?",
            ChoiceQuestion::DrawLiquid => {
                "Where should the plunger be when you put the tip into the liquid?"
            }
            ChoiceQuestion::Dispense => "How do you dispense all of the liquid from the tip?",
            ChoiceQuestion::Viscous => {
                "What is one trick for pipetting a thick, syrup-like solution accurately?"
            }
            ChoiceQuestion::WrongPipette => "What happens if you use a P1000 to pipette 20 µL?",
            ChoiceQuestion::ErrorCauses => {
                "Which of the following can cause inaccurate pipetting?"
            }
            ChoiceQuestion::Bubble => {
                "You see a bubble in your pipette tip after drawing up liquid. What should you do?"
            }
        }
    }

    #[must_use]
    pub fn options(self) -> &'static [&'static str] {
        match self {
            ChoiceQuestion::SetVolume => &[
                "Turn the volume adjustment knob until the display shows the target volume",
                "Push the plunger to the second stop",
                "Press the tip ejector button",
                "The volume is fixed and cannot be changed",
            ],
            ChoiceQuestion::DrawLiquid => &[
                "Pressed to the first stop",
                "Pressed to the second stop",
                "Fully released",
                "It does not matter",
            ],
            ChoiceQuestion::Dispense => &[
                "Press to the first stop only",
                "Press to the first stop, then on to the second stop",
                "Eject the tip into the tube",
                "Shake the pipette over the tube",
            ],
            ChoiceQuestion::Viscous => &[
                "Pipette slowly and pause before releasing the plunger",
                "Pipette as fast as possible",
                "Draw up from the second stop",
                "Use the largest pipette available",
            ],
            ChoiceQuestion::WrongPipette => &[
                "It works perfectly",
                "It’s less accurate than using a P20",
                "It delivers more than you set it to",
                "Nothing happens",
            ],
            ChoiceQuestion::ErrorCauses => &[
                "Pushing the plunger to the second stop before drawing up liquid",
                "Using the wrong tip",
                "Not fully inserting the tip",
                "All of the above",
            ],
            ChoiceQuestion::Bubble => &[
                "Just dispense it, close enough",
                "Shake the pipette",
                "Eject the liquid and try again",
                "Tap it to remove the bubble",
            ],
        }
    }

    /// Resolve the option text the learner picked.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownOption` if `option` is not one of the choices.
    pub fn resolve(self, option: &str) -> Result<&'static str, QuizError> {
        self.options()
            .iter()
            .copied()
            .find(|candidate| *candidate == option)
            .ok_or_else(|| QuizError::UnknownOption {
                question: self,
                option: option.to_string(),
            })
    }
}

/// Short free-text questions from the practice concept check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextQuestion {
    StopDifference,
    ViscousTrick,
}

impl TextQuestion {
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            TextQuestion::StopDifference => {
                "Describe the difference between the first stop and second stop when using a micropipette."
            }
            TextQuestion::ViscousTrick => {
                "You’re pipetting a thick syrup-like solution. What’s one trick you can use to make pipetting more accurate?"
            }
        }
    }
}

//
// ─── YES / NO ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    /// Parses `Yes`/`No`, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidYesNo` for anything else.
    pub fn parse(raw: &str) -> Result<Self, QuizError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            _ => Err(QuizError::InvalidYesNo {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Everything the learner has answered so far.
///
/// Choice answers are stored as the exact option text; restoring from a
/// snapshot re-checks each one against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedAnswers", into = "PersistedAnswers")]
pub struct QuizAnswers {
    choices: BTreeMap<ChoiceQuestion, &'static str>,
    texts: BTreeMap<TextQuestion, String>,
    mistakes_acknowledged: Option<YesNo>,
}

impl QuizAnswers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or change) the option chosen for `question`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownOption` when `option` is not offered.
    pub fn answer_choice(
        &mut self,
        question: ChoiceQuestion,
        option: &str,
    ) -> Result<&'static str, QuizError> {
        let resolved = question.resolve(option)?;
        self.choices.insert(question, resolved);
        Ok(resolved)
    }

    pub fn answer_text(&mut self, question: TextQuestion, text: impl Into<String>) {
        self.texts.insert(question, text.into());
    }

    pub fn acknowledge_mistakes(&mut self, answer: YesNo) {
        self.mistakes_acknowledged = Some(answer);
    }

    #[must_use]
    pub fn choice(&self, question: ChoiceQuestion) -> Option<&'static str> {
        self.choices.get(&question).copied()
    }

    pub fn choices(&self) -> impl Iterator<Item = (ChoiceQuestion, &'static str)> + '_ {
        self.choices.iter().map(|(q, option)| (*q, *option))
    }

    pub fn texts(&self) -> impl Iterator<Item = (TextQuestion, &str)> + '_ {
        self.texts.iter().map(|(q, text)| (*q, text.as_str()))
    }

    #[must_use]
    pub fn text(&self, question: TextQuestion) -> Option<&str> {
        self.texts.get(&question).map(String::as_str)
    }

    #[must_use]
    pub fn mistakes_acknowledged(&self) -> Option<YesNo> {
        self.mistakes_acknowledged
    }
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedAnswers {
    #[serde(default)]
    choices: BTreeMap<ChoiceQuestion, String>,
    #[serde(default)]
    texts: BTreeMap<TextQuestion, String>,
    #[serde(default)]
    mistakes_acknowledged: Option<YesNo>,
}

impl TryFrom<PersistedAnswers> for QuizAnswers {
    type Error = QuizError;

    fn try_from(raw: PersistedAnswers) -> Result<Self, Self::Error> {
        let mut answers = QuizAnswers {
            texts: raw.texts,
            mistakes_acknowledged: raw.mistakes_acknowledged,
            ..QuizAnswers::default()
        };
        for (question, option) in raw.choices {
            answers.answer_choice(question, &option)?;
        }
        Ok(answers)
    }
}

impl From<QuizAnswers> for PersistedAnswers {
    fn from(answers: QuizAnswers) -> Self {
        Self {
            choices: answers
                .choices
                .into_iter()
                .map(|(question, option)| (question, option.to_string()))
                .collect(),
            texts: answers.texts,
            mistakes_acknowledged: answers.mistakes_acknowledged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_question_offers_four_distinct_options() {
        for question in [
            ChoiceQuestion::SetVolume,
            ChoiceQuestion::DrawLiquid,
            ChoiceQuestion::Dispense,
            ChoiceQuestion::Viscous,
            ChoiceQuestion::WrongPipette,
            ChoiceQuestion::ErrorCauses,
            ChoiceQuestion::Bubble,
        ] {
            let options = question.options();
            assert_eq!(options.len(), 4, "{question:?}");
            for (i, a) in options.iter().enumerate() {
                assert!(!options[i + 1..].contains(a), "{question:?} repeats {a}");
            }
        }
    }

    #[test]
    fn answers_must_be_offered_options() {
        let mut answers = QuizAnswers::new();
        let err = answers
            .answer_choice(ChoiceQuestion::Bubble, "Ignore it")
            .unwrap_err();
        assert!(matches!(err, QuizError::UnknownOption { .. }));
        assert_eq!(answers.choice(ChoiceQuestion::Bubble), None);

        answers
            .answer_choice(ChoiceQuestion::Bubble, "Eject the liquid and try again")
            .unwrap();
        assert_eq!(
            answers.choice(ChoiceQuestion::Bubble),
            Some("Eject the liquid and try again")
        );
    }

    #[test]
    fn changing_an_answer_replaces_it() {
        let mut answers = QuizAnswers::new();
        answers
            .answer_choice(ChoiceQuestion::DrawLiquid, "Fully released")
            .unwrap();
        answers
            .answer_choice(ChoiceQuestion::DrawLiquid, "Pressed to the first stop")
            .unwrap();
        assert_eq!(
            answers.choice(ChoiceQuestion::DrawLiquid),
            Some("Pressed to the first stop")
        );
    }

    #[test]
    fn yes_no_parsing_is_lenient_about_case() {
        assert_eq!(YesNo::parse(" yes "), Ok(YesNo::Yes));
        assert_eq!(YesNo::parse("NO"), Ok(YesNo::No));
        assert!(YesNo::parse("maybe").is_err());
    }

    #[test]
    fn restoring_answers_rechecks_options() {
        let json = r#"{"choices":{"SetVolume":"Spin it"}}"#;
        assert!(serde_json::from_str::<QuizAnswers>(json).is_err());

        let mut answers = QuizAnswers::new();
        answers
            .answer_choice(ChoiceQuestion::Dispense, "Press to the first stop only")
            .unwrap();
        answers.answer_text(TextQuestion::ViscousTrick, "go slow");
        answers.acknowledge_mistakes(YesNo::Yes);

        let restored: QuizAnswers =
            serde_json::from_str(&serde_json::to_string(&answers).unwrap()).unwrap();
        assert_eq!(restored, answers);
    }
}
