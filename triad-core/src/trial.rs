use std::borrow::Cow;
use std::time::Duration;

use crate::{Atom, StimulusSet, TaskPhase};

/// Written in place of any field that does not apply to a record's phase.
pub const NOT_APPLICABLE: &str = "NaN";

/// Three distinct stimuli, stored as ascending indices into the run's
/// [`StimulusSet`]. Ascending order makes derived equality set equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple([usize; 3]);

impl Triple {
    /// Returns `None` unless the three indices are distinct.
    pub fn new(a: usize, b: usize, c: usize) -> Option<Self> {
        let mut idx = [a, b, c];
        idx.sort_unstable();
        (idx[0] != idx[1] && idx[1] != idx[2]).then_some(Self(idx))
    }

    pub fn indices(&self) -> [usize; 3] {
        self.0
    }

    pub fn ids(&self, stimuli: &StimulusSet) -> [Atom; 3] {
        self.0.map(|i| stimuli[i].id().clone())
    }
}

/// What the participant did on a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Zero-based position of the chosen item on screen.
    Choice(usize),
    Text(String),
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::Text(_) => "text",
        }
    }
}

/// One row of the data file. `None` fields are written as [`NOT_APPLICABLE`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub phase: TaskPhase,
    pub trial_num: Option<usize>,
    pub items: Option<[Atom; 3]>,
    pub response: Option<Atom>,
    pub reaction_time: Option<Duration>,
    pub stimulus: Option<Atom>,
    pub descriptor: Option<String>,
}

impl TrialRecord {
    pub const COLUMNS: [&'static str; 9] = [
        "phase",
        "trial_num",
        "item1",
        "item2",
        "item3",
        "response",
        "reaction_time",
        "stimulus",
        "descriptor",
    ];

    pub fn choice(
        phase: TaskPhase,
        trial_num: usize,
        items: [Atom; 3],
        response: Atom,
        reaction_time: Option<Duration>,
    ) -> Self {
        Self {
            phase,
            trial_num: Some(trial_num),
            items: Some(items),
            response: Some(response),
            reaction_time,
            stimulus: None,
            descriptor: None,
        }
    }

    /// Blank text (after trimming) becomes a missing descriptor, never a dropped row.
    pub fn descriptor(stimulus: Atom, text: &str, reaction_time: Option<Duration>) -> Self {
        let text = text.trim();
        Self {
            phase: TaskPhase::Descriptor,
            trial_num: None,
            items: None,
            response: None,
            reaction_time,
            stimulus: Some(stimulus),
            descriptor: (!text.is_empty()).then(|| text.to_string()),
        }
    }

    /// Field values in [`Self::COLUMNS`] order, unescaped.
    pub fn fields(&self) -> [Cow<'_, str>; 9] {
        fn atom(a: Option<&Atom>) -> Cow<'_, str> {
            a.map_or(Cow::Borrowed(NOT_APPLICABLE), |a| Cow::Borrowed(&**a))
        }

        let item = move |i: usize| atom(self.items.as_ref().map(|items| &items[i]));

        [
            Cow::Borrowed(self.phase.as_str()),
            self.trial_num
                .map_or(Cow::Borrowed(NOT_APPLICABLE), |n| Cow::Owned(n.to_string())),
            item(0),
            item(1),
            item(2),
            atom(self.response.as_ref()),
            self.reaction_time.map_or(Cow::Borrowed(NOT_APPLICABLE), |rt| {
                Cow::Owned(rt.as_secs_f64().to_string())
            }),
            atom(self.stimulus.as_ref()),
            self.descriptor
                .as_deref()
                .map_or(Cow::Borrowed(NOT_APPLICABLE), Cow::Borrowed),
        ]
    }
}
