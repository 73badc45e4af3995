use std::{fmt, str::FromStr};

/// Hidden state labels emitted by the read-depth HMM decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Tuf,
    TufDup,
    NormalI,
    NormalII,
    Deletion,
    Duplication,
    Gap,
}

impl State {
    pub const ALL: [State; 7] = [
        State::Tuf,
        State::TufDup,
        State::NormalI,
        State::NormalII,
        State::Deletion,
        State::Duplication,
        State::Gap,
    ];

    /// Folds the legacy synonyms into the five classes used by segmentation.
    pub fn canonical(self) -> State {
        match self {
            State::TufDup => State::Tuf,
            State::NormalII => State::NormalI,
            other => other,
        }
    }

    pub fn is_canonical(self) -> bool {
        self.canonical() == self
    }

    /// Track value written to `viterbi.bedgraph` for the raw decoder label.
    pub fn bedgraph_code(self) -> u8 {
        match self {
            State::Tuf => 10,
            State::TufDup => 12,
            State::Deletion => 30,
            State::NormalI => 40,
            State::NormalII => 42,
            State::Duplication => 50,
            State::Gap => 0,
        }
    }

    pub fn from_bedgraph_code(code: u8) -> Option<State> {
        State::ALL.into_iter().find(|s| s.bedgraph_code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            State::Tuf => "TUF",
            State::TufDup => "TUFDUP",
            State::NormalI => "Normal-I",
            State::NormalII => "Normal-II",
            State::Deletion => "Deletion",
            State::Duplication => "Duplication",
            State::Gap => "GAP_STATE",
        }
    }
}

impl FromStr for State {
    type Err = String;
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|s| s.name() == label)
            .ok_or_else(|| format!("Unknown state label: '{}'", label))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
