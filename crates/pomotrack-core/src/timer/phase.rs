use serde::{Deserialize, Serialize};

/// One of the three kinds of timed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Work)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "shortBreak",
            Phase::LongBreak => "longBreak",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// Phase that follows `current`.
///
/// `completed_work_sessions` must already include the session that is ending
/// when `current` is [`Phase::Work`]. A zero cadence is treated as one.
pub fn next_phase(current: Phase, completed_work_sessions: u32, sessions_before_long_break: u32) -> Phase {
    match current {
        Phase::Work => {
            let cadence = sessions_before_long_break.max(1);
            if completed_work_sessions % cadence == 0 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Work,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaks_always_return_to_work() {
        assert_eq!(next_phase(Phase::ShortBreak, 3, 4), Phase::Work);
        assert_eq!(next_phase(Phase::LongBreak, 4, 4), Phase::Work);
    }

    #[test]
    fn fourth_work_session_earns_long_break() {
        let seq: Vec<Phase> = (1..=8).map(|n| next_phase(Phase::Work, n, 4)).collect();
        assert_eq!(
            seq,
            vec![
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
            ]
        );
    }

    #[test]
    fn cadence_of_one_always_long() {
        assert_eq!(next_phase(Phase::Work, 1, 1), Phase::LongBreak);
        assert_eq!(next_phase(Phase::Work, 7, 1), Phase::LongBreak);
    }

    #[test]
    fn default_phase_is_work() {
        assert_eq!(Phase::default(), Phase::Work);
    }

    #[test]
    fn serde_names_match_history_format() {
        assert_eq!(serde_json::to_string(&Phase::ShortBreak).unwrap(), "\"shortBreak\"");
        let parsed: Phase = serde_json::from_str("\"longBreak\"").unwrap();
        assert_eq!(parsed, Phase::LongBreak);
    }
}
