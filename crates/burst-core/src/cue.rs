//! Minimal cue sheet for the opening sequence.
//!
//! The page's real choreography lives in an external timeline; this only
//! replays the effect cues of the opening so the effects can run standalone.

use crate::constants::{OPENING_BURST_AT, OPENING_MUSIC_AT};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueAction {
    /// Firecracker audio and particles together.
    Burst,
    BackgroundMusic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cue {
    /// Seconds since the sheet started.
    pub at: f64,
    pub action: CueAction,
}

#[derive(Clone, Debug)]
pub struct CueSheet {
    cues: Vec<Cue>,
    next: usize,
}

impl CueSheet {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { cues, next: 0 }
    }

    /// Burst at 0.5 s, music with the headline at 1.8 s.
    pub fn opening() -> Self {
        Self::new(vec![
            Cue {
                at: OPENING_BURST_AT,
                action: CueAction::Burst,
            },
            Cue {
                at: OPENING_MUSIC_AT,
                action: CueAction::BackgroundMusic,
            },
        ])
    }

    /// Cues that have come due by `elapsed` seconds, each returned once.
    pub fn due(&mut self, elapsed: f64) -> SmallVec<[CueAction; 2]> {
        let mut out = SmallVec::new();
        while let Some(cue) = self.cues.get(self.next) {
            if cue.at > elapsed {
                break;
            }
            out.push(cue.action);
            self.next += 1;
        }
        out
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.cues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_fires_each_cue_once_in_order() {
        let mut sheet = CueSheet::opening();
        assert!(sheet.due(0.2).is_empty());
        assert_eq!(sheet.due(0.5).as_slice(), &[CueAction::Burst]);
        assert!(sheet.due(1.0).is_empty());
        assert!(!sheet.is_finished());
        assert_eq!(sheet.due(5.0).as_slice(), &[CueAction::BackgroundMusic]);
        assert!(sheet.is_finished());
        assert!(sheet.due(10.0).is_empty());
    }

    #[test]
    fn late_poll_delivers_everything_due() {
        let mut sheet = CueSheet::opening();
        assert_eq!(
            sheet.due(3.0).as_slice(),
            &[CueAction::Burst, CueAction::BackgroundMusic]
        );
    }
}
