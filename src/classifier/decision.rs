//! Processing decision gate ( "Processing decision").

use super::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    CanProcess,
    CanProcessWithUnknowns,
    ManualRequired,
}

#[derive(Debug, Clone)]
pub struct ProcessingDecision {
    pub status: ProcessingStatus,
    pub confidence: u8,
}

/// Binary gate: requires a main movie and a TMDB id. Unknown files never
/// block `CAN_PROCESS`; they only downgrade the reported confidence.
pub fn decide(classification: &Classification) -> ProcessingDecision {
    let has_main = classification.main_movie.is_some();
    let has_tmdb = classification.tmdb_id.is_some();

    if !has_main || !has_tmdb {
        return ProcessingDecision { status: ProcessingStatus::ManualRequired, confidence: 0 };
    }

    if classification.unknown.is_empty() {
        ProcessingDecision { status: ProcessingStatus::CanProcess, confidence: 100 }
    } else {
        ProcessingDecision { status: ProcessingStatus::CanProcessWithUnknowns, confidence: 80 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MainMovie;

    #[test]
    fn missing_tmdb_id_forces_manual_required() {
        let classification = Classification {
            main_movie: Some(MainMovie { path: "/m/a.mkv".into(), duration_secs: 7200.0, confidence: 100 }),
            ..Default::default()
        };
        let decision = decide(&classification);
        assert_eq!(decision.status, ProcessingStatus::ManualRequired);
    }

    #[test]
    fn unknown_files_downgrade_but_do_not_block() {
        let classification = Classification {
            main_movie: Some(MainMovie { path: "/m/a.mkv".into(), duration_secs: 7200.0, confidence: 100 }),
            tmdb_id: Some(27205),
            unknown: vec!["/m/weird.xyz".into()],
            ..Default::default()
        };
        let decision = decide(&classification);
        assert_eq!(decision.status, ProcessingStatus::CanProcessWithUnknowns);
        assert_eq!(decision.confidence, 80);
    }

    #[test]
    fn clean_classification_can_process_at_full_confidence() {
        let classification = Classification {
            main_movie: Some(MainMovie { path: "/m/a.mkv".into(), duration_secs: 7200.0, confidence: 100 }),
            tmdb_id: Some(27205),
            ..Default::default()
        };
        let decision = decide(&classification);
        assert_eq!(decision.status, ProcessingStatus::CanProcess);
        assert_eq!(decision.confidence, 100);
    }
}
