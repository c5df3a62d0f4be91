//! Staged progress run
//!
//! Walks a list of named stages, each from 0% to 100% in steps of 10. Every
//! step yields the overall percentage and the name of the current stage, so
//! the overlay shows e.g. `[44%] Carregando Serviços`.

/// Progress points per step within one stage
pub const STEP: u32 = 10;

/// One emitted step of a staged run
#[derive(Clone, Debug, PartialEq)]
pub struct StageUpdate {
    pub index: usize,
    pub name: String,
    /// Progress within the stage, 0..=100
    pub stage_progress: u32,
    /// Overall progress, 0..=100
    pub total: f64,
}

/// Cursor over a staged run
#[derive(Clone, Debug, PartialEq)]
pub struct StageRun {
    stages: Vec<String>,
    index: usize,
    stage_progress: u32,
}

impl StageRun {
    pub fn new(stages: Vec<String>) -> Self {
        Self {
            stages,
            index: 0,
            stage_progress: 0,
        }
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.stages.len()
    }

    /// Emit the next step, or `None` once every stage reached 100%
    pub fn advance(&mut self) -> Option<StageUpdate> {
        let name = self.stages.get(self.index)?.clone();
        let count = self.stages.len() as f64;
        let base = self.index as f64 / count * 100.0;
        let share = 100.0 / count;
        let update = StageUpdate {
            index: self.index,
            name,
            stage_progress: self.stage_progress,
            total: base + f64::from(self.stage_progress) * share / 100.0,
        };

        if self.stage_progress >= 100 {
            self.index += 1;
            self.stage_progress = 0;
        } else {
            self.stage_progress += STEP;
        }
        Some(update)
    }
}

impl Iterator for StageRun {
    type Item = StageUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(names: &[&str]) -> StageRun {
        StageRun::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_eleven_steps_per_stage() {
        assert_eq!(run(&["a", "b", "c"]).count(), 33);
    }

    #[test]
    fn test_totals_are_monotonic_and_bounded() {
        let updates: Vec<_> = run(&["a", "b", "c", "d", "e"]).collect();
        assert_eq!(updates.first().unwrap().total, 0.0);
        assert!((updates.last().unwrap().total - 100.0).abs() < 1e-9);
        for pair in updates.windows(2) {
            assert!(pair[1].total >= pair[0].total);
        }
    }

    #[test]
    fn test_stage_boundaries() {
        let updates: Vec<_> = run(&["cache", "services"]).collect();
        let last_of_first = &updates[10];
        assert_eq!(last_of_first.name, "cache");
        assert_eq!(last_of_first.stage_progress, 100);
        assert!((last_of_first.total - 50.0).abs() < 1e-9);
        let first_of_second = &updates[11];
        assert_eq!(first_of_second.name, "services");
        assert_eq!(first_of_second.stage_progress, 0);
        assert!((first_of_second.total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run_is_finished() {
        let mut r = run(&[]);
        assert!(r.is_finished());
        assert_eq!(r.advance(), None);
    }
}
