pub mod artifact;
pub mod loaders;
pub mod plan;
pub mod record;
pub mod rubric;

pub use artifact::{Artifact, Origin};
pub use loaders::{load_run_plan, parse_run_plan};
pub use plan::{OracleFixture, RunPlan};
pub use record::{GradeOutcome, PerItemScore, RecordStatus, RunReport, RunStatus, ScoreRecord};
pub use rubric::{DifficultyTier, RubricConfig, RubricInput, ScoringStrategy};
