pub mod annotation;
pub mod artifacts;
pub mod checks;
pub mod config;
pub mod error;
pub mod genome;
pub mod pipeline;
pub mod scenario;
pub mod suite;
pub mod vcf;


pub use config::RunConfig;
pub use error::{FailureKind, HarnessError};
pub use genome::{ChromNaming, GenomeBuild};
pub use scenario::{Input, Scenario, ScenarioOutcome};
pub use suite::{Suite, SuiteReport};
pub use vcf::{VcfRecord, VcfText};
