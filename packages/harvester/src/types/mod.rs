//! Domain types for the pipeline.

pub mod enrichment;
pub mod posting;
pub mod report;
pub mod source;

pub use enrichment::{
    Category, ContractType, Enrichment, SalaryEstimate, Seniority, TechStackEntry, WorkFormat,
};
pub use posting::{DetailFields, JobPosting, SalaryRange, StubPosting};
pub use report::{PipelineStats, RunReport};
pub use source::SourceRecord;
