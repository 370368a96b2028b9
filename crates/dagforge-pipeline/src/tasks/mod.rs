//! Built-in task kinds

mod batch;
mod dbt;
mod dummy;
mod reverse_etl;
mod soda;

pub use batch::{BatchJob, BatchTask};
pub use dbt::DbtTask;
pub use dummy::DummyTask;
pub use reverse_etl::ReverseEtlTask;
pub use soda::SodaTask;
