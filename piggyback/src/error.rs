pub type PiggybackResult<T> = anyhow::Result<T>;
pub type DFResult<T> = datafusion_common::Result<T>;
