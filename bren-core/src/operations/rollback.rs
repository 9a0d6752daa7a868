use crate::output::RollbackResult;
use crate::rollback::rollback;
use anyhow::Result;
use std::path::Path;

/// High-level rollback operation - equivalent to `bren --rollback LOG`
pub fn rollback_operation(log: &Path) -> Result<RollbackResult> {
    let result = rollback(log)?;
    if !result.failed.is_empty() {
        tracing::warn!(
            "{} of {} entries could not be rolled back",
            result.failed.len(),
            result.failed.len() + result.restored.len() + result.skipped.len()
        );
    }
    Ok(result)
}
