use anyhow::Result;
use bren_core::{rollback_operation, InvalidArgument, OutputFormatter};
use std::path::Path;

use crate::cli::Cli;

/// Rollback stands alone: no match, actions or archive alongside it
pub fn check_standalone(cli: &Cli) -> Result<(), InvalidArgument> {
    if cli.match_spec.is_some() || cli.actions.any() || cli.archive.is_some() {
        return Err(InvalidArgument::RollbackCombined);
    }
    Ok(())
}

/// Returns whether every entry was restored or skipped
pub fn handle_rollback(cli: &Cli, log: &Path) -> Result<bool> {
    check_standalone(cli)?;
    let result = rollback_operation(log)?;

    println!("{}", result.format(cli.output.into()).trim_end());

    Ok(result.failed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_rollback_cannot_be_combined() {
        let cli = Cli::try_parse_from(["bren", "--rollback", "x.log", "--append", "_x"]).unwrap();
        assert_eq!(check_standalone(&cli), Err(InvalidArgument::RollbackCombined));

        let cli = Cli::try_parse_from(["bren", "--rollback", "x.log", "-m", "prefix:a"]).unwrap();
        assert_eq!(check_standalone(&cli), Err(InvalidArgument::RollbackCombined));

        let cli = Cli::try_parse_from(["bren", "--rollback", "x.log"]).unwrap();
        assert!(check_standalone(&cli).is_ok());
    }
}
