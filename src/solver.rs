use crate::pbo::SolverReport;
use crate::prelude::*;
use std::path::Path;
use std::process::Command;

/// Splits a configured solver command string into an argv. The solver
/// command in practice is a fixed argv, not a shell pipeline -- this is a
/// deliberate simplification over `original_source`'s
/// `subprocess.check_call(..., shell=True)` (see DESIGN.md).
fn split_argv(command: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    if parts.is_empty() {
        bail!(ResolverError::InvalidInput("solver command is empty".to_string()));
    }
    Ok(parts)
}

/// Invokes the external PBO solver (spec.md §6): run it against `opb_path`,
/// capture stdout verbatim, and parse the `s `/`v ` report lines out of it.
pub fn run(solver_cmd: &str, opb_path: &Path) -> Result<SolverReport> {
    let argv = split_argv(solver_cmd)?;
    let (program, rest) = argv.split_first().expect("split_argv never returns empty");

    let output = Command::new(program)
        .args(rest)
        .arg(opb_path)
        .output()
        .with_context(|| format!("invoking solver command {:?}", solver_cmd))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(SolverReport::parse(&stdout))
}
