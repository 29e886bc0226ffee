//! The gap report: a flat text listing of every requirement lacking a link
//! of a checked kind.

use std::io;

use crate::domain::{LinkKind, Repository};

/// Writes one warning line per missing link, in repository order.
///
/// Format: `[WARNING] <module>::<requirement> has no <kind> link`. A
/// requirement with blank text is exempt from every check and never appears.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_gap_report<W: io::Write>(
    out: &mut W,
    repository: &Repository,
    kinds: &[LinkKind],
) -> io::Result<()> {
    for module in repository.modules() {
        for (name, requirement) in module.requirements() {
            for &kind in kinds {
                if !requirement.is_satisfied(kind) {
                    writeln!(
                        out,
                        "[WARNING] {}::{name} has no {} link",
                        module.name(),
                        kind.label()
                    )?;
                }
            }
        }
    }
    Ok(())
}
