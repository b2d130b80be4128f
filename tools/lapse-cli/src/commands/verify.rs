//! Check directory alignment.

use std::path::PathBuf;

use lapse_frame_store::{scan_root, Misalignment};

pub fn run(root: PathBuf) -> anyhow::Result<()> {
    println!("Verifying capture root: {}", root.display());

    let state = scan_root(&root)?;
    let issues = state.misalignments();
    let mut diverged = 0usize;

    for issue in &issues {
        match issue {
            Misalignment::Behind { directory, len, max } => {
                println!(
                    "  [INFO] {directory}: {len} of {max} frames (monitor detached or lagging)"
                );
            }
            Misalignment::Diverged {
                directory,
                index,
                expected,
                found,
            } => {
                diverged += 1;
                println!("  [FAIL] {directory}: frame {index} is {found}, expected {expected}");
            }
        }
    }

    if diverged > 0 {
        anyhow::bail!("{diverged} directory(ies) are not index-aligned");
    }

    println!(
        "\n{} directory(ies) aligned, MaxFrameCount {}.",
        state.directories.len(),
        state.max_frame_count()
    );
    Ok(())
}
