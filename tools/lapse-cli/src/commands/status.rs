//! Show what is on disk under a capture root.

use std::path::PathBuf;

use lapse_frame_store::scan_root;
use lapse_platform_core::MonitorIdentity;

pub fn run(root: PathBuf) -> anyhow::Result<()> {
    let state = scan_root(&root)?;
    println!("Capture root: {}", root.display());

    if state.directories.is_empty() {
        println!("  No monitor directories yet.");
        return Ok(());
    }

    let max = state.max_frame_count();
    for (name, seq) in &state.directories {
        let geometry = MonitorIdentity::parse(name)
            .map(|id| format!("{}x{} @ ({}, {})", id.width, id.height, id.x, id.y))
            .unwrap_or_else(|| "unknown geometry".to_string());
        let marker = if seq.len() < max { "  (behind)" } else { "" };
        println!(
            "  {name}: {} frame(s), {} filler(s), {geometry}{marker}",
            seq.len(),
            seq.filler_count()
        );
    }

    println!();
    println!("MaxFrameCount: {max}");
    if let Some((name, seq)) = state.representative() {
        let first = seq.frames.first().map(|f| f.timestamp.as_str()).unwrap_or("-");
        let last = seq.frames.last().map(|f| f.timestamp.as_str()).unwrap_or("-");
        println!("Representative: {name} ({first} .. {last})");
    }
    Ok(())
}
