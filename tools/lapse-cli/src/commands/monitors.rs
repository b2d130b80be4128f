//! List detected monitors.

use lapse_capture_engine::TopologySnapshot;
use lapse_platform_core::virtual_desktop_bounds;

pub fn run(backend: &str, layout: Option<&str>) -> anyhow::Result<()> {
    let backend = super::resolve_backend(backend, layout)?;
    let monitors = backend.detect_monitors()?;

    println!("Backend: {}", backend.name());
    println!("[OK] Monitors detected: {}", monitors.len());
    for m in &monitors {
        println!(
            "     {} {}x{} at ({}, {}) {}",
            m.name,
            m.width,
            m.height,
            m.x,
            m.y,
            if m.primary { "(primary)" } else { "" }
        );
    }

    let snapshot = TopologySnapshot::from_monitors(&monitors);
    if snapshot.len() < monitors.len() {
        println!(
            "[WARN] {} monitor(s) share geometry with another and will not be captured",
            monitors.len() - snapshot.len()
        );
    }

    println!();
    println!("Directory keys:");
    for record in snapshot.records() {
        println!("     {} ({})", record.identity, record.info.name);
    }
    if let Some(bounds) = virtual_desktop_bounds(&monitors) {
        println!(
            "\nVirtual desktop: {}x{} at ({}, {})",
            bounds.width, bounds.height, bounds.x, bounds.y
        );
    }
    Ok(())
}
