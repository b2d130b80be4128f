pub mod monitors;
pub mod record;
pub mod status;
pub mod verify;

use std::sync::Arc;

use lapse_capture_engine::backend::{available_backends, backend_by_name, CaptureBackend};
use lapse_capture_engine::SyntheticBackend;

/// Pick the capture backend; `--layout` only makes sense for `synthetic`.
///
/// A configured `xcap` backend falls back to `synthetic` when this build
/// was compiled without it.
pub(crate) fn resolve_backend(
    name: &str,
    layout: Option<&str>,
) -> anyhow::Result<Arc<dyn CaptureBackend>> {
    match (name, layout) {
        ("synthetic", Some(layout)) => Ok(Arc::new(SyntheticBackend::from_layout(layout)?)),
        (other, Some(_)) => anyhow::bail!("--layout requires --backend synthetic (got '{other}')"),
        ("xcap", None) if !available_backends().contains(&"xcap") => {
            tracing::warn!("Built without the xcap feature; using the synthetic backend");
            Ok(Arc::new(SyntheticBackend::default()))
        }
        (name, None) => Ok(backend_by_name(name)?),
    }
}
