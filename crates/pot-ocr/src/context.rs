use pot_ocr_core::{ServiceConfig, SystemHost};
use std::path::{Path, PathBuf};

/// Plugin directory used when nothing else contains the service script
pub fn default_plugin_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("pot-ocr").join("plugin"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Find the directory holding the service script.
///
/// Order: explicit flag, `POT_OCR_PLUGIN_DIR`, the data dir, the executable's
/// directory, then development paths. Falls back to the data dir even when the
/// script is missing so the launch error names a real path.
pub fn resolve_plugin_dir(explicit: Option<PathBuf>, script: &str) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Ok(dir) = std::env::var("POT_OCR_PLUGIN_DIR") {
        return PathBuf::from(dir);
    }

    let mut candidates = vec![default_plugin_dir()];
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("plugin"));
        candidates.push(exe_dir);
    }
    candidates.push(PathBuf::from("plugin"));
    candidates.push(PathBuf::from("../plugin"));

    find_script_dir(&candidates, script).unwrap_or_else(default_plugin_dir)
}

fn find_script_dir(candidates: &[PathBuf], script: &str) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| dir.join(script).is_file())
        .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.clone()))
}

pub fn build_host(plugin_dir: Option<PathBuf>, config: &ServiceConfig) -> SystemHost {
    let plugin_dir = resolve_plugin_dir(plugin_dir, &config.service_script);
    tracing::debug!("Plugin dir: {}", plugin_dir.display());
    SystemHost::new(plugin_dir)
}
