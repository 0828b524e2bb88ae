use std::path::PathBuf;

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!(
        "{}/carousel-mpv-{}.sock",
        std::env::temp_dir().display(),
        std::process::id()
    )
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    format!("carousel-mpv-{}", std::process::id())
}

#[cfg(unix)]
pub fn mpv_socket_arg() -> String {
    format!("--input-ipc-server={}", mpv_socket_name())
}

#[cfg(windows)]
pub fn mpv_socket_arg() -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", mpv_socket_name())
}

const APP_DIR: &str = "carousel";

/// `~/.local/share/carousel` on every unix, macOS included.
#[cfg(unix)]
pub fn data_dir() -> PathBuf {
    home_relative(&[".local", "share"], "/tmp")
}

#[cfg(windows)]
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(unix)]
pub fn config_dir() -> PathBuf {
    home_relative(&[".config"], ".")
}

#[cfg(windows)]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(unix)]
fn home_relative(parts: &[&str], fallback: &str) -> PathBuf {
    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from(fallback));
    dir.extend(parts);
    dir.join(APP_DIR)
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

/// Find the mpv binary: `MPV_PATH`, then beside the current exe, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("MPV_PATH").map(PathBuf::from) {
        if path.exists() {
            return Some(path);
        }
    }

    let exe_name = mpv_binary_name();
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(exe_name)))
        .filter(|p| p.exists());
    if beside_exe.is_some() {
        return beside_exe;
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(exe_name))
        .find(|p| p.exists())
}
