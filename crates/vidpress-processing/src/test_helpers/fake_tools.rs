//! Executable shell scripts that imitate ffmpeg and ffprobe.

use std::path::{Path, PathBuf};

/// Remux stand-in: copies the `-i` input to the last argument.
pub const REMUX_COPY: &str = r#"in=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then in="$arg"; fi
  prev="$arg"
done
cp "$in" "$prev"
"#;

/// Remux stand-in that leaves a partial output behind and fails.
pub const REMUX_FAIL: &str = r#"for arg in "$@"; do last="$arg"; done
printf 'partial' > "$last"
echo "invalid data found" >&2
exit 1
"#;

/// Remux stand-in that never finishes in time.
pub const REMUX_HANG: &str = "sleep 30\n";

/// Probe stand-in printing a single video stream with the given dimensions.
pub fn probe_json(width: u32, height: u32) -> String {
    format!(
        "cat <<'JSON'\n{{\"streams\":[{{\"width\":{},\"height\":{}}}]}}\nJSON\n",
        width, height
    )
}

/// Probe stand-in printing `body` verbatim.
pub fn probe_raw(body: &str) -> String {
    format!("cat <<'JSON'\n{}\nJSON\n", body)
}

/// Write an executable `#!/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("Failed to write fake tool");
    let mut permissions = std::fs::metadata(&path)
        .expect("Failed to stat fake tool")
        .permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("Failed to chmod fake tool");
    path
}

/// Number of regular files left under `dir`.
pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
