use extpack_schema::Identity;
use std::path::{Path, PathBuf};

/// Output spec that asks for an automatically named package in the
/// current directory.
pub const AUTO_OUTPUT: &str = "{auto}";
pub const PACKAGE_EXTENSION: &str = "vsix";

/// `{Publisher}.{Id}-{Version}.vsix`
pub fn auto_file_name(identity: &Identity) -> String {
    format!(
        "{}.{}-{}.{PACKAGE_EXTENSION}",
        identity.publisher, identity.id, identity.version
    )
}

/// Resolve where the package is written.
///
/// `{auto}` yields the automatic name in `cwd`. A spec whose last segment
/// has a `.` after its first character is an explicit file name, so hidden
/// directories like `.builds` stay directories. Anything else is a directory
/// that receives the automatic name. Relative results are joined onto `cwd`.
pub fn resolve_output_path(spec: &str, identity: &Identity, cwd: &Path) -> PathBuf {
    let auto_name = auto_file_name(identity);
    if spec == AUTO_OUTPUT {
        return cwd.join(auto_name);
    }

    let spec_path = Path::new(spec);
    let is_file_name = spec_path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().find('.').is_some_and(|i| i > 0));

    if is_file_name {
        cwd.join(spec_path)
    } else {
        cwd.join(spec_path).join(auto_name)
    }
}
