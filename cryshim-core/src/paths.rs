use std::path::{Path, PathBuf};

use cryshim_abi::WordSize;

/// Install folder of the launcher: the executable's folder, or its parent
/// when the executable sits in `Bin32`/`Bin64`.
pub fn main_folder(exe_path: &Path) -> PathBuf {
    let Some(folder) = exe_path.parent() else {
        return PathBuf::new();
    };
    let inside_bin = folder
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case("Bin32") || name.eq_ignore_ascii_case("Bin64"));
    if inside_bin {
        folder.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        folder.to_path_buf()
    }
}

/// Game root: an explicit `-root` wins over the launcher's own install folder.
pub fn root_folder(explicit: Option<&Path>, exe_path: &Path) -> PathBuf {
    match explicit {
        Some(root) => root.to_path_buf(),
        None => main_folder(exe_path),
    }
}

/// Folder holding the host DLLs matching the launcher's pointer width.
pub fn bin_folder(root: &Path, word_size: WordSize) -> PathBuf {
    root.join(word_size.bin_folder())
}

pub fn module_path(root: &Path, word_size: WordSize, module: &str) -> PathBuf {
    bin_folder(root, word_size).join(format!("{module}.dll"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bin_folder() {
        let exe = Path::new("games/Crysis Wars/bin64/Crysis.exe");
        assert_eq!(main_folder(exe), Path::new("games/Crysis Wars"));

        let exe = Path::new("games/Crysis/BIN32/Crysis.exe");
        assert_eq!(main_folder(exe), Path::new("games/Crysis"));
    }

    #[test]
    fn keeps_other_folders() {
        let exe = Path::new("tools/launcher/cryshim.exe");
        assert_eq!(main_folder(exe), Path::new("tools/launcher"));
        assert_eq!(main_folder(Path::new("cryshim.exe")), Path::new(""));
    }

    #[test]
    fn explicit_root_wins() {
        let exe = Path::new("a/Bin32/Crysis.exe");
        assert_eq!(root_folder(Some(Path::new("d/Crysis")), exe), Path::new("d/Crysis"));
        assert_eq!(root_folder(None, exe), Path::new("a"));
    }

    #[test]
    fn module_paths() {
        let root = Path::new("Crysis");
        assert_eq!(module_path(root, WordSize::Bits32, "CrySystem"), Path::new("Crysis/Bin32/CrySystem.dll"));
        assert_eq!(bin_folder(root, WordSize::Bits64), Path::new("Crysis/Bin64"));
    }
}
