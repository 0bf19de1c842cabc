use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use cryshim_abi::{EntryFn, WordSize, ENTRY_SYMBOL};
use cryshim_core::builds::{self, BuildIdentity};
use cryshim_core::engine::EngineModule;
use cryshim_core::mode::ModeFlags;
use cryshim_core::paths;
use cryshim_core::version::{self, ImageVersion};
use cryshim_core::{BootError, Result};
use libloading::Library;
use log::{debug, info};

use crate::host::HostStartup;

/// A host DLL mapped for the rest of the process lifetime.
///
/// The CryEngine DLLs do not survive being unloaded, so the library handle
/// is never released.
pub struct HostModule {
    name: String,
    path: PathBuf,
    library: ManuallyDrop<Library>,
}

impl HostModule {
    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        // SAFETY: running the DLL initializers of a host module is the point of
        // the launcher; the build has been validated before game code loads.
        let library = unsafe { Library::new(path) }
            .map_err(|err| BootError::ModuleLoad { path: path.to_path_buf(), reason: err.to_string() })?;

        debug!("Loaded {}", path.display());
        Ok(Self { name, path: path.to_path_buf(), library: ManuallyDrop::new(library) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `CreateGameStartup`.
    pub fn entry(&self) -> Result<EntryFn> {
        // SAFETY: the export has this signature in every supported build.
        let symbol = unsafe { self.library.get::<EntryFn>(ENTRY_SYMBOL) }.map_err(|_| BootError::SymbolNotFound {
            module: self.name.clone(),
            symbol: String::from_utf8_lossy(&ENTRY_SYMBOL[..ENTRY_SYMBOL.len() - 1]).into_owned(),
        })?;
        Ok(*symbol)
    }
}

fn word_size_hint(found: WordSize) -> String {
    let folder = WordSize::NATIVE.bin_folder();
    format!("It seems you have {found} DLLs in {folder} directory! Fix it!")
}

/// Reads the build identity of CrySystem from disk, before the DLL is mapped.
pub fn read_identity(path: &Path) -> Result<ImageVersion> {
    let version = version::read_image_version_from_file(path)
        .map_err(|err| BootError::ModuleLoad { path: path.to_path_buf(), reason: err.to_string() })?;
    if version.word_size != WordSize::NATIVE {
        return Err(BootError::ModuleLoad { path: path.to_path_buf(), reason: word_size_hint(version.word_size) });
    }
    Ok(version)
}

/// The host DLLs a launch mode needs.
pub struct EngineModules {
    version: ImageVersion,
    system: HostModule,
    game: HostModule,
    network: HostModule,
    action: Option<HostModule>,
    renderer: Option<HostModule>,
}

impl EngineModules {
    /// Loads CrySystem, validates its build, then loads the rest.
    pub fn load(root: &Path, mode: ModeFlags, dx9: bool) -> Result<Self> {
        let module = |name: &str| paths::module_path(root, WordSize::NATIVE, name);

        let system_path = module("CrySystem");
        let version = read_identity(&system_path)?;
        let build = builds::classify(version.identity())?;
        info!("{} {} ({:?})", build.product, build.identity, version.file_version);

        let system = HostModule::load(&system_path)?;
        let game = HostModule::load(&module("CryGame"))?;
        let network = HostModule::load(&module("CryNetwork"))?;

        let (action, renderer) = if mode.is_dedicated() {
            (None, None)
        } else {
            let action = HostModule::load(&module("CryAction"))?;
            let renderer = if dx9 { None } else { Some(HostModule::load(&module("CryRenderD3D10"))?) };
            (Some(action), renderer)
        };

        Ok(Self { version, system, game, network, action, renderer })
    }

    pub fn version(&self) -> ImageVersion {
        self.version
    }

    pub fn loaded(&self) -> impl Iterator<Item = &HostModule> {
        [Some(&self.system), Some(&self.game), Some(&self.network), self.action.as_ref(), self.renderer.as_ref()]
            .into_iter()
            .flatten()
    }
}

impl EngineModule for EngineModules {
    type Startup = HostStartup;

    fn identity(&self) -> BuildIdentity {
        self.version.identity()
    }

    fn create_startup(&mut self) -> Result<Option<HostStartup>> {
        let entry = self.game.entry()?;
        // SAFETY: `entry` is the factory exported by a validated CryGame.
        let raw = unsafe { entry() };
        Ok(NonNull::new(raw).map(|raw| unsafe { HostStartup::from_raw(raw) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_module() {
        let path = Path::new("definitely/not/here/CrySystem.dll");
        match HostModule::load(path) {
            Err(BootError::ModuleLoad { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[cfg(any(all(target_os = "linux", target_env = "gnu"), windows))]
    #[test]
    fn library_without_the_startup_factory() {
        let system = if cfg!(windows) { "kernel32.dll" } else { "libc.so.6" };
        let module = HostModule::load(Path::new(system)).unwrap();
        match module.entry() {
            Err(BootError::SymbolNotFound { symbol, .. }) => assert_eq!(symbol, "CreateGameStartup"),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn missing_install() {
        let err = EngineModules::load(Path::new("no/such/game"), ModeFlags::empty(), false).err();
        assert!(matches!(err, Some(BootError::ModuleLoad { .. })));
    }

    #[test]
    fn word_size_hint_names_the_folder() {
        let hint = word_size_hint(WordSize::Bits32);
        assert!(hint.contains("32-bit DLLs"));
        assert!(hint.contains(WordSize::NATIVE.bin_folder()));
    }
}
