//! Catalog of host builds the launcher knows about.

use std::fmt;

use cryshim_abi::WordSize;

use crate::error::{BootError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Product {
    Crysis,
    CrysisWars,
    CrysisWarhead,
}

impl Product {
    pub fn name(self) -> &'static str {
        match self {
            Product::Crysis => "Crysis",
            Product::CrysisWars => "Crysis Wars",
            Product::CrysisWarhead => "Crysis Warhead",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build number plus the pointer width of the binaries it was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildIdentity {
    pub build: u32,
    pub word_size: WordSize,
}

impl BuildIdentity {
    pub fn new(build: u32, word_size: WordSize) -> Self {
        Self { build, word_size }
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build {} ({})", self.build, self.word_size)
    }
}

/// A build that passed [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    pub identity: BuildIdentity,
    pub product: Product,
}

impl BuildInfo {
    pub fn build(&self) -> u32 {
        self.identity.build
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Support {
    Supported,
    Unsupported,
}

#[derive(Clone, Copy, Debug)]
struct KnownBuild {
    build: u32,
    product: Product,
    support: Support,
    only_32bit: bool,
}

const fn known(build: u32, product: Product, support: Support) -> KnownBuild {
    KnownBuild { build, product, support, only_32bit: false }
}

const KNOWN_BUILDS: &[KnownBuild] = &[
    known(5767, Product::Crysis, Support::Supported),
    known(5879, Product::Crysis, Support::Supported),
    known(6115, Product::Crysis, Support::Supported),
    known(6156, Product::Crysis, Support::Supported),
    // 64-bit binaries were never shipped with the first Crysis Wars build
    KnownBuild { only_32bit: true, ..known(6527, Product::CrysisWars, Support::Supported) },
    known(6566, Product::CrysisWars, Support::Supported),
    known(6586, Product::CrysisWars, Support::Supported),
    known(6627, Product::CrysisWars, Support::Supported),
    known(6670, Product::CrysisWars, Support::Supported),
    known(6729, Product::CrysisWars, Support::Supported),
    known(687, Product::CrysisWarhead, Support::Unsupported),
    known(710, Product::CrysisWarhead, Support::Unsupported),
    known(711, Product::CrysisWarhead, Support::Unsupported),
];

fn lookup(identity: BuildIdentity) -> Option<&'static KnownBuild> {
    KNOWN_BUILDS.iter().find(|k| {
        k.build == identity.build && !(k.only_32bit && identity.word_size == WordSize::Bits64)
    })
}

/// Decides whether the launcher may call into a host of this build.
///
/// Must run before the entry point is touched: an unrecognized build means an
/// unknown layout of the init record.
pub fn classify(identity: BuildIdentity) -> Result<BuildInfo> {
    match lookup(identity) {
        Some(k) if k.support == Support::Supported => Ok(BuildInfo { identity, product: k.product }),
        Some(k) => Err(BootError::UnsupportedVariant { product: k.product, build: identity.build }),
        None => Err(BootError::UnknownBuild { build: identity.build, word_size: identity.word_size }),
    }
}

/// Product a build number belongs to, regardless of support.
pub fn product_of(identity: BuildIdentity) -> Option<Product> {
    lookup(identity).map(|k| k.product)
}

/// All builds accepted for `word_size`, in catalog order.
pub fn supported_builds(word_size: WordSize) -> Vec<(u32, Product)> {
    KNOWN_BUILDS
        .iter()
        .filter(|k| k.support == Support::Supported)
        .filter(|k| !(k.only_32bit && word_size == WordSize::Bits64))
        .map(|k| (k.build, k.product))
        .collect()
}
