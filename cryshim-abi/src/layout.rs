use std::fmt;

/// Pointer width of a host build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordSize {
    Bits32,
    Bits64,
}

impl WordSize {
    #[cfg(target_pointer_width = "64")]
    pub const NATIVE: WordSize = WordSize::Bits64;
    #[cfg(target_pointer_width = "32")]
    pub const NATIVE: WordSize = WordSize::Bits32;

    pub const fn pointer_size(self) -> usize {
        match self {
            WordSize::Bits32 => 4,
            WordSize::Bits64 => 8,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            WordSize::Bits32 => 32,
            WordSize::Bits64 => 64,
        }
    }

    /// Name of the folder the host keeps its binaries of this width in.
    pub const fn bin_folder(self) -> &'static str {
        match self {
            WordSize::Bits32 => "Bin32",
            WordSize::Bits64 => "Bin64",
        }
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Pointers(usize),
    Bytes(usize),
    Bool,
}

#[derive(Clone, Copy, Debug)]
struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
}

const fn ptrs(name: &'static str, count: usize) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Pointers(count) }
}

const fn bytes(name: &'static str, len: usize) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Bytes(len) }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Bool }
}

// SSystemInitParams as compiled into CrySystem, in declaration order.
const INIT_PARAMS_FIELDS: &[FieldSpec] = &[
    ptrs("instance", 1),
    ptrs("window", 1),
    ptrs("log", 1),
    ptrs("log_callback", 1),
    ptrs("user_callback", 1),
    ptrs("log_file_name", 1),
    ptrs("validator", 1),
    bytes("cmd_line", crate::params::CMD_LINE_CAPACITY),
    bytes("user_path", crate::params::USER_PATH_CAPACITY),
    flag("editor"),
    flag("minimal"),
    flag("testing"),
    flag("dedicated_server"),
    ptrs("system", 1),
    ptrs("check_func", 1),
    ptrs("protected_functions", 10),
];

/// Offset and size of one field for a given word size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

/// C layout of the init record computed for an arbitrary pointer width.
///
/// The native struct is checked at compile time; this lets the other width be
/// verified (and printed by the probe) on any machine.
#[derive(Clone, Debug)]
pub struct AbiLayout {
    word_size: WordSize,
    fields: Vec<FieldLayout>,
    size: usize,
}

impl AbiLayout {
    pub fn init_params(word_size: WordSize) -> Self {
        let ptr = word_size.pointer_size();
        let mut offset = 0usize;
        let mut max_align = 1usize;
        let mut fields = Vec::with_capacity(INIT_PARAMS_FIELDS.len());

        for spec in INIT_PARAMS_FIELDS {
            let (size, align) = match spec.kind {
                FieldKind::Pointers(n) => (ptr * n, ptr),
                FieldKind::Bytes(n) => (n, 1),
                FieldKind::Bool => (1, 1),
            };
            offset = align_up(offset, align);
            fields.push(FieldLayout { name: spec.name, offset, size });
            offset += size;
            max_align = max_align.max(align);
        }

        Self { word_size, fields, size: align_up(offset, max_align) }
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Size the host binary was compiled with.
    pub const fn expected_size(word_size: WordSize) -> usize {
        match word_size {
            WordSize::Bits32 => 2384,
            WordSize::Bits64 => 2464,
        }
    }

    pub fn matches_host(&self) -> bool {
        self.size == Self::expected_size(self.word_size)
    }
}

const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}
