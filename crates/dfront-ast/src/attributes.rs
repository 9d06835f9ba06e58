//! Storage classes, linkage, protection and type qualifier bits.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use dfront_ident::Ident;

/// Bitset over the closed set of storage class flags.
///
/// Three exclusive groups are enforced by the parser: `{const, immutable,
/// manifest}`, `{__gshared, shared, tls}` and the safety group `{@safe,
/// @trusted, @system, @live}`. `in` combined with `const` or `scope` is also
/// a conflict (legacy-compat rule).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StorageClass(u64);

impl StorageClass {
    pub const UNDEFINED: StorageClass = StorageClass(0);
    pub const CONST: StorageClass = StorageClass(1 << 0);
    pub const IMMUTABLE: StorageClass = StorageClass(1 << 1);
    pub const SHARED: StorageClass = StorageClass(1 << 2);
    /// `inout`
    pub const WILD: StorageClass = StorageClass(1 << 3);
    pub const STATIC: StorageClass = StorageClass(1 << 4);
    pub const FINAL: StorageClass = StorageClass(1 << 5);
    pub const AUTO: StorageClass = StorageClass(1 << 6);
    pub const SCOPE: StorageClass = StorageClass(1 << 7);
    pub const OVERRIDE: StorageClass = StorageClass(1 << 8);
    pub const ABSTRACT: StorageClass = StorageClass(1 << 9);
    pub const SYNCHRONIZED: StorageClass = StorageClass(1 << 10);
    pub const DEPRECATED: StorageClass = StorageClass(1 << 11);
    pub const NOTHROW: StorageClass = StorageClass(1 << 12);
    pub const PURE: StorageClass = StorageClass(1 << 13);
    pub const REF: StorageClass = StorageClass(1 << 14);
    /// `__gshared`
    pub const GSHARED: StorageClass = StorageClass(1 << 15);
    /// `enum` used as a manifest constant storage class
    pub const MANIFEST: StorageClass = StorageClass(1 << 16);
    pub const RETURN: StorageClass = StorageClass(1 << 17);
    pub const IN: StorageClass = StorageClass(1 << 18);
    pub const OUT: StorageClass = StorageClass(1 << 19);
    pub const LAZY: StorageClass = StorageClass(1 << 20);
    pub const ALIAS: StorageClass = StorageClass(1 << 21);
    /// `@disable`
    pub const DISABLE: StorageClass = StorageClass(1 << 22);
    /// `@property`
    pub const PROPERTY: StorageClass = StorageClass(1 << 23);
    /// `@nogc`
    pub const NOGC: StorageClass = StorageClass(1 << 24);
    /// `@safe`
    pub const SAFE: StorageClass = StorageClass(1 << 25);
    /// `@trusted`
    pub const TRUSTED: StorageClass = StorageClass(1 << 26);
    /// `@system`
    pub const SYSTEM: StorageClass = StorageClass(1 << 27);
    /// `@live`
    pub const LIVE: StorageClass = StorageClass(1 << 28);
    /// `@future`
    pub const FUTURE: StorageClass = StorageClass(1 << 29);
    /// thread-local (the default for module variables; the explicit bit only
    /// participates in the `{__gshared, shared, tls}` conflict group)
    pub const TLS: StorageClass = StorageClass(1 << 30);
    /// bare `extern` (declaration without definition)
    pub const EXTERN: StorageClass = StorageClass(1 << 31);

    /// The safety group `{@safe, @trusted, @system, @live}`.
    pub const SAFETY_GROUP: StorageClass =
        StorageClass(Self::SAFE.0 | Self::TRUSTED.0 | Self::SYSTEM.0 | Self::LIVE.0);

    /// `{const, immutable, manifest}`.
    pub const MUTABILITY_GROUP: StorageClass =
        StorageClass(Self::CONST.0 | Self::IMMUTABLE.0 | Self::MANIFEST.0);

    /// `{__gshared, shared, tls}`.
    pub const GLOBAL_GROUP: StorageClass =
        StorageClass(Self::GSHARED.0 | Self::SHARED.0 | Self::TLS.0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    pub fn contains(self, other: StorageClass) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit is shared with `other`.
    pub fn intersects(self, other: StorageClass) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(self, other: StorageClass) -> StorageClass {
        StorageClass(self.0 & other.0)
    }

    /// Remove the bits of `other`.
    pub fn without(self, other: StorageClass) -> StorageClass {
        StorageClass(self.0 & !other.0)
    }

    /// Exactly one bit set?
    pub fn is_single(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    /// The keyword spellings of the set bits, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        const TABLE: &[(StorageClass, &str)] = &[
            (StorageClass::CONST, "const"),
            (StorageClass::IMMUTABLE, "immutable"),
            (StorageClass::SHARED, "shared"),
            (StorageClass::WILD, "inout"),
            (StorageClass::STATIC, "static"),
            (StorageClass::FINAL, "final"),
            (StorageClass::AUTO, "auto"),
            (StorageClass::SCOPE, "scope"),
            (StorageClass::OVERRIDE, "override"),
            (StorageClass::ABSTRACT, "abstract"),
            (StorageClass::SYNCHRONIZED, "synchronized"),
            (StorageClass::DEPRECATED, "deprecated"),
            (StorageClass::NOTHROW, "nothrow"),
            (StorageClass::PURE, "pure"),
            (StorageClass::REF, "ref"),
            (StorageClass::GSHARED, "__gshared"),
            (StorageClass::MANIFEST, "enum"),
            (StorageClass::RETURN, "return"),
            (StorageClass::IN, "in"),
            (StorageClass::OUT, "out"),
            (StorageClass::LAZY, "lazy"),
            (StorageClass::ALIAS, "alias"),
            (StorageClass::DISABLE, "@disable"),
            (StorageClass::PROPERTY, "@property"),
            (StorageClass::NOGC, "@nogc"),
            (StorageClass::SAFE, "@safe"),
            (StorageClass::TRUSTED, "@trusted"),
            (StorageClass::SYSTEM, "@system"),
            (StorageClass::LIVE, "@live"),
            (StorageClass::FUTURE, "@future"),
            (StorageClass::TLS, "tls"),
            (StorageClass::EXTERN, "extern"),
        ];
        TABLE.iter().filter(|(bit, _)| self.contains(*bit)).map(|&(_, name)| name).collect()
    }
}

impl BitOr for StorageClass {
    type Output = StorageClass;

    fn bitor(self, rhs: StorageClass) -> StorageClass {
        StorageClass(self.0 | rhs.0)
    }
}

impl BitOrAssign for StorageClass {
    fn bitor_assign(&mut self, rhs: StorageClass) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" "))
    }
}

/// Type qualifier bits used by qualifier-only casts (`cast(const)`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModFlags(pub u8);

impl ModFlags {
    pub const CONST: ModFlags = ModFlags(1);
    pub const IMMUTABLE: ModFlags = ModFlags(2);
    pub const SHARED: ModFlags = ModFlags(4);
    pub const WILD: ModFlags = ModFlags(8);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: ModFlags) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: ModFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn names(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(ModFlags::CONST) {
            out.push("const");
        }
        if self.contains(ModFlags::IMMUTABLE) {
            out.push("immutable");
        }
        if self.contains(ModFlags::SHARED) {
            out.push("shared");
        }
        if self.contains(ModFlags::WILD) {
            out.push("inout");
        }
        out
    }
}

/// Calling/mangling convention selected by `extern (…)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Linkage {
    #[default]
    Default,
    D,
    C,
    Cpp,
    Windows,
    Pascal,
    ObjectiveC,
    System,
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Default => "",
            Linkage::D => "D",
            Linkage::C => "C",
            Linkage::Cpp => "C++",
            Linkage::Windows => "Windows",
            Linkage::Pascal => "Pascal",
            Linkage::ObjectiveC => "Objective-C",
            Linkage::System => "System",
        }
    }
}

/// How `extern (C++)` aggregates mangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CppMangle {
    #[default]
    Default,
    AsStruct,
    AsClass,
}

/// Protection attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Protection {
    #[default]
    Undefined,
    Private,
    /// `package` with an optional qualified scope `package(a.b)`.
    Package(Vec<Ident>),
    Protected,
    Public,
    Export,
}

impl Protection {
    pub fn keyword(&self) -> &'static str {
        match self {
            Protection::Undefined => "",
            Protection::Private => "private",
            Protection::Package(_) => "package",
            Protection::Protected => "protected",
            Protection::Public => "public",
            Protection::Export => "export",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_groups_cover_their_members() {
        assert!(StorageClass::SAFETY_GROUP.contains(StorageClass::SAFE));
        assert!(StorageClass::SAFETY_GROUP.contains(StorageClass::LIVE));
        assert!(!StorageClass::SAFETY_GROUP.contains(StorageClass::NOGC));
        assert!(StorageClass::MUTABILITY_GROUP.contains(StorageClass::MANIFEST));
        assert!(StorageClass::GLOBAL_GROUP.contains(StorageClass::GSHARED));
    }

    #[test]
    fn set_operations() {
        let set = StorageClass::CONST | StorageClass::STATIC;
        assert!(set.intersects(StorageClass::MUTABILITY_GROUP));
        assert!(set.contains(StorageClass::STATIC));
        assert!(!set.is_single());
        assert!(set.without(StorageClass::CONST).is_single());
        assert_eq!(set.names(), vec!["const", "static"]);
    }

    #[test]
    fn mod_flags() {
        let mut mods = ModFlags::default();
        mods.insert(ModFlags::CONST);
        mods.insert(ModFlags::SHARED);
        assert_eq!(mods.names(), vec!["const", "shared"]);
    }
}
