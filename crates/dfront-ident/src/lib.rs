//! Identifier interning for the D front end.
//!
//! Identifiers are interned once per parse and compared by identity: two
//! occurrences of the same spelling yield the same [`Ident`]. The parser
//! relies on this to recognise well-known names (`body`, `property`, `safe`,
//! …) with a plain equality test, mirroring pointer-identity interning in
//! classic compiler front ends.

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// An interned identifier. Equality is identity within one [`Interner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(u32);

impl Ident {
    /// The pool index backing this identifier.
    pub fn index(self) -> u32 {
        self.0
    }
}

macro_rules! well_known_idents {
    ($($konst:ident => $spelling:literal,)*) => {
        /// Identifiers the parser compares against by identity.
        pub mod well_known {
            use super::Ident;
            well_known_idents!(@consts 0u32; $($konst => $spelling,)*);
        }

        const WELL_KNOWN_SPELLINGS: &[&str] = &[$($spelling),*];
    };
    (@consts $idx:expr;) => {};
    (@consts $idx:expr; $konst:ident => $spelling:literal, $($rest:ident => $spelling_rest:literal,)*) => {
        #[doc = concat!("`", $spelling, "`")]
        pub const $konst: Ident = Ident($idx);
        well_known_idents!(@consts $idx + 1u32; $($rest => $spelling_rest,)*);
    };
}

well_known_idents! {
    // contracts
    BODY => "body",
    // predefined `@` attributes
    PROPERTY => "property",
    NOGC => "nogc",
    SAFE => "safe",
    TRUSTED => "trusted",
    SYSTEM => "system",
    LIVE => "live",
    DISABLE => "disable",
    FUTURE => "future",
    // linkage names after `extern (`
    C => "C",
    D => "D",
    WINDOWS => "Windows",
    PASCAL => "Pascal",
    SYSTEM_LINKAGE => "System",
    OBJECTIVE => "Objective",
    // scope guard kinds
    EXIT => "exit",
    SUCCESS => "success",
    FAILURE => "failure",
    // `is (T == __argTypes)`
    ARG_TYPES => "__argTypes",
}

/// Append-only identifier pool.
///
/// One interner serves one parse; sharing between parses requires external
/// synchronisation (the pool itself holds no locks).
#[derive(Debug)]
pub struct Interner {
    names: Vec<Arc<str>>,
    lookup: FxHashMap<Arc<str>, u32>,
    generated: u32,
}

impl Interner {
    /// Create a pool with the well-known identifiers pre-interned, so the
    /// `well_known` constants are valid for every interner.
    pub fn new() -> Self {
        let mut interner =
            Interner { names: Vec::with_capacity(256), lookup: FxHashMap::default(), generated: 0 };
        for spelling in WELL_KNOWN_SPELLINGS {
            interner.intern(spelling);
        }
        interner
    }

    /// Intern a spelling, returning the identity shared by all occurrences.
    pub fn intern(&mut self, spelling: &str) -> Ident {
        if let Some(&index) = self.lookup.get(spelling) {
            return Ident(index);
        }
        let index = self.names.len() as u32;
        let shared: Arc<str> = Arc::from(spelling);
        self.names.push(Arc::clone(&shared));
        self.lookup.insert(shared, index);
        Ident(index)
    }

    /// Spelling of an interned identifier.
    pub fn name(&self, ident: Ident) -> &str {
        &self.names[ident.0 as usize]
    }

    /// Synthesise a fresh identifier (`__<prefix><n>`) that cannot collide
    /// with source spellings, for generated template parameters and the like.
    pub fn generate_id(&mut self, prefix: &str) -> Ident {
        loop {
            self.generated += 1;
            let candidate = format!("__{prefix}{}", self.generated);
            if !self.lookup.contains_key(candidate.as_str()) {
                return self.intern(&candidate);
            }
        }
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.name(a), "foo");
    }

    #[test]
    fn well_known_are_preinterned() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern("body"), well_known::BODY);
        assert_eq!(interner.intern("safe"), well_known::SAFE);
        assert_eq!(interner.intern("Objective"), well_known::OBJECTIVE);
        assert_eq!(interner.name(well_known::ARG_TYPES), "__argTypes");
    }

    #[test]
    fn generated_ids_are_fresh() {
        let mut interner = Interner::new();
        let taken = interner.intern("__tmp1");
        let generated = interner.generate_id("tmp");
        assert_ne!(generated, taken);
        assert_eq!(interner.name(generated), "__tmp2");
    }
}
