//! Declaration modifiers, visibility and annotations.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier keywords attached to a class, method, field or property.
    ///
    /// ```
    /// use apex_core::Modifiers;
    ///
    /// let m = Modifiers::PUBLIC | Modifiers::STATIC;
    /// assert!(m.is_static());
    /// assert!(!m.is_override());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const GLOBAL = 1 << 3;
        const STATIC = 1 << 4;
        const FINAL = 1 << 5;
        const ABSTRACT = 1 << 6;
        const VIRTUAL = 1 << 7;
        const OVERRIDE = 1 << 8;
        const TRANSIENT = 1 << 9;
        const WITH_SHARING = 1 << 10;
        const WITHOUT_SHARING = 1 << 11;
    }
}

impl Modifiers {
    /// Parse a single modifier keyword (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let m = match keyword.to_ascii_lowercase().as_str() {
            "public" => Self::PUBLIC,
            "private" => Self::PRIVATE,
            "protected" => Self::PROTECTED,
            "global" => Self::GLOBAL,
            "static" => Self::STATIC,
            "final" => Self::FINAL,
            "abstract" => Self::ABSTRACT,
            "virtual" => Self::VIRTUAL,
            "override" => Self::OVERRIDE,
            "transient" => Self::TRANSIENT,
            "with sharing" => Self::WITH_SHARING,
            "without sharing" => Self::WITHOUT_SHARING,
            _ => return None,
        };
        Some(m)
    }

    /// Effective visibility. No access keyword means private.
    pub fn visibility(self) -> Visibility {
        if self.contains(Self::GLOBAL) {
            Visibility::Global
        } else if self.contains(Self::PUBLIC) {
            Visibility::Public
        } else if self.contains(Self::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Private
        }
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[inline]
    pub fn is_override(self) -> bool {
        self.contains(Self::OVERRIDE)
    }

    #[inline]
    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Whether a subclass is allowed to override this member.
    #[inline]
    pub fn is_overridable(self) -> bool {
        self.intersects(Self::ABSTRACT | Self::VIRTUAL)
    }
}

/// Access level derived from [`Modifiers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Visibility {
    #[default]
    Private,
    Protected,
    Public,
    Global,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Public => write!(f, "public"),
            Visibility::Global => write!(f, "global"),
        }
    }
}

/// An annotation such as `@IsTest` or `@AuraEnabled(cacheable=true)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub name: String,
    /// `key=value` pairs in declaration order.
    pub params: Vec<(String, String)>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Annotation names are case-insensitive.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<_> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "({})", params.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_visibility_is_private() {
        assert_eq!(Modifiers::empty().visibility(), Visibility::Private);
        assert_eq!(Modifiers::STATIC.visibility(), Visibility::Private);
        assert_eq!(
            (Modifiers::PUBLIC | Modifiers::GLOBAL).visibility(),
            Visibility::Global
        );
    }

    #[test]
    fn keyword_parsing_ignores_case() {
        assert_eq!(Modifiers::from_keyword("Override"), Some(Modifiers::OVERRIDE));
        assert_eq!(Modifiers::from_keyword("unknown"), None);
    }

    #[test]
    fn annotation_display() {
        let a = Annotation::new("AuraEnabled").with_param("cacheable", "true");
        assert_eq!(a.to_string(), "@AuraEnabled(cacheable=true)");
        assert!(a.is("auraenabled"));
    }
}
