//!
//! # Enum-String Mapping Utilities
//!
//! Defines the [enumstr] macro and paired [EnumStr] trait, mapping enums to
//! the fixed keyword vocabulary of the DEF grammar. DEF keywords are
//! case-sensitive on output (always upper-case), so each variant carries its
//! exact emitted spelling.
//!

/// # String-Enumeration Trait
///
/// * `to_str(&self) -> &'static str` converts the enum to its keyword string.
/// * `from_str(&str) -> Option<Self>` does the opposite, returning `None` on no match.
pub trait EnumStr: std::marker::Sized {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
}

/// # Enum-String Pairing Macro
///
/// Creates a fieldless `enum` with:
/// * (a) paired keyword string-values,
/// * (b) an [EnumStr] implementation converting to and from them, and
/// * (c) a [std::fmt::Display] implementation writing the keyword.
///
/// Variants derive the common traits, notably `serde::{Serialize, Deserialize}`
/// and `schemars::JsonSchema`.
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
                $variant ),*
        }
        impl $crate::utils::EnumStr for $enum_name {
            /// Convert a [$enum_name] variant to its keyword string.
            #[allow(dead_code)]
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create a [$enum_name] from one of its keyword strings.
            /// Matching is case-sensitive; re-case outside `from_str` if needed.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                let s = match self {
                    $( Self::$variant => $strval),*,
                };
                write!(f, "{}", s)
            }
        }
    }
}
pub(crate) use enumstr;
