//! Ravi-type tagging (spec §3): a coarse type tag attached to every
//! expression and symbol, immutable post-parse except by the external
//! type-check pass.

use crate::intern::Name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RaviTag {
    Any,
    Nil,
    Boolean,
    Integer,
    Float,
    ArrayInteger,
    ArrayFloat,
    Table,
    String,
    Function,
    Userdata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaviType {
    pub tag: RaviTag,
    /// Dotted user-type name (e.g. `a.b.c`); meaningful only when
    /// `tag == Userdata`, or on an unresolved qualified `@` cast.
    pub user_type: Option<Name>,
}

impl RaviType {
    pub fn simple(tag: RaviTag) -> Self {
        RaviType { tag, user_type: None }
    }

    pub fn userdata(user_type: Name) -> Self {
        RaviType {
            tag: RaviTag::Userdata,
            user_type: Some(user_type),
        }
    }

    pub fn any() -> Self {
        RaviType::simple(RaviTag::Any)
    }
}

/// Recognises the built-in type-annotation keywords used by both typed
/// locals (`local x: integer`) and `@`-conversions; anything else is a
/// (possibly dotted) user-type name.
pub fn builtin_tag(word: &str) -> Option<RaviTag> {
    Some(match word {
        "integer" => RaviTag::Integer,
        "number" => RaviTag::Float,
        "closure" => RaviTag::Function,
        "table" => RaviTag::Table,
        "string" => RaviTag::String,
        "boolean" => RaviTag::Boolean,
        "any" => RaviTag::Any,
        _ => return None,
    })
}

pub fn array_tag(tag: RaviTag) -> Option<RaviTag> {
    match tag {
        RaviTag::Integer => Some(RaviTag::ArrayInteger),
        RaviTag::Float => Some(RaviTag::ArrayFloat),
        _ => None,
    }
}
