/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::VarMap;
use crate::meta::error::ConvertError;
use crate::meta::{FromVariant, ToVariant};

mod impls;

pub(crate) use impls::hash_entries;

/// Maximum nesting depth that deep comparisons, hashing and formatting descend into.
///
/// Dictionaries can contain themselves through shared handles. Past this depth, deep comparisons yield `false`, while hashing
/// and formatting stop descending.
pub const MAX_RECURSION: usize = 100;

/// Dynamically typed value, able to hold any element of a [`VarMap`].
///
/// Nested dictionaries are stored as [`VarMap`] handles, so the sharing rules of [`Map`][crate::builtin::Map] apply to them.
#[derive(Clone, Default, Debug)]
pub enum Variant {
    /// Absence of a value (`null` in GDScript).
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Variant>),

    /// Handle to a dictionary. [`Variant::from()`] stores a shared handle, so that clones of the variant alias the map.
    Dictionary(VarMap),
}

/// Discriminant of a [`Variant`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariantType {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Array,
    Dictionary,
}

impl Variant {
    /// Create an empty variant (`null` value in GDScript).
    pub fn nil() -> Self {
        Self::Nil
    }

    /// Create a variant holding a non-nil value.
    ///
    /// Equivalent to [`value.to_variant()`][ToVariant::to_variant], but consumes the argument.
    pub fn from<T: ToVariant>(value: T) -> Self {
        value.to_variant()
    }

    /// Checks whether the variant is empty (`null` value in GDScript).
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the type that is currently held by this variant.
    pub fn get_type(&self) -> VariantType {
        match self {
            Self::Nil => VariantType::Nil,
            Self::Bool(_) => VariantType::Bool,
            Self::Int(_) => VariantType::Int,
            Self::Float(_) => VariantType::Float,
            Self::String(_) => VariantType::String,
            Self::Array(_) => VariantType::Array,
            Self::Dictionary(_) => VariantType::Dictionary,
        }
    }

    /// ⚠️ Convert to type `T`, panicking on failure.
    ///
    /// # Panics
    /// When this variant holds a different type.
    pub fn to<T: FromVariant>(&self) -> T {
        T::from_variant(self)
    }

    /// Convert to type `T`, returning `Err` on failure.
    pub fn try_to<T: FromVariant>(&self) -> Result<T, ConvertError> {
        T::try_from_variant(self)
    }

    /// Copy, descending into arrays and dictionaries.
    ///
    /// Nested dictionaries become new, independent local maps. Scalars are cloned.
    pub fn duplicate_deep(&self) -> Self {
        match self {
            Self::Array(elements) => Self::Array(elements.iter().map(Self::duplicate_deep).collect()),
            Self::Dictionary(dict) => Self::from(dict.duplicate_deep()),
            other => other.clone(),
        }
    }

    /// Deep equality with `other`, descending into arrays and dictionaries.
    ///
    /// Unlike `==`, nested dictionaries are compared entry by entry through their proxies. Nesting deeper than
    /// [`MAX_RECURSION`] levels compares as unequal.
    pub fn recursively_equal(&self, other: &Variant) -> bool {
        self.recursively_equal_at(other, 0)
    }

    pub(crate) fn recursively_equal_at(&self, other: &Variant, depth: usize) -> bool {
        if depth > MAX_RECURSION {
            log::warn!("Variant::recursively_equal(): max recursion depth {MAX_RECURSION} exceeded, comparing as unequal");
            return false;
        }

        match (self, other) {
            (Self::Array(lhs), Self::Array(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs
                        .iter()
                        .zip(rhs)
                        .all(|(l, r)| l.recursively_equal_at(r, depth + 1))
            }
            (Self::Dictionary(lhs), Self::Dictionary(rhs)) => {
                lhs.len() == rhs.len()
                    && crate::builtin::collections::functions::entries_contained_in(lhs, rhs, depth + 1)
            }
            _ => self == other,
        }
    }

    /// Stable 32-bit content hash.
    ///
    /// Equal variants produce equal hashes; dictionaries hash their entries in iteration order.
    pub fn hash_u32(&self) -> u32 {
        let mut bytes = Vec::new();
        self.write_canonical(&mut bytes, 0);
        xxhash_rust::xxh32::xxh32(&bytes, 0)
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            other => other.fmt_at(f, depth),
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("<null>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing ".0" for integral floats.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => f.write_str(s),
            Self::Array(_) if depth > MAX_RECURSION => f.write_str("[...]"),
            Self::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt_nested(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Self::Dictionary(dict) => fmt_entries(f, dict.iter(), depth),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

/// Writes `{ k: v, ... }` with nested strings quoted, like GDScript's `str()` on dictionaries.
///
/// Beyond [`MAX_RECURSION`] levels, writes `{...}` instead of the entries.
pub(crate) fn fmt_entries(
    f: &mut fmt::Formatter<'_>,
    entries: impl Iterator<Item = (Variant, Variant)>,
    depth: usize,
) -> fmt::Result {
    if depth > MAX_RECURSION {
        return f.write_str("{...}");
    }

    let mut empty = true;

    for (key, value) in entries {
        f.write_str(if empty { "{ " } else { ", " })?;
        key.fmt_nested(f, depth + 1)?;
        f.write_str(": ")?;
        value.fmt_nested(f, depth + 1)?;
        empty = false;
    }

    f.write_str(if empty { "{}" } else { " }" })
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(feature = "serde")]
mod serialize {
    use super::*;
    use serde::de::{MapAccess, SeqAccess, Visitor};
    use serde::ser::{SerializeMap, SerializeSeq};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Variant {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            Nested(self, 0).serialize(serializer)
        }
    }

    /// Variant at a given nesting depth. Cyclic dictionaries fail to serialize instead of recursing forever.
    struct Nested<'a>(&'a Variant, usize);

    impl Serialize for Nested<'_> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let Self(variant, depth) = *self;
            if depth > MAX_RECURSION {
                return Err(serde::ser::Error::custom(format_args!(
                    "max recursion depth {MAX_RECURSION} exceeded"
                )));
            }

            match variant {
                Variant::Nil => serializer.serialize_unit(),
                Variant::Bool(b) => serializer.serialize_bool(*b),
                Variant::Int(i) => serializer.serialize_i64(*i),
                Variant::Float(x) => serializer.serialize_f64(*x),
                Variant::String(s) => serializer.serialize_str(s),
                Variant::Array(elements) => {
                    let mut sequence = serializer.serialize_seq(Some(elements.len()))?;
                    for element in elements {
                        sequence.serialize_element(&Nested(element, depth + 1))?;
                    }
                    sequence.end()
                }
                Variant::Dictionary(dict) => {
                    let mut map = serializer.serialize_map(Some(dict.len()))?;
                    for (key, value) in dict.iter() {
                        map.serialize_entry(&Nested(&key, depth + 1), &Nested(&value, depth + 1))?;
                    }
                    map.end()
                }
            }
        }
    }

    impl<'de> Deserialize<'de> for Variant {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct VariantVisitor;

            impl<'de> Visitor<'de> for VariantVisitor {
                type Value = Variant;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a null, bool, number, string, sequence or map")
                }

                fn visit_unit<E>(self) -> Result<Variant, E> {
                    Ok(Variant::Nil)
                }

                fn visit_none<E>(self) -> Result<Variant, E> {
                    Ok(Variant::Nil)
                }

                fn visit_some<D>(self, deserializer: D) -> Result<Variant, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    Variant::deserialize(deserializer)
                }

                fn visit_bool<E>(self, v: bool) -> Result<Variant, E> {
                    Ok(Variant::Bool(v))
                }

                fn visit_i64<E>(self, v: i64) -> Result<Variant, E> {
                    Ok(Variant::Int(v))
                }

                fn visit_u64<E>(self, v: u64) -> Result<Variant, E> {
                    // Integers beyond i64 lose precision, like in GDScript's JSON parser.
                    Ok(i64::try_from(v).map_or(Variant::Float(v as f64), Variant::Int))
                }

                fn visit_f64<E>(self, v: f64) -> Result<Variant, E> {
                    Ok(Variant::Float(v))
                }

                fn visit_str<E>(self, v: &str) -> Result<Variant, E> {
                    Ok(Variant::String(v.to_owned()))
                }

                fn visit_string<E>(self, v: String) -> Result<Variant, E> {
                    Ok(Variant::String(v))
                }

                fn visit_seq<A>(self, mut seq: A) -> Result<Variant, A::Error>
                where
                    A: SeqAccess<'de>,
                {
                    let mut elements = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                    while let Some(element) = seq.next_element()? {
                        elements.push(element);
                    }
                    Ok(Variant::Array(elements))
                }

                fn visit_map<A>(self, mut map: A) -> Result<Variant, A::Error>
                where
                    A: MapAccess<'de>,
                {
                    let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                    while let Some(entry) = map.next_entry::<Variant, Variant>()? {
                        entries.push(entry);
                    }
                    Ok(Variant::from(entries.into_iter().collect::<VarMap>()))
                }
            }

            deserializer.deserialize_any(VariantVisitor)
        }
    }
}
