/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::{Variant, VariantType};
use crate::meta::error::{ConvertError, FromVariantError};
use crate::meta::{Element, FromVariant, ToVariant};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Variant itself

impl ToVariant for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromVariant for Variant {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars stored directly

fn bad_type(expected: VariantType, variant: &Variant) -> ConvertError {
    FromVariantError::BadType {
        expected,
        actual: variant.get_type(),
    }
    .into_error(variant.clone())
}

impl ToVariant for bool {
    fn to_variant(&self) -> Variant {
        Variant::Bool(*self)
    }
}

impl FromVariant for bool {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::Bool(b) => Ok(*b),
            other => Err(bad_type(VariantType::Bool, other)),
        }
    }
}

impl ToVariant for i64 {
    fn to_variant(&self) -> Variant {
        Variant::Int(*self)
    }
}

impl FromVariant for i64 {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::Int(i) => Ok(*i),
            other => Err(bad_type(VariantType::Int, other)),
        }
    }
}

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self)
    }
}

impl FromVariant for f64 {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::Float(f) => Ok(*f),
            other => Err(bad_type(VariantType::Float, other)),
        }
    }
}

// f32 widens losslessly; narrowing back may round.
impl ToVariant for f32 {
    fn to_variant(&self) -> Variant {
        Variant::Float(f64::from(*self))
    }
}

impl FromVariant for f32 {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        f64::try_from_variant(variant).map(|f| f as f32)
    }
}

impl ToVariant for String {
    fn to_variant(&self) -> Variant {
        Variant::String(self.clone())
    }
}

impl FromVariant for String {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::String(s) => Ok(s.clone()),
            other => Err(bad_type(VariantType::String, other)),
        }
    }
}

// Borrowed strings can be passed in (keys for lookups, literal macros), but not extracted.
impl ToVariant for &str {
    fn to_variant(&self) -> Variant {
        Variant::String((*self).to_owned())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Integers stored as i64

macro_rules! impl_int_via_i64 {
    ($($T:ty),* $(,)?) => {
        $(
            impl ToVariant for $T {
                fn to_variant(&self) -> Variant {
                    Variant::Int(i64::from(*self))
                }
            }

            impl FromVariant for $T {
                fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
                    let wide = i64::try_from_variant(variant)?;

                    <$T>::try_from(wide)
                        .map_err(|_| FromVariantError::BadValue.into_error(variant.clone()))
                }
            }
        )*
    };
}

impl_int_via_i64!(i8, i16, i32, u8, u16, u32);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Arrays

impl<T: Element> ToVariant for Vec<T> {
    fn to_variant(&self) -> Variant {
        Variant::Array(self.iter().map(ToVariant::to_variant).collect())
    }
}

impl<T: Element> FromVariant for Vec<T> {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::Array(elements) => elements.iter().map(T::try_from_variant).collect(),
            other => Err(bad_type(VariantType::Array, other)),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_out_of_range_is_bad_value() {
        let big = Variant::Int(300);

        assert_eq!(u8::try_from_variant(&Variant::Int(255)).ok(), Some(255));

        let err = u8::try_from_variant(&big).expect_err("300 does not fit into u8");
        assert_eq!(err.value(), Some(&big));
        assert!(err.to_string().contains("domain"), "{err}");
    }

    #[test]
    fn wrong_type_reports_both_types() {
        let err = i64::try_from_variant(&Variant::from("text")).expect_err("string is not int");
        assert_eq!(err.to_string(), r#"expected type Int, got String: String("text")"#);
    }

    #[test]
    fn vec_converts_elementwise() {
        let ints = vec![1i64, 2, 3];
        let variant = ints.to_variant();

        assert_eq!(Vec::<i64>::from_variant(&variant), ints);
        assert!(Vec::<bool>::try_from_variant(&variant).is_err());
    }

    #[test]
    #[should_panic(expected = "FromVariant::from_variant() failed")]
    fn from_variant_panics_on_mismatch() {
        let _ = bool::from_variant(&Variant::Int(1));
    }
}
