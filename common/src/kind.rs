//! Macros for defining kind enums.

/// Defines a closed set of named values stored as a small integer and
/// exposed as a lowercase string.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
/// define_kind! {
///     #[doc = "Shape kind."]
///     enum Shape {
///         #[doc = "A cube."]
///         Cube = 1,
///
///         #[doc = "A sphere."]
///         Sphere = 2,
///     }
/// }
///
/// assert_eq!(Shape::Cube.to_string(), "cube");
/// assert_eq!("sphere".parse::<Shape>().unwrap(), Shape::Sphere);
/// assert_eq!(Shape::ALL.len(), 2);
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            $crate::private::strum::IntoStaticStr,
            Eq,
            Hash,
            PartialEq,
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "lowercase")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Returns the string representation of this value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }

        $crate::__kind_serde!($name);

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let raw = u8::try_from(i16::from_sql(ty, raw)?)?;
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.u8() == raw)
                    .ok_or_else(|| ::std::format!(
                        "invalid `{}` value: {raw}",
                        ::core::stringify!($name),
                    ).into())
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

/// Implements [`serde`] integration of a [`define_kind!`] enum via its string
/// representation.
///
/// [`serde`]: https://docs.rs/serde
#[cfg(feature = "serde")]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($name:ident) => {
        impl $crate::private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::private::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> $crate::private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::private::serde::Deserializer<'de>,
            {
                let s = <::std::string::String as $crate::private::serde::Deserialize<'de>>::deserialize(
                    deserializer,
                )?;
                s.parse().map_err(|_| {
                    <D::Error as $crate::private::serde::de::Error>::custom(
                        ::std::format!(
                            "invalid `{}` value: `{s}`",
                            ::core::stringify!($name),
                        ),
                    )
                })
            }
        }
    };
}

/// No-op without the `serde` feature.
#[cfg(not(feature = "serde"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($name:ident) => {};
}

#[cfg(test)]
mod spec {
    crate::define_kind! {
        #[doc = "Kind used in tests."]
        enum Access {
            #[doc = "Read access."]
            Read = 1,

            #[doc = "Write access."]
            ReadWrite = 2,
        }
    }

    #[test]
    fn displays_as_lowercase() {
        assert_eq!(Access::Read.to_string(), "read");
        assert_eq!(Access::ReadWrite.as_str(), "readwrite");
    }

    #[test]
    fn parses_from_lowercase() {
        assert_eq!("read".parse::<Access>().unwrap(), Access::Read);
        assert_eq!("readwrite".parse::<Access>().unwrap(), Access::ReadWrite);
        assert!("Read".parse::<Access>().is_err());
        assert!("none".parse::<Access>().is_err());
    }

    #[test]
    fn lists_all_variants_in_order() {
        assert_eq!(Access::ALL, &[Access::Read, Access::ReadWrite]);
        assert_eq!(Access::ReadWrite.u8(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_string() {
        assert_eq!(
            serde_json::to_string(&Access::ReadWrite).unwrap(),
            r#""readwrite""#,
        );
        assert_eq!(
            serde_json::from_str::<Access>(r#""read""#).unwrap(),
            Access::Read,
        );
        assert!(serde_json::from_str::<Access>(r#""admin""#).is_err());
    }
}
