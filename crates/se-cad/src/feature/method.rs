//! Method discriminators
//!
//! Each feature family selects a named variant with a discriminator string.
//! The string is parsed once at the entry point into a family-specific enum
//! and every later decision is an exhaustive `match` on that enum.

/// Declare the method enum of one feature family
///
/// Generates the enum with serde names, `ALL`, `as_str`, `parse` and
/// `Display`. The first listed variant is the family default.
macro_rules! feature_methods {
    (
        $(#[$meta:meta])*
        $name:ident for $family:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Get the discriminator string of this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parse a discriminator string
            pub fn parse(method: &str) -> $crate::error::SessionResult<Self> {
                match method {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::error::SessionError::UnknownMethod {
                        family: $crate::feature::FeatureFamily::$family.as_str().to_string(),
                        method: other.to_string(),
                    }),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use feature_methods;
