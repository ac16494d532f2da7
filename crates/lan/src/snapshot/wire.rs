/// Declares an enum whose wire ordinals are fixed by an explicit table
/// instead of declaration order. Unknown ordinals decode to the fallback.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident (fallback = $fallback:ident) {
            $($variant:ident = $ordinal:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn to_wire(self) -> u8 {
                match self {
                    $($name::$variant => $ordinal),+
                }
            }

            pub const fn from_wire(ordinal: u8) -> Option<Self> {
                match ordinal {
                    $($ordinal => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$fallback
            }
        }

        impl From<u8> for $name {
            fn from(ordinal: u8) -> Self {
                Self::from_wire(ordinal).unwrap_or_else(|| {
                    log::debug!(
                        "Unknown {} ordinal {}, using {:?}",
                        stringify!($name),
                        ordinal,
                        $name::$fallback
                    );
                    $name::$fallback
                })
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.to_wire()
            }
        }
    };
}

pub(crate) use wire_enum;
