//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Primitive types and delivery modes travel as lowercase strings (in event
//! payloads, environment variables and config files). This macro provides both
//! directions in one place with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use agnost_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Transport {
//!     Stdio,
//!     Http,
//! }
//!
//! impl_domain_enum_conversions!(Transport {
//!     Stdio => "stdio",
//!     Http => "http",
//! });
//! ```

/// Implements Display and FromStr traits for wire-level enums
///
/// - Display: the variant's lowercase wire string
/// - FromStr: case-insensitive parse, error names the enum
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::std::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestKind {
        Tool,
        Resource,
    }

    impl_domain_enum_conversions!(TestKind {
        Tool => "tool",
        Resource => "resource",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestKind::Tool.to_string(), "tool");
        assert_eq!(TestKind::Resource.to_string(), "resource");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(TestKind::from_str("TOOL").unwrap(), TestKind::Tool);
        assert_eq!(TestKind::from_str(" Resource ").unwrap(), TestKind::Resource);
    }

    #[test]
    fn test_fromstr_invalid() {
        let err = TestKind::from_str("prompt").unwrap_err();
        assert!(err.contains("TestKind"));
        assert!(err.contains("prompt"));
    }

    mod with_result_alias {
        use std::str::FromStr;

        use crate::errors::Result;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Channel {
            Stdio,
            Http,
        }

        impl_domain_enum_conversions!(Channel {
            Stdio => "stdio",
            Http => "http",
        });

        fn parse(raw: &str) -> Result<Channel> {
            Channel::from_str(raw).map_err(crate::errors::AgnostError::Config)
        }

        #[test]
        fn test_expands_next_to_crate_result_alias() {
            assert_eq!(parse("HTTP").unwrap(), Channel::Http);
            assert_eq!(Channel::Stdio.to_string(), "stdio");
            assert!(parse("grpc").is_err());
        }
    }
}
