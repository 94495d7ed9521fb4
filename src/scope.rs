//! Installation scope on the remote target.

use std::fmt;

/// Visibility tier for an installed package.
///
/// `Public` installs into the path shared by all principals and requires the
/// connecting principal to hold the elevated administrative role; `Private`
/// installs into the connecting principal's own path. When the caller does
/// not pick a scope, the default is `Public` for elevated principals and
/// `Private` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    Public,
    #[default]
    Private,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => write!(f, "public"),
            Scope::Private => write!(f, "private"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Scope::Public.to_string(), "public");
        assert_eq!(Scope::Private.to_string(), "private");
    }

    #[test]
    fn test_default_is_private() {
        assert_eq!(Scope::default(), Scope::Private);
    }
}
