//! vCard field names understood by the server's vCard commands.

use std::fmt;
use std::str::FromStr;

/// A profile field stored in a user's vCard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VCardField {
    FullName,
    Nickname,
    Birthday,
    Email,
    Country,
    City,
    Description,
    AvatarUrl,
}

impl VCardField {
    pub const ALL: [VCardField; 8] = [
        Self::FullName,
        Self::Nickname,
        Self::Birthday,
        Self::Email,
        Self::Country,
        Self::City,
        Self::Description,
        Self::AvatarUrl,
    ];

    /// The vCard token, with a space between element and sub-element.
    pub fn token(self) -> &'static str {
        match self {
            Self::FullName => "FN",
            Self::Nickname => "NICKNAME",
            Self::Birthday => "BDAY",
            Self::Email => "EMAIL USERID",
            Self::Country => "ADR CTRY",
            Self::City => "ADR LOCALITY",
            Self::Description => "DESC",
            Self::AvatarUrl => "EXTRA PHOTOURL",
        }
    }

    /// Element name and optional sub-element name.
    ///
    /// Two-part fields go through `set_vcard2` / `get_vcard2`.
    pub fn parts(self) -> (&'static str, Option<&'static str>) {
        match self.token().split_once(' ') {
            Some((name, sub)) => (name, Some(sub)),
            None => (self.token(), None),
        }
    }
}

impl fmt::Display for VCardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for VCardField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.token().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown vCard field: {}", s))
    }
}
