/// Validated value types for the attributes the merge engine reconciles.
///
/// Each type parses a constrained attribute value via [`TryFrom<&str>`] and
/// carries its default-if-absent semantics as an associated constant or
/// constructor. Parse failures return a [`ValueError`] whose `expected` text
/// feeds directly into the engine's diagnostic messages.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Error produced when an attribute value does not match its expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The string did not match the expected format.
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// Human-readable description of the expected format, phrased to
        /// slot into a diagnostic sentence.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat {
                type_name,
                expected,
                got,
            } => write!(f, "invalid {type_name}: {expected}, found {got:?}"),
        }
    }
}

impl std::error::Error for ValueError {}

// ---------------------------------------------------------------------------
// Regex statics
//
// Both patterns are compile-time literals; Regex::new never returns Err for
// them. The fallback chain exists because the workspace bans expect() and
// unwrap(); "a^" never matches and is always a valid pattern.
// ---------------------------------------------------------------------------

/// Matches one or more decimal digits and nothing else.
static SDK_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

/// Matches `0x` followed by 1–8 hex digits.
static GL_ES_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{1,8}$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

// ---------------------------------------------------------------------------
// SdkVersion
// ---------------------------------------------------------------------------

/// An API level from `<uses-sdk android:minSdkVersion>`.
///
/// Accepts decimal digits only — no sign, no hex, no whitespace — and the
/// value must fit a 32-bit signed integer. A manifest that omits the
/// attribute is treated as declaring [`SdkVersion::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SdkVersion(i32);

impl SdkVersion {
    /// The level assumed when a manifest declares no `minSdkVersion`.
    pub const DEFAULT: SdkVersion = SdkVersion(1);

    /// Returns the numeric API level.
    pub fn level(self) -> i32 {
        self.0
    }
}

impl TryFrom<&str> for SdkVersion {
    type Error = ValueError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let invalid = || ValueError::InvalidFormat {
            type_name: "SdkVersion",
            expected: "must be an integer number",
            got: s.to_owned(),
        };
        if !SDK_VERSION_RE.is_match(s) {
            return Err(invalid());
        }
        // The digit-only shape check above leaves overflow as the only
        // remaining failure mode.
        s.parse::<i32>().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GlEsVersion
// ---------------------------------------------------------------------------

/// An OpenGL ES version from `<uses-feature android:glEsVersion>`.
///
/// Accepts hex literals of the form `0x` + 1–8 hex digits, interpreted as an
/// unsigned 32-bit integer whose high 16 bits are the major version and low
/// 16 bits the minor. Displays in the canonical `0x00020001` form. A manifest
/// that declares no GL ES requirement is treated as requiring
/// [`GlEsVersion::DEFAULT`] (1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlEsVersion(u32);

impl GlEsVersion {
    /// GL ES 1.0, the version assumed when no requirement is declared.
    pub const DEFAULT: GlEsVersion = GlEsVersion(0x0001_0000);

    /// Returns the packed major/minor value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Whether this version is below GL ES 1.0. Such declarations are
    /// ignored by the engine with a warning.
    pub fn below_minimum(self) -> bool {
        self.0 < Self::DEFAULT.0
    }
}

impl TryFrom<&str> for GlEsVersion {
    type Error = ValueError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let invalid = || ValueError::InvalidFormat {
            type_name: "GlEsVersion",
            expected: "must be an integer in the form 0x00020001",
            got: s.to_owned(),
        };
        if !GL_ES_VERSION_RE.is_match(s) {
            return Err(invalid());
        }
        u32::from_str_radix(&s[2..], 16).map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for GlEsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RequiredFlag
// ---------------------------------------------------------------------------

/// The `android:required` boolean on `<uses-library>`.
///
/// Only the exact literals `true` and `false` parse. The engine treats both
/// an absent attribute and a failed parse as *required* — a library is never
/// silently made optional by a typo — with the parse failure surfaced as a
/// warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequiredFlag(bool);

impl RequiredFlag {
    /// The effective value for an absent attribute.
    pub const DEFAULT: RequiredFlag = RequiredFlag(true);

    /// Returns the boolean value.
    pub fn is_required(self) -> bool {
        self.0
    }
}

impl TryFrom<&str> for RequiredFlag {
    type Error = ValueError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "true" => Ok(Self(true)),
            "false" => Ok(Self(false)),
            _ => Err(ValueError::InvalidFormat {
                type_name: "RequiredFlag",
                expected: "Expected 'true' or 'false'",
                got: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for RequiredFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "true" } else { "false" })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
