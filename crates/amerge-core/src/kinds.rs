/// The element-kind policy table.
///
/// [`ElementKind`] is a closed enum over every manifest element the engine
/// merges, at both recognized levels (direct children of `/manifest` and of
/// `/manifest/application`). A kind carries its key attribute and its
/// [`MergeAction`]; dispatch is a tag-name lookup with an implicit
/// "unrecognized, ignore in libraries" default for everything else —
/// including the deliberately unmerged `supports-screens`,
/// `uses-configuration`, `compatible-screens`, and `supports-gl-texture`.
use std::fmt;

/// Namespace URI of the `android:` attributes the policies key on.
pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Where in the document an element was encountered.
///
/// The same tag name can be recognized at one level and ignored at the
/// other, so dispatch is always level-qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Direct children of `/manifest`.
    Manifest,
    /// Direct children of `/manifest/application`.
    Application,
}

// ---------------------------------------------------------------------------
// MergeAction
// ---------------------------------------------------------------------------

/// What the engine does when a library element of some kind meets the
/// primary document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeAction {
    /// Union by key: append when the key is absent from the primary, skip
    /// silently when present.
    Union,
    /// Union by key, but a key collision demands semantic equality: equal
    /// duplicates are skipped with a progress record, unequal ones are an
    /// error and the primary is left untouched.
    RequireEqual,
    /// Never modifies the primary; numeric reconciliation of
    /// `minSdkVersion` only.
    ReconcileSdk,
    /// `uses-feature` handling: GL ES version comparison plus name-keyed
    /// union with `glEsVersion` stripped from appended copies.
    ReconcileFeature,
    /// `uses-library` handling: name-keyed union plus one-way escalation of
    /// the `required` flag.
    ReconcileLibrary,
}

// ---------------------------------------------------------------------------
// ElementKind
// ---------------------------------------------------------------------------

/// A manifest element kind the engine knows how to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<uses-sdk>` — singleton, never overwritten.
    UsesSdk,
    /// `<uses-feature>` — keyed by `android:name` when present.
    UsesFeature,
    /// `<uses-permission>` — keyed by `android:name`.
    UsesPermission,
    /// `<activity>`.
    Activity,
    /// `<activity-alias>`.
    ActivityAlias,
    /// `<service>`.
    Service,
    /// `<receiver>`.
    Receiver,
    /// `<provider>`.
    Provider,
    /// `<uses-library>` — keyed by `android:name`, `required` escalates.
    UsesLibrary,
    /// `<meta-data>` — keyed by `android:name`, equality required.
    MetaData,
}

impl ElementKind {
    /// Looks up the kind for a tag name at a document level. Returns `None`
    /// for anything the engine ignores in libraries.
    pub fn from_tag(tag: &str, level: Level) -> Option<Self> {
        match level {
            Level::Manifest => match tag {
                "uses-sdk" => Some(Self::UsesSdk),
                "uses-feature" => Some(Self::UsesFeature),
                "uses-permission" => Some(Self::UsesPermission),
                _ => None,
            },
            Level::Application => match tag {
                "activity" => Some(Self::Activity),
                "activity-alias" => Some(Self::ActivityAlias),
                "service" => Some(Self::Service),
                "receiver" => Some(Self::Receiver),
                "provider" => Some(Self::Provider),
                "uses-library" => Some(Self::UsesLibrary),
                "meta-data" => Some(Self::MetaData),
                _ => None,
            },
        }
    }

    /// The tag name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::UsesSdk => "uses-sdk",
            Self::UsesFeature => "uses-feature",
            Self::UsesPermission => "uses-permission",
            Self::Activity => "activity",
            Self::ActivityAlias => "activity-alias",
            Self::Service => "service",
            Self::Receiver => "receiver",
            Self::Provider => "provider",
            Self::UsesLibrary => "uses-library",
            Self::MetaData => "meta-data",
        }
    }

    /// The android-namespace local name of the key attribute, or `None` for
    /// the singleton `uses-sdk`. `uses-feature`'s key is optional in the
    /// document (a keyless `uses-feature` declares only a GL ES version).
    pub fn key_attribute(self) -> Option<&'static str> {
        match self {
            Self::UsesSdk => None,
            Self::UsesFeature
            | Self::UsesPermission
            | Self::Activity
            | Self::ActivityAlias
            | Self::Service
            | Self::Receiver
            | Self::Provider
            | Self::UsesLibrary
            | Self::MetaData => Some("name"),
        }
    }

    /// The merge policy for this kind.
    pub fn action(self) -> MergeAction {
        match self {
            Self::UsesSdk => MergeAction::ReconcileSdk,
            Self::UsesFeature => MergeAction::ReconcileFeature,
            Self::UsesPermission => MergeAction::Union,
            Self::Activity
            | Self::ActivityAlias
            | Self::Service
            | Self::Receiver
            | Self::Provider
            | Self::MetaData => MergeAction::RequireEqual,
            Self::UsesLibrary => MergeAction::ReconcileLibrary,
        }
    }

    /// Fixed output ordering of application-level append buckets: the five
    /// structural kinds in their mandated order, then the unioned kinds.
    pub fn application_bucket_order() -> &'static [ElementKind] {
        &[
            Self::Activity,
            Self::ActivityAlias,
            Self::Service,
            Self::Receiver,
            Self::Provider,
            Self::UsesLibrary,
            Self::MetaData,
        ]
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_level_dispatch() {
        assert_eq!(
            ElementKind::from_tag("uses-sdk", Level::Manifest),
            Some(ElementKind::UsesSdk)
        );
        assert_eq!(
            ElementKind::from_tag("uses-permission", Level::Manifest),
            Some(ElementKind::UsesPermission)
        );
        assert_eq!(ElementKind::from_tag("application", Level::Manifest), None);
    }

    #[test]
    fn application_level_dispatch() {
        assert_eq!(
            ElementKind::from_tag("activity", Level::Application),
            Some(ElementKind::Activity)
        );
        assert_eq!(
            ElementKind::from_tag("activity-alias", Level::Application),
            Some(ElementKind::ActivityAlias)
        );
        assert_eq!(
            ElementKind::from_tag("meta-data", Level::Application),
            Some(ElementKind::MetaData)
        );
    }

    #[test]
    fn levels_do_not_cross() {
        // activity is not a /manifest child, uses-sdk not an application one.
        assert_eq!(ElementKind::from_tag("activity", Level::Manifest), None);
        assert_eq!(ElementKind::from_tag("uses-sdk", Level::Application), None);
    }

    #[test]
    fn unmerged_kinds_are_unrecognized() {
        for tag in [
            "supports-screens",
            "uses-configuration",
            "compatible-screens",
            "supports-gl-texture",
        ] {
            assert_eq!(ElementKind::from_tag(tag, Level::Manifest), None);
        }
    }

    #[test]
    fn key_attributes() {
        assert_eq!(ElementKind::UsesSdk.key_attribute(), None);
        assert_eq!(ElementKind::Activity.key_attribute(), Some("name"));
        assert_eq!(ElementKind::UsesLibrary.key_attribute(), Some("name"));
    }

    #[test]
    fn actions() {
        assert_eq!(ElementKind::UsesSdk.action(), MergeAction::ReconcileSdk);
        assert_eq!(ElementKind::Service.action(), MergeAction::RequireEqual);
        assert_eq!(
            ElementKind::UsesLibrary.action(),
            MergeAction::ReconcileLibrary
        );
        assert_eq!(ElementKind::UsesPermission.action(), MergeAction::Union);
    }

    #[test]
    fn bucket_order_starts_with_the_five_structural_kinds() {
        let order = ElementKind::application_bucket_order();
        assert_eq!(
            &order[..5],
            &[
                ElementKind::Activity,
                ElementKind::ActivityAlias,
                ElementKind::Service,
                ElementKind::Receiver,
                ElementKind::Provider,
            ]
        );
    }

    #[test]
    fn tag_round_trips_through_dispatch() {
        for kind in ElementKind::application_bucket_order() {
            assert_eq!(
                ElementKind::from_tag(kind.tag(), Level::Application),
                Some(*kind)
            );
        }
    }
}
