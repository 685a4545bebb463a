use roxmltree::Node;
use shared::protocol::{WSA_2004_NS, WSA_2005_NS, WSD_2005_NS, WSD_2009_NS};

/// One of the two WS-Discovery vocabularies seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceProfile {
    pub label: &'static str,
    pub addressing: &'static str,
    pub discovery: &'static str,
}

pub const PROFILE_2005: NamespaceProfile = NamespaceProfile {
    label: "2005/04",
    addressing: WSA_2004_NS,
    discovery: WSD_2005_NS,
};

pub const PROFILE_2009: NamespaceProfile = NamespaceProfile {
    label: "2009/01",
    addressing: WSA_2005_NS,
    discovery: WSD_2009_NS,
};

/// Probing order for the Action header and for every fallback lookup.
/// Changing it changes which value wins when a device emits both.
pub const KNOWN_PROFILES: [NamespaceProfile; 2] = [PROFILE_2005, PROFILE_2009];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Addressing,
    Discovery,
}

impl NamespaceProfile {
    pub fn uri(&self, vocabulary: Vocabulary) -> &'static str {
        match vocabulary {
            Vocabulary::Addressing => self.addressing,
            Vocabulary::Discovery => self.discovery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Child,
    Descendant,
}

/// Elements the codec extracts from inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Action,
    RelatesTo,
    ProbeMatch,
    Hello,
    EndpointAddress,
    XAddrs,
    Types,
    Scopes,
    MetadataVersion,
}

impl Field {
    const fn lookup(self) -> (Vocabulary, &'static str, Reach) {
        match self {
            Field::Action => (Vocabulary::Addressing, "Action", Reach::Descendant),
            Field::RelatesTo => (Vocabulary::Addressing, "RelatesTo", Reach::Descendant),
            Field::ProbeMatch => (Vocabulary::Discovery, "ProbeMatch", Reach::Descendant),
            Field::Hello => (Vocabulary::Discovery, "Hello", Reach::Descendant),
            Field::EndpointAddress => (Vocabulary::Addressing, "Address", Reach::Descendant),
            Field::XAddrs => (Vocabulary::Discovery, "XAddrs", Reach::Child),
            Field::Types => (Vocabulary::Discovery, "Types", Reach::Child),
            Field::Scopes => (Vocabulary::Discovery, "Scopes", Reach::Child),
            Field::MetadataVersion => (Vocabulary::Discovery, "MetadataVersion", Reach::Child),
        }
    }
}

/// Namespace URIs to try for `vocabulary`: the active profile first, then every
/// known profile in order, skipping URIs already tried.
fn candidates(active: NamespaceProfile, vocabulary: Vocabulary) -> Vec<&'static str> {
    let mut uris = Vec::with_capacity(KNOWN_PROFILES.len() + 1);
    for profile in std::iter::once(active).chain(KNOWN_PROFILES) {
        let uri = profile.uri(vocabulary);
        if !uris.contains(&uri) {
            uris.push(uri);
        }
    }
    uris
}

fn find_in<'a, 'input>(
    scope: Node<'a, 'input>,
    namespace: &str,
    name: &str,
    reach: Reach,
) -> Option<Node<'a, 'input>> {
    let matches = |node: &Node| node.is_element() && node.has_tag_name((namespace, name));
    match reach {
        Reach::Child => scope.children().find(matches),
        Reach::Descendant => scope.descendants().find(matches),
    }
}

/// Look up `field` under `scope` using only `profile`'s namespaces.
pub fn find_strict<'a, 'input>(
    scope: Node<'a, 'input>,
    profile: NamespaceProfile,
    field: Field,
) -> Option<Node<'a, 'input>> {
    let (vocabulary, name, reach) = field.lookup();
    find_in(scope, profile.uri(vocabulary), name, reach)
}

/// Look up `field` under `scope`, falling back from the active profile to the
/// raw URIs of each known profile.
pub fn find<'a, 'input>(
    scope: Node<'a, 'input>,
    active: NamespaceProfile,
    field: Field,
) -> Option<Node<'a, 'input>> {
    let (vocabulary, name, reach) = field.lookup();
    candidates(active, vocabulary)
        .into_iter()
        .find_map(|uri| find_in(scope, uri, name, reach))
}

/// Locate the Action header and the profile it was found under.
pub fn locate_action<'a, 'input>(
    root: Node<'a, 'input>,
) -> Option<(NamespaceProfile, Node<'a, 'input>)> {
    KNOWN_PROFILES
        .into_iter()
        .find_map(|profile| find_strict(root, profile, Field::Action).map(|node| (profile, node)))
}
