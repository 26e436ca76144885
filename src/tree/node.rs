//! Node type definitions.
//!
//! `NodeKind` carries the per-kind payload of a node. Navigation links
//! (parent, children, siblings, attributes) live in `NodeData`, not here.

/// The kind of a document node and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document` and it never
    /// has a parent.
    Document,

    /// An element, e.g. `<item id="3">`. An empty name is legal and is
    /// written as `unknown` in markup.
    Element {
        /// The tag name.
        name: String,
    },

    /// An attribute. Lives in its owner's attribute list, never in a child list.
    Attribute {
        /// The attribute name.
        name: String,
        /// The decoded attribute value.
        value: String,
    },

    /// Character data. `cdata` marks content that came from (and is written
    /// back as) a `<![CDATA[...]]>` section.
    Text {
        /// The decoded text.
        content: String,
        /// Whether the text is a CDATA section.
        cdata: bool,
    },

    /// A comment, without the `<!--` and `-->` delimiters.
    Comment {
        /// The comment text.
        content: String,
    },

    /// A declaration such as `<?xml version="1.0" ?>`. Its pseudo-attributes
    /// are ordinary attribute nodes.
    Declaration {
        /// The declaration target, e.g. `xml`.
        name: String,
    },

    /// An unrecognized `<!...>` construct kept verbatim (e.g. a DOCTYPE).
    Unknown {
        /// Everything between `<` and `>`.
        content: String,
    },
}

/// The payload-free tag of a [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    Declaration,
    Unknown,
}

impl NodeType {
    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 7] = [
        Self::Document,
        Self::Element,
        Self::Attribute,
        Self::Text,
        Self::Comment,
        Self::Declaration,
        Self::Unknown,
    ];

    /// Whether nodes of this type may own a child list.
    #[must_use]
    pub fn can_own_children(self) -> bool {
        matches!(self, Self::Document | Self::Element)
    }

    /// Whether nodes of this type may own an attribute list.
    #[must_use]
    pub fn can_own_attributes(self) -> bool {
        matches!(self, Self::Element | Self::Declaration)
    }
}

impl NodeKind {
    /// Returns the payload-free type tag.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element { .. } => NodeType::Element,
            Self::Attribute { .. } => NodeType::Attribute,
            Self::Text { .. } => NodeType::Text,
            Self::Comment { .. } => NodeType::Comment,
            Self::Declaration { .. } => NodeType::Declaration,
            Self::Unknown { .. } => NodeType::Unknown,
        }
    }
}
