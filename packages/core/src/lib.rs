//! Protocol core for a Linked Data Platform (LDP) resource server.
//!
//! This crate holds everything about the HTTP binding that does not depend
//! on a particular HTTP framework or storage engine. The `ldp-node` crate
//! wires it to Axum and to the graph/blob store collaborators.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`graph`] | The opaque RDF [`Graph`] value handed to codecs and stores |
//! | [`codec`] | Parser/serializer traits and the immutable [`CodecRegistry`] |
//! | [`negotiate`] | Ranked media-type parsing and [`negotiate`] |
//! | [`link`] | `Link` header parsing into a [`ContainerLinkSet`] |
//! | [`slug`] | `Slug` handling and child-IRI computation for `POST` |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use ldp::{negotiate, CodecRegistry};
//!
//! let codecs = CodecRegistry::with_defaults();
//! let mime = codecs.accepts_serializer(Some("text/turtle;q=0.9, application/n-triples"));
//! assert_eq!(mime.as_deref(), Some("application/n-triples"));
//! ```

pub mod codec;
pub mod graph;
pub mod link;
pub mod negotiate;
pub mod slug;

pub use codec::{CodecError, CodecRegistry, CodecRegistryBuilder, Parser, Serializer};
pub use graph::{Graph, Term, Triple};
pub use link::{ContainerLinkSet, LinkRelation, BASIC_CONTAINER};
pub use negotiate::{negotiate, parse_media_ranges, MediaRange};
pub use slug::{child_iri, container_iri, IriError, Slug};

/// The `rdf:type` predicate IRI.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
