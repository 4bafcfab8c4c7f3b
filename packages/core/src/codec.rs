//! RDF parsers and serializers, and the registry that indexes them by
//! media type.
//!
//! A [`CodecRegistry`] is built once at startup and shared behind an `Arc`.
//! It is never mutated afterwards; handlers only look things up.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Arc;

use oxiri::Iri;
use rio_api::formatter::TriplesFormatter;
use rio_api::model;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesFormatter, NTriplesParser, TurtleError, TurtleFormatter, TurtleParser};

use crate::graph::{Graph, Term, Triple};
use crate::negotiate::negotiate;

pub const TURTLE: &str = "text/turtle";
pub const N_TRIPLES: &str = "application/n-triples";

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Errors produced by codecs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input is not valid in the codec's syntax.
    #[error("parse error: {0}")]
    Parse(String),

    /// The graph could not be written out.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Turns request bytes into a [`Graph`].
pub trait Parser: Send + Sync + 'static {
    /// Parse `data`, resolving relative IRIs against `base_iri`.
    fn parse(&self, data: &[u8], base_iri: &str) -> Result<Graph, CodecError>;
}

/// Turns a [`Graph`] into response bytes.
pub trait Serializer: Send + Sync + 'static {
    fn serialize(&self, graph: &Graph, base_iri: &str) -> Result<Vec<u8>, CodecError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable mapping from media type to parser, serializer, and file
/// extension.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    parsers: BTreeMap<String, Arc<dyn Parser>>,
    serializers: BTreeMap<String, Arc<dyn Serializer>>,
    extensions: BTreeMap<String, String>,
}

impl CodecRegistry {
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// Registry with the built-in Turtle and N-Triples codecs.
    pub fn with_defaults() -> Self {
        Self::builder()
            .parser(TURTLE, TurtleCodec)
            .serializer(TURTLE, TurtleCodec)
            .extension(TURTLE, "ttl")
            .parser(N_TRIPLES, NTriplesCodec)
            .serializer(N_TRIPLES, NTriplesCodec)
            .extension(N_TRIPLES, "nt")
            .build()
    }

    pub fn parser(&self, mime: &str) -> Option<&Arc<dyn Parser>> {
        self.parsers.get(mime)
    }

    pub fn serializer(&self, mime: &str) -> Option<&Arc<dyn Serializer>> {
        self.serializers.get(mime)
    }

    /// Canonical file extension (without the dot) for `mime`, if any.
    pub fn extension(&self, mime: &str) -> Option<&str> {
        self.extensions.get(mime).map(String::as_str)
    }

    /// Negotiate a `Content-Type` header against the registered parsers.
    pub fn accepts_parser(&self, content_type: Option<&str>) -> Option<String> {
        negotiate(content_type, self.parsers.keys().map(String::as_str))
    }

    /// Negotiate an `Accept` header against the registered serializers.
    pub fn accepts_serializer(&self, accept: Option<&str>) -> Option<String> {
        negotiate(accept, self.serializers.keys().map(String::as_str))
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("parsers", &self.parsers.keys().collect::<Vec<_>>())
            .field("serializers", &self.serializers.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Builder for [`CodecRegistry`]. Media types are stored lowercased.
#[derive(Default)]
pub struct CodecRegistryBuilder {
    inner: CodecRegistry,
}

impl CodecRegistryBuilder {
    pub fn parser(mut self, mime: &str, parser: impl Parser) -> Self {
        self.inner
            .parsers
            .insert(mime.to_ascii_lowercase(), Arc::new(parser));
        self
    }

    pub fn serializer(mut self, mime: &str, serializer: impl Serializer) -> Self {
        self.inner
            .serializers
            .insert(mime.to_ascii_lowercase(), Arc::new(serializer));
        self
    }

    pub fn extension(mut self, mime: &str, ext: &str) -> Self {
        self.inner.extensions.insert(
            mime.to_ascii_lowercase(),
            ext.trim_start_matches('.').to_string(),
        );
        self
    }

    pub fn build(self) -> CodecRegistry {
        self.inner
    }
}

// ---------------------------------------------------------------------------
// Built-in codecs
// ---------------------------------------------------------------------------

/// Turtle, via `rio_turtle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleCodec;

impl Parser for TurtleCodec {
    fn parse(&self, data: &[u8], base_iri: &str) -> Result<Graph, CodecError> {
        let base = Iri::parse(base_iri.to_string()).ok();
        let mut parser = TurtleParser::new(data, base);
        collect_triples(&mut parser)
    }
}

impl Serializer for TurtleCodec {
    fn serialize(&self, graph: &Graph, _base_iri: &str) -> Result<Vec<u8>, CodecError> {
        let mut formatter = TurtleFormatter::new(Vec::new());
        for triple in graph.triples() {
            format_triple(&mut formatter, triple)?;
        }
        formatter
            .finish()
            .map_err(|e| CodecError::Serialize(e.to_string()))
    }
}

/// N-Triples, via `rio_turtle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NTriplesCodec;

impl Parser for NTriplesCodec {
    fn parse(&self, data: &[u8], _base_iri: &str) -> Result<Graph, CodecError> {
        let mut parser = NTriplesParser::new(data);
        collect_triples(&mut parser)
    }
}

impl Serializer for NTriplesCodec {
    fn serialize(&self, graph: &Graph, _base_iri: &str) -> Result<Vec<u8>, CodecError> {
        let mut formatter = NTriplesFormatter::new(Vec::new());
        for triple in graph.triples() {
            format_triple(&mut formatter, triple)?;
        }
        formatter
            .finish()
            .map_err(|e| CodecError::Serialize(e.to_string()))
    }
}

/// Blank node labels scoped to one parse. Document labels are mapped to
/// fresh ones, so graphs from separate parses never share a blank node.
struct BlankLabels {
    scope: String,
    seen: HashMap<String, String>,
}

impl BlankLabels {
    fn new() -> Self {
        Self {
            scope: uuid::Uuid::now_v7().simple().to_string(),
            seen: HashMap::new(),
        }
    }

    fn label(&mut self, id: &str) -> Term {
        let next = self.seen.len();
        let scope = &self.scope;
        let label = self
            .seen
            .entry(id.to_string())
            .or_insert_with(|| format!("b{scope}n{next}"));
        Term::blank(label.clone())
    }
}

fn collect_triples<P>(parser: &mut P) -> Result<Graph, CodecError>
where
    P: TriplesParser<Error = TurtleError>,
{
    let mut graph = Graph::new();
    let mut labels = BlankLabels::new();
    parser
        .parse_all(&mut |t| -> Result<(), TurtleError> {
            graph.insert(from_rio(&t, &mut labels)?);
            Ok(())
        })
        .map_err(|e| CodecError::Parse(e.to_string()))?;
    Ok(graph)
}

fn format_triple<F>(formatter: &mut F, triple: &Triple) -> Result<(), CodecError>
where
    F: TriplesFormatter<Error = io::Error>,
{
    let predicate = model::NamedNode {
        iri: &triple.predicate,
    };
    let subject = match &triple.subject {
        Term::Iri(iri) => model::Subject::NamedNode(model::NamedNode { iri }),
        Term::Blank(id) => model::Subject::BlankNode(model::BlankNode { id }),
        Term::Literal { .. } => {
            return Err(CodecError::Serialize(
                "literal in subject position".to_string(),
            ))
        }
    };
    let object = match &triple.object {
        Term::Iri(iri) => model::Term::NamedNode(model::NamedNode { iri }),
        Term::Blank(id) => model::Term::BlankNode(model::BlankNode { id }),
        Term::Literal {
            value,
            datatype,
            language,
        } => model::Term::Literal(match (language, datatype) {
            (Some(language), _) => model::Literal::LanguageTaggedString { value, language },
            (None, Some(dt)) => model::Literal::Typed {
                value,
                datatype: model::NamedNode { iri: dt },
            },
            (None, None) => model::Literal::Simple { value },
        }),
    };

    formatter
        .format(&model::Triple {
            subject,
            predicate,
            object,
        })
        .map_err(|e| CodecError::Serialize(e.to_string()))
}

fn from_rio(t: &model::Triple<'_>, labels: &mut BlankLabels) -> Result<Triple, io::Error> {
    let subject = match t.subject {
        model::Subject::NamedNode(n) => Term::iri(n.iri),
        model::Subject::BlankNode(b) => labels.label(b.id),
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported("quoted triple in subject position")),
    };
    let object = match t.object {
        model::Term::NamedNode(n) => Term::iri(n.iri),
        model::Term::BlankNode(b) => labels.label(b.id),
        model::Term::Literal(model::Literal::Simple { value }) => Term::literal(value),
        model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => {
            Term::lang_literal(value, language.to_ascii_lowercase())
        }
        model::Term::Literal(model::Literal::Typed { value, datatype }) => {
            if datatype.iri == XSD_STRING {
                Term::literal(value)
            } else {
                Term::typed_literal(value, datatype.iri)
            }
        }
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported("quoted triple in object position")),
    };
    Ok(Triple::new(subject, t.predicate.iri, object))
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        @prefix ex: <http://example.org/> .
        <> ex:title "Report"@en ;
           ex:size 42 ;
           ex:next <other> .
    "#;

    #[test]
    fn turtle_resolves_relative_iris_against_base() {
        let graph = TurtleCodec
            .parse(DOC.as_bytes(), "http://localhost/c/report.ttl")
            .unwrap();
        assert_eq!(graph.len(), 3);
        assert!(graph.contains(&Triple::new(
            Term::iri("http://localhost/c/report.ttl"),
            "http://example.org/next",
            Term::iri("http://localhost/c/other"),
        )));
        assert!(graph.contains(&Triple::new(
            Term::iri("http://localhost/c/report.ttl"),
            "http://example.org/title",
            Term::lang_literal("Report", "en"),
        )));
    }

    #[test]
    fn invalid_turtle_is_a_parse_error() {
        let err = TurtleCodec
            .parse(b"<a> <b> oops", "http://localhost/x")
            .unwrap_err();
        assert!(matches!(err, CodecError::Parse(_)));
    }

    #[test]
    fn ntriples_output_reparses_to_same_graph() {
        let graph = TurtleCodec
            .parse(DOC.as_bytes(), "http://localhost/r")
            .unwrap();
        let bytes = NTriplesCodec.serialize(&graph, "http://localhost/r").unwrap();
        let back = NTriplesCodec.parse(&bytes, "http://localhost/r").unwrap();
        assert_eq!(back, graph);
    }

    fn blank_nodes(graph: &Graph) -> std::collections::BTreeSet<&Term> {
        graph
            .triples()
            .flat_map(|t| [&t.subject, &t.object])
            .filter(|term| matches!(term, Term::Blank(_)))
            .collect()
    }

    #[test]
    fn separate_parses_never_share_blank_nodes() {
        let first = TurtleCodec
            .parse(b"<http://s> <http://p> [ <http://q> \"1\" ] .", "http://localhost/")
            .unwrap();
        let second = TurtleCodec
            .parse(b"<http://s> <http://p> [ <http://q> \"2\" ] .", "http://localhost/")
            .unwrap();
        let mut merged = first.clone();
        merged.merge(&second);
        assert_eq!(merged.len(), 4);
        assert_eq!(blank_nodes(&merged).len(), 2);
    }

    #[test]
    fn one_label_stays_one_node_within_a_parse() {
        let graph = NTriplesCodec
            .parse(
                b"_:a <http://p> \"1\" .\n_:a <http://q> \"2\" .\n_:b <http://p> \"3\" .\n",
                "",
            )
            .unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(blank_nodes(&graph).len(), 2);
    }

    #[test]
    fn turtle_output_mentions_subject() {
        let graph: Graph = [Triple::new(
            Term::iri("http://example.org/a"),
            "http://example.org/b",
            Term::literal("c"),
        )]
        .into_iter()
        .collect();
        let out = String::from_utf8(TurtleCodec.serialize(&graph, "").unwrap()).unwrap();
        assert!(out.contains("<http://example.org/a>"));
    }

    #[test]
    fn default_registry_knows_turtle_and_ntriples() {
        let codecs = CodecRegistry::with_defaults();
        assert!(codecs.parser(TURTLE).is_some());
        assert!(codecs.serializer(N_TRIPLES).is_some());
        assert_eq!(codecs.extension(TURTLE), Some("ttl"));
        assert_eq!(codecs.extension(N_TRIPLES), Some("nt"));
        assert_eq!(codecs.extension("image/png"), None);
    }

    #[test]
    fn registry_negotiates_both_directions() {
        let codecs = CodecRegistry::with_defaults();
        assert_eq!(
            codecs.accepts_parser(Some("text/turtle; charset=utf-8")).as_deref(),
            Some(TURTLE)
        );
        assert_eq!(codecs.accepts_parser(Some("image/png")), None);
        assert_eq!(
            codecs
                .accepts_serializer(Some("text/html, application/n-triples;q=0.1"))
                .as_deref(),
            Some(N_TRIPLES)
        );
    }
}
