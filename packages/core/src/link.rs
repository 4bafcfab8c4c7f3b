//! `Link` header parsing (RFC 8288), reduced to what container detection
//! needs.

/// Type marker a client sends to ask for a basic container.
pub const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";

/// One `<target>; rel="..."` entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    pub target: String,
    /// Relation types, lowercased. Empty if the entry had no `rel`.
    pub rels: Vec<String>,
}

/// All link relations carried by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLinkSet {
    links: Vec<LinkRelation>,
}

impl ContainerLinkSet {
    /// Parse a `Link` header value. Malformed entries are skipped.
    pub fn parse(header: &str) -> Self {
        let links = split_entries(header)
            .into_iter()
            .filter_map(parse_entry)
            .collect();
        Self { links }
    }

    /// Parse every `Link` header value of a request.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let links = values
            .into_iter()
            .flat_map(|v| Self::parse(v).links)
            .collect();
        Self { links }
    }

    pub fn links(&self) -> &[LinkRelation] {
        &self.links
    }

    /// `true` if any relation targets the LDP basic-container type.
    pub fn is_basic_container(&self) -> bool {
        self.links.iter().any(|l| l.target == BASIC_CONTAINER)
    }
}

// Commas may appear inside `<...>` and quoted strings, so a plain split
// on ',' is not enough.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let (mut in_angle, mut in_quote) = (false, false);
    let mut start = 0;
    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            '"' if !in_angle => in_quote = !in_quote,
            ',' if !in_angle && !in_quote => {
                entries.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

fn parse_entry(entry: &str) -> Option<LinkRelation> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let (target, params) = rest.split_once('>')?;

    let mut rels = Vec::new();
    for param in params.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("rel") {
            rels.extend(
                value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .map(str::to_ascii_lowercase),
            );
        }
    }

    Some(LinkRelation {
        target: target.trim().to_string(),
        rels,
    })
}
