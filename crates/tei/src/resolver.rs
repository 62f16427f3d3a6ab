//! Enumerates the citable units of a document by walking it with a
//! compiled citation grammar.

use crate::error::TeiError;
use crate::grammar::CitationGrammar;
use crate::xml::XmlNode;
use citenav_navigation::{CitableStructure, CitableUnit};
use citenav_xpath::{
    DataSourceNode, EvaluationContext, evaluate_nodes, first_node, parse_expression,
};

const POSITION_USE: &str = "position()";

/// Enumerates the full ordered reference tree of a document.
///
/// `root` must be the document node the grammar's root level was declared
/// against. Children of every unit come out in document order even when
/// heterogeneous sibling structures produced them.
pub fn find_refs<'a>(
    root: XmlNode<'a, 'a>,
    grammar: &CitationGrammar,
) -> Result<Vec<CitableUnit>, TeiError> {
    let walker = Walker { root };
    let units = walker.collect(root, grammar.structure(), None, 1)?;
    log::debug!(
        "enumerated {} top-level unit(s) of type '{}'",
        units.len(),
        grammar.structure().cite_type
    );
    Ok(units)
}

struct Walker<'a> {
    root: XmlNode<'a, 'a>,
}

impl<'a> Walker<'a> {
    fn context(&self, node: XmlNode<'a, 'a>) -> EvaluationContext<XmlNode<'a, 'a>> {
        EvaluationContext::new(node, self.root)
    }

    /// Evaluates one level's `match` against a context node and derives
    /// the identifier of every matched node from its `use` expression.
    /// The positional function numbers matches 1-based within this
    /// context; everything else evaluates relative to the matched node.
    fn identifiers(
        &self,
        context: XmlNode<'a, 'a>,
        structure: &CitableStructure,
        at_root: bool,
    ) -> Result<Vec<(String, XmlNode<'a, 'a>)>, TeiError> {
        let match_src = if at_root {
            structure.match_expr.clone()
        } else {
            relative(&structure.match_expr)
        };
        let match_expr = parse_expression(&match_src)?;
        let nodes = evaluate_nodes(&match_expr, &self.context(context))?;

        let mut out = Vec::with_capacity(nodes.len());
        if structure.use_expr == POSITION_USE {
            for (index, node) in nodes.into_iter().enumerate() {
                out.push(((index + 1).to_string(), node));
            }
        } else {
            let use_expr = parse_expression(&relative(&structure.use_expr))?;
            for node in nodes {
                match first_node(&use_expr, &self.context(node))? {
                    Some(value) => out.push((value.string_value(), node)),
                    None => log::warn!(
                        "node matched by '{}' has no value for '{}', skipping",
                        structure.match_expr,
                        structure.use_expr
                    ),
                }
            }
        }
        Ok(out)
    }

    fn collect(
        &self,
        context: XmlNode<'a, 'a>,
        structure: &CitableStructure,
        parent_ref: Option<&str>,
        level: usize,
    ) -> Result<Vec<CitableUnit>, TeiError> {
        let prefix = match parent_ref {
            Some(parent) => format!("{}{}", parent, structure.delim),
            None => String::new(),
        };

        let mut units = Vec::new();
        for (value, node) in self.identifiers(context, structure, parent_ref.is_none())? {
            let reference = format!("{}{}", prefix, value);
            let mut unit = CitableUnit::new(&structure.cite_type, &reference, parent_ref, level);
            self.apply_metadata(&mut unit, structure, node)?;
            self.descend(node, structure, &mut unit, level)?;
            units.push(unit);
        }
        Ok(units)
    }

    /// Recurses into a unit's declared children. A single child structure
    /// preserves document order trivially; multiple structures interleave
    /// by document order of the nodes they locate.
    fn descend(
        &self,
        node: XmlNode<'a, 'a>,
        structure: &CitableStructure,
        unit: &mut CitableUnit,
        level: usize,
    ) -> Result<(), TeiError> {
        match structure.children.len() {
            0 => {}
            1 => {
                unit.children =
                    self.collect(node, &structure.children[0], Some(&unit.reference), level + 1)?;
            }
            _ => {
                unit.children =
                    self.merge_branches(node, &structure.children, &unit.reference, level + 1)?;
            }
        }
        Ok(())
    }

    /// Evaluates every child structure independently, then interleaves the
    /// candidates by document order of their nodes. The node ordering is a
    /// precomputed document-order key, so a stable sort suffices.
    fn merge_branches(
        &self,
        context: XmlNode<'a, 'a>,
        structures: &[CitableStructure],
        parent_ref: &str,
        level: usize,
    ) -> Result<Vec<CitableUnit>, TeiError> {
        let mut candidates: Vec<(String, XmlNode<'a, 'a>, &CitableStructure)> = Vec::new();
        for structure in structures {
            for (value, node) in self.identifiers(context, structure, false)? {
                let reference = format!("{}{}{}", parent_ref, structure.delim, value);
                candidates.push((reference, node, structure));
            }
        }
        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        let mut units = Vec::with_capacity(candidates.len());
        for (reference, node, structure) in candidates {
            let mut unit =
                CitableUnit::new(&structure.cite_type, &reference, Some(parent_ref), level);
            self.apply_metadata(&mut unit, structure, node)?;
            self.descend(node, structure, &mut unit, level)?;
            units.push(unit);
        }
        Ok(units)
    }

    fn apply_metadata(
        &self,
        unit: &mut CitableUnit,
        structure: &CitableStructure,
        node: XmlNode<'a, 'a>,
    ) -> Result<(), TeiError> {
        for cite_data in &structure.metadata {
            let expr = parse_expression(&relative(&cite_data.xpath))?;
            for value_node in evaluate_nodes(&expr, &self.context(node))? {
                unit.add_metadata(
                    cite_data.bucket(),
                    &cite_data.property,
                    value_node.string_value(),
                );
            }
        }
        Ok(())
    }
}

/// Rewrites a locator fragment so it evaluates relative to the current
/// context node instead of the document root.
fn relative(expr: &str) -> String {
    if let Some(rest) = expr.strip_prefix("//") {
        format!(".//{}", rest)
    } else if expr.starts_with('.') {
        expr.to_string()
    } else {
        format!("./{}", expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use citenav_navigation::PathIndex;

    const BASE_TEI: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
    <teiHeader>
        <refsDecl>
            <citeStructure unit="book" match="//body/div" use="@n">
                <citeStructure unit="chapter" match="div" use="position()" delim=" ">
                    <citeStructure unit="verse" match="div" use="position()" delim=":"/>
                    <citeStructure unit="bloup" match="l" use="position()" delim="#"/>
                </citeStructure>
            </citeStructure>
        </refsDecl>
    </teiHeader>
    <text>
    <body>
    <div n="Luke">
        <div>
            <div>Text</div>
            <div>Text 2</div>
            <l>Text 3</l>
        </div>
    </div>
    <div n="Mark">
        <div>
            <div>Text A</div>
            <div>Text B</div>
            <l>Text C</l>
            <div>Text D</div>
        </div>
    </div>
    </body>
    </text>
    </TEI>"##;

    fn compile(xml: &str) -> CitationGrammar {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let refs_decl = doc
            .descendants()
            .find(|n| n.tag_name().name() == "refsDecl")
            .unwrap();
        CitationGrammar::compile(refs_decl).unwrap()
    }

    #[test]
    fn test_enumeration_with_document_order_merge() {
        let grammar = compile(BASE_TEI);
        let doc = XmlDocument::parse(BASE_TEI).unwrap();
        let units = find_refs(doc.root_node(), &grammar).unwrap();

        let index = PathIndex::from_units(&units);
        let refs: Vec<&str> = index.iter().map(|(r, _)| r).collect();
        assert_eq!(
            refs,
            vec![
                "Luke", "Luke 1", "Luke 1:1", "Luke 1:2", "Luke 1#1", "Mark", "Mark 1",
                "Mark 1:1", "Mark 1:2", "Mark 1#1", "Mark 1:3"
            ]
        );

        // The l element sits between the second and third div of Mark's
        // chapter; the merge interleaves the heterogeneous types.
        let mark_chapter = &units[1].children[0];
        let kinds: Vec<&str> = mark_chapter
            .children
            .iter()
            .map(|u| u.cite_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["verse", "verse", "bloup", "verse"]);
    }

    #[test]
    fn test_levels_and_parents() {
        let grammar = compile(BASE_TEI);
        let doc = XmlDocument::parse(BASE_TEI).unwrap();
        let units = find_refs(doc.root_node(), &grammar).unwrap();

        let luke = &units[0];
        assert_eq!(luke.level, 1);
        assert_eq!(luke.parent, None);
        let luke_1 = &luke.children[0];
        assert_eq!(luke_1.level, 2);
        assert_eq!(luke_1.parent.as_deref(), Some("Luke"));
        let luke_1_1 = &luke_1.children[0];
        assert_eq!(luke_1_1.level, 3);
        assert_eq!(luke_1_1.parent.as_deref(), Some("Luke 1"));
    }

    #[test]
    fn test_round_trip_with_grammar() {
        let grammar = compile(BASE_TEI);
        let doc = XmlDocument::parse(BASE_TEI).unwrap();
        let units = find_refs(doc.root_node(), &grammar).unwrap();
        let index = PathIndex::from_units(&units);

        // Every enumerated ref parses, and its locator selects exactly one
        // node.
        let root = doc.root_node();
        let e_ctx = EvaluationContext::new(root, root);
        for (reference, _) in index.iter() {
            assert!(grammar.parse(reference).is_ok(), "{} must parse", reference);
            let locator = grammar.to_locator(reference).unwrap();
            let expr = parse_expression(&locator).unwrap();
            let nodes = evaluate_nodes(&expr, &e_ctx).unwrap();
            assert_eq!(nodes.len(), 1, "locator {} must select one node", locator);
        }
    }

    #[test]
    fn test_cite_data_extraction() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
        <teiHeader>
            <refsDecl>
                <citeStructure unit="book" match="//body/div" use="@n">
                    <citeData use="head" property="http://purl.org/dc/terms/title"/>
                    <citeData use="@resp" property="http://purl.org/dc/terms/creator"/>
                    <citeData use="@part" property="http://foo.bar/part"/>
                </citeStructure>
            </refsDecl>
        </teiHeader>
        <text>
        <body>
        <div n="1" resp="John Doe" part="A">
            <head>Introduction</head>
            <head>Contexte</head>
            <p>Lorem</p>
        </div>
        <div n="2">
            <head>Background</head>
        </div>
        </body>
        </text>
        </TEI>"#;
        let grammar = compile(xml);
        let doc = XmlDocument::parse(xml).unwrap();
        let units = find_refs(doc.root_node(), &grammar).unwrap();

        assert_eq!(units.len(), 2);
        let first = &units[0];
        assert_eq!(
            first.dublin_core["http://purl.org/dc/terms/title"],
            vec!["Introduction", "Contexte"]
        );
        assert_eq!(
            first.dublin_core["http://purl.org/dc/terms/creator"],
            vec!["John Doe"]
        );
        assert_eq!(first.extension["http://foo.bar/part"], vec!["A"]);

        let second = &units[1];
        assert_eq!(
            second.dublin_core["http://purl.org/dc/terms/title"],
            vec!["Background"]
        );
        assert!(second.dublin_core.get("http://purl.org/dc/terms/creator").is_none());
        assert!(second.extension.is_empty());
    }
}
