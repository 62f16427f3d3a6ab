//! Compiles a declarative `citeStructure` tree into a two-way translator
//! between human-readable references and locator expressions.
//!
//! Each declared level contributes a named capture group to one aggregate
//! regular expression (parsing direction) and a locator template
//! (generation direction). Group names join the accumulated unit names
//! with `__` so they stay unique across the tree.

use crate::error::TeiError;
use citenav_navigation::{CitableStructure, CiteData};
use regex::Regex;
use roxmltree::Node;

const POSITION_USE: &str = "position()";

/// A compiled citation grammar for one declared tree.
#[derive(Debug, Clone)]
pub struct CitationGrammar {
    pattern: Regex,
    levels: Vec<Level>,
    structure: CitableStructure,
}

/// One level of the compiled grammar, in declaration order.
#[derive(Debug, Clone)]
struct Level {
    /// The sanitized capture-group key, e.g. `book__chapter`.
    key: String,
    cite_type: String,
    match_expr: String,
    use_expr: String,
}

impl Level {
    /// Fills the locator template for one captured identifier. String
    /// identifiers are quoted; the positional function compares numbers.
    fn fill(&self, value: &str) -> String {
        if self.use_expr == POSITION_USE {
            format!("{}[{}={}]", self.match_expr, self.use_expr, value)
        } else {
            format!("{}[{}='{}']", self.match_expr, self.use_expr, value)
        }
    }
}

impl CitationGrammar {
    /// Compiles the first `citeStructure` declaration under a `refsDecl`
    /// element.
    pub fn compile(refs_decl: Node) -> Result<Self, TeiError> {
        let decl = child_elements(refs_decl, "citeStructure")
            .into_iter()
            .next()
            .ok_or_else(|| {
                TeiError::Grammar("refsDecl declares no citeStructure".to_string())
            })?;

        let mut levels = Vec::new();
        let (pattern, structure) = build_level(decl, "", &mut levels)?;
        let pattern = Regex::new(&format!("^{}", pattern))
            .map_err(|e| TeiError::Grammar(format!("cannot compile reference pattern: {}", e)))?;

        log::debug!(
            "compiled citation grammar with {} level(s): {}",
            levels.len(),
            levels
                .iter()
                .map(|l| l.cite_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            pattern,
            levels,
            structure,
        })
    }

    /// The semantic tree of declared levels.
    pub fn structure(&self) -> &CitableStructure {
        &self.structure
    }

    /// Splits a reference into its per-level identifiers, in declaration
    /// order of the levels it touches.
    pub fn parse(&self, reference: &str) -> Result<Vec<(String, String)>, TeiError> {
        let captures = self
            .pattern
            .captures(reference)
            .ok_or_else(|| TeiError::RefSyntax(reference.to_string()))?;

        Ok(self
            .levels
            .iter()
            .filter_map(|level| {
                captures
                    .name(&level.key)
                    .map(|m| (level.cite_type.clone(), m.as_str().to_string()))
            })
            .collect())
    }

    /// Translates a reference into the locator expression selecting its
    /// node.
    pub fn to_locator(&self, reference: &str) -> Result<String, TeiError> {
        let captures = self
            .pattern
            .captures(reference)
            .ok_or_else(|| TeiError::RefSyntax(reference.to_string()))?;

        let locator = self
            .levels
            .iter()
            .filter_map(|level| {
                captures
                    .name(&level.key)
                    .map(|m| level.fill(m.as_str()))
            })
            .collect::<Vec<_>>()
            .join("/");

        // A root locator beginning with // followed by a relative child
        // level produces a triple slash at the join; collapse it back into
        // a descendant step.
        Ok(locator.replace("///", "//"))
    }
}

fn child_elements<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == name)
        .collect()
}

/// Depth-first compilation of one declaration level: returns the regex
/// fragment for the level (children included) and the semantic structure.
fn build_level(
    element: Node,
    accumulated: &str,
    levels: &mut Vec<Level>,
) -> Result<(String, CitableStructure), TeiError> {
    let unit = element
        .attribute("unit")
        .ok_or_else(|| TeiError::Grammar("citeStructure is missing its unit attribute".to_string()))?;
    let match_expr = element.attribute("match").ok_or_else(|| {
        TeiError::Grammar(format!("citeStructure '{}' is missing its match attribute", unit))
    })?;
    let use_expr = element.attribute("use").ok_or_else(|| {
        TeiError::Grammar(format!("citeStructure '{}' is missing its use attribute", unit))
    })?;
    let delim = element.attribute("delim").unwrap_or("");

    let mut structure = CitableStructure {
        cite_type: unit.to_string(),
        match_expr: match_expr.to_string(),
        use_expr: use_expr.to_string(),
        delim: delim.to_string(),
        children: Vec::new(),
        metadata: Vec::new(),
    };

    for cite_data in child_elements(element, "citeData") {
        let xpath = cite_data.attribute("use").ok_or_else(|| {
            TeiError::Grammar(format!("citeData under '{}' is missing its use attribute", unit))
        })?;
        let property = cite_data.attribute("property").ok_or_else(|| {
            TeiError::Grammar(format!(
                "citeData under '{}' is missing its property attribute",
                unit
            ))
        })?;
        structure.metadata.push(CiteData {
            xpath: xpath.to_string(),
            property: property.to_string(),
        });
    }

    let key = if accumulated.is_empty() {
        sanitize_key(unit)
    } else {
        format!("{}__{}", accumulated, sanitize_key(unit))
    };

    let children = child_elements(element, "citeStructure");

    // An identifier may contain anything except the delimiters its
    // immediate children introduce.
    let child_delims: String = children
        .iter()
        .filter_map(|c| c.attribute("delim"))
        .collect();
    let allowed_values = if child_delims.is_empty() {
        ".".to_string()
    } else {
        format!("[^{}]", regex::escape(&child_delims))
    };

    let mut pattern = if delim.is_empty() {
        format!("(?P<{}>{}+)", key, allowed_values)
    } else {
        format!(
            "(?:{}(?P<{}>{}+))",
            regex::escape(delim),
            key,
            allowed_values
        )
    };

    let level_key = key.clone();
    levels.push(Level {
        key,
        cite_type: unit.to_string(),
        match_expr: match_expr.to_string(),
        use_expr: use_expr.to_string(),
    });

    let mut child_patterns = Vec::with_capacity(children.len());
    for child in children {
        let (child_pattern, child_structure) = build_level(child, &level_key, levels)?;
        child_patterns.push(child_pattern);
        structure.children.push(child_structure);
    }

    match child_patterns.len() {
        0 => {}
        1 => pattern.push_str(&format!("(?:{})?", child_patterns[0])),
        _ => {
            let alternatives: Vec<String> = child_patterns
                .iter()
                .map(|p| format!("(?:{})", p))
                .collect();
            pattern.push_str(&format!("(?:{})?", alternatives.join("|")));
        }
    }

    Ok((pattern, structure))
}

/// Capture-group names admit word characters only.
fn sanitize_key(unit: &str) -> String {
    unit.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECLARATION: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
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
    <text><body/></text>
    </TEI>"##;

    fn compile_declaration(xml: &str) -> CitationGrammar {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let refs_decl = doc
            .descendants()
            .find(|n| n.tag_name().name() == "refsDecl")
            .unwrap();
        CitationGrammar::compile(refs_decl).unwrap()
    }

    #[test]
    fn test_locator_generation() {
        let grammar = compile_declaration(DECLARATION);

        assert_eq!(
            grammar.to_locator("Luke 1:2").unwrap(),
            "//body/div[@n='Luke']/div[position()=1]/div[position()=2]"
        );
        assert_eq!(
            grammar.to_locator("Luke 1#3").unwrap(),
            "//body/div[@n='Luke']/div[position()=1]/l[position()=3]"
        );
        // Partial references stop at any level.
        assert_eq!(
            grammar.to_locator("Luke 1").unwrap(),
            "//body/div[@n='Luke']/div[position()=1]"
        );
        assert_eq!(grammar.to_locator("Luke").unwrap(), "//body/div[@n='Luke']");
    }

    #[test]
    fn test_reference_parsing() {
        let grammar = compile_declaration(DECLARATION);

        assert_eq!(
            grammar.parse("Luke 1:2").unwrap(),
            vec![
                ("book".to_string(), "Luke".to_string()),
                ("chapter".to_string(), "1".to_string()),
                ("verse".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(
            grammar.parse("Luke 1#3").unwrap(),
            vec![
                ("book".to_string(), "Luke".to_string()),
                ("chapter".to_string(), "1".to_string()),
                ("bloup".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(
            grammar.parse("Luke").unwrap(),
            vec![("book".to_string(), "Luke".to_string())]
        );
    }

    #[test]
    fn test_ref_syntax_failure() {
        let grammar = compile_declaration(DECLARATION);
        // The book identifier cannot be empty or start with the chapter
        // delimiter.
        assert!(matches!(
            grammar.to_locator("").unwrap_err(),
            TeiError::RefSyntax(_)
        ));
        assert!(matches!(
            grammar.parse(" 1:2").unwrap_err(),
            TeiError::RefSyntax(_)
        ));
    }

    #[test]
    fn test_traversing_child_match_collapses_slashes() {
        let xml = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader><refsDecl>
            <citeStructure unit="book" match="//body/div" use="@n">
                <citeStructure unit="chapter" match="div" use="@n" delim=" ">
                    <citeStructure unit="line" match="//l" use="@n" delim="#"/>
                </citeStructure>
            </citeStructure>
        </refsDecl></teiHeader><text><body/></text></TEI>"##;
        let grammar = compile_declaration(xml);
        assert_eq!(
            grammar.to_locator("Luke 1#3").unwrap(),
            "//body/div[@n='Luke']/div[@n='1']//l[@n='3']"
        );
    }

    #[test]
    fn test_structure_shape() {
        let grammar = compile_declaration(DECLARATION);
        let structure = grammar.structure();
        assert_eq!(structure.cite_type, "book");
        assert_eq!(structure.children.len(), 1);
        let chapter = &structure.children[0];
        assert_eq!(chapter.cite_type, "chapter");
        assert_eq!(chapter.delim, " ");
        let kinds: Vec<&str> = chapter
            .children
            .iter()
            .map(|c| c.cite_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["verse", "bloup"]);
    }

    #[test]
    fn test_cite_data_declaration() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader><refsDecl>
            <citeStructure unit="book" match="//body/div" use="@n">
                <citeData use="head" property="http://purl.org/dc/terms/title"/>
                <citeData use="@part" property="http://foo.bar/part"/>
            </citeStructure>
        </refsDecl></teiHeader><text><body/></text></TEI>"#;
        let grammar = compile_declaration(xml);
        let metadata = &grammar.structure().metadata;
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[0].property, "http://purl.org/dc/terms/title");
        assert_eq!(metadata[1].xpath, "@part");
    }

    #[test]
    fn test_missing_attributes_rejected() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader><refsDecl>
            <citeStructure unit="book" match="//body/div"/>
        </refsDecl></teiHeader><text><body/></text></TEI>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let refs_decl = doc
            .descendants()
            .find(|n| n.tag_name().name() == "refsDecl")
            .unwrap();
        assert!(matches!(
            CitationGrammar::compile(refs_decl),
            Err(TeiError::Grammar(_))
        ));
    }
}
